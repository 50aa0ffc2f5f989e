//! 得分聚合服务 - 业务能力层
//!
//! 只负责把各维度得分聚合成一个百分制指标，不关心流程

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::EvaluationResult;

/// 得分聚合器
///
/// 公式：`round((1 - Σ(score_i × weight_i) / max_score) × 100)`。
/// 求和只覆盖"评价列表与权重表都出现"的维度；分母固定为
/// `max_score`，不按实际使用的权重总和重新归一——被评价的加权
/// 维度越少，结果越靠近 100（空评价列表恰好为 100）。
/// 该行为按部署规格原样保留，见 DESIGN.md
pub struct ScoreAggregator {
    weights: BTreeMap<u32, f64>,
    max_score: f64,
}

impl ScoreAggregator {
    /// 创建新的得分聚合器
    ///
    /// 权重表只覆盖部分维度，未覆盖的维度不参与聚合
    pub fn new(weights: BTreeMap<u32, f64>, max_score: f64) -> Self {
        Self { weights, max_score }
    }

    /// 计算聚合指标（0..=100 的整数）
    pub fn aggregate(&self, evaluations: &[EvaluationResult]) -> i64 {
        let weighted_sum: f64 = evaluations
            .iter()
            .filter_map(|e| self.weights.get(&e.dimension_id).map(|w| e.score * w))
            .sum();

        let rate = ((1.0 - weighted_sum / self.max_score) * 100.0).round() as i64;

        debug!(
            "聚合计算: 加权和 {:.3}, 满分 {}, 指标 {}",
            weighted_sum, self.max_score, rate
        );

        rate
    }
}
