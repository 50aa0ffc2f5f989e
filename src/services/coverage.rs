//! 覆盖调度服务 - 业务能力层
//!
//! 只负责"下一个该考察哪个维度"的判断，不关心流程

use std::collections::BTreeSet;

use tracing::debug;

use crate::models::Dimension;

/// 覆盖调度器
///
/// 职责：
/// - 持有按编号升序的维度目录（1..=K）
/// - 确定地返回编号最小的未出题维度（不做随机化，这是设计决定）
/// - 目录耗尽时返回 None，流程层据此走结束语路径
pub struct CoverageScheduler {
    catalog: Vec<Dimension>,
}

impl CoverageScheduler {
    /// 创建新的覆盖调度器
    ///
    /// 目录在构造时按编号排序并去重
    pub fn new(mut catalog: Vec<Dimension>) -> Self {
        catalog.sort_by_key(|d| d.id);
        catalog.dedup_by_key(|d| d.id);
        Self { catalog }
    }

    /// 返回编号最小的未出题维度
    ///
    /// `consumed` 为集合类型，重复记录天然不影响结果
    pub fn next_unused(&self, consumed: &BTreeSet<u32>) -> Option<&Dimension> {
        let next = self.catalog.iter().find(|d| !consumed.contains(&d.id));

        match next {
            Some(dimension) => debug!("下一个考察维度: {}", dimension),
            None => debug!("维度目录已耗尽"),
        }

        next
    }

    /// 未出题的维度数量
    pub fn remaining(&self, consumed: &BTreeSet<u32>) -> usize {
        self.catalog
            .iter()
            .filter(|d| !consumed.contains(&d.id))
            .count()
    }

    /// 目录是否已耗尽
    pub fn is_exhausted(&self, consumed: &BTreeSet<u32>) -> bool {
        self.remaining(consumed) == 0
    }

    /// 目录大小 K
    pub fn catalog_size(&self) -> usize {
        self.catalog.len()
    }

    /// 按编号查找维度
    pub fn dimension(&self, id: u32) -> Option<&Dimension> {
        self.catalog.iter().find(|d| d.id == id)
    }
}
