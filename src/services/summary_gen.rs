//! 总评生成服务 - 业务能力层
//!
//! 只负责"根据全部问答与评价生成总评"能力，不关心流程

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::EvaluationResult;
use crate::services::collaborator::SummaryGenerator;

const SYSTEM_MESSAGE: &str = "あなたは面接結果を講評するコーチです。\
受け取ったJSONの質問・回答・評価・集計スコアをもとに、\
候補者向けの総評を日本語で作成してください。\
出力は必ずJSONのみ: {\"summary\":\"...\"}";

/// 基于 LLM 的总评生成服务
pub struct LlmSummaryGenerator {
    client: LlmClient,
}

impl LlmSummaryGenerator {
    /// 创建新的总评生成服务
    pub fn new(config: &Config) -> Self {
        Self {
            client: LlmClient::new(config),
        }
    }
}

#[async_trait]
impl SummaryGenerator for LlmSummaryGenerator {
    async fn generate(
        &self,
        qa_pairs: &JsonValue,
        evaluations: &[EvaluationResult],
        aggregate_score: i64,
    ) -> AppResult<String> {
        let payload = json!({
            "qaPairs": qa_pairs,
            "evaluations": evaluations,
            "aggregateScore": aggregate_score,
        });

        self.client
            .chat(&payload.to_string(), Some(SYSTEM_MESSAGE))
            .await
    }
}
