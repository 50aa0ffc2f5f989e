//! 反馈生成服务 - 业务能力层
//!
//! 只负责"对一组问答生成教练反馈"能力，不关心流程。
//! 输出字段由部署的载荷结构决定，提示词里的 JSON 模板
//! 按结构描述动态拼出，核心不写死任何一种反馈形状

use async_trait::async_trait;

use crate::clients::LlmClient;
use crate::config::{Config, DeploymentConfig};
use crate::error::AppResult;
use crate::models::{FieldKind, PayloadSchema};
use crate::services::collaborator::FeedbackGenerator;

/// 基于 LLM 的反馈生成服务
pub struct LlmFeedbackGenerator {
    client: LlmClient,
    json_template: String,
    opening_question: String,
}

impl LlmFeedbackGenerator {
    /// 创建新的反馈生成服务
    pub fn new(config: &Config, deployment: &DeploymentConfig) -> Self {
        Self {
            client: LlmClient::new(config),
            json_template: json_template(&deployment.feedback_schema),
            opening_question: deployment.opening_question.clone(),
        }
    }

    fn build_user_message(&self, question: &str, answer: &str) -> String {
        format!(
            "【役割】あなたは面接コーチです。以下のルールに厳密に従ってください。\n\
             - 「質問の意図」は必ず【質問】の本文を参照して説明する。回答文から推測しない。\n\
             - 質問1は固定文（「{}」）である。\n\
             - 各フィールドは日本語で簡潔に書くこと。\n\
             \n\
             【質問】{}\n\
             【回答】{}\n\
             \n\
             出力は必ずJSON形式のみ：（他の文字や説明を含めない）\n\
             {}",
            self.opening_question, question, answer, self.json_template
        )
    }
}

#[async_trait]
impl FeedbackGenerator for LlmFeedbackGenerator {
    async fn generate(&self, question: &str, answer: &str) -> AppResult<String> {
        let user = self.build_user_message(question, answer);

        self.client.simple_chat(&user).await
    }
}

/// 按载荷结构描述拼出提示词中的 JSON 模板
fn json_template(schema: &PayloadSchema) -> String {
    let parts: Vec<String> = schema
        .fields
        .iter()
        .map(|f| match &f.kind {
            FieldKind::Text { .. } => format!("\"{}\":\"...\"", f.key),
            FieldKind::Score { min, max } => {
                format!("\"{}\":{}〜{}の数値", f.key, min, max)
            }
        })
        .collect();

    format!("{{{}}}", parts.join(","))
}
