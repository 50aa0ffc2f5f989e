//! 提问生成服务 - 业务能力层
//!
//! 只负责"生成下一个提问"能力，不关心流程。
//! 提示词把目标维度告知模型，但要求措辞上不让候选人察觉

use async_trait::async_trait;

use crate::clients::LlmClient;
use crate::config::{Config, DeploymentConfig};
use crate::error::AppResult;
use crate::models::{Dimension, Speaker, Turn};
use crate::services::collaborator::QuestionGenerator;

/// 历史压缩窗口：只带最近 3 个往返
const HISTORY_WINDOW: usize = 6;

/// 基于 LLM 的提问生成服务
pub struct LlmQuestionGenerator {
    client: LlmClient,
    question_key: String,
}

impl LlmQuestionGenerator {
    /// 创建新的提问生成服务
    pub fn new(config: &Config, deployment: &DeploymentConfig) -> Self {
        Self {
            client: LlmClient::new(config),
            question_key: deployment.question_key.clone(),
        }
    }

    fn build_system_message(&self, dimension: &Dimension) -> String {
        format!(
            "あなたは企業の採用面接におけるインタビュアーです。\n\
             今回は「{}」を測定するための質問を作成してください。\n\
             \n\
             【質問作成ルール】\n\
             - 質問は必ず日本語で1つだけ出力してください。\n\
             - 評価対象の項目名や番号、心理学用語は一切使用せず、測定意図を候補者に悟られないようにしてください。\n\
             - 直前の回答に自然な形で共感を示したうえで、次の質問を投げかけてください。\n\
             - 質問文は150文字以内の自然な疑問文で終えてください。\n\
             - 「Q:」「A:」などのラベルや、評価・感想・アドバイスは含めないでください。",
            dimension.name
        )
    }

    fn build_user_message(&self, history: &[Turn]) -> String {
        let excerpt = compact_history(history, HISTORY_WINDOW);

        format!(
            "以下はこれまでの面接ログの抜粋です。\n\
             {}\n\n\
             次の面接質問を1つだけ出してください。\n\
             出力は必ずJSONのみ:\n\
             {{\"{}\":\"...\"}}",
            if excerpt.is_empty() {
                "(初回または履歴なし)".to_string()
            } else {
                excerpt
            },
            self.question_key
        )
    }
}

#[async_trait]
impl QuestionGenerator for LlmQuestionGenerator {
    async fn generate(&self, history: &[Turn], dimension: &Dimension) -> AppResult<String> {
        let system = self.build_system_message(dimension);
        let user = self.build_user_message(history);

        self.client.chat(&user, Some(&system)).await
    }
}

/// 历史压缩：取最近 `max` 条发言，面试官标 `Q:`、候选人标 `A:`
fn compact_history(history: &[Turn], max: usize) -> String {
    let skip = history.len().saturating_sub(max);
    history
        .iter()
        .skip(skip)
        .map(|t| match t.speaker {
            Speaker::Interviewer => format!("Q: {}", t.text),
            Speaker::Candidate => format!("A: {}", t.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_history_keeps_recent_turns() {
        let history: Vec<Turn> = (1..=8)
            .map(|i| {
                if i % 2 == 1 {
                    Turn::interviewer(format!("質問{}", i), i, None)
                } else {
                    Turn::candidate(format!("回答{}", i), i)
                }
            })
            .collect();

        let compact = compact_history(&history, 6);
        let lines: Vec<&str> = compact.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Q: 質問3");
        assert_eq!(lines[5], "A: 回答8");
    }

    #[test]
    fn test_compact_history_empty() {
        assert_eq!(compact_history(&[], 6), "");
    }
}
