//! 协作服务接口
//!
//! 核心通过抽象接口调用外部文本生成/翻译服务，但不实现它们。
//! 接口以 trait 对象形式注入流程层，启动时决定具体后端，
//! 测试时用桩实现替换。
//!
//! 所有调用都是"等待到完成"语义：底层轮询由实现方自行处理，
//! 失败以 `CollaboratorError::Service` 或 `CollaboratorError::Timeout`
//! 区分呈现给核心

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::AppResult;
use crate::models::{Dimension, EvaluationResult, Turn};

/// 提问生成服务
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// 基于会话历史与目标维度生成下一个提问的原始文本
    async fn generate(&self, history: &[Turn], dimension: &Dimension) -> AppResult<String>;
}

/// 反馈生成服务
#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    /// 基于提问与回答生成结构化反馈的原始文本
    async fn generate(&self, question: &str, answer: &str) -> AppResult<String>;
}

/// 翻译服务
///
/// 契约：保持所有键与数组长度不变，只翻译叶子字符串值。
/// 违约由调用方（翻译投影）检出并丢弃结果
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, locale: &str, payload: &JsonValue) -> AppResult<JsonValue>;
}

/// 总评生成服务
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(
        &self,
        qa_pairs: &JsonValue,
        evaluations: &[EvaluationResult],
        aggregate_score: i64,
    ) -> AppResult<String>;
}
