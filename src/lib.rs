//! # Interview Trainer
//!
//! 一个有界多轮模拟面试引擎：固定开场提问 → 收集自由文本回答 →
//! 向文本生成服务索取结构化反馈 → 覆盖调度选择下一个评价维度 →
//! 加权聚合得分 → 结束后生成总评与翻译投影
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 封装外部 API 调用，统一执行等待策略
//! - `LlmClient` - 唯一的 LLM 出口，提供 chat() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，单一能力、不关心流程
//! - `ResponseExtractor` - 严格/宽松双模式的结构化提取能力
//! - `CoverageScheduler` - 维度覆盖调度能力
//! - `ScoreAggregator` - 加权得分聚合能力
//! - `TranslationOverlay` - 快照翻译投影能力
//! - `collaborator` - 四个协作服务接口与各自的 LLM 实现
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场面试"的完整回合流程
//! - `SessionCtx` - 上下文封装（会话ID）
//! - `InterviewFlow` - 流程编排（回答 → 反馈 → 终止判断 → 下一问）
//!
//! ### ④ 应用层（App）
//! - `app.rs` - 宿主参考实现，驱动交互循环与收尾输出
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use clients::LlmClient;
pub use config::{Config, DeploymentConfig};
pub use error::{AppError, AppResult};
pub use models::{Dimension, EvaluationResult, SessionPhase, SessionState, Speaker, Turn};
pub use services::{
    CoverageScheduler, ExtractMode, ResponseExtractor, ScoreAggregator, TranslationOverlay,
};
pub use workflow::{InterviewFlow, SessionCtx};
