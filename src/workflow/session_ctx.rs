//! 会话上下文
//!
//! 封装"我正在处理哪场面试"这一信息，主要用于日志前缀

use std::fmt::Display;

/// 会话上下文
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 会话ID（仅用于日志显示与导出标记）
    pub session_id: String,
}

impl SessionCtx {
    /// 创建新的会话上下文，ID 取启动时刻
    pub fn new() -> Self {
        Self {
            session_id: chrono::Local::now().format("%Y%m%d-%H%M%S").to_string(),
        }
    }

    /// 使用指定 ID 创建
    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}

impl Default for SessionCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[会话 #{}]", self.session_id)
    }
}
