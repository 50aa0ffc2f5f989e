//! LLM API 客户端
//!
//! 封装所有与 LLM API 相关的调用逻辑，兼容 OpenAI API 的服务。
//! 所有生成服务共用这一个客户端，等待策略（尝试次数 + 单次等待
//! 上限）在这里统一执行，调用方只看到"等待到完成"或两类失败

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, CollaboratorError};

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_attempts: usize,
    max_wait: Duration,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_attempts: config.llm_max_attempts.max(1),
            max_wait: Duration::from_secs(config.llm_max_wait_secs),
        }
    }

    /// 发送聊天请求
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容。失败时区分两类错误：
    /// 超出等待策略 → `CollaboratorError::Timeout`，
    /// 服务拒绝或调用失败 → `CollaboratorError::Service`
    pub async fn chat(&self, user_message: &str, system_message: Option<&str>) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| AppError::service_failed(format!("构建系统消息失败: {}", e)))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| AppError::service_failed(format!("构建用户消息失败: {}", e)))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| AppError::service_failed(format!("构建请求失败: {}", e)))?;

        let mut last_was_timeout = false;
        let mut last_detail = String::new();

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                warn!("第 {} 次重试 LLM 调用...", attempt - 1);
            }

            match timeout(self.max_wait, self.client.chat().create(request.clone())).await {
                Err(_) => {
                    last_was_timeout = true;
                    warn!(
                        "LLM 调用超时 (第 {} 次, 上限 {} 秒)",
                        attempt,
                        self.max_wait.as_secs()
                    );
                }
                Ok(Err(e)) => {
                    last_was_timeout = false;
                    last_detail = e.to_string();
                    warn!("LLM API 调用失败 (第 {} 次): {}", attempt, e);
                }
                Ok(Ok(response)) => {
                    debug!("LLM API 调用成功");

                    let content = response
                        .choices
                        .first()
                        .and_then(|choice| choice.message.content.clone())
                        .ok_or(AppError::Collaborator(CollaboratorError::EmptyContent))?;

                    if content.trim().is_empty() {
                        return Err(AppError::Collaborator(CollaboratorError::EmptyContent));
                    }

                    return Ok(content.trim().to_string());
                }
            }
        }

        if last_was_timeout {
            Err(AppError::service_timeout(
                self.max_wait.as_secs(),
                self.max_attempts,
            ))
        } else {
            Err(AppError::service_failed(format!(
                "已尝试 {} 次: {}",
                self.max_attempts, last_detail
            )))
        }
    }

    /// 简单的聊天请求（不带系统消息）
    pub async fn simple_chat(&self, user_message: &str) -> AppResult<String> {
        self.chat(user_message, None).await
    }
}
