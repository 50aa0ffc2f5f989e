//! 翻译服务 - 业务能力层
//!
//! 只负责"整体 JSON 的保形翻译"能力，不关心流程。
//! 载荷包一层 `{lang, payload}` 再发送，降低模型改动结构的概率；
//! 响应里若回带 `payload` 键则取其内容

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::services::collaborator::Translator;
use crate::services::extractor::ResponseExtractor;

const SYSTEM_MESSAGE: &str = "You are a precise translator for interview Q&A and coaching feedback.\n\
- Keep JSON shape and all keys exactly the same; translate ONLY string values.\n\
- Do not add/remove fields. Do not paraphrase or summarize.\n\
- Preserve numbers, URLs, code, IDs as-is.\n\
- For Mongolian (\"mn\"), use modern Cyrillic orthography.\n\
- Output must be valid JSON only.";

/// 基于 LLM 的翻译服务
pub struct LlmTranslator {
    client: LlmClient,
    extractor: ResponseExtractor,
}

impl LlmTranslator {
    /// 创建新的翻译服务
    pub fn new(config: &Config) -> Self {
        Self {
            client: LlmClient::new(config),
            extractor: ResponseExtractor::new(),
        }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, locale: &str, payload: &JsonValue) -> AppResult<JsonValue> {
        let wrapped = json!({ "lang": locale, "payload": payload });

        let user = format!(
            "Translate all STRING values in this JSON to target language \"{}\". \
             Return JSON with the SAME SHAPE (same keys, same structure), \
             with translated string values only. \
             Return ONLY the translated JSON object, nothing else.\n\n{}",
            locale, wrapped
        );

        let raw = self.client.chat(&user, Some(SYSTEM_MESSAGE)).await?;

        let parsed = self.extractor.extract_value(&raw)?;

        // 响应可能以 {lang, payload} 形式回带
        let translated = match parsed {
            JsonValue::Object(ref map) if map.contains_key("payload") => {
                map["payload"].clone()
            }
            other => other,
        };

        Ok(translated)
    }
}
