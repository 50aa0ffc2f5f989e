//! 翻译投影服务 - 业务能力层
//!
//! 对会话快照做展示语言的投影：
//! - 只读取快照，绝不触碰规范状态，可与下一轮回答处理并发执行
//! - 翻译服务契约上必须保键保长、只译叶子字符串；调用后在本地
//!   做结构等价校验，不一致或调用失败时静默回退到源文——
//!   翻译问题永远不作为错误暴露给最终用户

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::services::collaborator::Translator;

/// 翻译投影器
pub struct TranslationOverlay {
    translator: Box<dyn Translator>,
    source_locale: String,
}

impl TranslationOverlay {
    /// 创建新的翻译投影器
    pub fn new(translator: Box<dyn Translator>, source_locale: impl Into<String>) -> Self {
        Self {
            translator,
            source_locale: source_locale.into(),
        }
    }

    /// 生成目标语言的投影
    ///
    /// 目标语言与源语言一致时直接返回快照副本
    pub async fn project(&self, snapshot: &JsonValue, locale: &str) -> JsonValue {
        if locale == self.source_locale {
            return snapshot.clone();
        }

        match self.translator.translate(locale, snapshot).await {
            Ok(translated) if same_shape(snapshot, &translated) => {
                debug!("✓ 翻译投影完成: {}", locale);
                translated
            }
            Ok(_) => {
                warn!("⚠️ 翻译结果结构不一致，回退到源文 ({})", locale);
                snapshot.clone()
            }
            Err(e) => {
                warn!("⚠️ 翻译服务失败，回退到源文 ({}): {}", locale, e);
                snapshot.clone()
            }
        }
    }
}

/// 结构等价校验
///
/// 键集合与数组长度必须完全一致；字符串叶子允许值不同，
/// 数值、布尔、null 必须原样保留
fn same_shape(source: &JsonValue, translated: &JsonValue) -> bool {
    match (source, translated) {
        (JsonValue::Object(a), JsonValue::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| same_shape(value, other)))
        }
        (JsonValue::Array(a), JsonValue::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| same_shape(x, y))
        }
        (JsonValue::String(_), JsonValue::String(_)) => true,
        (JsonValue::Number(a), JsonValue::Number(b)) => a == b,
        (JsonValue::Bool(a), JsonValue::Bool(b)) => a == b,
        (JsonValue::Null, JsonValue::Null) => true,
        _ => false,
    }
}
