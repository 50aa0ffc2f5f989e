//! 响应提取服务 - 业务能力层
//!
//! 把生成服务返回的自由文本变成经过校验的结构化数据。
//!
//! ## 提取管线
//! 1. 去掉包裹的代码围栏（带语言标签或不带）
//! 2. 用平衡定界符扫描定位第一个完整的 JSON 片段
//!    （正则取首个 `{...}` 的做法在嵌套结构下会截错，已弃用；
//!    文本中存在多个片段时只取第一个完整片段）
//! 3. 结构化解析
//! 4. 按声明的字段逐个校验类型与取值，多余的键忽略
//!
//! ## 双模式
//! - 严格模式：评分、覆盖等关键路径使用，任何失败都抛错，
//!   调用方绝不能当作拿到了有效值继续执行
//! - 宽松模式：会话文本路径使用，永不抛错，缺失或不合法的
//!   字段用配置的兜底值顶替，保证对话始终能继续

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, SchemaError};
use crate::models::{FieldKind, FieldSpec, PayloadSchema};

/// 提取模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// 失败即抛错
    Strict,
    /// 失败吸收为兜底值
    Lenient,
}

/// 响应提取器
///
/// 职责：
/// - 从原始响应文本中定位并解析 JSON 片段
/// - 按载荷结构描述校验字段
/// - 不关心响应来自哪个生成服务
pub struct ResponseExtractor;

impl ResponseExtractor {
    /// 创建新的响应提取器
    pub fn new() -> Self {
        Self
    }

    /// 提取并校验结构化载荷
    ///
    /// 返回只含声明字段的对象。宽松模式下永不返回 Err
    pub fn extract(
        &self,
        raw: &str,
        schema: &PayloadSchema,
        mode: ExtractMode,
    ) -> AppResult<JsonValue> {
        let parsed = match self.extract_value(raw) {
            Ok(value) => value,
            Err(e) => match mode {
                ExtractMode::Strict => return Err(e),
                ExtractMode::Lenient => {
                    warn!("提取失败，使用全兜底对象: {}", e);
                    return Ok(schema.fallback_object());
                }
            },
        };

        let object = match parsed.as_object() {
            Some(map) => map,
            None => match mode {
                ExtractMode::Strict => return Err(AppError::Schema(SchemaError::NotObject)),
                ExtractMode::Lenient => {
                    warn!("解析结果不是对象，使用全兜底对象");
                    return Ok(schema.fallback_object());
                }
            },
        };

        let mut out = Map::new();
        for field in &schema.fields {
            match validate_field(field, object.get(&field.key)) {
                Ok(value) => {
                    out.insert(field.key.clone(), value);
                }
                Err(e) => match mode {
                    ExtractMode::Strict => return Err(e),
                    ExtractMode::Lenient => {
                        warn!("字段 {} 校验失败，使用兜底值: {}", field.key, e);
                        out.insert(field.key.clone(), field.fallback.clone());
                    }
                },
            }
        }

        debug!("提取成功，共 {} 个字段", out.len());

        Ok(JsonValue::Object(out))
    }

    /// 提取第一个完整的 JSON 片段并解析（不做字段校验）
    pub fn extract_value(&self, raw: &str) -> AppResult<JsonValue> {
        let stripped = strip_code_fences(raw);

        let fragment = find_balanced_fragment(&stripped)
            .ok_or_else(|| AppError::no_json_fragment(preview(raw)))?;

        serde_json::from_str(fragment).map_err(|e| AppError::parse_failed(preview(fragment), e))
    }
}

impl Default for ResponseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// 逐字段校验，返回规范化后的值
fn validate_field(field: &FieldSpec, value: Option<&JsonValue>) -> AppResult<JsonValue> {
    let value = value.ok_or_else(|| AppError::missing_key(&field.key))?;

    match &field.kind {
        FieldKind::Text { min_len, max_len } => {
            let text = value.as_str().ok_or_else(|| {
                AppError::Schema(SchemaError::WrongKind {
                    key: field.key.clone(),
                    expected: "文本",
                })
            })?;

            let trimmed = text.trim();
            let len = trimmed.chars().count();

            if len == 0 {
                return Err(AppError::Schema(SchemaError::EmptyText {
                    key: field.key.clone(),
                }));
            }

            let max = max_len.unwrap_or(usize::MAX);
            if len < *min_len || len > max {
                return Err(AppError::Schema(SchemaError::TextLength {
                    key: field.key.clone(),
                    len,
                    min: *min_len,
                    max,
                }));
            }

            Ok(json!(trimmed))
        }
        FieldKind::Score { min, max } => {
            let number = value.as_f64().ok_or_else(|| {
                AppError::Schema(SchemaError::WrongKind {
                    key: field.key.clone(),
                    expected: "数值",
                })
            })?;

            if number < *min || number > *max {
                return Err(AppError::Schema(SchemaError::OutOfRange {
                    key: field.key.clone(),
                    value: number,
                    min: *min,
                    max: *max,
                }));
            }

            Ok(json!(number))
        }
    }
}

/// 去掉代码围栏标记，保留围栏内的内容
fn strip_code_fences(text: &str) -> String {
    fence_re().replace_all(text, "$1").trim().to_string()
}

fn fence_re() -> &'static Regex {
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    FENCE_RE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```").expect("固定正则不会构造失败")
    })
}

/// 平衡定界符扫描
///
/// 从第一个 `{` 或 `[` 开始，跟踪嵌套深度与字符串状态，
/// 返回第一个配平的片段。片段未闭合时返回 None
fn find_balanced_fragment(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// 截断长文本用于错误信息
fn preview(text: &str) -> String {
    const MAX_LEN: usize = 80;
    if text.chars().count() > MAX_LEN {
        text.chars().take(MAX_LEN).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
