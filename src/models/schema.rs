//! 载荷结构描述
//!
//! 反馈记录的形状随部署而变（如 `{intent, evaluation, improvement, japanese}`
//! 或 `{praise, improve, next_tip}`），因此不使用固定的结构体，
//! 而是用"必需字段 + 类型 + 兜底值"的描述来校验模型输出

use serde_json::{json, Map, Value as JsonValue};

/// 字段类型
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// 非空文本，可附加长度限制（按字符计）
    Text {
        min_len: usize,
        max_len: Option<usize>,
    },
    /// 范围内数值（闭区间）
    Score { min: f64, max: f64 },
}

/// 字段描述
///
/// `fallback` 是宽松模式下字段缺失或不合法时的替代值
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub key: String,
    pub kind: FieldKind,
    pub fallback: JsonValue,
}

impl FieldSpec {
    /// 创建非空文本字段
    pub fn text(key: impl Into<String>, fallback: impl Into<String>) -> Self {
        let fallback: String = fallback.into();
        Self {
            key: key.into(),
            kind: FieldKind::Text {
                min_len: 1,
                max_len: None,
            },
            fallback: json!(fallback),
        }
    }

    /// 创建带长度限制的文本字段
    pub fn text_bounded(
        key: impl Into<String>,
        min_len: usize,
        max_len: usize,
        fallback: impl Into<String>,
    ) -> Self {
        let fallback: String = fallback.into();
        Self {
            key: key.into(),
            kind: FieldKind::Text {
                min_len,
                max_len: Some(max_len),
            },
            fallback: json!(fallback),
        }
    }

    /// 创建范围内数值字段
    pub fn score(key: impl Into<String>, min: f64, max: f64, fallback: f64) -> Self {
        Self {
            key: key.into(),
            kind: FieldKind::Score { min, max },
            fallback: json!(fallback),
        }
    }
}

/// 载荷结构描述
///
/// 声明的字段即必需字段，多余的键在提取时被忽略
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadSchema {
    pub fields: Vec<FieldSpec>,
}

impl PayloadSchema {
    /// 创建新的载荷结构描述
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// 按键查找字段描述
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// 所有必需字段的键
    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.key.as_str()).collect()
    }

    /// 全部取兜底值的对象（宽松模式下完全无法解析时使用）
    pub fn fallback_object(&self) -> JsonValue {
        let mut map = Map::new();
        for field in &self.fields {
            map.insert(field.key.clone(), field.fallback.clone());
        }
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_object_contains_all_keys() {
        let schema = PayloadSchema::new(vec![
            FieldSpec::text("praise", "良い点を抽出できませんでした。"),
            FieldSpec::score("score", 0.0, 5.0, 0.0),
        ]);

        let fallback = schema.fallback_object();
        assert_eq!(
            fallback["praise"],
            json!("良い点を抽出できませんでした。")
        );
        assert_eq!(fallback["score"], json!(0.0));
    }

    #[test]
    fn test_field_lookup() {
        let schema = PayloadSchema::new(vec![FieldSpec::text_bounded("question", 4, 200, "…")]);

        assert!(schema.field("question").is_some());
        assert!(schema.field("answer").is_none());
        assert_eq!(schema.keys(), vec!["question"]);
    }
}
