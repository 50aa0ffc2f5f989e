//! 部署配置加载器
//!
//! 从 TOML 文件加载 `DeploymentConfig`。文件里的原始结构与领域结构
//! 分开定义，加载时做一次转换和合法性检查

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio::fs;
use tracing::info;

use crate::config::DeploymentConfig;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{Dimension, FieldKind, FieldSpec, PayloadSchema};

/// TOML 文件中的部署配置
#[derive(Debug, Deserialize)]
struct RawDeployment {
    opening_question: String,
    closing_message: String,
    max_questions: usize,
    max_score: f64,
    #[serde(default = "default_strict")]
    strict_feedback: bool,
    opening_dimension: Option<u32>,
    #[serde(default = "default_question_key")]
    question_key: String,
    score_key: Option<String>,
    comment_key: Option<String>,
    question_fallback: String,
    #[serde(default = "default_question_min_len")]
    question_min_len: usize,
    #[serde(default = "default_question_max_len")]
    question_max_len: usize,
    #[serde(default = "default_summary_fallback")]
    summary_fallback: String,
    dimensions: Vec<RawDimension>,
    #[serde(default)]
    weights: Vec<RawWeight>,
    feedback_fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawDimension {
    id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawWeight {
    id: u32,
    value: f64,
}

/// 反馈字段：带 min/max 的是数值字段，其余是文本字段
#[derive(Debug, Deserialize)]
struct RawField {
    key: String,
    min: Option<f64>,
    max: Option<f64>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    fallback: toml::Value,
}

fn default_strict() -> bool {
    true
}

fn default_question_key() -> String {
    "question".to_string()
}

fn default_question_min_len() -> usize {
    4
}

fn default_question_max_len() -> usize {
    200
}

fn default_summary_fallback() -> String {
    "総評が取得できませんでした。".to_string()
}

/// 从 TOML 文件加载部署配置
pub async fn load_deployment(path: &Path) -> AppResult<DeploymentConfig> {
    let content = fs::read_to_string(path).await.map_err(|e| {
        AppError::Config(ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    })?;

    let raw: RawDeployment = toml::from_str(&content).map_err(|e| {
        AppError::Config(ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })
    })?;

    let deployment = to_deployment(raw)?;

    info!(
        "✓ 部署配置加载完成: {} 个维度, 回答上限 {}",
        deployment.dimensions.len(),
        deployment.max_questions
    );

    Ok(deployment)
}

/// 原始结构 → 领域结构
fn to_deployment(raw: RawDeployment) -> AppResult<DeploymentConfig> {
    if raw.dimensions.is_empty() {
        return Err(AppError::config_invalid("维度目录不能为空"));
    }
    if raw.max_score <= 0.0 {
        return Err(AppError::config_invalid("max_score 必须大于 0"));
    }
    if raw.max_questions == 0 {
        return Err(AppError::config_invalid("max_questions 必须大于 0"));
    }

    let mut dimensions: Vec<Dimension> = raw
        .dimensions
        .into_iter()
        .map(|d| Dimension::new(d.id, d.name))
        .collect();
    dimensions.sort_by_key(|d| d.id);
    dimensions.dedup_by_key(|d| d.id);

    let mut weights = BTreeMap::new();
    for w in raw.weights {
        weights.insert(w.id, w.value);
    }

    let mut feedback_fields = Vec::new();
    for field in raw.feedback_fields {
        feedback_fields.push(to_field_spec(field)?);
    }
    let feedback_schema = PayloadSchema::new(feedback_fields);

    if let Some(score_key) = &raw.score_key {
        if feedback_schema.field(score_key).is_none() {
            return Err(AppError::config_invalid(format!(
                "score_key '{}' 不在反馈字段中",
                score_key
            )));
        }
    }

    let question_schema = PayloadSchema::new(vec![FieldSpec::text_bounded(
        raw.question_key.clone(),
        raw.question_min_len,
        raw.question_max_len,
        raw.question_fallback,
    )]);

    Ok(DeploymentConfig {
        opening_question: raw.opening_question,
        closing_message: raw.closing_message,
        max_questions: raw.max_questions,
        max_score: raw.max_score,
        strict_feedback: raw.strict_feedback,
        opening_dimension: raw.opening_dimension,
        dimensions,
        weights,
        feedback_schema,
        question_schema,
        question_key: raw.question_key,
        score_key: raw.score_key,
        comment_key: raw.comment_key,
        summary_fallback: raw.summary_fallback,
    })
}

fn to_field_spec(raw: RawField) -> AppResult<FieldSpec> {
    let fallback = toml_value_to_json(&raw.fallback);

    let kind = match (raw.min, raw.max) {
        (Some(min), Some(max)) => {
            if min > max {
                return Err(AppError::config_invalid(format!(
                    "字段 {} 的 min 大于 max",
                    raw.key
                )));
            }
            FieldKind::Score { min, max }
        }
        (None, None) => FieldKind::Text {
            min_len: raw.min_len.unwrap_or(1),
            max_len: raw.max_len,
        },
        _ => {
            return Err(AppError::config_invalid(format!(
                "字段 {} 必须同时给出 min 和 max",
                raw.key
            )));
        }
    };

    Ok(FieldSpec {
        key: raw.key,
        kind,
        fallback,
    })
}

fn toml_value_to_json(value: &toml::Value) -> JsonValue {
    match value {
        toml::Value::String(s) => json!(s),
        toml::Value::Integer(i) => json!(i),
        toml::Value::Float(f) => json!(f),
        toml::Value::Boolean(b) => json!(b),
        other => json!(other.to_string()),
    }
}
