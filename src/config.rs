use std::collections::BTreeMap;

use crate::models::{Dimension, FieldSpec, PayloadSchema};

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 等待策略 ---
    /// 单次协作调用的最大尝试次数
    pub llm_max_attempts: usize,
    /// 单次尝试的最长等待秒数
    pub llm_max_wait_secs: u64,
    // --- 部署配置 ---
    /// 部署配置文件路径（不存在时使用内置默认部署）
    pub deployment_file: String,
    /// 展示语言（与源语言一致时跳过翻译投影）
    pub display_locale: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_attempts: 3,
            llm_max_wait_secs: 120,
            deployment_file: "interview.toml".to_string(),
            display_locale: "ja".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_max_attempts: std::env::var("LLM_MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_attempts),
            llm_max_wait_secs: std::env::var("LLM_MAX_WAIT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_wait_secs),
            deployment_file: std::env::var("DEPLOYMENT_FILE").unwrap_or(default.deployment_file),
            display_locale: std::env::var("DISPLAY_LOCALE").unwrap_or(default.display_locale),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}

/// 部署配置
///
/// 维度目录、权重表、反馈结构等都是部署期注入的数据，
/// 核心代码不写死任何一种形状
#[derive(Clone, Debug)]
pub struct DeploymentConfig {
    /// 固定的开场提问
    pub opening_question: String,
    /// 结束语
    pub closing_message: String,
    /// 回答轮数上限
    pub max_questions: usize,
    /// 单维度满分（聚合公式的固定分母）
    pub max_score: f64,
    /// 反馈提取是否使用严格模式
    pub strict_feedback: bool,
    /// 开场提问针对的维度（旧部署把固定首问绑定到维度1，新部署不绑定）
    pub opening_dimension: Option<u32>,
    /// 评价维度目录（1..=K）
    pub dimensions: Vec<Dimension>,
    /// 权重表：只覆盖部分维度，未覆盖的维度不参与聚合
    pub weights: BTreeMap<u32, f64>,
    /// 反馈记录的结构描述
    pub feedback_schema: PayloadSchema,
    /// 生成提问的结构描述（单字段）
    pub question_schema: PayloadSchema,
    /// 提问字段的键名
    pub question_key: String,
    /// 反馈中数值得分的键名（无则该部署不记录数值评价）
    pub score_key: Option<String>,
    /// 评语来源的键名
    pub comment_key: Option<String>,
    /// 总评文本的兜底值
    pub summary_fallback: String,
}

impl Default for DeploymentConfig {
    /// 内置默认部署：12 维度 GRIT 目录
    fn default() -> Self {
        let dimensions = vec![
            Dimension::new(1, "注意散漫への対処力"),
            Dimension::new(2, "熱意の持続性"),
            Dimension::new(3, "長期集中力"),
            Dimension::new(4, "関心の安定性"),
            Dimension::new(5, "目標の一貫性"),
            Dimension::new(6, "関心の持続力"),
            Dimension::new(7, "没頭力"),
            Dimension::new(8, "レジリエンス"),
            Dimension::new(9, "長期的継続力"),
            Dimension::new(10, "地道な努力の継続性"),
            Dimension::new(11, "やり遂げ力"),
            Dimension::new(12, "モチベーションの自己管理力"),
        ];

        let weights = BTreeMap::from([
            (2, 0.30),
            (5, 0.25),
            (8, 0.20),
            (12, 0.15),
            (4, 0.10),
        ]);

        let feedback_schema = PayloadSchema::new(vec![
            FieldSpec::text("intent", "この質問の意図の解析に失敗しました。"),
            FieldSpec::text("evaluation", "回答評価の生成に失敗しました。"),
            FieldSpec::text("improvement", "改善ポイントの抽出に失敗しました。"),
            FieldSpec::text("japanese", "日本語の改善提案の生成に失敗しました。"),
            FieldSpec::score("score", 0.0, 5.0, 0.0),
        ]);

        let question_schema = PayloadSchema::new(vec![FieldSpec::text_bounded(
            "question",
            4,
            200,
            "最近の業務で最も成果を出した事例を、役割・工夫・数値で具体的に教えてください。",
        )]);

        Self {
            opening_question: "それでは、経歴や実績を交えてまずは自己紹介をお願いします。"
                .to_string(),
            closing_message: "以上で全ての質問が終了しました。ご回答ありがとうございました。"
                .to_string(),
            max_questions: 12,
            max_score: 5.0,
            strict_feedback: true,
            opening_dimension: None,
            dimensions,
            weights,
            feedback_schema,
            question_schema,
            question_key: "question".to_string(),
            score_key: Some("score".to_string()),
            comment_key: Some("evaluation".to_string()),
            summary_fallback: "総評が取得できませんでした。".to_string(),
        }
    }
}

impl DeploymentConfig {
    /// 维度目录大小 K
    pub fn catalog_size(&self) -> usize {
        self.dimensions.len()
    }
}
