use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 调用方输入错误
    Validation(ValidationError),
    /// 会话状态错误
    Session(SessionError),
    /// 模型输出提取错误
    Extraction(ExtractionError),
    /// 结构校验错误
    Schema(SchemaError),
    /// 协作服务调用错误
    Collaborator(CollaboratorError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "输入错误: {}", e),
            AppError::Session(e) => write!(f, "会话错误: {}", e),
            AppError::Extraction(e) => write!(f, "提取错误: {}", e),
            AppError::Schema(e) => write!(f, "结构校验错误: {}", e),
            AppError::Collaborator(e) => write!(f, "协作服务错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Validation(e) => Some(e),
            AppError::Session(e) => Some(e),
            AppError::Extraction(e) => Some(e),
            AppError::Schema(e) => Some(e),
            AppError::Collaborator(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 调用方输入错误
///
/// 在任何协作服务调用之前同步拒绝，不产生任何副作用
#[derive(Debug)]
pub enum ValidationError {
    /// 回答内容为空或仅含空白字符
    EmptyAnswer,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyAnswer => write!(f, "回答内容不能为空"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// 会话状态错误
#[derive(Debug)]
pub enum SessionError {
    /// 会话尚未启动
    NotStarted,
    /// 会话已经启动，不能重复启动
    AlreadyStarted,
    /// 会话已结束，不再接受回答
    Completed,
    /// 会话尚未结束，无法生成总评
    NotComplete,
    /// 上一轮处理尚未完成
    CycleInProgress,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotStarted => write!(f, "会话尚未启动"),
            SessionError::AlreadyStarted => write!(f, "会话已经启动"),
            SessionError::Completed => write!(f, "会话已结束"),
            SessionError::NotComplete => write!(f, "会话尚未结束"),
            SessionError::CycleInProgress => write!(f, "上一轮处理尚未完成"),
        }
    }
}

impl std::error::Error for SessionError {}

/// 模型输出提取错误（仅严格模式抛出）
#[derive(Debug)]
pub enum ExtractionError {
    /// 响应中不存在可解析的 JSON 片段
    NoJsonFragment {
        response: String,
    },
    /// JSON 片段解析失败
    ParseFailed {
        fragment: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::NoJsonFragment { response } => {
                write!(f, "响应中未找到 JSON 片段: {}", response)
            }
            ExtractionError::ParseFailed { fragment, source } => {
                write!(f, "JSON 片段解析失败 ({}): {}", fragment, source)
            }
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractionError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 结构校验错误（仅严格模式抛出）
#[derive(Debug)]
pub enum SchemaError {
    /// 解析结果不是 JSON 对象
    NotObject,
    /// 缺少必需字段
    MissingKey {
        key: String,
    },
    /// 文本字段为空
    EmptyText {
        key: String,
    },
    /// 字段类型不符
    WrongKind {
        key: String,
        expected: &'static str,
    },
    /// 文本长度超出限制
    TextLength {
        key: String,
        len: usize,
        min: usize,
        max: usize,
    },
    /// 数值超出范围
    OutOfRange {
        key: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::NotObject => write!(f, "解析结果不是 JSON 对象"),
            SchemaError::MissingKey { key } => write!(f, "缺少必需字段: {}", key),
            SchemaError::EmptyText { key } => write!(f, "文本字段为空: {}", key),
            SchemaError::WrongKind { key, expected } => {
                write!(f, "字段 {} 类型不符，期望 {}", key, expected)
            }
            SchemaError::TextLength { key, len, min, max } => {
                write!(f, "字段 {} 长度 {} 超出范围 [{}, {}]", key, len, min, max)
            }
            SchemaError::OutOfRange {
                key,
                value,
                min,
                max,
            } => {
                write!(f, "字段 {} 的值 {} 超出范围 [{}, {}]", key, value, min, max)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// 协作服务调用错误
///
/// Service 与 Timeout 由调用方区分处理：
/// 前者表示服务明确拒绝或失败，后者表示超出等待策略仍未完成
#[derive(Debug)]
pub enum CollaboratorError {
    /// 服务调用失败
    Service {
        detail: String,
    },
    /// 超出等待策略仍未完成
    Timeout {
        waited_secs: u64,
        attempts: usize,
    },
    /// 服务返回内容为空
    EmptyContent,
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorError::Service { detail } => write!(f, "服务调用失败: {}", detail),
            CollaboratorError::Timeout {
                waited_secs,
                attempts,
            } => {
                write!(
                    f,
                    "服务调用超时 (等待 {} 秒, 共尝试 {} 次)",
                    waited_secs, attempts
                )
            }
            CollaboratorError::EmptyContent => write!(f, "服务返回内容为空"),
        }
    }
}

impl std::error::Error for CollaboratorError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 读取配置文件失败
    FileReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 配置内容不合法
    Invalid {
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileReadFailed { path, source } => {
                write!(f, "读取配置文件失败 ({}): {}", path, source)
            }
            ConfigError::TomlParseFailed { path, source } => {
                write!(f, "TOML 解析失败 ({}): {}", path, source)
            }
            ConfigError::Invalid { message } => write!(f, "配置内容不合法: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FileReadFailed { source, .. }
            | ConfigError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建空回答错误
    pub fn empty_answer() -> Self {
        AppError::Validation(ValidationError::EmptyAnswer)
    }

    /// 创建无 JSON 片段错误
    pub fn no_json_fragment(response: impl Into<String>) -> Self {
        AppError::Extraction(ExtractionError::NoJsonFragment {
            response: response.into(),
        })
    }

    /// 创建 JSON 解析失败错误
    pub fn parse_failed(
        fragment: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Extraction(ExtractionError::ParseFailed {
            fragment: fragment.into(),
            source: Box::new(source),
        })
    }

    /// 创建缺少字段错误
    pub fn missing_key(key: impl Into<String>) -> Self {
        AppError::Schema(SchemaError::MissingKey { key: key.into() })
    }

    /// 创建服务调用失败错误
    pub fn service_failed(detail: impl Into<String>) -> Self {
        AppError::Collaborator(CollaboratorError::Service {
            detail: detail.into(),
        })
    }

    /// 创建服务超时错误
    pub fn service_timeout(waited_secs: u64, attempts: usize) -> Self {
        AppError::Collaborator(CollaboratorError::Timeout {
            waited_secs,
            attempts,
        })
    }

    /// 创建配置不合法错误
    pub fn config_invalid(message: impl Into<String>) -> Self {
        AppError::Config(ConfigError::Invalid {
            message: message.into(),
        })
    }

    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            AppError::Collaborator(CollaboratorError::Timeout { .. })
        )
    }

    /// 是否为协作服务错误（含超时）
    pub fn is_collaborator(&self) -> bool {
        matches!(self, AppError::Collaborator(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
