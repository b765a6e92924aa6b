use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenerError {
    InvalidUrl(String),
    InvalidFormat(String),
    AlreadyExists(String),
    CodeConflict(String),
    NotFound(String),
    GenerationExhausted(String),
    StorageUnavailable(String),
    Configuration(String),
    /// Malformed request body or parameters at the HTTP layer
    BadRequest(String),
}

impl ShortenerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::InvalidUrl(_) => "E001",
            ShortenerError::InvalidFormat(_) => "E002",
            ShortenerError::AlreadyExists(_) => "E003",
            ShortenerError::CodeConflict(_) => "E004",
            ShortenerError::NotFound(_) => "E005",
            ShortenerError::GenerationExhausted(_) => "E006",
            ShortenerError::StorageUnavailable(_) => "E007",
            ShortenerError::Configuration(_) => "E008",
            ShortenerError::BadRequest(_) => "E009",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::InvalidUrl(_) => "Invalid URL",
            ShortenerError::InvalidFormat(_) => "Invalid Short Code Format",
            ShortenerError::AlreadyExists(_) => "Short Code Already Exists",
            ShortenerError::CodeConflict(_) => "Short Code Conflict",
            ShortenerError::NotFound(_) => "Resource Not Found",
            ShortenerError::GenerationExhausted(_) => "Code Generation Exhausted",
            ShortenerError::StorageUnavailable(_) => "Storage Unavailable",
            ShortenerError::Configuration(_) => "Configuration Error",
            ShortenerError::BadRequest(_) => "Bad Request",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortenerError::InvalidUrl(msg) => msg,
            ShortenerError::InvalidFormat(msg) => msg,
            ShortenerError::AlreadyExists(msg) => msg,
            ShortenerError::CodeConflict(msg) => msg,
            ShortenerError::NotFound(msg) => msg,
            ShortenerError::GenerationExhausted(msg) => msg,
            ShortenerError::StorageUnavailable(msg) => msg,
            ShortenerError::Configuration(msg) => msg,
            ShortenerError::BadRequest(msg) => msg,
        }
    }

    /// HTTP status the transport layer answers with for this error.
    ///
    /// Conflicts keep their own variants even though both answer 409.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ShortenerError::InvalidUrl(_)
            | ShortenerError::InvalidFormat(_)
            | ShortenerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ShortenerError::AlreadyExists(_) | ShortenerError::CodeConflict(_) => {
                StatusCode::CONFLICT
            }
            ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortenerError::GenerationExhausted(_) | ShortenerError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ShortenerError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// 格式化为彩色输出（用于启动失败时的终端输出）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

// 便捷的构造函数
impl ShortenerError {
    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        ShortenerError::InvalidUrl(msg.into())
    }

    pub fn invalid_format<T: Into<String>>(msg: T) -> Self {
        ShortenerError::InvalidFormat(msg.into())
    }

    pub fn already_exists<T: Into<String>>(msg: T) -> Self {
        ShortenerError::AlreadyExists(msg.into())
    }

    pub fn code_conflict<T: Into<String>>(msg: T) -> Self {
        ShortenerError::CodeConflict(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortenerError::NotFound(msg.into())
    }

    pub fn generation_exhausted<T: Into<String>>(msg: T) -> Self {
        ShortenerError::GenerationExhausted(msg.into())
    }

    pub fn storage_unavailable<T: Into<String>>(msg: T) -> Self {
        ShortenerError::StorageUnavailable(msg.into())
    }

    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Configuration(msg.into())
    }

    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        ShortenerError::BadRequest(msg.into())
    }
}

// 持久化层的 I/O 与序列化错误统一视为存储不可用
impl From<std::io::Error> for ShortenerError {
    fn from(err: std::io::Error) -> Self {
        ShortenerError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::StorageUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;
