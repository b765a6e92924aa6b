//! HTTP 请求/响应类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ShortenerError;
use crate::storage::ShortLink;

/// `POST /shorten`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
    #[serde(default)]
    pub short_code: Option<String>,
}

/// `PUT /u/{code}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub short_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    pub short_code: String,
    pub url: String,
    pub short_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_count: u64,
}

impl LinkResponse {
    pub fn new(link: ShortLink, short_url: String) -> Self {
        Self {
            short_code: link.code,
            url: link.target,
            short_url,
            created_at: link.created_at,
            updated_at: link.updated_at,
            access_count: link.access_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub short_code: String,
    pub access_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 统一错误响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable error code, `E001`..
    pub code: String,
    pub kind: String,
}

impl From<&ShortenerError> for ErrorResponse {
    fn from(err: &ShortenerError) -> Self {
        Self {
            error: err.message().to_string(),
            code: err.code().to_string(),
            kind: err.error_type().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub links_count: Option<usize>,
    pub storage: String,
    pub version: String,
    pub uptime_secs: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
