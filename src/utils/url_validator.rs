//! URL 验证模块
//!
//! 目标地址必须是带主机名的 http(s) 绝对 URL，危险协议单独报告

use url::Url;

/// URL 验证错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    InvalidProtocol(String),
    DangerousProtocol(String),
    InvalidFormat(String),
    MissingHost,
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidProtocol(proto) => write!(
                f,
                "Invalid protocol: {}. Only http:// and https:// are allowed",
                proto
            ),
            Self::DangerousProtocol(proto) => {
                write!(f, "Dangerous protocol blocked: {}", proto)
            }
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
            Self::MissingHost => write!(f, "URL must contain a host"),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 危险协议列表
const DANGEROUS_PROTOCOLS: &[&str] = &[
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
    "about:",
    "blob:",
];

/// RFC 3986 允许原样出现的字符（不含 `%`，另行检查）
fn is_url_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-._~:/?#[]@!$&'()*+,;=".contains(&b)
}

/// `url` 解析时会静默删除制表符和换行、转义空格，原样存储就不再是合法 URL。
/// 这里直接拒绝，保证存储的字符串和解析结果一致。
fn check_characters(url: &str) -> Result<(), UrlValidationError> {
    let bytes = url.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            let escaped = bytes
                .get(i + 1..i + 3)
                .is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit));
            if !escaped {
                return Err(UrlValidationError::InvalidFormat(
                    "'%' must be followed by two hex digits".to_string(),
                ));
            }
            i += 3;
            continue;
        }
        if !is_url_char(b) {
            let bad = url[i..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(UrlValidationError::InvalidFormat(format!(
                "character {:?} must be percent-encoded",
                bad
            )));
        }
        i += 1;
    }
    Ok(())
}

/// 验证 URL
///
/// 检查项目：
/// 1. URL 不为空
/// 2. 不是危险协议（javascript:, data:, file: 等）
/// 3. 必须是 http:// 或 https://
/// 4. 只含 RFC 3986 字符，空白、控制字符和非 ASCII 必须先转义
/// 5. URL 格式有效且包含主机名
pub fn validate_url(url: &str) -> Result<(), UrlValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    let url_lower = url.to_lowercase();

    for proto in DANGEROUS_PROTOCOLS {
        if url_lower.starts_with(proto) {
            return Err(UrlValidationError::DangerousProtocol(proto.to_string()));
        }
    }

    if !url_lower.starts_with("http://") && !url_lower.starts_with("https://") {
        let proto = url_lower
            .split(':')
            .next()
            .map(|s| format!("{}:", s))
            .unwrap_or_default();
        return Err(UrlValidationError::InvalidProtocol(proto));
    }

    check_characters(url)?;

    let parsed = Url::parse(url).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;
    if parsed.host_str().is_none_or(|h| h.is_empty()) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(())
}

/// 去除首尾空白后验证，返回实际存储的 URL
pub fn normalize_url(url: &str) -> Result<String, UrlValidationError> {
    validate_url(url)?;
    Ok(url.trim().to_string())
}
