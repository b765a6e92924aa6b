use serde::{Deserialize, Serialize};
use strum::Display;

use crate::errors::{Result, ShortenerError};
use crate::utils::MAX_SHORT_CODE_LEN;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀，分隔符为 `__`
pub const ENV_PREFIX: &str = "SHORTENER";

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 服务器地址、端口、CPU 数量
/// - storage: 存储后端
/// - shortener: 短码生成与短链接前缀
/// - clicks: 点击计数缓冲
/// - logging: 日志配置
/// - cors / rate_limit: HTTP 层中间件
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub shortener: ShortenerSettings,
    #[serde(default)]
    pub clicks: ClickSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// 示例：SHORTENER__SERVER__PORT=9999
    ///
    /// An explicitly given path must exist; the default `config.toml` is
    /// optional.
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let (path, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        let settings = Config::builder()
            .add_source(File::with_name(path).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                ShortenerError::configuration(format!("Failed to build config: {}", e))
            })?;

        let config: StaticConfig = settings.try_deserialize().map_err(|e| {
            ShortenerError::configuration(format!("Failed to deserialize config: {}", e))
        })?;

        config.validate()?;

        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }
        Ok(config)
    }

    /// 检查取值范围
    pub fn validate(&self) -> Result<()> {
        let s = &self.shortener;
        if s.code_length == 0 || s.code_length > MAX_SHORT_CODE_LEN {
            return Err(ShortenerError::configuration(format!(
                "shortener.code_length must be between 1 and {}, got {}",
                MAX_SHORT_CODE_LEN, s.code_length
            )));
        }
        if s.max_generation_attempts == 0 {
            return Err(ShortenerError::configuration(
                "shortener.max_generation_attempts must be at least 1",
            ));
        }
        if let Err(e) = crate::utils::validate_url(&s.base_url) {
            return Err(ShortenerError::configuration(format!(
                "shortener.base_url is not a valid http(s) URL: {}",
                e
            )));
        }
        if self.clicks.flush_interval_secs == 0 {
            return Err(ShortenerError::configuration(
                "clicks.flush_interval_secs must be at least 1",
            ));
        }
        if self.rate_limit.enabled && self.rate_limit.requests_per_second == 0 {
            return Err(ShortenerError::configuration(
                "rate_limit.requests_per_second must be at least 1",
            ));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Snapshot location for the `file` backend
    #[serde(default = "default_storage_file_path")]
    pub file_path: String,
}

/// 短码生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,
}

/// 点击计数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickSettings {
    #[serde(default = "default_clicks_enabled")]
    pub enabled: bool,
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_max_clicks_before_flush")]
    pub max_clicks_before_flush: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Empty list means any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: usize,
}

/// 限流配置（按客户端 IP）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u64,
    /// Defaults to twice `requests_per_second`
    #[serde(default)]
    pub burst_size: Option<u32>,
}

impl RateLimitConfig {
    pub fn effective_burst(&self) -> u32 {
        self.burst_size.unwrap_or_else(|| {
            u32::try_from(self.requests_per_second.saturating_mul(2)).unwrap_or(u32::MAX)
        })
    }
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_storage_file_path() -> String {
    "links.json".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_code_length() -> usize {
    6
}

fn default_max_generation_attempts() -> u32 {
    5
}

fn default_clicks_enabled() -> bool {
    true
}

fn default_flush_interval_secs() -> u64 {
    30
}

fn default_max_clicks_before_flush() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_cors_max_age() -> usize {
    3600
}

fn default_requests_per_second() -> u64 {
    100
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            file_path: default_storage_file_path(),
        }
    }
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            code_length: default_code_length(),
            max_generation_attempts: default_max_generation_attempts(),
        }
    }
}

impl Default for ClickSettings {
    fn default() -> Self {
        Self {
            enabled: default_clicks_enabled(),
            flush_interval_secs: default_flush_interval_secs(),
            max_clicks_before_flush: default_max_clicks_before_flush(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: default_requests_per_second(),
            burst_size: None,
        }
    }
}
