//! Configuration loading tests
//!
//! TOML files are written to a temp dir. Each test asserts on different
//! fields, since environment overrides are process-wide.

use std::io::Write;

use shortener::config::{StaticConfig, StorageBackend};
use shortener::errors::ShortenerError;
use tempfile::NamedTempFile;

fn write_toml(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_toml_file() {
    let file = write_toml(
        r#"
[server]
port = 9090

[storage]
backend = "file"
file_path = "/tmp/links.json"

[shortener]
base_url = "https://sho.rt"
code_length = 8

[rate_limit]
enabled = true
requests_per_second = 10
"#,
    );

    let config = StaticConfig::load(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(config.storage.file_path, "/tmp/links.json");
    assert_eq!(config.shortener.base_url, "https://sho.rt");
    assert_eq!(config.shortener.code_length, 8);
    // 未配置的字段使用默认值
    assert_eq!(config.shortener.max_generation_attempts, 5);
    assert!(config.clicks.enabled);
    assert_eq!(config.rate_limit.effective_burst(), 20);
}

#[test]
fn test_env_overrides_file() {
    let file = write_toml(
        r#"
[logging]
level = "info"
"#,
    );

    // SAFETY: 其它测试不读取 logging.level
    unsafe {
        std::env::set_var("SHORTENER__LOGGING__LEVEL", "debug");
    }
    let config = StaticConfig::load(Some(file.path().to_str().unwrap()));
    unsafe {
        std::env::remove_var("SHORTENER__LOGGING__LEVEL");
    }

    assert_eq!(config.unwrap().logging.level, "debug");
}

#[test]
fn test_missing_explicit_file_is_error() {
    let err = StaticConfig::load(Some("/nonexistent/shortener.toml")).unwrap_err();
    assert!(matches!(err, ShortenerError::Configuration(_)));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let file = write_toml(
        r#"
[shortener]
code_length = 0
"#,
    );
    let err = StaticConfig::load(Some(file.path().to_str().unwrap())).unwrap_err();
    assert!(matches!(err, ShortenerError::Configuration(_)));

    let file = write_toml(
        r#"
[shortener]
base_url = "ftp://files.example.com"
"#,
    );
    assert!(StaticConfig::load(Some(file.path().to_str().unwrap())).is_err());
}

#[test]
fn test_sample_config_is_loadable() {
    let file = write_toml(&StaticConfig::generate_sample_config());
    let config = StaticConfig::load(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(config.shortener.code_length, 6);
}
