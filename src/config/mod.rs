//! Configuration management.
//!
//! Settings come from an optional TOML file layered under `SCHOLARLY_*`
//! environment variables (`SCHOLARLY_ARXIV__TIMEOUT_SECONDS=10`). Every field
//! has a default, so an empty or missing file is valid.

mod file_config;

pub use file_config::{
    default_config_path, default_config_toml, find_config_file, write_default_config,
    ConfigFileError,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::RetryConfig;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub arxiv: ArxivConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub summary: SummaryConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// arXiv API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxivConfig {
    /// Query endpoint
    #[serde(default = "default_arxiv_url")]
    pub api_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Minimum spacing between requests; arXiv asks for 3 seconds
    #[serde(default = "default_request_interval")]
    pub min_request_interval_ms: u64,

    /// Page size when none is given
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            api_url: default_arxiv_url(),
            timeout_seconds: default_timeout(),
            min_request_interval_ms: default_request_interval(),
            default_max_results: default_max_results(),
        }
    }
}

fn default_arxiv_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_request_interval() -> u64 {
    3000
}

fn default_max_results() -> usize {
    10
}

/// Retry settings for the fetch step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    30_000
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        RetryConfig {
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            ..RetryConfig::default()
        }
        .max_attempts(settings.max_attempts)
    }
}

/// Text-generation API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// API key; falls back to `GEMINI_API_KEY`
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_summary_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            model: default_model(),
            base_url: default_summary_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_summary_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

/// Local storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the comment database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scholarly")
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?
        .try_deserialize()
}

/// Configuration from environment variables and defaults only
pub fn get_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(environment())
        .build()?
        .try_deserialize()
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("SCHOLARLY")
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.arxiv.api_url, "http://export.arxiv.org/api/query");
        assert_eq!(config.arxiv.min_request_interval_ms, 3000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.logging.level, "info");
        assert!(config.storage.data_dir.ends_with("scholarly"));
    }

    #[test]
    fn test_retry_settings_conversion() {
        let settings = RetrySettings {
            max_attempts: 0,
            initial_delay_ms: 250,
            max_delay_ms: 4000,
        };
        let retry = RetryConfig::from(&settings);
        assert_eq!(retry.max_attempts, 1);
        assert_eq!(retry.initial_delay, Duration::from_millis(250));
        assert_eq!(retry.max_delay, Duration::from_millis(4000));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scholarly.toml");
        std::fs::write(
            &path,
            r#"
[arxiv]
timeout_seconds = 5

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.arxiv.timeout_seconds, 5);
        assert_eq!(config.arxiv.default_max_results, 10);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.retry, RetrySettings::default());
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(load_config(Path::new("/nonexistent/scholarly.toml")).is_err());
    }
}
