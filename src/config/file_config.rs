//! Configuration file discovery and generation.
//!
//! # Configuration File Format
//!
//! ```toml
//! [arxiv]
//! api_url = "http://export.arxiv.org/api/query"
//! timeout_seconds = 30
//! min_request_interval_ms = 3000
//! default_max_results = 10
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 1000
//! max_delay_ms = 30000
//!
//! [summary]
//! api_key = "your-gemini-key"
//! model = "gemini-1.5-flash"
//! base_url = "https://generativelanguage.googleapis.com"
//! timeout_seconds = 30
//!
//! [storage]
//! data_dir = "~/.local/share/scholarly"
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

const LOCAL_CONFIG_FILE: &str = "scholarly.toml";

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file already exists: {0}")]
    AlreadyExists(PathBuf),
}

/// Look for `./scholarly.toml`, then `<config_dir>/scholarly/config.toml`
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("scholarly").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Default location for a new config file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("scholarly").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
}

/// The default configuration rendered as TOML.
///
/// The API key is left out so a key from the environment is never written
/// to disk.
pub fn default_config_toml() -> Result<String, ConfigFileError> {
    let mut config = Config::default();
    config.summary.api_key = None;
    Ok(toml::to_string_pretty(&config)?)
}

/// Write the default configuration to `path`, creating parent directories.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<(), ConfigFileError> {
    if path.exists() && !force {
        return Err(ConfigFileError::AlreadyExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, default_config_toml()?)?;
    Ok(())
}
