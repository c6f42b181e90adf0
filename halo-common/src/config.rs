//! Configuration loading and service endpoint resolution
//!
//! Resolution priority for the backend base URL:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`HALO_SERVICE_URL`)
//! 3. TOML config file
//! 4. Compiled default (`http://localhost:8000`)
//!
//! A missing or unparseable TOML file never aborts startup: a warning is
//! logged and compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Compiled default for the recognition/search backend
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend base URL
pub const SERVICE_URL_ENV: &str = "HALO_SERVICE_URL";

/// Environment variable overriding the TOML config file location
pub const CONFIG_PATH_ENV: &str = "HALO_CONFIG";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_LOG_LEVEL: &str = "info";

/// TOML configuration file contents
///
/// Every field is optional in the file; absent fields take compiled defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    /// Backend connection settings
    pub service: ServiceConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the backend exposing `/api/ocr`, `/api/search` and `/health`
    pub base_url: String,
    /// Per-request timeout. Extraction runs vision models server-side, so this is generous.
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("halo-trace/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter level (overridden by `RUST_LOG`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl TomlConfig {
    /// Check values that would make every request fail
    pub fn validate(&self) -> Result<()> {
        let url = self.service.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("service.base_url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "service.base_url must start with http:// or https:// (got {})",
                url
            )));
        }
        if self.service.timeout_secs == 0 {
            return Err(Error::Config("service.timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Platform config file location: `<config_dir>/halo-trace/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("halo-trace").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Resolves the effective configuration from CLI, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_config_path: Option<PathBuf>,
    cli_service_url: Option<String>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config file path given on the command line
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_config_path = path;
        self
    }

    /// Backend URL given on the command line
    pub fn with_service_url(mut self, url: Option<String>) -> Self {
        self.cli_service_url = url;
        self
    }

    /// Config file to read: CLI → `HALO_CONFIG` → platform default
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_config_path {
            return Some(path.clone());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        default_config_path()
    }

    /// Resolve the effective configuration
    ///
    /// Fails only when the resolved values are invalid, never because the
    /// config file is missing.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match self.config_path() {
            Some(path) if path.exists() => match load_toml_config(&path) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}. Using defaults.", path.display(), e);
                    TomlConfig::default()
                }
            },
            Some(path) => {
                debug!("No config file at {}, using defaults", path.display());
                TomlConfig::default()
            }
            None => TomlConfig::default(),
        };

        if let Some(url) = &self.cli_service_url {
            debug!(url = %url, "Service URL from command line");
            config.service.base_url = url.clone();
        } else if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            if !url.trim().is_empty() {
                debug!(url = %url, "Service URL from {}", SERVICE_URL_ENV);
                config.service.base_url = url;
            }
        }

        config.service.base_url = config.service.base_url.trim().trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TomlConfig::default();
        assert_eq!(config.service.base_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("[service]\nbase_url = \"http://10.0.0.2:9000\"\n").unwrap();
        assert_eq!(config.service.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.service.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TomlConfig::default();
        config.service.base_url = "   ".to_string();
        assert!(config.validate().is_err());

        config.service.base_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());

        config.service.base_url = DEFAULT_SERVICE_URL.to_string();
        config.service.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
