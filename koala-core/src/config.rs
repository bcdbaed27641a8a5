//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/koala/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/koala/` (~/.config/koala/)
//! - State/Logs: `$XDG_STATE_HOME/koala/` (~/.local/state/koala/)

use crate::device::DeviceIdiom;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Host metadata overrides
    #[serde(default)]
    pub device: DeviceConfig,

    /// Koala endpoint configuration
    #[serde(default)]
    pub client: ClientConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Values the host process cannot discover on its own.
///
/// A CLI or daemon has no application bundle and usually no screen, so these
/// fill the gaps when probing the live system.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DeviceConfig {
    /// Build number reported as `app_version`
    pub app_version: Option<String>,
    /// Marketing version reported as `app_release`
    pub app_release: Option<String>,
    /// Screen width in points
    pub screen_width: Option<f64>,
    /// Screen height in points
    pub screen_height: Option<f64>,
    /// Device class; `unspecified` when not set
    #[serde(default)]
    pub idiom: DeviceIdiom,
}

/// Koala endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Enable/disable sending events over HTTP
    #[serde(default)]
    pub enabled: bool,

    /// Endpoint base URL (e.g., `https://koala.example.com`)
    pub endpoint: Option<String>,

    /// Bearer token sent with every request
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            timeout_secs: default_client_timeout(),
        }
    }
}

impl ClientConfig {
    /// Check if the client is enabled and has somewhere to send events
    pub fn is_ready(&self) -> bool {
        self.enabled && self.endpoint.is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        match self.endpoint.as_deref() {
            None => {
                return Err(Error::Config(
                    "client.endpoint is required when client is enabled".to_string(),
                ))
            }
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(Error::Config(format!(
                    "client.endpoint must be an http(s) URL, got {:?}",
                    url
                )))
            }
            Some(_) => {}
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "client.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_client_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/koala/config.toml` (~/.config/koala/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("koala").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/koala/` (~/.local/state/koala/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("koala")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.max_files, 5);
        assert_eq!(config.device.idiom, DeviceIdiom::Unspecified);
        assert!(config.device.app_version.is_none());
        assert!(!config.client.enabled);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"

[device]
app_version = "1042"
app_release = "2.3.0"
screen_width = 375.5
screen_height = 667.0
idiom = "phone"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.device.app_version.as_deref(), Some("1042"));
        assert_eq!(config.device.app_release.as_deref(), Some("2.3.0"));
        assert_eq!(config.device.screen_width, Some(375.5));
        assert_eq!(config.device.idiom, DeviceIdiom::Phone);
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.timeout_secs, 10);
        assert!(!config.is_ready());
    }

    #[test]
    fn test_client_config_validation() {
        // Disabled config is always valid
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());

        // Enabled without endpoint should fail
        let config = ClientConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        // Non-http endpoint should fail
        let config = ClientConfig {
            enabled: true,
            endpoint: Some("koala.example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            enabled: true,
            endpoint: Some("https://koala.example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.is_ready());
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[client\nenabled = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_paths_end_with_koala() {
        assert!(Config::config_path().ends_with("koala/config.toml"));
        assert!(Config::state_dir().ends_with("koala"));
    }
}
