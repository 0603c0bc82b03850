//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/gitpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/gitpulse/` (~/.config/gitpulse/)
//! - Cache: `$XDG_CACHE_HOME/gitpulse/` (~/.cache/gitpulse/)
//! - State/Logs: `$XDG_STATE_HOME/gitpulse/` (~/.local/state/gitpulse/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

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

/// Returns XDG_CACHE_HOME or ~/.cache
fn xdg_cache_home() -> PathBuf {
    std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".cache"))
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
    /// Fetch and aggregation configuration
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Result cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fetch and aggregation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Trailing window for the basic summary, in days
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    /// Trailing window for synthesized pseudo-events, in days.
    ///
    /// Pseudo-events older than this are assumed to already be covered by
    /// the primary feed and are dropped.
    #[serde(default = "default_pseudo_window_days")]
    pub pseudo_event_window_days: i64,

    /// How many recent activities the summary carries
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// Ranking size for the basic summary
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Ranking size for the extended summary
    #[serde(default = "default_extended_top_n")]
    pub extended_top_n: usize,

    /// Interval between watch-mode fetch cycles, in seconds
    #[serde(default = "default_watch_interval")]
    pub watch_interval_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            pseudo_event_window_days: default_pseudo_window_days(),
            recent_limit: default_recent_limit(),
            top_n: default_top_n(),
            extended_top_n: default_extended_top_n(),
            watch_interval_secs: default_watch_interval(),
        }
    }
}

impl FetchConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.window_days < 1 {
            return Err(Error::Config(
                "fetch.window_days must be at least 1".to_string(),
            ));
        }
        if !(1..=7).contains(&self.pseudo_event_window_days) {
            return Err(Error::Config(
                "fetch.pseudo_event_window_days must be between 1 and 7".to_string(),
            ));
        }
        if self.recent_limit == 0 {
            return Err(Error::Config(
                "fetch.recent_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_window_days() -> i64 {
    7
}

fn default_pseudo_window_days() -> i64 {
    3
}

fn default_recent_limit() -> usize {
    5
}

fn default_top_n() -> usize {
    5
}

fn default_extended_top_n() -> usize {
    15
}

fn default_watch_interval() -> u64 {
    300
}

/// Result cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Enable/disable the on-disk cache layer
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Time-to-live for cached fetch results, in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    /// Override directory for cache entries (defaults to the XDG cache dir)
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_cache_ttl(),
            dir: None,
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    600
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
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.fetch.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/gitpulse/config.toml` (~/.config/gitpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("gitpulse").join("config.toml")
    }

    /// Returns the cache directory path (for TTL cache entries)
    ///
    /// `$XDG_CACHE_HOME/gitpulse/` (~/.cache/gitpulse/)
    pub fn cache_dir() -> PathBuf {
        xdg_cache_home().join("gitpulse")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/gitpulse/` (~/.local/state/gitpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("gitpulse")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/gitpulse/gitpulse.log` (~/.local/state/gitpulse/gitpulse.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("gitpulse.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch.window_days, 7);
        assert_eq!(config.fetch.pseudo_event_window_days, 3);
        assert_eq!(config.fetch.recent_limit, 5);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 600);
        assert!(config.fetch.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[fetch]
window_days = 30
top_n = 10

[cache]
enabled = false
ttl_secs = 120

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.fetch.window_days, 30);
        assert_eq!(config.fetch.top_n, 10);
        // Unset fields keep their defaults
        assert_eq!(config.fetch.recent_limit, 5);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 120);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_windows() {
        let config = FetchConfig {
            window_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = FetchConfig {
            pseudo_event_window_days: 14,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
