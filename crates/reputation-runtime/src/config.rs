//! # Runtime Configuration
//!
//! TOML file (path from `REP_CONFIG`) layered under environment overrides.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LOTUS_API_URL` | `lotus.endpoint` |
//! | `LOTUS_API_TOKEN` | `lotus.auth_token` |
//! | `REP_REFRESH_INTERVAL_SECS` | `monitor.refresh_interval_ms` |
//! | `REP_CONCURRENCY_LIMIT` | `monitor.concurrency_limit` |
//! | `REP_ADMIN_ADDR` | `admin.addr` (also enables the endpoint) |

use miner_reputation::{LotusConfig, MonitorConfig};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "REP_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config file {path}: {error}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        error: String,
    },

    /// Config file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// An environment override could not be parsed.
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Rejected value
        value: String,
    },

    /// Monitor settings are unusable.
    #[error(transparent)]
    Monitor(#[from] miner_reputation::ConfigError),

    /// Display interval must be positive.
    #[error("display.interval_ms must be greater than zero")]
    ZeroDisplayInterval,
}

/// Console display settings.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Print the snapshot periodically.
    pub enabled: bool,
    /// Time between prints.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "interval_ms")]
    pub interval: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(3),
        }
    }
}

/// Admin HTTP endpoint settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve `/health`, `/reputations` and `/metrics`.
    pub enabled: bool,
    /// Listen address.
    pub addr: SocketAddr,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: SocketAddr::from(([127, 0, 0, 1], 9464)),
        }
    }
}

/// Complete runtime configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Refresh loop settings.
    pub monitor: MonitorConfig,
    /// Lotus node connection.
    pub lotus: LotusConfig,
    /// Console display.
    pub display: DisplayConfig,
    /// Admin endpoint.
    pub admin: AdminConfig,
}

impl RuntimeConfig {
    /// Load from the file named by `REP_CONFIG` (defaults if unset), apply
    /// environment overrides, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LOTUS_API_URL") {
            self.lotus.endpoint = url;
        }
        if let Some(token) = lookup("LOTUS_API_TOKEN") {
            self.lotus.auth_token = Some(token);
        }
        if let Some(value) = lookup("REP_REFRESH_INTERVAL_SECS") {
            let secs: u64 = parse_env("REP_REFRESH_INTERVAL_SECS", value)?;
            self.monitor.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("REP_CONCURRENCY_LIMIT") {
            self.monitor.concurrency_limit = parse_env("REP_CONCURRENCY_LIMIT", value)?;
        }
        if let Some(value) = lookup("REP_ADMIN_ADDR") {
            self.admin.addr = parse_env("REP_ADMIN_ADDR", value)?;
            self.admin.enabled = true;
        }
        Ok(())
    }

    /// Reject settings the runtime cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor.validate()?;
        if self.display.enabled && self.display.interval.is_zero() {
            return Err(ConfigError::ZeroDisplayInterval);
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
