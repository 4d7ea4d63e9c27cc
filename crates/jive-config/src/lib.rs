//! Configuration for the jive5ab KATCP proxy.
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `JIVE5AB_PROXY_*` environment variables (nested keys split on
//! `__`, e.g. `JIVE5AB_PROXY_JIVE__PORT=2621`). The binary applies CLI
//! flags on top and converts the result into `jive_core::BridgeConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use jive_core::BridgeConfig;
use jive_core::config::DEFAULT_NET2FILE_PATH;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "JIVE5AB_PROXY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Config {
    /// KATCP listener.
    #[serde(default)]
    pub katcp: KatcpSection,

    /// jive5ab control channel and polling.
    #[serde(default)]
    pub jive: JiveSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KatcpSection {
    #[serde(default = "default_katcp_host")]
    pub host: String,

    /// Port 0 binds an ephemeral port.
    #[serde(default = "default_katcp_port")]
    pub port: u16,
}

impl Default for KatcpSection {
    fn default() -> Self {
        Self {
            host: default_katcp_host(),
            port: default_katcp_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JiveSection {
    #[serde(default = "default_jive_host")]
    pub host: String,

    #[serde(default = "default_jive_port")]
    pub port: u16,

    /// Per-command timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Output file for `net2file-start` without an argument.
    #[serde(default = "default_net2file_path")]
    pub net2file_path: String,
}

impl Default for JiveSection {
    fn default() -> Self {
        Self {
            host: default_jive_host(),
            port: default_jive_port(),
            timeout_ms: default_timeout_ms(),
            poll_interval_secs: default_poll_interval_secs(),
            net2file_path: default_net2file_path(),
        }
    }
}

fn default_katcp_host() -> String {
    "0.0.0.0".into()
}
fn default_katcp_port() -> u16 {
    7147
}
fn default_jive_host() -> String {
    "127.0.0.1".into()
}
fn default_jive_port() -> u16 {
    2620
}
fn default_timeout_ms() -> u64 {
    1000
}
fn default_poll_interval_secs() -> u64 {
    120
}
fn default_net2file_path() -> String {
    DEFAULT_NET2FILE_PATH.into()
}

impl Config {
    /// Reject values the proxy cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("katcp.host", &self.katcp.host)?;
        non_empty("jive.host", &self.jive.host)?;
        non_empty("jive.net2file_path", &self.jive.net2file_path)?;
        if self.jive.port == 0 {
            return Err(invalid("jive.port", "must be between 1 and 65535"));
        }
        if self.jive.timeout_ms == 0 {
            return Err(invalid("jive.timeout_ms", "must be greater than zero"));
        }
        if self.jive.poll_interval_secs == 0 {
            return Err(invalid("jive.poll_interval_secs", "must be greater than zero"));
        }
        Ok(())
    }

    /// Settings for the bridge to jive5ab.
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            control_host: self.jive.host.clone(),
            control_port: self.jive.port,
            timeout: Duration::from_millis(self.jive.timeout_ms),
            poll_interval: Duration::from_secs(self.jive.poll_interval_secs),
            net2file_path: self.jive.net2file_path.clone(),
        }
    }

    /// The `host:port` the KATCP server binds.
    pub fn katcp_addr(&self) -> String {
        format!("{}:{}", self.katcp.host, self.katcp.port)
    }

    /// Render as TOML, in the layout `load_config` reads.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(invalid(field, "must not be empty"))
    } else {
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("za.ac", "sarao", "jive5ab-katcp-proxy").map_or_else(
        || PathBuf::from("jive5ab-katcp-proxy.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// The provider stack for a given config file: defaults, file, env.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the configuration.
///
/// An explicit `path` must exist; the default path is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(path) if !path.exists() => {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }
        Some(path) => path.to_path_buf(),
        None => config_path(),
    };

    let config: Config = figment(&path).extract()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.katcp_addr(), "0.0.0.0:7147");

        let bridge = config.bridge_config();
        assert_eq!(bridge, BridgeConfig::default());
    }

    #[test]
    fn validation_names_the_field() {
        let mut config = Config::default();
        config.jive.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid jive.timeout_ms: must be greater than zero");

        let mut config = Config::default();
        config.jive.host = "  ".into();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid jive.host: must not be empty");

        let mut config = Config::default();
        config.jive.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.katcp.port = 0;
        assert!(config.validate().is_ok());
    }
}
