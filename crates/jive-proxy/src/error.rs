//! Process-level errors with miette diagnostics.
//!
//! Everything here ends the process; request and device failures never
//! reach this type.

use miette::Diagnostic;
use thiserror::Error;

use jive_config::ConfigError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const BIND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum ProxyError {
    // ── Configuration ────────────────────────────────────────────────

    #[error("Invalid configuration value for {field}: {reason}")]
    #[diagnostic(
        code(jive5ab_proxy::validation),
        help("Fix the value in the config file, the JIVE5AB_PROXY_* environment or the matching flag.")
    )]
    Validation { field: String, reason: String },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(jive5ab_proxy::no_config),
        help("Check the --config path, or omit it to use the default location.")
    )]
    NoConfig { path: String },

    #[error("Could not load configuration")]
    #[diagnostic(
        code(jive5ab_proxy::config),
        help("Default config location: {default_path}")
    )]
    Config {
        default_path: String,
        #[source]
        source: ConfigError,
    },

    // ── Networking ───────────────────────────────────────────────────

    #[error("Could not bind KATCP server to {addr}")]
    #[diagnostic(
        code(jive5ab_proxy::bind),
        help("Is another proxy already listening there? Try --katcp-port.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for ProxyError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Missing { path } => Self::NoConfig {
                path: path.display().to_string(),
            },
            other => Self::Config {
                default_path: jive_config::config_path().display().to_string(),
                source: other,
            },
        }
    }
}

impl ProxyError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => exit_code::USAGE,
            Self::NoConfig { .. } | Self::Config { .. } => exit_code::CONFIG,
            Self::Bind { .. } => exit_code::BIND,
            Self::Io(_) => exit_code::GENERAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn config_errors_map_to_exit_codes() {
        let err = ProxyError::from(ConfigError::Validation {
            field: "jive.port".into(),
            reason: "must be between 1 and 65535".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for jive.port: must be between 1 and 65535"
        );

        let err = ProxyError::from(ConfigError::Missing {
            path: PathBuf::from("/nowhere/proxy.toml"),
        });
        assert_eq!(err.exit_code(), exit_code::CONFIG);
        assert_eq!(err.to_string(), "Configuration file not found: /nowhere/proxy.toml");
    }

    #[test]
    fn bind_failure_has_its_own_exit_code() {
        let err = ProxyError::Bind {
            addr: "0.0.0.0:7147".into(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert_eq!(err.exit_code(), exit_code::BIND);
    }
}
