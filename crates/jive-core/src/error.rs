// ── Core error types ──
//
// Domain errors surfaced as failed request outcomes or written to the
// `jive5ab-error` sensor. The `From<jive_api::Error>` impl translates
// transport failures; validation errors never reach the device.

use std::time::Duration;

use jive_api::Stage;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Request errors (no device contact) ───────────────────────────
    #[error("{message}")]
    Validation { message: String },

    #[error("Unknown request: {name}")]
    UnknownRequest { name: String },

    // ── Device errors ────────────────────────────────────────────────
    #[error("{command}: {stage} timed out after {}ms", timeout.as_millis())]
    Timeout {
        command: String,
        stage: Stage,
        timeout: Duration,
    },

    #[error("{command}: {reason}")]
    Transport { command: String, reason: String },

    #[error("{command}: rejected with code {code}{}", detail_suffix(detail))]
    Rejected {
        command: String,
        code: i32,
        detail: String,
    },

    #[error("open failed")]
    OpenFailed { path: String },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` for failures of a device interaction, which are
    /// published on the error sensor. Request errors are not.
    pub fn is_device_error(&self) -> bool {
        !matches!(self, Self::Validation { .. } | Self::UnknownRequest { .. })
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<jive_api::Error> for CoreError {
    fn from(err: jive_api::Error) -> Self {
        match err {
            jive_api::Error::Timeout {
                command,
                stage,
                timeout,
            } => Self::Timeout {
                command,
                stage,
                timeout,
            },
            jive_api::Error::Transport {
                command,
                stage,
                source,
            } => Self::Transport {
                command,
                reason: format!("{stage} failed: {source}"),
            },
        }
    }
}
