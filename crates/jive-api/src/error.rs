use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The stage of a control channel exchange that was in progress when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Write,
    Read,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Write => "write",
            Self::Read => "read",
        })
    }
}

/// Top-level error type for the `jive-api` crate.
///
/// Covers the two ways a single command/reply exchange can fail. The
/// command text is carried for logging but kept out of the message, so
/// callers can prefix it in whatever form they publish.
/// `jive-core` maps these into its domain taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Timeouts ────────────────────────────────────────────────────
    /// The device did not complete a stage of the exchange in time.
    #[error("{stage} timed out after {}ms", timeout.as_millis())]
    Timeout {
        command: String,
        stage: Stage,
        timeout: Duration,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// Connection refused, reset, or otherwise broken.
    #[error("{stage} failed: {source}")]
    Transport {
        command: String,
        stage: Stage,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The command whose exchange failed.
    pub fn command(&self) -> &str {
        match self {
            Self::Timeout { command, .. } | Self::Transport { command, .. } => command,
        }
    }

    /// Returns `true` if the failure was a timeout rather than a transport error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
