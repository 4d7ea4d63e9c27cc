// ── Request API ──
//
// Every externally-initiated operation flows through a typed `Request`.
// Parsing validates arguments up front; the bridge dispatches the result.

pub mod requests;

use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::error::CoreError;

pub use requests::Request;

/// Names of the structured requests the bridge answers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum RequestKind {
    Status,
    SetProtocol,
    SetPort,
    SetDisks,
    RecordStart,
    RecordStop,
    RecordStatus,
    #[strum(serialize = "net2file-start")]
    Net2FileStart,
    #[strum(serialize = "net2file-stop")]
    Net2FileStop,
    #[strum(serialize = "net2file-status")]
    Net2FileStatus,
}

impl RequestKind {
    /// The request name as clients send it, e.g. `record-start`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// One-line help, including usage.
    pub fn help(self) -> &'static str {
        match self {
            Self::Status => "Return compact status line. Usage: ?status",
            Self::SetProtocol => {
                "Set network protocol. Usage: ?set-protocol <udp|udps> [<rcv> <snd> <threads>]"
            }
            Self::SetPort => {
                "Set net_port. Usage: ?set-port <port | mcast@port> (e.g. 50000 or 239.1.2.3@50000)"
            }
            Self::SetDisks => {
                "Configure FlexBuff mountpoints. Usage: ?set-disks /mnt/disk0 [/mnt/disk1 ...]"
            }
            Self::RecordStart => "Start VBS recording. Usage: ?record-start <scan_name>",
            Self::RecordStop => "Stop VBS recording. Usage: ?record-stop",
            Self::RecordStatus => "Query VBS recording status. Usage: ?record-status",
            Self::Net2FileStart => {
                "Start legacy net2file capture. Usage: ?net2file-start [<output_path>]"
            }
            Self::Net2FileStop => "Stop legacy net2file (off, flush, close). Usage: ?net2file-stop",
            Self::Net2FileStatus => "Query legacy net2file status. Usage: ?net2file-status",
        }
    }

    /// Returns `true` if a successful run changes device state and is
    /// followed by a refresh.
    pub fn is_state_changing(self) -> bool {
        !matches!(
            self,
            Self::Status | Self::RecordStatus | Self::Net2FileStatus
        )
    }
}

// ── Outcome ──────────────────────────────────────────────────────────

/// Status tag of a request outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Fail,
}

/// What a request returns to its caller: ok/fail plus a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub status: OutcomeStatus,
    pub message: String,
}

impl RequestOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Ok,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Fail,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OutcomeStatus::Ok
    }
}

impl From<Result<String, CoreError>> for RequestOutcome {
    fn from(result: Result<String, CoreError>) -> Self {
        match result {
            Ok(message) => Self::ok(message),
            Err(err) => Self::fail(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn request_names_are_kebab_case() {
        let names: Vec<&str> = RequestKind::iter().map(RequestKind::name).collect();
        assert_eq!(
            names,
            vec![
                "status",
                "set-protocol",
                "set-port",
                "set-disks",
                "record-start",
                "record-stop",
                "record-status",
                "net2file-start",
                "net2file-stop",
                "net2file-status",
            ]
        );
        for kind in RequestKind::iter() {
            assert_eq!(RequestKind::from_str(kind.name()).ok(), Some(kind));
        }
    }

    #[test]
    fn only_queries_skip_the_refresh() {
        assert!(!RequestKind::Status.is_state_changing());
        assert!(!RequestKind::RecordStatus.is_state_changing());
        assert!(RequestKind::SetDisks.is_state_changing());
        assert!(RequestKind::Net2FileStop.is_state_changing());
    }

    #[test]
    fn outcome_from_result() {
        assert_eq!(
            RequestOutcome::from(Ok("idle 0B".to_owned())),
            RequestOutcome::ok("idle 0B")
        );
        let outcome = RequestOutcome::from(Err(CoreError::UnknownRequest {
            name: "frobnicate".into(),
        }));
        assert!(!outcome.is_ok());
        assert_eq!(outcome.message, "Unknown request: frobnicate");
        assert_eq!(outcome.status.to_string(), "fail");
    }
}
