// ── Request dispatch ──
//
// Routes each validated request to its command sequence. Device failures
// land in the error record and the outcome; validation failures only in
// the outcome. A successful state-changing sequence is followed by one
// refresh before the outcome is returned.

use jive_api::reply::{self, Ack, ProgressReport};
use jive_api::{Command, ControlChannel, Net2FileAction, Query};
use tracing::{debug, error, warn};

use crate::bridge::Bridge;
use crate::command::{Request, RequestOutcome};
use crate::error::CoreError;

impl<C: ControlChannel> Bridge<C> {
    /// Parse and run a request by name, as received from a client.
    pub async fn handle_named(&self, name: &str, args: &[&str]) -> RequestOutcome {
        match Request::parse(name, args) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                debug!(request = name, error = %err, "request rejected");
                RequestOutcome::fail(err.to_string())
            }
        }
    }

    /// Run a validated request.
    pub async fn handle(&self, request: Request) -> RequestOutcome {
        let kind = request.kind();
        let result = self.execute(request).await;

        if let Err(err) = &result {
            if err.is_device_error() {
                error!(request = %kind, error = %err, "request failed");
                self.store().record_error(err.to_string());
            }
        }
        RequestOutcome::from(result)
    }

    async fn execute(&self, request: Request) -> Result<String, CoreError> {
        let kind = request.kind();

        let message = match request {
            // Served from the store; never touches the device.
            Request::Status => return Ok(self.store().status_line()),

            Request::SetProtocol(protocol) => {
                self.assign(Command::SetNetProtocol(protocol)).await?;
                String::new()
            }
            Request::SetPort(destination) => {
                self.assign(Command::SetNetPort(destination)).await?;
                String::new()
            }
            Request::SetDisks(paths) => {
                self.assign(Command::SetDisks(paths)).await?;
                String::new()
            }
            Request::RecordStart { scan_name } => {
                self.assign(Command::RecordOn { scan_name }).await?;
                String::new()
            }
            Request::RecordStop => {
                self.assign(Command::RecordOff).await?;
                String::new()
            }
            Request::RecordStatus => {
                let text = self.issue(&Command::from(Query::Record)).await?;
                progress_or_raw(reply::parse_record(&text), &text)
            }
            Request::Net2FileStart { path } => {
                let path = path.unwrap_or_else(|| self.config().net2file_path.clone());
                self.net2file_start(path).await?;
                String::new()
            }
            Request::Net2FileStop => {
                self.net2file_stop().await?;
                String::new()
            }
            Request::Net2FileStatus => {
                let text = self.issue(&Command::from(Query::Net2File)).await?;
                progress_or_raw(reply::parse_net2file(&text), &text)
            }
        };

        self.store().clear_error();
        if kind.is_state_changing() {
            self.refresh().await;
        }
        debug!(request = %kind, "request complete");
        Ok(message)
    }

    // ── Command sequences ────────────────────────────────────────────

    /// Send an assignment and check its return code.
    ///
    /// Codes 0 and 1 succeed, other codes fail with
    /// [`CoreError::Rejected`]. An unrecognisable reply is accepted.
    async fn assign(&self, command: Command) -> Result<(), CoreError> {
        let text = self.issue(&command).await?;
        match reply::parse_ack(&text, command.keyword()) {
            Ack::Done | Ack::Initiated => Ok(()),
            Ack::Unrecognised => {
                warn!(command = %command, reply = text.trim(), "unrecognised acknowledgement");
                Ok(())
            }
            Ack::Rejected { code, detail } => Err(CoreError::Rejected {
                command: command.to_string(),
                code,
                detail,
            }),
        }
    }

    /// Open the output file, falling back to `connect` and a second open
    /// when the first is not acknowledged with code 0, then switch on.
    async fn net2file_start(&self, path: String) -> Result<(), CoreError> {
        let open = Command::Net2File(Net2FileAction::Open { path: path.clone() });

        if !self.net2file_open(&open).await? {
            debug!(command = %open, "open not acknowledged, connecting and retrying");
            self.issue(&Command::Net2File(Net2FileAction::Connect)).await?;
            if !self.net2file_open(&open).await? {
                return Err(CoreError::OpenFailed { path });
            }
        }

        self.assign(Command::Net2File(Net2FileAction::On)).await
    }

    async fn net2file_open(&self, open: &Command) -> Result<bool, CoreError> {
        let text = self.issue(open).await?;
        Ok(reply::parse_ack(&text, open.keyword()) == Ack::Done)
    }

    /// Switch off, flush and close. A rejected step does not stop the
    /// rest, so the file is still closed; the first rejection is
    /// reported. Transport failures abort at once.
    async fn net2file_stop(&self) -> Result<(), CoreError> {
        let mut rejected = None;
        for action in [Net2FileAction::Off, Net2FileAction::Flush, Net2FileAction::Close] {
            match self.assign(Command::Net2File(action)).await {
                Ok(()) => {}
                Err(err @ CoreError::Rejected { .. }) => {
                    warn!(error = %err, "net2file step rejected, continuing");
                    rejected.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }
        rejected.map_or(Ok(()), Err)
    }
}

/// `<state> <bytes>B` when the reply parses, else the trimmed raw reply.
fn progress_or_raw(report: Option<ProgressReport>, text: &str) -> String {
    report.map_or_else(
        || text.trim().to_owned(),
        |report| format!("{} {}B", report.state, report.bytes),
    )
}
