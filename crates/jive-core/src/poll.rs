// ── Poll scheduler ──
//
// One cycle issues `status?`, `net_protocol?` and `net_port?` in turn.
// Each command stands alone: a failure is recorded and the cycle moves on.

use std::time::Duration;

use jive_api::reply::{self, UNKNOWN};
use jive_api::{Command, ControlChannel, Query};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::bridge::Bridge;
use crate::store::SensorId;

impl<C: ControlChannel> Bridge<C> {
    /// Run one poll cycle and write the results to the store.
    ///
    /// A success clears the error record unless an earlier command in
    /// the same cycle failed; values behind a failed command keep their
    /// previous reading. So a cycle that fails on `status?` but answers
    /// `net_port?` still ends with the `status?` error published, rather
    /// than each success clearing it.
    pub async fn refresh(&self) {
        let mut failed = false;

        if let Some(text) = self.poll_query(Query::Status, &mut failed).await {
            let report = reply::parse_status(&text);
            if report.state == UNKNOWN {
                warn_unparsed(Query::Status, &text);
            }
            self.store().apply_progress(report);
        }

        if let Some(text) = self.poll_query(Query::NetProtocol, &mut failed).await {
            let protocol = reply::parse_protocol(&text);
            if protocol == UNKNOWN {
                warn_unparsed(Query::NetProtocol, &text);
            }
            self.store().set_text(SensorId::Protocol, protocol);
        }

        if let Some(text) = self.poll_query(Query::NetPort, &mut failed).await {
            let port = reply::parse_port(&text);
            if port == UNKNOWN {
                warn_unparsed(Query::NetPort, &text);
            }
            self.store().set_text(SensorId::Port, port);
        }

        debug!(failed, status = %self.store().status_line(), "poll cycle complete");
    }

    async fn poll_query(&self, query: Query, failed: &mut bool) -> Option<String> {
        match self.issue(&Command::from(query)).await {
            Ok(text) => {
                if !*failed {
                    self.store().clear_error();
                }
                Some(text)
            }
            Err(err) => {
                let message = err.to_string();
                error!(command = %query, error = %message, "poll command failed");
                self.store().record_error(message);
                *failed = true;
                None
            }
        }
    }
}

fn warn_unparsed(query: Query, text: &str) {
    warn!(command = %query, reply = text.trim(), "unparsable reply, using fallback");
}

// ── Background task ──────────────────────────────────────────────────

/// Poll immediately, then once per interval, until cancelled.
pub(crate) async fn poll_task<C: ControlChannel>(bridge: Bridge<C>, cancel: CancellationToken) {
    let interval: Duration = bridge.config().poll_interval;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            () = bridge.refresh() => {}
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }

    debug!("poll scheduler stopped");
}
