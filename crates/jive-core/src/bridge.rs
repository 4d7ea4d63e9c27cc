// ── Bridge facade ──
//
// Owns the control channel, the sensor store and the background poll
// scheduler for one jive5ab instance. Requests and polling share the
// channel; a device lock keeps at most one command in flight.

use std::sync::Arc;

use jive_api::{Command, ControlChannel, TcpControlChannel};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::poll::poll_task;
use crate::store::StateStore;

/// The main entry point for the proxy.
///
/// Cheaply cloneable via `Arc<BridgeInner>`. Call [`start()`](Self::start)
/// to begin polling and [`shutdown()`](Self::shutdown) to stop it.
pub struct Bridge<C: ControlChannel = TcpControlChannel> {
    inner: Arc<BridgeInner<C>>,
}

struct BridgeInner<C> {
    config: BridgeConfig,
    channel: C,
    store: StateStore,
    device_lock: Mutex<()>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: ControlChannel> Clone for Bridge<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Bridge<TcpControlChannel> {
    /// Create a bridge that talks TCP to the configured jive5ab. Does not
    /// contact the device until [`start()`](Self::start) or a request.
    pub fn new(config: BridgeConfig) -> Self {
        let channel = TcpControlChannel::new(config.transport());
        Self::with_channel(config, channel)
    }
}

impl<C: ControlChannel> Bridge<C> {
    /// Create a bridge over an arbitrary control channel.
    pub fn with_channel(config: BridgeConfig, channel: C) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                config,
                channel,
                store: StateStore::new(),
                device_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Read-only view of the published sensors.
    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the poll scheduler. Its first cycle runs immediately.
    ///
    /// Calling this on a running bridge does nothing. A bridge that has
    /// been shut down stays stopped.
    pub async fn start(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            return;
        }

        let bridge = self.clone();
        let cancel = self.inner.cancel.clone();
        handles.push(tokio::spawn(poll_task(bridge, cancel)));

        let config = &self.inner.config;
        info!(
            host = %config.control_host,
            port = config.control_port,
            interval_secs = config.poll_interval.as_secs(),
            "bridge started"
        );
    }

    /// Cancel the poll scheduler and wait for it to exit.
    ///
    /// An exchange in flight is abandoned and its connection closed.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("bridge stopped");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    // ── Device access ────────────────────────────────────────────────

    /// Send one command while holding the device lock.
    pub(crate) async fn issue(&self, command: &Command) -> Result<String, CoreError> {
        let wire = command.to_string();
        let _guard = self.inner.device_lock.lock().await;

        debug!(command = %wire, "sending control command");
        let reply = self.inner.channel.send(&wire).await?;
        trace!(command = %wire, reply = reply.trim_end(), "control reply");
        Ok(reply)
    }
}
