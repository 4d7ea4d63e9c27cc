// ── Runtime bridge configuration ──
//
// Describes where jive5ab listens and how the bridge paces itself. Built
// by the proxy binary from jive-config; core never reads config files.

use std::time::Duration;

use jive_api::transport::{DEFAULT_CONTROL_PORT, DEFAULT_MAX_REPLY_BYTES};
use jive_api::TransportConfig;

/// Default output file for `net2file-start` when no path is given.
pub const DEFAULT_NET2FILE_PATH: &str = "/mnt/disk0/testscan/testscan.vdif";

/// Configuration for a single bridge to one jive5ab instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Host running jive5ab.
    pub control_host: String,
    /// jive5ab control port.
    pub control_port: u16,
    /// Per-command bound on connect, write and read.
    pub timeout: Duration,
    /// Sleep between poll cycles.
    pub poll_interval: Duration,
    /// Output file used by `net2file-start` without an argument.
    pub net2file_path: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            control_host: "127.0.0.1".into(),
            control_port: DEFAULT_CONTROL_PORT,
            timeout: Duration::from_secs(1),
            poll_interval: Duration::from_secs(120),
            net2file_path: DEFAULT_NET2FILE_PATH.into(),
        }
    }
}

impl BridgeConfig {
    /// Transport settings for the control channel.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            host: self.control_host.clone(),
            port: self.control_port,
            timeout: self.timeout,
            max_reply_bytes: DEFAULT_MAX_REPLY_BYTES,
        }
    }
}
