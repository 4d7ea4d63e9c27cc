//! Clap derive structures for the `jive5ab-katcp-proxy` binary.
//!
//! Every flag overrides the value loaded from the config file and the
//! `JIVE5AB_PROXY_*` environment.

use std::path::PathBuf;

use clap::Parser;

/// jive5ab-katcp-proxy -- KATCP control for a local jive5ab instance
#[derive(Debug, Parser)]
#[command(
    name = "jive5ab-katcp-proxy",
    version,
    about = "KATCP proxy that forwards control to a local jive5ab instance",
    long_about = "Serves KATCP requests (record-start, set-protocol, net2file-start, ...)\n\
        by translating them into jive5ab control-channel commands, and publishes\n\
        jive5ab state as KATCP sensors refreshed on a fixed poll interval."
)]
pub struct Cli {
    /// Config file (default: platform config dir, config.toml)
    #[arg(long, short = 'c', env = "JIVE5AB_PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind the KATCP server on
    #[arg(long)]
    pub katcp_host: Option<String>,

    /// Port to bind the KATCP server on (0 picks a free port)
    #[arg(long)]
    pub katcp_port: Option<u16>,

    /// Host running jive5ab
    #[arg(long)]
    pub jive_host: Option<String>,

    /// jive5ab control port
    #[arg(long)]
    pub jive_port: Option<u16>,

    /// Per-command timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Seconds between background polls of jive5ab
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Default output file for net2file-start
    #[arg(long, value_name = "PATH")]
    pub net2file_path: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}
