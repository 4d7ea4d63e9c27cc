mod cli;
mod error;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jive_config::Config;
use jive_core::Bridge;
use jive_proxy::katcp::KatcpServer;

use crate::cli::Cli;
use crate::error::ProxyError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn,jive_proxy=info,jive_core=info",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), ProxyError> {
    let config = build_config(&cli)?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let bridge = Bridge::new(config.bridge_config());
    let addr = config.katcp_addr();
    let server = KatcpServer::bind(&addr, bridge.clone())
        .await
        .map_err(|source| ProxyError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(
        addr = %server.local_addr()?,
        jive = %format!("{}:{}", config.jive.host, config.jive.port),
        "KATCP proxy listening"
    );

    bridge.start().await;

    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(server.run(shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, shutting down");

    shutdown.cancel();
    let _ = serving.await;
    bridge.shutdown().await;
    Ok(())
}

/// Load config from file + environment, then apply CLI flag overrides.
fn build_config(cli: &Cli) -> Result<Config, ProxyError> {
    let mut config = jive_config::load_config(cli.config.as_deref())?;

    if let Some(ref host) = cli.katcp_host {
        config.katcp.host.clone_from(host);
    }
    if let Some(port) = cli.katcp_port {
        config.katcp.port = port;
    }
    if let Some(ref host) = cli.jive_host {
        config.jive.host.clone_from(host);
    }
    if let Some(port) = cli.jive_port {
        config.jive.port = port;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.jive.timeout_ms = timeout_ms;
    }
    if let Some(secs) = cli.poll_interval {
        config.jive.poll_interval_secs = secs;
    }
    if let Some(ref path) = cli.net2file_path {
        config.jive.net2file_path.clone_from(path);
    }

    config.validate()?;
    Ok(config)
}
