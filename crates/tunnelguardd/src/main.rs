//! tunnelguard daemon
//!
//! Watches WireGuard peer handshakes and resets stale dynamic endpoints so
//! they are re-resolved.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tunnelguard_core::{GuardMetrics, TunnelGuard};
use tunnelguard_wg::WgCli;
use tunnelguardd::{metrics_server, GuardConfig, MetricsWriter};

/// WireGuard handshake watchdog
#[derive(Parser, Debug)]
#[command(name = "tunnelguardd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args).await {
        Ok(()) => {
            info!("tunnelguardd: Exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "tunnelguardd: Exiting with error");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).compact())
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = GuardConfig::load(args.config.as_deref()).context("loading configuration")?;
    info!(
        interface = %config.interface,
        config_file = %config.config_file.display(),
        "tunnelguardd: Starting"
    );

    let driver = WgCli::new(config.interface.clone(), config.config_file.clone())
        .context("initializing WireGuard driver")?;

    let metrics_file = config.metrics_file_target()?;
    let metrics_addr = config.metrics_listen_addr()?;

    let metrics = Arc::new(GuardMetrics::new());
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let mut exporters = JoinSet::new();
    if let Some(path) = metrics_file {
        exporters.spawn(MetricsWriter::new(path).run(metrics.clone(), cancel.clone()));
    }
    if let Some(addr) = metrics_addr {
        let (metrics, cancel) = (metrics.clone(), cancel.clone());
        exporters.spawn(async move {
            if let Err(e) = metrics_server::serve(addr, metrics, cancel).await {
                error!(error = %e, %addr, "Metrics server failed");
            }
        });
    }

    TunnelGuard::new(driver, metrics)
        .with_display_names(config.display_names)
        .run(cancel)
        .await;

    while let Some(joined) = exporters.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Exporter task ended abnormally");
        }
    }

    info!("tunnelguardd: Graceful shutdown complete");
    Ok(())
}

/// Cancels `cancel` on SIGINT or SIGTERM.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = ctrl_c => info!("tunnelguardd: Received SIGINT"),
                        _ = term.recv() => info!("tunnelguardd: Received SIGTERM"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("tunnelguardd: Received SIGINT");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("tunnelguardd: Received SIGINT");
        }

        cancel.cancel();
    });
}
