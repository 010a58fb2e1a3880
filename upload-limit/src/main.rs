#![forbid(unsafe_code)]

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use upload_limit_lib::config::load_from_path;
use upload_limit_lib::telemetry::{init_metrics, init_tracing, start_observability_server};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reverse proxy that caps request body upload rates")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "UPLOAD_LIMIT_CONFIG",
        default_value = "config.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(&cfg.logging, &cfg.telemetry) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    info!(
        ?cfg.listen,
        backends = cfg.backends.len(),
        routes = cfg.routes.len(),
        "configuration loaded"
    );
    let cfg = Arc::new(cfg);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = match cfg.telemetry.metrics_port {
        Some(port) => match init_metrics() {
            Ok((metrics, registry)) => {
                let cfg = cfg.clone();
                let shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move {
                    if let Err(err) =
                        start_observability_server(port, registry, cfg, shutdown_rx).await
                    {
                        error!(%err, "observability server exited with error");
                    }
                });
                Some(metrics)
            }
            Err(err) => {
                warn!(%err, "failed to initialize metrics, continuing without them");
                None
            }
        },
        None => None,
    };

    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    if let Err(err) = upload_limit_lib::run(cfg, metrics, shutdown_rx).await {
        error!(%err, "upload proxy exited with error");
        std::process::exit(1);
    }
}

async fn wait_for_signal() {
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            warn!(%err, "Failed to setup SIGTERM handler, falling back to Ctrl-C only");
            if signal::ctrl_c().await.is_ok() {
                info!("Received SIGINT, initiating graceful shutdown");
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
        _ = signal::ctrl_c() => info!("Received SIGINT, initiating graceful shutdown"),
    }
}
