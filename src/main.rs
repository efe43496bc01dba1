//! HQ demo server binary.
//!
//! Wires together configuration, the QUIC front end, the optional
//! plain-TCP fallback, and signal-driven shutdown.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hq_server::config::{load_config, ServerConfig};
use hq_server::lifecycle::{wait_for_signal, Shutdown};
use hq_server::{handlers, HqServer};

#[derive(Parser, Debug)]
#[command(name = "hq-server", about = "QUIC/HTTP demo server", version)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the QUIC bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Directory for per-connection qlog files.
    #[arg(long)]
    qlog_dir: Option<PathBuf>,

    /// Override the push payload file.
    #[arg(long)]
    push_file: Option<PathBuf>,

    /// TLS certificate PEM file (requires --key).
    #[arg(long, requires = "key")]
    cert: Option<PathBuf>,

    /// TLS private key PEM file (requires --cert).
    #[arg(long, requires = "cert")]
    key: Option<PathBuf>,

    /// Enable the plain-TCP fallback server.
    #[arg(long)]
    fallback: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hq_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(dir) = args.qlog_dir {
        config.qlog.dir = Some(dir);
    }
    if let Some(file) = args.push_file {
        config.push.file = file;
    }
    if args.cert.is_some() {
        config.tls.cert_path = args.cert;
        config.tls.key_path = args.key;
    }
    if args.fallback {
        config.fallback.enabled = true;
    }

    tracing::info!(
        bind_address = %config.bind_address,
        fallback = config.fallback.enabled,
        "configuration loaded"
    );

    // The push payload must exist before any connection is accepted.
    handlers::push::load_push_body(&config.push.file)?;

    let shutdown = Shutdown::new();

    if config.fallback.enabled {
        let fallback_config = config.fallback.clone();
        let http_version = config.http_version.clone();
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                result = hq_server::fallback::run(&fallback_config, &http_version) => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "fallback server failed");
                    }
                }
                _ = stop.recv() => {}
            }
        });
    }

    let server = HqServer::bind(config)?;
    let mut stop = shutdown.subscribe();

    tokio::select! {
        _ = server.run() => {}
        _ = wait_for_signal() => shutdown.trigger(),
        _ = stop.recv() => {}
    }

    server.reject_new_connections(true);
    server.stop().await;
    tracing::info!("shutdown complete");
    Ok(())
}
