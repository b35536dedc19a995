//! kfactd — factorial worker daemon.
//!
//! Listens for coordinator connections and answers each 24-byte range
//! request with its 8-byte product.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use kfact_core::config::KfactConfig;
use kfact_services::WorkerServer;

#[derive(Parser, Debug)]
#[command(name = "kfactd", about = "kfact worker daemon")]
struct Args {
    /// Port to listen on. Defaults to the configured worker port.
    #[arg(long)]
    port: Option<u16>,

    /// Local fan-out per request. 0 = available parallelism.
    #[arg(long, alias = "tnum")]
    threads: Option<usize>,

    /// Address to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = KfactConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        KfactConfig::default()
    });
    if let Some(port) = args.port {
        config.worker.port = port;
    }
    if let Some(threads) = args.threads {
        config.worker.threads = threads;
    }

    let addr = SocketAddr::new(args.bind, config.worker.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "kfactd starting");

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    WorkerServer::new(
        listener,
        config.worker.effective_threads(),
        config.worker.read_timeout(),
        shutdown_rx,
    )
    .run()
    .await
}
