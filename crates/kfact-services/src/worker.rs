//! Worker server — the remote side of the wire contract.
//!
//! Accepts connections, reads one 24-byte request per connection, computes
//! the range product, writes the 8-byte response, and closes. Each request
//! is fanned out across `threads` sub-ranges on the blocking pool so a
//! single large block still uses every core.
//!
//! Invalid requests (zero modulus, empty range) get no reply; the
//! connection is closed and the coordinator sees a short read.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use kfact_core::wire::{FactorialRequest, FactorialResponse, WireError, REQUEST_LEN};
use kfact_core::{mulmod, range_product, split_range};

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("request not received within {0:?}")]
    ReadTimeout(Duration),
    #[error("read failed: {0}")]
    Read(std::io::Error),
    #[error("invalid request: {0}")]
    Invalid(#[from] WireError),
    #[error("write failed: {0}")]
    Write(std::io::Error),
    #[error("computation aborted: {0}")]
    Compute(#[from] tokio::task::JoinError),
}

pub struct WorkerServer {
    listener: TcpListener,
    threads: usize,
    read_timeout: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl WorkerServer {
    pub fn new(
        listener: TcpListener,
        threads: usize,
        read_timeout: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            listener,
            threads: threads.max(1),
            read_timeout,
            shutdown,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the shutdown channel fires or is dropped.
    pub async fn run(mut self) -> anyhow::Result<()> {
        tracing::info!(
            addr = ?self.listener.local_addr().ok(),
            threads = self.threads,
            "worker listening"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("worker shutting down");
                    return Ok(());
                }

                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(a) => a,
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                            continue;
                        }
                    };

                    let threads = self.threads;
                    let read_timeout = self.read_timeout;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, threads, read_timeout).await {
                            tracing::warn!(%peer, error = %e, "request dropped");
                        }
                    });
                }
            }
        }
    }
}

/// Serve exactly one request on `stream`, then close it.
pub async fn handle_connection(
    mut stream: TcpStream,
    threads: usize,
    read_timeout: Duration,
) -> Result<(), ServeError> {
    let mut buf = [0u8; REQUEST_LEN];
    tokio::time::timeout(read_timeout, stream.read_exact(&mut buf))
        .await
        .map_err(|_| ServeError::ReadTimeout(read_timeout))?
        .map_err(ServeError::Read)?;

    let request = FactorialRequest::decode(&buf)?;
    request.validate()?;

    let (begin, end, modulus) = (request.begin(), request.end(), request.modulus());
    let start = Instant::now();
    let product = compute(begin, end, modulus, threads).await?;
    tracing::info!(
        begin,
        end,
        modulus,
        product,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request served"
    );

    stream
        .write_all(&FactorialResponse::new(product).encode())
        .await
        .map_err(ServeError::Write)?;
    let _ = stream.shutdown().await;
    Ok(())
}

/// Product of `[begin, end]` mod `modulus`, split across `threads` blocking tasks.
pub async fn compute(
    begin: u64,
    end: u64,
    modulus: u64,
    threads: usize,
) -> Result<u64, tokio::task::JoinError> {
    let handles: Vec<_> = split_range(begin, end, threads.max(1))
        .into_iter()
        .map(|block| {
            tokio::task::spawn_blocking(move || range_product(block.begin, block.end, modulus))
        })
        .collect();

    let mut acc = 1 % modulus;
    for handle in handles {
        acc = mulmod(acc, handle.await?, modulus);
    }
    Ok(acc)
}
