//! kfact integration test harness.
//!
//! Every test runs real worker servers and fake misbehaving workers on
//! loopback ports chosen by the OS, so tests run in parallel without
//! coordination. Each helper returns a `WorkerGuard`; dropping it stops the
//! worker, including on panic.
//!
//!   cargo test --test integration

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use kfact_core::Endpoint;
use kfact_services::{JobParams, Timeouts, WorkerServer};

mod faults;
mod job;
mod server_list;

// ── WorkerGuard — Drop-based shutdown ────────────────────────────────────────

pub struct WorkerGuard {
    pub addr: SocketAddr,
    shutdown: broadcast::Sender<()>,
}

impl WorkerGuard {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.addr.ip().to_string(), self.addr.port())
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

// ── Workers ──────────────────────────────────────────────────────────────────

/// A real worker, the same server kfactd runs.
pub async fn spawn_worker(threads: usize) -> Result<WorkerGuard> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind worker")?;
    let (shutdown, rx) = broadcast::channel(1);
    let server = WorkerServer::new(listener, threads, Duration::from_secs(5), rx);
    let addr = server.local_addr()?;
    tokio::spawn(server.run());
    Ok(WorkerGuard { addr, shutdown })
}

/// How a fake worker treats each connection.
#[derive(Debug, Clone, Copy)]
pub enum Misbehaviour {
    /// Reads the request and never answers, keeping the connection open.
    Silent,
    /// Answers with fewer than 8 bytes, then closes.
    Truncated,
    /// Answers with a residue that is not below the modulus.
    OutOfRange,
    /// Closes the connection without reading.
    Hangup,
}

pub async fn spawn_fake_worker(mode: Misbehaviour) -> Result<WorkerGuard> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind fake worker")?;
    let addr = listener.local_addr()?;
    let (shutdown, mut rx) = broadcast::channel::<()>(1);

    tokio::spawn(async move {
        let mut held: Vec<TcpStream> = Vec::new();
        loop {
            tokio::select! {
                _ = rx.recv() => return,
                accepted = listener.accept() => {
                    let Ok((mut stream, _)) = accepted else { continue };
                    match mode {
                        Misbehaviour::Silent => {
                            let mut buf = [0u8; 24];
                            let _ = stream.read_exact(&mut buf).await;
                            held.push(stream);
                        }
                        Misbehaviour::Truncated => {
                            let mut buf = [0u8; 24];
                            let _ = stream.read_exact(&mut buf).await;
                            let _ = stream.write_all(&[0, 0, 0]).await;
                        }
                        Misbehaviour::OutOfRange => {
                            let mut buf = [0u8; 24];
                            let _ = stream.read_exact(&mut buf).await;
                            let _ = stream.write_all(&u64::MAX.to_be_bytes()).await;
                        }
                        Misbehaviour::Hangup => drop(stream),
                    }
                }
            }
        }
    });

    Ok(WorkerGuard { addr, shutdown })
}

/// An endpoint with nothing listening on it.
pub async fn closed_endpoint() -> Result<Endpoint> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(Endpoint::new("127.0.0.1", port))
}

/// Job parameters with timeouts short enough for tests.
pub fn params(k: u64, modulus: u64, servers: Vec<Endpoint>) -> JobParams {
    let mut params = JobParams::new(k, modulus, servers);
    params.timeouts = Timeouts {
        connect: Duration::from_secs(2),
        io: Duration::from_secs(2),
    };
    params.job_timeout = Duration::from_secs(10);
    params.verify = true;
    params
}
