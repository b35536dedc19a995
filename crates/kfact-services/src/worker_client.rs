//! Worker client — runs one task against one worker over TCP.
//!
//! Each task gets its own tokio task, its own socket and its own buffers.
//! The sequence is resolve → connect → send 24 bytes → receive 8 bytes →
//! close, with every step bounded by a timeout. Every resolved address is
//! tried in order within the one connect timeout; apart from that there are
//! no retries.
//!
//! Whatever happens, the task reports to the completion monitor exactly
//! once. `ReportGuard` covers the paths where the future never gets to
//! report itself (panic, abort).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use kfact_core::config::CoordinatorConfig;
use kfact_core::wire::{FactorialRequest, FactorialResponse, WireError, RESPONSE_LEN};

use crate::job_types::{Task, TaskResult};
use crate::monitor::CompletionMonitor;

/// Per-connection time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Name resolution plus TCP connect.
    pub connect: Duration,
    /// Applied separately to the send and to the receive.
    pub io: Duration,
}

impl Timeouts {
    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            io: config.io_timeout(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from_config(&CoordinatorConfig::default())
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        source: std::io::Error,
    },
    #[error("{0} resolved to no addresses")]
    NoAddress(String),
    #[error("lookup of {0} timed out")]
    ResolveTimeout(String),
    #[error("connect to {0} failed: {1}")]
    Connect(SocketAddr, std::io::Error),
    #[error("connect to {0} timed out")]
    ConnectTimeout(String),
    #[error("send failed: {0}")]
    Send(std::io::Error),
    #[error("send timed out")]
    SendTimeout,
    #[error("receive failed: {0}")]
    Receive(std::io::Error),
    #[error("worker closed the connection before sending {} bytes", RESPONSE_LEN)]
    ShortResponse,
    #[error("receive timed out")]
    ReceiveTimeout,
    #[error("bad response: {0}")]
    Protocol(#[from] WireError),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ClientError::ResolveTimeout(_)
                | ClientError::ConnectTimeout(_)
                | ClientError::SendTimeout
                | ClientError::ReceiveTimeout
        )
    }
}

// ── Execution ─────────────────────────────────────────────────────────────────

/// Run one task and classify its outcome. Never fails: errors become
/// `Failed` or `TimedOut` results.
pub async fn execute(task: &Task, timeouts: &Timeouts) -> TaskResult {
    tracing::debug!(
        task_id = task.task_id,
        server = %task.server,
        begin = task.begin,
        end = task.end,
        "dispatching task"
    );

    let start = Instant::now();
    let outcome = round_trip(task, timeouts).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(product) => {
            tracing::info!(
                task_id = task.task_id,
                server = %task.server,
                begin = task.begin,
                end = task.end,
                product,
                elapsed_ms,
                "partial product received"
            );
            TaskResult::ok(task.task_id, product, elapsed_ms)
        }
        Err(e) if e.is_timeout() => {
            tracing::warn!(task_id = task.task_id, server = %task.server, error = %e, "worker timed out");
            TaskResult::timed_out(task.task_id, elapsed_ms)
        }
        Err(e) => {
            tracing::warn!(task_id = task.task_id, server = %task.server, error = %e, "worker failed");
            TaskResult::failed(task.task_id, e.to_string(), elapsed_ms)
        }
    }
}

/// Run one task and report it. Spawned once per task by the coordinator.
pub async fn run_and_report(task: Task, timeouts: Timeouts, monitor: Arc<CompletionMonitor>) {
    let guard = ReportGuard::new(task.task_id, monitor);
    let result = execute(&task, &timeouts).await;
    guard.report(result);
}

async fn round_trip(task: &Task, timeouts: &Timeouts) -> Result<u64, ClientError> {
    let host = task.server.host.as_str();
    let label = task.server.to_string();

    let addrs = timeout(timeouts.connect, resolve(host, task.server.port))
        .await
        .map_err(|_| ClientError::ResolveTimeout(label.clone()))??;

    let mut stream = timeout(timeouts.connect, connect_any(host, &addrs))
        .await
        .map_err(|_| ClientError::ConnectTimeout(label))??;
    let _ = stream.set_nodelay(true);

    let request = FactorialRequest::new(task.begin, task.end, task.modulus).encode();
    timeout(timeouts.io, stream.write_all(&request))
        .await
        .map_err(|_| ClientError::SendTimeout)?
        .map_err(ClientError::Send)?;

    let mut response = [0u8; RESPONSE_LEN];
    timeout(timeouts.io, stream.read_exact(&mut response))
        .await
        .map_err(|_| ClientError::ReceiveTimeout)?
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ClientError::ShortResponse,
            _ => ClientError::Receive(e),
        })?;

    let product = FactorialResponse::decode(&response)?.check_residue(task.modulus)?;
    Ok(product)
}

async fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, ClientError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| ClientError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();
    if addrs.is_empty() {
        return Err(ClientError::NoAddress(host.to_string()));
    }
    Ok(addrs)
}

/// Connect to the first address that accepts, in resolver order.
async fn connect_any(host: &str, addrs: &[SocketAddr]) -> Result<TcpStream, ClientError> {
    let mut last_err = None;
    for &addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!(host, %addr, error = %e, "connect failed, trying next address");
                last_err = Some(ClientError::Connect(addr, e));
            }
        }
    }
    Err(last_err.unwrap_or_else(|| ClientError::NoAddress(host.to_string())))
}

// ── Report guard ──────────────────────────────────────────────────────────────

/// Reports `Failed` on drop unless `report` was called first.
struct ReportGuard {
    task_id: usize,
    monitor: Arc<CompletionMonitor>,
    started: Instant,
    reported: bool,
}

impl ReportGuard {
    fn new(task_id: usize, monitor: Arc<CompletionMonitor>) -> Self {
        Self {
            task_id,
            monitor,
            started: Instant::now(),
            reported: false,
        }
    }

    fn report(mut self, result: TaskResult) {
        self.reported = true;
        self.monitor.report(result);
    }
}

impl Drop for ReportGuard {
    fn drop(&mut self) {
        if !self.reported {
            let elapsed_ms = self.started.elapsed().as_millis() as u64;
            self.monitor.report(TaskResult::failed(
                self.task_id,
                "worker task ended without reporting",
                elapsed_ms,
            ));
        }
    }
}
