//! Coordinator — runs one distributed factorial job end to end.
//!
//! `[1, k]` is partitioned across the servers, one tokio task per block is
//! spawned, and the coordinator waits on the completion monitor until every
//! task has reported or the job deadline passes. Whatever has arrived by
//! then is aggregated; the job never fails because a worker did.
//!
//! Workers still in flight at the deadline are not cancelled. Their tasks
//! are detached and end on their own I/O timeouts; a late report lands in a
//! monitor nobody reads any more.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

use kfact_core::config::CoordinatorConfig;
use kfact_core::{partition, Endpoint};

use crate::aggregator::aggregate;
use crate::job_types::{JobId, Task, TaskResult};
use crate::monitor::CompletionMonitor;
use crate::verifier::{verify, Verification};
use crate::worker_client::{self, Timeouts};

/// Everything needed to run one job.
#[derive(Debug, Clone)]
pub struct JobParams {
    pub k: u64,
    pub modulus: u64,
    pub servers: Vec<Endpoint>,
    pub timeouts: Timeouts,
    /// Budget for collecting every partial result.
    pub job_timeout: Duration,
    /// Recompute `k! mod M` sequentially after aggregation.
    pub verify: bool,
    /// Skip the recomputation above this `k`.
    pub verify_max_k: u64,
}

impl JobParams {
    /// Parameters with the default coordinator config and verification off.
    pub fn new(k: u64, modulus: u64, servers: Vec<Endpoint>) -> Self {
        Self::from_config(k, modulus, servers, &CoordinatorConfig::default())
    }

    pub fn from_config(
        k: u64,
        modulus: u64,
        servers: Vec<Endpoint>,
        config: &CoordinatorConfig,
    ) -> Self {
        Self {
            k,
            modulus,
            servers,
            timeouts: Timeouts::from_config(config),
            job_timeout: config.job_timeout(),
            verify: false,
            verify_max_k: config.verify_max_k,
        }
    }

    fn wants_verification(&self) -> bool {
        if !self.verify {
            return false;
        }
        if self.k > self.verify_max_k {
            tracing::info!(
                k = self.k,
                verify_max_k = self.verify_max_k,
                "k above verification limit, sequential check skipped"
            );
            return false;
        }
        true
    }
}

/// Stand-in deadline when `start + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// Outcome of a job. Produced even when some or all workers failed.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub k: u64,
    pub modulus: u64,
    /// Best-effort `k! mod M`, built from the successful tasks only.
    pub value: u64,
    pub successful: usize,
    pub total: usize,
    /// True when every dispatched task reported before the deadline.
    pub all_completed: bool,
    /// Servers that received no block because `k` was smaller than the server count.
    pub idle_servers: usize,
    pub tasks: Vec<Task>,
    pub results: Vec<TaskResult>,
    pub verification: Option<Verification>,
    pub elapsed_ms: u64,
}

impl JobReport {
    /// True when the value is the exact answer, not a partial product.
    pub fn is_exact(&self) -> bool {
        self.successful == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("modulus must be positive")]
    ZeroModulus,
    #[error("no usable servers")]
    NoServers,
}

/// Run a job to completion or deadline.
///
/// Fails only on configuration errors, before any network activity.
pub async fn run_job(params: JobParams) -> Result<JobReport, JobError> {
    if params.modulus == 0 {
        return Err(JobError::ZeroModulus);
    }
    if params.servers.is_empty() {
        return Err(JobError::NoServers);
    }

    let job_id = JobId::derive(params.k, params.modulus, &params.servers);
    let span = tracing::info_span!("job", id = %job_id);
    Ok(execute(job_id, params).instrument(span).await)
}

async fn execute(job_id: JobId, params: JobParams) -> JobReport {
    let should_verify = params.wants_verification();
    let JobParams {
        k,
        modulus,
        servers,
        timeouts,
        job_timeout,
        ..
    } = params;
    let started = Instant::now();

    if k <= 1 {
        tracing::info!(k, modulus, "trivial factorial, no servers contacted");
        let value = 1 % modulus;
        return JobReport {
            job_id,
            k,
            modulus,
            value,
            successful: 0,
            total: 0,
            all_completed: true,
            idle_servers: servers.len(),
            tasks: Vec::new(),
            results: Vec::new(),
            verification: should_verify.then(|| verify(k, modulus, value)),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
    }

    let tasks: Vec<Task> = partition(k, servers.len())
        .into_iter()
        .zip(servers.iter().cloned())
        .enumerate()
        .map(|(task_id, (block, server))| Task::new(task_id, server, block, modulus))
        .collect();
    let idle_servers = servers.len() - tasks.len();

    tracing::info!(
        k,
        modulus,
        servers = servers.len(),
        tasks = tasks.len(),
        "starting distributed computation"
    );
    if idle_servers > 0 {
        tracing::info!(idle_servers, "fewer factors than servers, extra servers left idle");
    }
    for task in &tasks {
        tracing::info!(
            task_id = task.task_id,
            server = %task.server,
            begin = task.begin,
            end = task.end,
            "range assigned"
        );
    }

    let monitor = Arc::new(CompletionMonitor::new(tasks.len()));
    let deadline = deadline_after(started, job_timeout);

    let handles: Vec<JoinHandle<()>> = tasks
        .iter()
        .cloned()
        .map(|task| {
            tokio::spawn(
                worker_client::run_and_report(task, timeouts, monitor.clone())
                    .instrument(tracing::Span::current()),
            )
        })
        .collect();
    tracing::debug!(workers = handles.len(), "all workers dispatched");

    let all_completed = monitor.wait_all(deadline).await;

    let progress = monitor.snapshot();
    if all_completed {
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "worker task ended abnormally");
            }
        }
    } else {
        tracing::warn!(
            missing = progress.remaining(),
            total = progress.total,
            timeout_secs = job_timeout.as_secs_f64(),
            "some servers did not respond in time, using available results"
        );
    }

    let results = monitor.collect();
    let agg = aggregate(&results, modulus);
    tracing::info!(
        value = agg.value,
        successful = agg.successful,
        total = agg.total,
        "aggregation complete"
    );

    let verification = if should_verify {
        let checked = tokio::task::spawn_blocking(move || verify(k, modulus, agg.value)).await;
        match checked {
            Ok(v) => {
                if v.matches {
                    tracing::info!(expected = v.expected, "sequential check matches");
                } else {
                    tracing::warn!(
                        expected = v.expected,
                        actual = v.actual,
                        "sequential check does not match"
                    );
                }
                Some(v)
            }
            Err(e) => {
                tracing::warn!(error = %e, "sequential check did not finish");
                None
            }
        }
    } else {
        None
    };

    JobReport {
        job_id,
        k,
        modulus,
        value: agg.value,
        successful: agg.successful,
        total: agg.total,
        all_completed,
        idle_servers,
        tasks,
        results,
        verification,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }
}
