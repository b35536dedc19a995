//! Job types — task descriptors, per-task outcomes, and job identifiers.
//!
//! A `Task` is created by the coordinator and never mutated. A `TaskResult`
//! is produced by exactly one worker client and handed to the completion
//! monitor; after aggregation it belongs to the job report.

use std::time::{SystemTime, UNIX_EPOCH};

use kfact_core::partition::Block;
use kfact_core::Endpoint;
use serde::{Deserialize, Serialize};

// ── Task ──────────────────────────────────────────────────────────────────────

/// One block of the factorial range, bound to one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Position in dispatch order, 0-based. Indexes the monitor's slots.
    pub task_id: usize,
    pub server: Endpoint,
    pub begin: u64,
    pub end: u64,
    pub modulus: u64,
}

impl Task {
    pub fn new(task_id: usize, server: Endpoint, block: Block, modulus: u64) -> Self {
        Self {
            task_id,
            server,
            begin: block.begin,
            end: block.end,
            modulus,
        }
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// What happened to a task.
///
/// A zero partial product is `Ok(0)`; it is never confused with failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum TaskOutcome {
    Ok(u64),
    Failed(String),
    TimedOut,
}

/// Status without payload, for counting and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Ok,
    Failed,
    TimedOut,
}

/// Result reported by a worker client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: usize,
    pub outcome: TaskOutcome,
    /// Wall-clock milliseconds spent on the round-trip.
    pub elapsed_ms: u64,
}

impl TaskResult {
    pub fn ok(task_id: usize, partial_product: u64, elapsed_ms: u64) -> Self {
        Self {
            task_id,
            outcome: TaskOutcome::Ok(partial_product),
            elapsed_ms,
        }
    }

    pub fn failed(task_id: usize, reason: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            task_id,
            outcome: TaskOutcome::Failed(reason.into()),
            elapsed_ms,
        }
    }

    pub fn timed_out(task_id: usize, elapsed_ms: u64) -> Self {
        Self {
            task_id,
            outcome: TaskOutcome::TimedOut,
            elapsed_ms,
        }
    }

    pub fn status(&self) -> TaskStatus {
        match self.outcome {
            TaskOutcome::Ok(_) => TaskStatus::Ok,
            TaskOutcome::Failed(_) => TaskStatus::Failed,
            TaskOutcome::TimedOut => TaskStatus::TimedOut,
        }
    }

    /// Meaningful only for successful tasks.
    pub fn partial_product(&self) -> Option<u64> {
        match self.outcome {
            TaskOutcome::Ok(v) => Some(v),
            _ => None,
        }
    }
}

// ── Job identity ──────────────────────────────────────────────────────────────

/// Short identifier correlating every log line of one job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// BLAKE3 over the job parameters and the start time, first 8 bytes in hex.
    pub fn derive(k: u64, modulus: u64, servers: &[Endpoint]) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        let mut hasher = blake3::Hasher::new();
        hasher.update(&k.to_be_bytes());
        hasher.update(&modulus.to_be_bytes());
        for server in servers {
            hasher.update(server.to_string().as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(&nanos.to_be_bytes());
        JobId(hex::encode(&hasher.finalize().as_bytes()[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
