//! Completion monitor — tracks which tasks of one job have reported.
//!
//! One lock guards the whole job state. Worker tasks call `report` exactly
//! once each; the coordinator is the only caller of `wait_all`. The reporter
//! that moves `completed` to `total` broadcasts on `all_done`, and that
//! happens at most once per job.
//!
//! The lock is a std mutex: it is never held across an await point.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::job_types::TaskResult;

/// `(completed, total)` at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }

    pub fn remaining(&self) -> usize {
        self.total - self.completed
    }
}

struct JobState {
    total: usize,
    completed: usize,
    /// Indexed by task_id.
    slots: Vec<Option<TaskResult>>,
    broadcasts: usize,
}

pub struct CompletionMonitor {
    state: Mutex<JobState>,
    all_done: Notify,
    started: Instant,
}

impl CompletionMonitor {
    pub fn new(total: usize) -> Self {
        Self {
            state: Mutex::new(JobState {
                total,
                completed: 0,
                slots: vec![None; total],
                broadcasts: 0,
            }),
            all_done: Notify::new(),
            started: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        // A panicking reporter cannot leave JobState half-written: every
        // mutation below completes before the guard drops.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record one task's result.
    ///
    /// Returns false (and changes nothing) for an unknown task id or a task
    /// that already reported.
    pub fn report(&self, result: TaskResult) -> bool {
        let mut state = self.lock();
        let task_id = result.task_id;

        match state.slots.get(task_id) {
            None => {
                tracing::warn!(task_id, total = state.total, "report for unknown task ignored");
                return false;
            }
            Some(Some(_)) => {
                tracing::warn!(task_id, "duplicate report ignored");
                return false;
            }
            Some(None) => {}
        }

        let status = result.status();
        state.slots[task_id] = Some(result);
        state.completed += 1;

        tracing::debug!(
            task_id,
            ?status,
            completed = state.completed,
            total = state.total,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "task reported"
        );

        if state.completed == state.total {
            state.broadcasts += 1;
            self.all_done.notify_waiters();
        }
        true
    }

    /// Wait until every task has reported or `deadline` passes.
    ///
    /// Returns whether all tasks completed. The predicate is re-checked
    /// after every wake-up.
    pub async fn wait_all(&self, deadline: Instant) -> bool {
        loop {
            // Register interest before checking, so a report landing between
            // the check and the await still wakes us.
            let notified = self.all_done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let progress = self.snapshot();
            if progress.is_done() {
                return true;
            }
            tracing::debug!(remaining = progress.remaining(), "waiting for workers");

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.snapshot().is_done();
            }
        }
    }

    /// Non-blocking progress read.
    pub fn snapshot(&self) -> Progress {
        let state = self.lock();
        Progress {
            completed: state.completed,
            total: state.total,
        }
    }

    /// How many times the all-done broadcast fired. 0 or 1.
    pub fn broadcasts(&self) -> usize {
        self.lock().broadcasts
    }

    /// Results in task order. Tasks that never reported come back as
    /// `TimedOut`, stamped with the time since the monitor was created.
    pub fn collect(&self) -> Vec<TaskResult> {
        let state = self.lock();
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        state
            .slots
            .iter()
            .enumerate()
            .map(|(task_id, slot)| {
                slot.clone()
                    .unwrap_or_else(|| TaskResult::timed_out(task_id, elapsed_ms))
            })
            .collect()
    }
}
