//! kfact-services — the coordinator side of a distributed factorial job,
//! plus the request handler that worker daemons run.

pub mod aggregator;
pub mod coordinator;
pub mod job_types;
pub mod monitor;
pub mod verifier;
pub mod worker;
pub mod worker_client;

pub use aggregator::{aggregate, Aggregate};
pub use coordinator::{run_job, JobError, JobParams, JobReport};
pub use job_types::{JobId, Task, TaskOutcome, TaskResult, TaskStatus};
pub use monitor::{CompletionMonitor, Progress};
pub use verifier::{verify, Verification};
pub use worker::WorkerServer;
pub use worker_client::Timeouts;
