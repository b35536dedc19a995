use crate::*;

use kfact_core::factorial_mod;
use kfact_services::{run_job, TaskOutcome, TaskStatus};

const PRIME: u64 = 1_000_000_007;

#[tokio::test]
async fn single_worker_computes_whole_range() -> Result<()> {
    let worker = spawn_worker(2).await?;

    let report = run_job(params(10, PRIME, vec![worker.endpoint()])).await?;

    assert_eq!(report.value, 3_628_800);
    assert_eq!((report.successful, report.total), (1, 1));
    assert!(report.all_completed);
    assert_eq!((report.tasks[0].begin, report.tasks[0].end), (1, 10));
    assert!(report.verification.unwrap().matches);
    Ok(())
}

#[tokio::test]
async fn three_workers_split_the_range() -> Result<()> {
    let workers = [spawn_worker(1).await?, spawn_worker(1).await?, spawn_worker(1).await?];
    let servers = workers.iter().map(WorkerGuard::endpoint).collect();

    let report = run_job(params(10, 7, servers)).await?;

    let ranges: Vec<_> = report.tasks.iter().map(|t| (t.begin, t.end)).collect();
    assert_eq!(ranges, vec![(1, 4), (5, 7), (8, 10)]);
    for (task, worker) in report.tasks.iter().zip(&workers) {
        assert_eq!(task.server, worker.endpoint());
    }

    // [5, 7] contains 7, so its partial product is a legitimate zero.
    assert_eq!(report.results[1].outcome, TaskOutcome::Ok(0));
    assert_eq!(report.value, 0);
    assert_eq!(report.successful, 3);
    assert!(report.is_exact());
    Ok(())
}

#[tokio::test]
async fn large_job_matches_sequential() -> Result<()> {
    let mut workers = Vec::new();
    for threads in [1, 2, 4, 8] {
        workers.push(spawn_worker(threads).await?);
    }
    let servers = workers.iter().map(WorkerGuard::endpoint).collect();

    let report = run_job(params(200_000, PRIME, servers)).await?;

    assert_eq!(report.value, factorial_mod(200_000, PRIME));
    assert_eq!(report.successful, 4);
    assert!(report.verification.unwrap().matches);
    Ok(())
}

#[tokio::test]
async fn fewer_factors_than_servers_leaves_servers_idle() -> Result<()> {
    let mut workers = Vec::new();
    for _ in 0..5 {
        workers.push(spawn_worker(1).await?);
    }
    let servers = workers.iter().map(WorkerGuard::endpoint).collect();

    let report = run_job(params(3, PRIME, servers)).await?;

    assert_eq!(report.value, 6);
    assert_eq!(report.total, 3);
    assert_eq!(report.idle_servers, 2);
    assert!(report.tasks.iter().all(|t| t.begin == t.end));
    Ok(())
}

#[tokio::test]
async fn duplicate_servers_each_get_a_block() -> Result<()> {
    let worker = spawn_worker(1).await?;
    let servers = vec![worker.endpoint(), worker.endpoint()];

    let report = run_job(params(12, PRIME, servers)).await?;

    assert_eq!(report.total, 2);
    assert_eq!(report.value, factorial_mod(12, PRIME));
    Ok(())
}

#[tokio::test]
async fn every_result_is_accounted_for() -> Result<()> {
    let worker = spawn_worker(1).await?;
    let dead = closed_endpoint().await?;

    let report = run_job(params(20, PRIME, vec![worker.endpoint(), dead])).await?;

    assert_eq!(report.results.len(), report.tasks.len());
    for (i, result) in report.results.iter().enumerate() {
        assert_eq!(result.task_id, i);
    }
    assert_eq!(report.results[0].status(), TaskStatus::Ok);
    assert_eq!(report.results[1].status(), TaskStatus::Failed);
    Ok(())
}

#[tokio::test]
async fn report_serializes_to_json() -> Result<()> {
    let worker = spawn_worker(1).await?;

    let report = run_job(params(5, 7, vec![worker.endpoint()])).await?;
    let json = serde_json::to_value(&report)?;

    assert_eq!(json["value"], 120 % 7);
    assert_eq!(json["results"][0]["outcome"]["status"], "ok");
    assert_eq!(json["tasks"][0]["server"]["port"], worker.addr.port());
    Ok(())
}
