use crate::*;

use std::time::Instant;

use kfact_services::{run_job, TaskOutcome, TaskStatus};

const PRIME: u64 = 1_000_000_007;

async fn two_honest_and(fault: WorkerGuard) -> Result<(WorkerGuard, WorkerGuard, WorkerGuard)> {
    Ok((spawn_worker(1).await?, spawn_worker(1).await?, fault))
}

#[tokio::test]
async fn silent_worker_is_cut_off_by_the_job_deadline() -> Result<()> {
    let (a, b, silent) = two_honest_and(spawn_fake_worker(Misbehaviour::Silent).await?).await?;

    let mut params = params(10, PRIME, vec![a.endpoint(), b.endpoint(), silent.endpoint()]);
    params.timeouts.io = Duration::from_secs(5);
    params.job_timeout = Duration::from_millis(500);

    let start = Instant::now();
    let report = run_job(params).await?;
    let elapsed = start.elapsed();

    // 1..=7 from the two honest workers.
    assert_eq!(report.value, 5040);
    assert_eq!((report.successful, report.total), (2, 3));
    assert!(!report.all_completed);
    assert_eq!(report.results[2].outcome, TaskOutcome::TimedOut);
    assert!(!report.verification.unwrap().matches);
    assert!(
        elapsed < Duration::from_secs(3),
        "job waited {elapsed:?}, longer than its deadline allows"
    );
    Ok(())
}

#[tokio::test]
async fn silent_worker_times_out_on_io_before_the_deadline() -> Result<()> {
    let silent = spawn_fake_worker(Misbehaviour::Silent).await?;

    let mut params = params(10, PRIME, vec![silent.endpoint()]);
    params.timeouts.io = Duration::from_millis(300);
    params.job_timeout = Duration::from_secs(10);

    let report = run_job(params).await?;

    assert!(report.all_completed);
    assert_eq!(report.results[0].status(), TaskStatus::TimedOut);
    assert_eq!(report.value, 1);
    Ok(())
}

#[tokio::test]
async fn refused_connection_degrades_the_result() -> Result<()> {
    let a = spawn_worker(1).await?;
    let dead = closed_endpoint().await?;
    let c = spawn_worker(1).await?;

    let report = run_job(params(10, PRIME, vec![a.endpoint(), dead, c.endpoint()])).await?;

    // [1,4] and [8,10] survive: 24 * 720.
    assert_eq!(report.value, 17_280);
    assert_eq!(report.successful, 2);
    assert!(report.all_completed);
    assert!(!report.is_exact());
    assert_eq!(report.results[1].status(), TaskStatus::Failed);
    Ok(())
}

#[tokio::test]
async fn malformed_answers_count_as_failures() -> Result<()> {
    for mode in [
        Misbehaviour::Truncated,
        Misbehaviour::OutOfRange,
        Misbehaviour::Hangup,
    ] {
        let (a, b, bad) = two_honest_and(spawn_fake_worker(mode).await?).await?;

        let report = run_job(params(10, PRIME, vec![a.endpoint(), b.endpoint(), bad.endpoint()])).await?;

        assert_eq!(report.value, 5040, "{mode:?}");
        assert_eq!(report.results[2].status(), TaskStatus::Failed, "{mode:?}");
        assert!(report.all_completed, "{mode:?}");
    }
    Ok(())
}

#[tokio::test]
async fn all_workers_down_yields_identity() -> Result<()> {
    let servers = vec![closed_endpoint().await?, closed_endpoint().await?];

    let report = run_job(params(10, PRIME, servers)).await?;

    assert_eq!(report.value, 1);
    assert_eq!(report.successful, 0);
    assert_eq!(report.total, 2);
    Ok(())
}

#[tokio::test]
async fn worker_shutdown_refuses_new_jobs() -> Result<()> {
    let worker = spawn_worker(1).await?;
    let endpoint = worker.endpoint();
    drop(worker);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let report = run_job(params(10, PRIME, vec![endpoint])).await?;

    assert_eq!(report.successful, 0);
    Ok(())
}

#[tokio::test]
async fn truncated_reply_closes_cleanly_on_the_client() -> Result<()> {
    // A raw client against the fake worker, checking the fake itself.
    let fake = spawn_fake_worker(Misbehaviour::Truncated).await?;
    let mut stream = TcpStream::connect(fake.addr).await?;
    stream.write_all(&[0u8; 24]).await?;
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await?;
    assert_eq!(out.len(), 3);
    Ok(())
}
