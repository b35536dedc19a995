use crate::*;

use kfact_core::ServerList;
use kfact_services::run_job;

#[tokio::test]
async fn job_runs_from_a_server_file() -> Result<()> {
    let a = spawn_worker(1).await?;
    let b = spawn_worker(1).await?;

    let path = std::env::temp_dir().join(format!("kfact-servers-{}", std::process::id()));
    std::fs::write(
        &path,
        format!(
            "# two local workers\n{}\n\nnot-an-endpoint\n{}\n",
            a.addr, b.addr
        ),
    )?;

    let list = ServerList::load(&path)?;
    let _ = std::fs::remove_file(&path);

    assert_eq!(list.endpoints, vec![a.endpoint(), b.endpoint()]);
    assert_eq!(list.rejected.len(), 1);

    let report = run_job(params(10, 1_000_000_007, list.endpoints)).await?;
    assert_eq!(report.value, 3_628_800);
    assert_eq!(report.total, 2);
    Ok(())
}
