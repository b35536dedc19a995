//! kfact-ctl — computes k! mod M across a list of kfactd workers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use kfact_core::config::KfactConfig;
use kfact_core::ServerList;
use kfact_services::{run_job, JobParams};

mod report;

#[derive(Parser, Debug)]
#[command(
    name = "kfact-ctl",
    about = "Compute k! mod M on remote workers",
    override_usage = "kfact-ctl --k 1000 --mod 5 --servers /path/to/file"
)]
struct Args {
    /// Factorial argument.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    k: u64,

    /// Modulus.
    #[arg(long = "mod", value_parser = clap::value_parser!(u64).range(1..))]
    modulus: u64,

    /// File with one host:port per line.
    #[arg(long)]
    servers: PathBuf,

    /// Seconds to wait for all workers. Defaults to the configured job timeout.
    #[arg(long)]
    timeout: Option<u64>,

    /// Skip the sequential cross-check.
    #[arg(long)]
    skip_verify: bool,

    /// Print the job report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = KfactConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        KfactConfig::default()
    });

    let list = ServerList::load(&args.servers).context("cannot load server list")?;
    if list.is_empty() {
        bail!("no valid servers found in {}", args.servers.display());
    }

    let mut params =
        JobParams::from_config(args.k, args.modulus, list.endpoints, &config.coordinator);
    if let Some(secs) = args.timeout {
        params.job_timeout = Duration::from_secs(secs);
    }
    params.verify = !args.skip_verify;

    let report = run_job(params).await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print!("{}", report::render(&report));
    }
    Ok(())
}
