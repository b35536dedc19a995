//! Human-readable job summary.

use std::fmt::Write;

use kfact_services::{JobReport, TaskOutcome};

const RULE: &str = "═══════════════════════════════════════";

pub fn render(report: &JobReport) -> String {
    let mut out = String::new();
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, r: &JobReport) -> std::fmt::Result {
    writeln!(out, "{RULE}")?;
    writeln!(out, "  {}! mod {}", r.k, r.modulus)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "  Job        : {}", r.job_id)?;
    writeln!(out, "  Elapsed    : {}ms", r.elapsed_ms)?;

    if r.total == 0 {
        writeln!(out, "  Servers    : none contacted")?;
    } else {
        writeln!(out, "  Servers    : {}/{} succeeded", r.successful, r.total)?;
    }
    if r.idle_servers > 0 {
        writeln!(out, "  Idle       : {}", r.idle_servers)?;
    }

    for (task, result) in r.tasks.iter().zip(&r.results) {
        writeln!(out, "  ┌─ task {}  {}", task.task_id, task.server)?;
        writeln!(out, "  │  range   : {}..={}", task.begin, task.end)?;
        match &result.outcome {
            TaskOutcome::Ok(v) => writeln!(out, "  │  product : {v}")?,
            TaskOutcome::Failed(reason) => writeln!(out, "  │  failed  : {reason}")?,
            TaskOutcome::TimedOut => writeln!(out, "  │  timed out")?,
        }
        writeln!(out, "  └─ {}ms", result.elapsed_ms)?;
    }

    writeln!(out, "  Result     : {}", r.value)?;
    if !r.is_exact() {
        writeln!(
            out,
            "  Warning    : partial result, {} of {} ranges missing",
            r.total - r.successful,
            r.total
        )?;
    }
    if let Some(v) = &r.verification {
        if v.matches {
            writeln!(out, "  Check      : ok")?;
        } else {
            writeln!(out, "  Check      : MISMATCH (sequential {})", v.expected)?;
        }
    }
    Ok(())
}
