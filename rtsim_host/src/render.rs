//! Report rendering
//!
//! The host owns all output. Library crates only log.

use crate::runtime::{HostError, HostOutcome};
use core_types::TaskKind;
use sched_engine::{ServerConfig, ServerKind, SimulationReport, Termination};
use std::fmt::Write;

/// Renders a human-readable report
pub fn render_text(outcome: &HostOutcome) -> String {
    let report = &outcome.report;
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(
        out,
        "Scheduling: {} | Server: {}",
        report.algorithm,
        describe_server(&report.server)
    );
    let feasibility = &report.feasibility;
    let _ = writeln!(
        out,
        "Utilization: {:.3} (bound {:.3}, {})",
        feasibility.utilization, feasibility.bound, feasibility.verdict
    );

    for skipped in &outcome.skipped {
        let _ = writeln!(
            out,
            "Skipped line {}: {} ({})",
            skipped.line, skipped.content, skipped.reason
        );
    }

    out.push('\n');
    let _ = writeln!(out, "{:>10} {:>10}  {}", "Start", "End", "Task");
    for interval in &report.trace {
        let _ = writeln!(
            out,
            "{:>10.2} {:>10.2}  {}",
            interval.start, interval.end, interval.label
        );
    }

    out.push('\n');
    render_tasks(&mut out, report);

    out.push('\n');
    let _ = writeln!(
        out,
        "Busy {:.2} / idle {:.2}, {} context switches",
        report.trace.busy_time(),
        report.stats.idle_time,
        report.stats.context_switches
    );
    match (&report.fault, report.termination) {
        (Some(miss), _) => {
            let _ = writeln!(out, "DEADLINE MISS: {} at {:.2}", miss.task_name, miss.time);
        }
        (None, Termination::Cancelled) => {
            let _ = writeln!(out, "Cancelled at {:.2}", report.end_time);
        }
        (None, _) => {
            let _ = writeln!(out, "Completed at {:.2}", report.end_time);
        }
    }

    out
}

/// Renders the full report as pretty-printed JSON
pub fn render_json(outcome: &HostOutcome) -> Result<String, HostError> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

fn render_tasks(out: &mut String, report: &SimulationReport) {
    let _ = writeln!(
        out,
        "{:<6} {:<10} {:>8} {:>9} {:>7} {:>12}",
        "Task", "Kind", "Released", "Completed", "Pending", "Next release"
    );
    for task in &report.tasks {
        let next = match task.spec.kind {
            TaskKind::Periodic => format!("{:.2}", task.next_release),
            TaskKind::Aperiodic => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<6} {:<10} {:>8} {:>9} {:>7} {:>12}",
            task.spec.name,
            task.spec.kind,
            task.jobs_released,
            task.jobs_completed,
            task.pending.len(),
            next
        );
    }
}

fn describe_server(server: &ServerConfig) -> String {
    match server.kind {
        ServerKind::Background => server.kind.to_string(),
        kind => format!(
            "{} (budget {}, period {})",
            kind, server.budget, server.period
        ),
    }
}
