//! Scheduling Test Utilities
//!
//! This crate provides shared utilities for the cross-crate scheduling
//! tests.
//!
//! ## Test Philosophy
//!
//! - **Properties over snapshots**: Tests assert invariants that must hold
//!   for every run, plus a few hand-checked timelines
//! - **Audit replay**: Per-tick decisions are checked against the audit log,
//!   not against internal state
//! - **Deterministic**: Every scenario is a fixed task set and configuration

use core_types::{JobId, SimTime, TaskId, TaskSet};
use sched_engine::{
    Algorithm, Dispatch, ScheduleEvent, ServerConfig, Simulation, SimulationConfig,
    SimulationReport,
};
use std::collections::BTreeMap;
use task_loader::{ParseMode, TaskLoader};

/// Parses a task file body
///
/// # Panics
///
/// Panics if the text contains no valid task.
pub fn load(text: &str) -> TaskSet {
    match TaskLoader::from_text(text, ParseMode::Strict) {
        Ok(loaded) => loaded.tasks,
        Err(err) => panic!("bad test input: {}", err),
    }
}

/// Configuration with auditing enabled
pub fn audited(algorithm: Algorithm, duration: SimTime) -> SimulationConfig {
    SimulationConfig::new(algorithm)
        .with_duration(duration)
        .with_audit(true)
}

/// The three aperiodic service options with a budget of 1 per 5
pub fn all_servers() -> [ServerConfig; 3] {
    [
        ServerConfig::background(),
        ServerConfig::polling(1.0, 5.0),
        ServerConfig::deferrable(1.0, 5.0),
    ]
}

/// Runs a simulation and returns its report together with the audit log
///
/// # Panics
///
/// Panics on an invalid configuration.
pub fn run_audited(tasks: &TaskSet, config: SimulationConfig) -> (SimulationReport, Vec<ScheduleEvent>) {
    let mut sim = match Simulation::new(tasks, config) {
        Ok(sim) => sim,
        Err(err) => panic!("invalid test configuration: {}", err),
    };
    while sim.step() == sched_engine::StepOutcome::Continue {}
    let events = sim.audit_log().to_vec();
    (sim.finish(), events)
}

/// Pending periodic jobs and their absolute deadlines at a dispatch point
pub type PendingJobs = BTreeMap<JobId, SimTime>;

/// Replays an audit log, calling `visit` at every dispatch decision
///
/// `pending` holds the periodic jobs that were ready when the decision was
/// made.
pub fn replay<F>(events: &[ScheduleEvent], mut visit: F)
where
    F: FnMut(SimTime, Dispatch, &PendingJobs),
{
    let mut pending = PendingJobs::new();
    for event in events {
        match event {
            ScheduleEvent::JobReleased {
                job,
                absolute_deadline,
                ..
            } => {
                pending.insert(*job, *absolute_deadline);
            }
            ScheduleEvent::JobCompleted { job, .. } => {
                pending.remove(job);
            }
            ScheduleEvent::Dispatched { time, dispatch } => visit(*time, *dispatch, &pending),
            _ => {}
        }
    }
}

/// Absolute deadlines of every released job of `task`, in release order
pub fn released_deadlines(events: &[ScheduleEvent], task: TaskId) -> Vec<SimTime> {
    events
        .iter()
        .filter_map(|event| match event {
            ScheduleEvent::JobReleased {
                job,
                absolute_deadline,
                ..
            } if job.task == task => Some(*absolute_deadline),
            _ => None,
        })
        .collect()
}

/// Looks up a task's ID by name
///
/// # Panics
///
/// Panics if no task has that name.
pub fn task_id(tasks: &TaskSet, name: &str) -> TaskId {
    match tasks.iter().find(|t| t.name == name) {
        Some(spec) => spec.id,
        None => panic!("no task named {}", name),
    }
}
