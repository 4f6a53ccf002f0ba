//! Dispatch Policy Integration Tests
//!
//! These tests validate the four dispatch policies end to end:
//! - RM and DM always prefer the statically higher-priority task
//! - EDF never runs a job while an earlier deadline is pending
//! - LLF keeps the running job while laxities stay within the threshold

use sched_engine::test_utils::{approx, spans_of};
use sched_engine::{Algorithm, Dispatch, Simulation, SimulationConfig, TraceLabel};
use tests_scheduling::{audited, load, replay, run_audited, task_id};

#[test]
fn test_rm_prefers_shorter_period_whenever_both_ready() {
    let tasks = load("P 0 1 4\nP 0 2 6\n");
    let t1 = task_id(&tasks, "P1");
    let (report, events) = run_audited(&tasks, audited(Algorithm::RateMonotonic, 24.0));
    assert!(report.fault.is_none());

    let mut contested = 0;
    replay(&events, |time, dispatch, pending| {
        if pending.keys().any(|job| job.task == t1) {
            contested += 1;
            match dispatch {
                Dispatch::Periodic(job) => assert_eq!(job.task, t1, "t={:.2}", time),
                other => panic!("t={:.2}: expected P1, got {}", time, other),
            }
        }
    });
    assert!(contested > 0);

    // Hand-checked timeline for the first hyperperiod half
    let p1 = spans_of(&report.trace, "P1");
    assert!(approx(p1[0].0, 0.0) && approx(p1[0].1, 1.0));
    assert!(approx(p1[1].0, 4.0) && approx(p1[1].1, 5.0));
    assert!(approx(p1[2].0, 8.0) && approx(p1[2].1, 9.0));
    let p2 = spans_of(&report.trace, "P2");
    assert!(approx(p2[0].0, 1.0) && approx(p2[0].1, 3.0));
}

#[test]
fn test_dm_prefers_shorter_relative_deadline() {
    // RM would favour P1 (period 5); DM favours P2 (deadline 3)
    let tasks = load("P 0 1 5 5\nD 1 8 3\n");
    let p2 = task_id(&tasks, "P2");
    let (report, events) = run_audited(&tasks, audited(Algorithm::DeadlineMonotonic, 40.0));
    assert!(report.fault.is_none());

    replay(&events, |time, dispatch, pending| {
        if pending.keys().any(|job| job.task == p2) {
            assert!(
                matches!(dispatch, Dispatch::Periodic(job) if job.task == p2),
                "t={:.2}: P2 pending but {} ran",
                time,
                dispatch
            );
        }
    });
    assert_eq!(
        report.trace.intervals()[0].label,
        TraceLabel::Task("P2".into())
    );
}

#[test]
fn test_edf_never_runs_a_later_deadline() {
    let tasks = load("P 0 1 4\nP 0 2 6\nP 0 3 10\nP 1 1 14\n");
    let (report, events) =
        run_audited(&tasks, audited(Algorithm::EarliestDeadlineFirst, 60.0));
    assert!(report.fault.is_none(), "U < 1 must be feasible under EDF");

    let mut checked = 0;
    replay(&events, |time, dispatch, pending| {
        if let Dispatch::Periodic(job) = dispatch {
            let chosen = pending[&job];
            let earliest = pending.values().cloned().fold(f64::INFINITY, f64::min);
            assert!(
                chosen <= earliest,
                "t={:.2}: ran deadline {} while {} was pending",
                time,
                chosen,
                earliest
            );
            checked += 1;
        }
    });
    assert!(checked > 1000);
}

#[test]
fn test_edf_schedules_what_rm_cannot() {
    // U = 0.97: P2 gets only 3 units before its deadline at 7 under RM
    let tasks = load("P 0 2 5\nP 0 4 7\n");

    let rm = Simulation::new(
        &tasks,
        SimulationConfig::new(Algorithm::RateMonotonic).with_duration(20.0),
    )
    .unwrap()
    .run();
    let edf = Simulation::new(
        &tasks,
        SimulationConfig::new(Algorithm::EarliestDeadlineFirst).with_duration(20.0),
    )
    .unwrap()
    .run();

    let miss = rm.fault.as_ref().expect("RM must miss");
    assert_eq!(miss.task_name, "P2");
    assert!(miss.time > 7.0 && miss.time < 7.05);
    assert!(edf.fault.is_none());
}

#[test]
fn test_llf_hysteresis_keeps_running_job() {
    let tasks = load("P 0 2 10\nP 0 2 10\n");
    let report = Simulation::new(
        &tasks,
        SimulationConfig::new(Algorithm::LeastLaxityFirst).with_duration(10.0),
    )
    .unwrap()
    .run();
    assert!(report.fault.is_none());

    // At t=0.01 P2's laxity is 0.01 better, within the threshold
    assert_eq!(report.trace.label_at(0.015), Some(&TraceLabel::Task("P1".into())));
    let first = &report.trace.intervals()[0];
    assert_eq!(first.label, TraceLabel::Task("P1".into()));
    assert!(
        first.duration() > 0.08 && first.duration() < 0.13,
        "first P1 run lasted {}",
        first.duration()
    );
    // Both jobs finish well before their deadline, in long runs
    assert!(report.trace.len() < 60, "{} intervals", report.trace.len());
    assert!(approx(report.trace.total_time("P1"), 2.0));
    assert!(approx(report.trace.total_time("P2"), 2.0));
}

#[test]
fn test_llf_without_hysteresis_thrashes() {
    let tasks = load("P 0 2 10\nP 0 2 10\n");
    let report = Simulation::new(
        &tasks,
        SimulationConfig::new(Algorithm::LeastLaxityFirst)
            .with_duration(10.0)
            .with_llf_threshold(0.0),
    )
    .unwrap()
    .run();

    assert!(report.fault.is_none());
    assert_eq!(report.trace.label_at(0.015), Some(&TraceLabel::Task("P2".into())));
    assert!(report.trace.len() > 150, "{} intervals", report.trace.len());
}
