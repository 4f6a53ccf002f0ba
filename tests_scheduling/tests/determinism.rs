//! Determinism and Cancellation Tests
//!
//! These tests validate reproducibility of runs:
//! - Identical inputs produce identical traces and reports
//! - Simulating never mutates the task set
//! - Cancellation stops at a tick boundary with a consistent report

use sched_engine::{
    Algorithm, CancelToken, ServerConfig, Simulation, SimulationConfig, StepOutcome, Termination,
};
use tests_scheduling::{all_servers, load};

const WORKLOAD: &str = "\
P 0 1 4
P 0.5 1.5 6 5
D 1 10 8
A 1.3 0.7
A 7 1.2
A 7.05 0.4
";

#[test]
fn test_repeated_runs_are_identical() {
    let tasks = load(WORKLOAD);
    for algorithm in Algorithm::ALL {
        for server in all_servers() {
            let config = SimulationConfig::new(algorithm)
                .with_server(server)
                .with_duration(40.0)
                .with_audit(true);

            let first = Simulation::new(&tasks, config.clone()).unwrap().run();
            let second = Simulation::new(&tasks, config).unwrap().run();

            assert_eq!(first.trace.fingerprint(), second.trace.fingerprint());
            assert_eq!(first, second);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }
}

#[test]
fn test_different_policies_differ() {
    let tasks = load(WORKLOAD);
    let poller = SimulationConfig::new(Algorithm::RateMonotonic)
        .with_server(ServerConfig::polling(1.0, 5.0))
        .with_duration(20.0);
    let deferrable = poller.clone().with_server(ServerConfig::deferrable(1.0, 5.0));

    let a = Simulation::new(&tasks, poller).unwrap().run();
    let b = Simulation::new(&tasks, deferrable).unwrap().run();
    assert_ne!(a.trace.fingerprint(), b.trace.fingerprint());
}

#[test]
fn test_simulation_leaves_task_set_untouched() {
    let tasks = load(WORKLOAD);
    let before = tasks.clone();

    let config = SimulationConfig::new(Algorithm::LeastLaxityFirst)
        .with_server(ServerConfig::deferrable(1.0, 5.0))
        .with_duration(30.0);
    let report = Simulation::new(&tasks, config).unwrap().run();

    assert_eq!(tasks, before);
    let specs: Vec<_> = report.tasks.iter().map(|t| t.spec.clone()).collect();
    assert_eq!(specs.as_slice(), before.as_slice());
}

#[test]
fn test_cancel_between_ticks() {
    let tasks = load(WORKLOAD);
    let config = SimulationConfig::new(Algorithm::EarliestDeadlineFirst).with_duration(40.0);
    let mut sim = Simulation::new(&tasks, config.clone()).unwrap();
    for _ in 0..250 {
        assert_eq!(sim.step(), StepOutcome::Continue);
    }

    let cancel = CancelToken::new();
    cancel.clone().cancel();
    let report = sim.run_until_cancelled(&cancel);

    assert_eq!(report.termination, Termination::Cancelled);
    assert!((report.end_time - 2.5).abs() < 1e-9);
    assert_eq!(report.stats.ticks, 250);
    assert!(report.trace.is_well_formed());
    assert_eq!(report.trace.end_time(), report.end_time);

    // The cancelled prefix matches the same prefix of a full run
    let full = Simulation::new(&tasks, config).unwrap().run();
    for interval in report.trace.iter().take(report.trace.len() - 1) {
        assert!(full.trace.intervals().contains(interval), "{:?}", interval);
    }
}

#[test]
fn test_cancel_before_first_tick() {
    let tasks = load(WORKLOAD);
    let cancel = CancelToken::new();
    cancel.cancel();
    let report = Simulation::new(&tasks, SimulationConfig::new(Algorithm::RateMonotonic))
        .unwrap()
        .run_until_cancelled(&cancel);

    assert_eq!(report.termination, Termination::Cancelled);
    assert_eq!(report.end_time, 0.0);
    assert!(report.trace.is_empty());
    assert!(report.tasks.iter().all(|t| t.jobs_released == 0));
}
