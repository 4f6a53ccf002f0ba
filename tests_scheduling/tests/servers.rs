//! Aperiodic Server Integration Tests
//!
//! These tests validate how aperiodic work is served:
//! - Background service only runs when no periodic job is ready
//! - Polling and deferrable servers run within their budget
//! - A poller forfeits its budget when the queue is empty at replenishment

use sched_engine::test_utils::{approx, describe, spans_of};
use sched_engine::{
    Algorithm, Dispatch, ServerConfig, ServerKind, Simulation, SimulationConfig, StepOutcome,
};
use tests_scheduling::{all_servers, audited, load, replay, run_audited};

fn run(text: &str, server: ServerConfig, duration: f64) -> sched_engine::SimulationReport {
    let config = SimulationConfig::new(Algorithm::RateMonotonic)
        .with_server(server)
        .with_duration(duration);
    Simulation::new(&load(text), config).unwrap().run()
}

#[test]
fn test_background_waits_for_idle_processor() {
    let tasks = load("P 0 2 5\nP 0 2 5\nA 5 2\n");
    let config = audited(Algorithm::RateMonotonic, 20.0).with_server(ServerConfig::background());
    let (report, events) = run_audited(&tasks, config);
    assert!(report.fault.is_none());

    let mut background_ticks = 0;
    replay(&events, |time, dispatch, pending| {
        if dispatch == Dispatch::Background {
            assert!(pending.is_empty(), "t={:.2}: background ran over {:?}", time, pending);
            background_ticks += 1;
        }
    });
    assert_eq!(background_ticks, 200);

    let a1 = spans_of(&report.trace, "A1");
    assert_eq!(a1.len(), 2);
    assert!(approx(a1[0].0, 9.0) && approx(a1[0].1, 10.0));
    assert!(approx(a1[1].0, 14.0) && approx(a1[1].1, 15.0));
    assert!(report.stats.replenishments == 0);
}

#[test]
fn test_servers_run_within_budget() {
    let text = "P 0 1 4\nA 2 1.5\n";
    for server in [ServerConfig::polling(1.0, 5.0), ServerConfig::deferrable(1.0, 5.0)] {
        let report = run(text, server, 6.0);
        assert_eq!(
            describe(&report.trace),
            "P1[0.00,1.00) Idle[1.00,2.00) A1[2.00,3.00) Idle[3.00,4.00) \
             P1[4.00,5.00) A1[5.00,5.50) Idle[5.50,6.00)",
            "{}",
            server.kind
        );
        assert_eq!(report.stats.replenishments, 1);
    }
}

#[test]
fn test_poller_forfeits_budget_deferrable_keeps_it() {
    let text = "P 0 1 4\nA 6 0.5\n";

    let poller = run(text, ServerConfig::polling(1.0, 5.0), 12.0);
    let a1 = spans_of(&poller.trace, "A1");
    assert_eq!(a1.len(), 1);
    assert!(approx(a1[0].0, 10.0) && approx(a1[0].1, 10.5));

    let deferrable = run(text, ServerConfig::deferrable(1.0, 5.0), 12.0);
    let a1 = spans_of(&deferrable.trace, "A1");
    assert_eq!(a1.len(), 1);
    assert!(approx(a1[0].0, 6.0) && approx(a1[0].1, 6.5));
}

#[test]
fn test_server_budget_stays_within_bounds() {
    let tasks = load("P 0 1 4\nP 0 1.5 6\nA 1.3 2.7\nA 7 1.2\nA 7.5 3\n");
    for server in &all_servers()[1..] {
        let config = SimulationConfig::new(Algorithm::EarliestDeadlineFirst)
            .with_server(*server)
            .with_duration(40.0);
        let mut sim = Simulation::new(&tasks, config).unwrap();

        let mut served = 0.0;
        while sim.step() == StepOutcome::Continue {
            let model = sim.server().unwrap();
            assert!(model.current_budget() >= 0.0);
            assert!(model.current_budget() <= model.full_budget() + 1e-9);
            assert!(model.next_replenishment() > sim.now() - 1e-9);
            if let Some(label) = sim.current_label() {
                if label.as_str().starts_with('A') {
                    served += 1.0;
                }
            }
        }
        assert!(served > 0.0);

        let report = sim.finish();
        assert!(report.fault.is_none(), "{}", server.kind);
        // 6.9 units of aperiodic work at 1 unit per 5
        let aperiodic: f64 = ["A1", "A2", "A3"]
            .iter()
            .map(|name| report.trace.total_time(name))
            .sum();
        assert!(approx(aperiodic, 6.9), "{}: served {}", server.kind, aperiodic);
        assert!(report.trace.end_time() <= 40.0 + 1e-9);
    }
}

#[test]
fn test_aperiodic_jobs_served_in_arrival_order() {
    let report = run(
        "P 0 1 4\nA 3 1\nA 1 1\n",
        ServerConfig::deferrable(1.0, 2.0),
        10.0,
    );
    let a1 = spans_of(&report.trace, "A1");
    let a2 = spans_of(&report.trace, "A2");
    assert!(a2[0].0 < a1[0].0, "A2 arrived first");
    assert!(approx(report.trace.total_time("A1"), 1.0));
    assert!(approx(report.trace.total_time("A2"), 1.0));
}

#[test]
fn test_unserved_aperiodic_never_misses() {
    // The server period is long enough that A1 never finishes
    let report = run("P 0 1 2\nA 0 5\n", ServerConfig::polling(0.5, 5.0), 12.0);
    assert!(report.fault.is_none());
    assert_eq!(report.server.kind, ServerKind::Polling);
    assert!(report.task("A1").unwrap().pending.len() == 1);
}
