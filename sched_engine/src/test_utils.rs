//! Test utilities for scheduling tests
//!
//! Builders and comparison helpers shared by the unit tests in this crate
//! and the integration tests in `tests_scheduling`.

use crate::config::SimulationConfig;
use crate::engine::{Simulation, SimulationReport};
use crate::trace::Trace;
use core_types::{SimTime, TaskSet, TaskSpec};

/// Tolerance used by [`approx`]
pub const TIME_TOLERANCE: f64 = 1e-6;

/// Builds a task set from specs
///
/// # Panics
///
/// Panics if a spec is invalid; test inputs are expected to be well-formed.
pub fn task_set(specs: Vec<TaskSpec>) -> TaskSet {
    let mut set = TaskSet::new();
    for spec in specs {
        if let Err(err) = set.push(spec) {
            panic!("invalid test task: {}", err);
        }
    }
    set
}

/// Builds periodic tasks `P1, P2, …` from `(execution, period)` pairs
///
/// Every task is released at 0 with its deadline equal to its period.
pub fn periodic_set(params: &[(SimTime, SimTime)]) -> TaskSet {
    task_set(
        params
            .iter()
            .enumerate()
            .map(|(i, &(exec, period))| {
                TaskSpec::periodic(format!("P{}", i + 1), 0.0, exec, period, period)
            })
            .collect(),
    )
}

/// Returns true if two instants are equal within [`TIME_TOLERANCE`]
pub fn approx(a: SimTime, b: SimTime) -> bool {
    (a - b).abs() < TIME_TOLERANCE
}

/// Builds and runs a simulation to the end
///
/// # Panics
///
/// Panics on an invalid configuration.
pub fn simulate(tasks: &TaskSet, config: SimulationConfig) -> SimulationReport {
    match Simulation::new(tasks, config) {
        Ok(sim) => sim.run(),
        Err(err) => panic!("invalid test configuration: {}", err),
    }
}

/// The `(start, end)` spans during which `label` ran
pub fn spans_of(trace: &Trace, label: &str) -> Vec<(SimTime, SimTime)> {
    trace
        .iter()
        .filter(|i| i.label.as_str() == label)
        .map(|i| (i.start, i.end))
        .collect()
}

/// Compact `label[start,end)` rendering, handy in assertion messages
pub fn describe(trace: &Trace) -> String {
    trace
        .iter()
        .map(|i| format!("{}[{:.2},{:.2})", i.label, i.start, i.end))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Algorithm;

    #[test]
    fn test_periodic_set_names_and_deadlines() {
        let set = periodic_set(&[(1.0, 4.0), (2.0, 6.0)]);
        let names: Vec<&str> = set.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["P1", "P2"]);
        assert!(set.iter().all(|t| t.relative_deadline == t.period));
    }

    #[test]
    fn test_spans_and_describe() {
        let report = simulate(
            &periodic_set(&[(1.0, 4.0)]),
            SimulationConfig::new(Algorithm::RateMonotonic).with_duration(2.0),
        );
        let spans = spans_of(&report.trace, "P1");
        assert_eq!(spans.len(), 1);
        assert!(approx(spans[0].1, 1.0));
        assert_eq!(describe(&report.trace), "P1[0.00,1.00) Idle[1.00,2.00)");
    }

    #[test]
    #[should_panic(expected = "invalid test task")]
    fn test_invalid_spec_panics() {
        task_set(vec![TaskSpec::periodic("P1", 0.0, 0.0, 4.0, 4.0)]);
    }
}
