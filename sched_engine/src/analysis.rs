//! # Feasibility Analysis
//!
//! Utilization-based schedulability checks for the periodic part of a task
//! set. The results are advisory: the simulation runs regardless and is the
//! ground truth for whether deadlines are met.
//!
//! ## Bounds
//!
//! - **RM / DM**: Liu & Layland. `n` periodic tasks with implicit deadlines
//!   are schedulable if `U ≤ n(2^(1/n) − 1)`. Above the bound and up to 1
//!   the answer needs the simulation.
//! - **EDF / LLF**: with implicit deadlines, `U ≤ 1` is exact. With
//!   constrained deadlines the density `Σ C/min(D, T)` is used instead.

use crate::config::Algorithm;
use core_types::{TaskSet, TaskSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total processor share demanded by the periodic specs
pub fn utilization(tasks: &TaskSet) -> f64 {
    tasks.total_utilization()
}

/// Sum of `C / min(D, T)` over the periodic specs
pub fn density(tasks: &TaskSet) -> f64 {
    tasks
        .periodic()
        .map(|t| t.execution / t.relative_deadline.min(t.period))
        .sum()
}

/// Liu & Layland utilization bound for `n` tasks
///
/// `1.0` for a single task, `0.0` for none.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    nf * (2.0_f64.powf(1.0 / nf) - 1.0)
}

/// Verdict of a utilization test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Schedulability {
    /// The bound proves every deadline is met
    Guaranteed,
    /// The bound neither proves nor refutes schedulability
    Inconclusive,
    /// Demand exceeds the processor; some deadline will be missed
    Overloaded,
}

impl fmt::Display for Schedulability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedulability::Guaranteed => write!(f, "guaranteed"),
            Schedulability::Inconclusive => write!(f, "inconclusive"),
            Schedulability::Overloaded => write!(f, "overloaded"),
        }
    }
}

/// Summary of the utilization tests for a task set under one policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub algorithm: Algorithm,
    pub periodic_tasks: usize,
    pub utilization: f64,
    pub density: f64,
    /// Bound the utilization was compared against
    pub bound: f64,
    pub verdict: Schedulability,
}

impl FeasibilityReport {
    /// Runs the test matching `algorithm`
    pub fn for_tasks(tasks: &TaskSet, algorithm: Algorithm) -> Self {
        let periodic_tasks = tasks.periodic().count();
        let utilization = utilization(tasks);
        let density = density(tasks);
        let implicit = tasks
            .periodic()
            .all(|t| t.relative_deadline >= t.period);

        let load = if implicit { utilization } else { density };
        let bound = if algorithm.is_dynamic() {
            1.0
        } else {
            liu_layland_bound(periodic_tasks)
        };

        let verdict = if utilization > 1.0 {
            Schedulability::Overloaded
        } else if periodic_tasks == 0 || load <= bound {
            Schedulability::Guaranteed
        } else {
            Schedulability::Inconclusive
        };

        Self {
            algorithm,
            periodic_tasks,
            utilization,
            density,
            bound,
            verdict,
        }
    }
}
