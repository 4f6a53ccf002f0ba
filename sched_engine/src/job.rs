//! Released job instances
//!
//! A [`Job`] is the mutable execution state of one release of a
//! [`TaskSpec`]. It copies the scalar fields it needs from its spec so the
//! spec itself is never touched during a run.

use core_types::{JobId, SimTime, TaskId, TaskKind, TaskSpec};
use serde::{Deserialize, Serialize};

/// One released instance of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Spec and instance sequence
    pub id: JobId,
    /// Name of the originating spec
    pub name: String,
    /// Kind of the originating spec
    pub kind: TaskKind,
    /// Computation time of a full instance
    pub execution: SimTime,
    /// Period of the originating spec
    pub period: SimTime,
    /// Deadline relative to the release
    pub relative_deadline: SimTime,
    /// Instant this instance was released
    pub release_time: SimTime,
    /// `release_time + relative_deadline`, fixed at creation
    pub absolute_deadline: SimTime,
    /// Computation still owed; never negative
    pub remaining: SimTime,
}

impl Job {
    /// Creates the `instance`-th job of a spec, released at `release_time`
    pub fn release(spec: &TaskSpec, instance: u64, release_time: SimTime) -> Self {
        Self {
            id: JobId::new(spec.id, instance),
            name: spec.name.clone(),
            kind: spec.kind,
            execution: spec.execution,
            period: spec.period,
            relative_deadline: spec.relative_deadline,
            release_time,
            absolute_deadline: release_time + spec.relative_deadline,
            remaining: spec.execution,
        }
    }

    /// Returns the spec this job belongs to
    pub fn task(&self) -> TaskId {
        self.id.task
    }

    /// Slack left before the deadline becomes unmeetable
    pub fn laxity(&self, now: SimTime) -> f64 {
        self.absolute_deadline - now - self.remaining
    }

    /// Executes for up to `amount` and returns the time actually used
    pub fn run_for(&mut self, amount: SimTime) -> SimTime {
        let used = amount.min(self.remaining).max(0.0);
        self.remaining -= used;
        used
    }

    /// Restores the full computation time
    pub fn rearm(&mut self) {
        self.remaining = self.execution;
    }
}
