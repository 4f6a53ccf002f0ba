//! Task definitions
//!
//! A [`TaskSpec`] describes a periodic or aperiodic task exactly as it was
//! declared in the input. A [`TaskSet`] owns the specs a simulation is built
//! from and hands out their [`TaskId`]s.

use crate::ids::TaskId;
use crate::SimTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Relative deadline given to aperiodic tasks
///
/// Aperiodic work has no real deadline; this sentinel keeps it well behind
/// any periodic deadline in priority comparisons.
pub const APERIODIC_DEADLINE: SimTime = 99999.0;

/// Errors raised when building or validating task definitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskSpecError {
    #[error("Task {task}: invalid {field} value {value}")]
    InvalidValue {
        task: String,
        field: &'static str,
        value: f64,
    },

    #[error("Duplicate task name: {0}")]
    DuplicateName(String),
}

/// Kind of task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// Released every `period` time units starting at `release`
    Periodic,
    /// Released once, at `release`
    Aperiodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Periodic => write!(f, "Periodic"),
            TaskKind::Aperiodic => write!(f, "Aperiodic"),
        }
    }
}

/// Immutable task definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Identifier, assigned when the spec joins a [`TaskSet`]
    pub id: TaskId,
    /// Unique name, also used as the trace label
    pub name: String,
    /// First release time
    pub release: SimTime,
    /// Computation time of every instance
    pub execution: SimTime,
    /// Release period (0 for aperiodic tasks)
    pub period: SimTime,
    /// Deadline relative to each release
    pub relative_deadline: SimTime,
    /// Periodic or aperiodic
    pub kind: TaskKind,
}

impl TaskSpec {
    /// Creates a periodic task definition
    ///
    /// The ID is a placeholder until the spec is pushed into a [`TaskSet`].
    pub fn periodic(
        name: impl Into<String>,
        release: SimTime,
        execution: SimTime,
        period: SimTime,
        relative_deadline: SimTime,
    ) -> Self {
        Self {
            id: TaskId::new(0),
            name: name.into(),
            release,
            execution,
            period,
            relative_deadline,
            kind: TaskKind::Periodic,
        }
    }

    /// Creates an aperiodic task definition
    pub fn aperiodic(name: impl Into<String>, release: SimTime, execution: SimTime) -> Self {
        Self {
            id: TaskId::new(0),
            name: name.into(),
            release,
            execution,
            period: 0.0,
            relative_deadline: APERIODIC_DEADLINE,
            kind: TaskKind::Aperiodic,
        }
    }

    /// Returns true for periodic tasks
    pub fn is_periodic(&self) -> bool {
        self.kind == TaskKind::Periodic
    }

    /// Processor share demanded by this task (0 for aperiodic tasks)
    pub fn utilization(&self) -> f64 {
        match self.kind {
            TaskKind::Periodic => self.execution / self.period,
            TaskKind::Aperiodic => 0.0,
        }
    }

    /// Checks that every field is within range
    pub fn validate(&self) -> Result<(), TaskSpecError> {
        let invalid = |field: &'static str, value: f64| TaskSpecError::InvalidValue {
            task: self.name.clone(),
            field,
            value,
        };

        if !self.release.is_finite() || self.release < 0.0 {
            return Err(invalid("release", self.release));
        }
        if !self.execution.is_finite() || self.execution <= 0.0 {
            return Err(invalid("execution", self.execution));
        }
        if self.is_periodic() {
            if !self.period.is_finite() || self.period <= 0.0 {
                return Err(invalid("period", self.period));
            }
            if !self.relative_deadline.is_finite() || self.relative_deadline <= 0.0 {
                return Err(invalid("deadline", self.relative_deadline));
            }
        }

        Ok(())
    }
}

/// Ordered collection of task definitions
///
/// Specs keep the order they were pushed in; that order is also the
/// tie-break order used by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSet {
    tasks: Vec<TaskSpec>,
}

impl TaskSet {
    /// Creates an empty task set
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Validates a spec, assigns it the next ID and appends it
    pub fn push(&mut self, mut spec: TaskSpec) -> Result<TaskId, TaskSpecError> {
        spec.validate()?;
        if self.tasks.iter().any(|t| t.name == spec.name) {
            return Err(TaskSpecError::DuplicateName(spec.name));
        }

        let id = TaskId::new(self.tasks.len() as u32);
        spec.id = id;
        self.tasks.push(spec);
        Ok(id)
    }

    /// Looks up a spec by ID
    pub fn get(&self, id: TaskId) -> Option<&TaskSpec> {
        self.tasks.get(id.index())
    }

    /// Iterates over all specs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.iter()
    }

    /// Iterates over the periodic specs
    pub fn periodic(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.iter().filter(|t| t.kind == TaskKind::Periodic)
    }

    /// Iterates over the aperiodic specs
    pub fn aperiodic(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.iter().filter(|t| t.kind == TaskKind::Aperiodic)
    }

    /// Returns the number of specs
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if the set holds no specs
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Sum of the periodic utilizations
    pub fn total_utilization(&self) -> f64 {
        self.periodic().map(TaskSpec::utilization).sum()
    }

    /// Returns the specs as a slice
    pub fn as_slice(&self) -> &[TaskSpec] {
        &self.tasks
    }
}

impl<'a> IntoIterator for &'a TaskSet {
    type Item = &'a TaskSpec;
    type IntoIter = std::slice::Iter<'a, TaskSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_constructor() {
        let spec = TaskSpec::periodic("P1", 0.0, 1.0, 4.0, 4.0);
        assert!(spec.is_periodic());
        assert_eq!(spec.utilization(), 0.25);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_aperiodic_constructor() {
        let spec = TaskSpec::aperiodic("A1", 5.0, 2.0);
        assert_eq!(spec.kind, TaskKind::Aperiodic);
        assert_eq!(spec.period, 0.0);
        assert_eq!(spec.relative_deadline, APERIODIC_DEADLINE);
        assert_eq!(spec.utilization(), 0.0);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_execution() {
        let spec = TaskSpec::periodic("P1", 0.0, 0.0, 4.0, 4.0);
        assert!(matches!(
            spec.validate(),
            Err(TaskSpecError::InvalidValue {
                field: "execution",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_release() {
        let spec = TaskSpec::aperiodic("A1", -1.0, 2.0);
        assert!(matches!(
            spec.validate(),
            Err(TaskSpecError::InvalidValue {
                field: "release",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let spec = TaskSpec::periodic("P1", 0.0, 1.0, 0.0, 4.0);
        assert!(spec.validate().is_err());

        let spec = TaskSpec::periodic("P1", 0.0, 1.0, 4.0, f64::NAN);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_task_set_assigns_ids_in_order() {
        let mut set = TaskSet::new();
        let a = set.push(TaskSpec::periodic("P1", 0.0, 1.0, 4.0, 4.0)).unwrap();
        let b = set.push(TaskSpec::aperiodic("A1", 5.0, 2.0)).unwrap();

        assert_eq!(a, TaskId::new(0));
        assert_eq!(b, TaskId::new(1));
        assert_eq!(set.get(b).unwrap().name, "A1");
        assert_eq!(set.periodic().count(), 1);
        assert_eq!(set.aperiodic().count(), 1);
    }

    #[test]
    fn test_task_set_rejects_duplicate_names() {
        let mut set = TaskSet::new();
        set.push(TaskSpec::periodic("P1", 0.0, 1.0, 4.0, 4.0)).unwrap();
        let result = set.push(TaskSpec::periodic("P1", 0.0, 2.0, 6.0, 6.0));
        assert_eq!(result, Err(TaskSpecError::DuplicateName("P1".to_string())));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_total_utilization_ignores_aperiodic() {
        let mut set = TaskSet::new();
        set.push(TaskSpec::periodic("P1", 0.0, 1.0, 4.0, 4.0)).unwrap();
        set.push(TaskSpec::periodic("P2", 0.0, 2.0, 8.0, 8.0)).unwrap();
        set.push(TaskSpec::aperiodic("A1", 1.0, 3.0)).unwrap();

        assert!((set.total_utilization() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_spec_serialization() {
        let spec = TaskSpec::periodic("P1", 0.0, 1.0, 4.0, 3.0);
        let json = serde_json::to_string(&spec).unwrap();
        let back: TaskSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }
}
