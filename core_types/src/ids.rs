//! Identifiers for task definitions and their released instances

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a task definition
///
/// A `TaskId` is the position of the spec inside its [`TaskSet`](crate::TaskSet).
/// It is assigned once, when the spec is pushed, and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u32);

impl TaskId {
    /// Creates a task ID from a raw index
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the index of the spec in its set
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Identifier of a released job
///
/// The instance sequence starts at 1 for the first release of a spec and
/// grows by one with every release. It disambiguates overlapping instances
/// and plays no part in scheduling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId {
    /// The spec this job was released from
    pub task: TaskId,
    /// Per-spec instance sequence
    pub instance: u64,
}

impl JobId {
    /// Creates a job ID
    pub fn new(task: TaskId, instance: u64) -> Self {
        Self { task, instance }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({}#{})", self.task.0, self.instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_index() {
        let id = TaskId::new(3);
        assert_eq!(id.index(), 3);
        assert_eq!(id.to_string(), "Task(3)");
    }

    #[test]
    fn test_job_id_ordering() {
        let a = JobId::new(TaskId::new(0), 2);
        let b = JobId::new(TaskId::new(0), 3);
        let c = JobId::new(TaskId::new(1), 1);

        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "Job(0#2)");
    }

    #[test]
    fn test_job_id_serialization() {
        let id = JobId::new(TaskId::new(2), 7);
        let json = serde_json::to_string(&id).unwrap();
        let back: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
