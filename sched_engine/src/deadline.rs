//! Deadline monitoring
//!
//! Checked at the start of every tick, before any scheduling. The first
//! pending periodic job found past its absolute deadline ends the run.

use crate::config::TimeBase;
use crate::queue::ReadyQueue;
use core_types::{JobId, SimTime, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// First deadline violation of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineMiss {
    /// Offending spec
    pub task: TaskId,
    /// Name of the offending spec
    pub task_name: String,
    /// Offending job instance
    pub job: JobId,
    /// Deadline that was missed
    pub absolute_deadline: SimTime,
    /// Time the miss was detected
    pub time: SimTime,
}

impl fmt::Display for DeadlineMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} missed its deadline {:.2} (detected at {:.2})",
            self.task_name, self.absolute_deadline, self.time
        )
    }
}

/// Scans pending jobs for missed deadlines
#[derive(Debug, Clone, Copy)]
pub struct DeadlineMonitor {
    time_base: TimeBase,
}

impl DeadlineMonitor {
    pub fn new(time_base: TimeBase) -> Self {
        Self { time_base }
    }

    /// Returns the first pending job, in ready order, whose deadline has passed
    pub fn check(&self, now: SimTime, ready: &ReadyQueue) -> Option<DeadlineMiss> {
        ready
            .iter()
            .find(|job| self.time_base.is_past(job.absolute_deadline, now))
            .map(|job| DeadlineMiss {
                task: job.task(),
                task_name: job.name.clone(),
                job: job.id,
                absolute_deadline: job.absolute_deadline,
                time: now,
            })
    }
}
