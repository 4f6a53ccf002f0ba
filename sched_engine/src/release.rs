//! # Release Manager
//!
//! Decides, at every tick, which specs put new work in front of the
//! dispatcher.
//!
//! ## Rules
//!
//! - **Periodic**: at most one job per spec is released per tick, when the
//!   tracked next-release time is due. The next-release time then moves
//!   forward by exactly one period, never to "now", so release instants do
//!   not drift. A period shorter than the tick falls behind instead of
//!   flooding the ready set. Earlier
//!   instances that are still running are left alone: overlapping jobs of
//!   one spec are allowed.
//! - **Aperiodic**: the spec's single unit of work is armed on the tick its
//!   release time falls on and joins the aperiodic FIFO.

use crate::clock::SimClock;
use crate::job::Job;
use crate::queue::{AperiodicQueue, ReadyQueue};
use core_types::{JobId, SimTime, TaskId, TaskKind, TaskSet, TaskSpec};
use log::debug;

/// Per-spec release bookkeeping
#[derive(Debug, Clone)]
struct ReleaseTracker {
    spec: TaskSpec,
    next_release: SimTime,
    released: u64,
}

/// Release bookkeeping for every spec of a run
///
/// The manager owns private copies of the specs, so the caller's
/// [`TaskSet`] is never mutated.
#[derive(Debug, Clone)]
pub struct ReleaseManager {
    trackers: Vec<ReleaseTracker>,
}

impl ReleaseManager {
    /// Creates trackers for every spec in the set
    pub fn new(tasks: &TaskSet) -> Self {
        let trackers = tasks
            .iter()
            .map(|spec| ReleaseTracker {
                spec: spec.clone(),
                next_release: spec.release,
                released: 0,
            })
            .collect();
        Self { trackers }
    }

    /// Releases every job that is due at the current tick
    ///
    /// Periodic jobs are appended to `ready`; aperiodic work is armed in
    /// `aperiodic`. Returns the IDs of the jobs released, in spec order.
    pub fn release_due(
        &mut self,
        clock: &SimClock,
        ready: &mut ReadyQueue,
        aperiodic: &mut AperiodicQueue,
    ) -> Vec<JobId> {
        let now = clock.now();
        let time_base = *clock.time_base();
        let mut released = Vec::new();

        for tracker in &mut self.trackers {
            match tracker.spec.kind {
                TaskKind::Periodic => {
                    if time_base.is_due(tracker.next_release, now) {
                        tracker.released += 1;
                        let job = Job::release(&tracker.spec, tracker.released, tracker.next_release);
                        debug!(
                            "t={:.2} release {} #{} (deadline {:.2})",
                            now, job.name, job.id.instance, job.absolute_deadline
                        );
                        released.push(job.id);
                        ready.push(job);
                        tracker.next_release += tracker.spec.period;
                    }
                }
                TaskKind::Aperiodic => {
                    if clock.is_at(tracker.spec.release) {
                        tracker.released += 1;
                        let job = Job::release(&tracker.spec, tracker.released, now);
                        debug!("t={:.2} arm aperiodic {}", now, job.name);
                        released.push(job.id);
                        aperiodic.arm(job);
                    }
                }
            }
        }

        released
    }

    /// Next release instant of a spec
    ///
    /// For aperiodic specs this is their one release time.
    pub fn next_release(&self, task: TaskId) -> Option<SimTime> {
        self.trackers.get(task.index()).map(|t| t.next_release)
    }

    /// Number of jobs released so far for a spec
    pub fn released(&self, task: TaskId) -> u64 {
        self.trackers
            .get(task.index())
            .map(|t| t.released)
            .unwrap_or(0)
    }

    /// The run's working copies of the specs
    pub fn specs(&self) -> impl Iterator<Item = &TaskSpec> {
        self.trackers.iter().map(|t| &t.spec)
    }
}
