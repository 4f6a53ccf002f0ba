//! # Executor
//!
//! Applies one tick of execution to the unit chosen by the dispatcher.
//!
//! A unit never runs for more than the tick or more than it still owes.
//! Work that drops to within the tolerance of zero is retired: periodic
//! jobs leave the ready set, aperiodic work leaves the FIFO. Work run on
//! behalf of the server is also charged to the server budget, whether or
//! not it completed.

use crate::config::TimeBase;
use crate::dispatcher::Dispatch;
use crate::job::Job;
use crate::queue::{AperiodicQueue, ReadyQueue};
use crate::server::ServerModel;
use crate::trace::TraceLabel;
use core_types::{JobId, SimTime};
use log::debug;

/// Result of executing one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Label recorded in the trace for this tick
    pub label: TraceLabel,
    /// Job that ran, if any
    pub job: Option<JobId>,
    /// Processor time consumed
    pub used: SimTime,
    /// The job, if it completed during this tick
    pub completed: Option<Job>,
}

impl Execution {
    fn idle() -> Self {
        Self {
            label: TraceLabel::Idle,
            job: None,
            used: 0.0,
            completed: None,
        }
    }
}

/// Executes dispatch decisions against the run's queues
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    time_base: TimeBase,
}

impl Executor {
    pub fn new(time_base: TimeBase) -> Self {
        Self { time_base }
    }

    /// Runs the dispatched unit for one tick starting at `now`
    ///
    /// # Panics
    ///
    /// Panics if the dispatch names work that does not exist: a periodic
    /// job missing from the ready set, or server/background service with an
    /// empty aperiodic queue. Either means the dispatcher and the queues
    /// disagree.
    pub fn execute(
        &self,
        now: SimTime,
        dispatch: Dispatch,
        ready: &mut ReadyQueue,
        aperiodic: &mut AperiodicQueue,
        server: Option<&mut ServerModel>,
    ) -> Execution {
        match dispatch {
            Dispatch::Idle => Execution::idle(),
            Dispatch::Periodic(id) => {
                let Some(job) = ready.get_mut(id) else {
                    panic!("dispatched job {} is not in the ready set", id);
                };
                let used = job.run_for(self.time_base.tick);
                let label = TraceLabel::Task(job.name.clone());
                let completed = if self.time_base.is_exhausted(job.remaining) {
                    debug!("t={:.2} {} complete", now, id);
                    ready.remove(id)
                } else {
                    None
                };
                Execution {
                    label,
                    job: Some(id),
                    used,
                    completed,
                }
            }
            Dispatch::Server => {
                let Some(server) = server else {
                    panic!("server dispatch without a configured server");
                };
                let execution = self.run_aperiodic_head(now, dispatch, aperiodic);
                server.consume(execution.used);
                if execution.completed.is_none() && !server.has_budget(self.time_base.epsilon) {
                    debug!("t={:.2} server budget exhausted", now);
                }
                execution
            }
            Dispatch::Background => self.run_aperiodic_head(now, dispatch, aperiodic),
        }
    }

    fn run_aperiodic_head(
        &self,
        now: SimTime,
        dispatch: Dispatch,
        aperiodic: &mut AperiodicQueue,
    ) -> Execution {
        let Some(job) = aperiodic.head_mut() else {
            panic!(
                "{} dispatch with an empty aperiodic queue at t={:.2}",
                dispatch, now
            );
        };
        let used = job.run_for(self.time_base.tick);
        let id = job.id;
        let label = TraceLabel::Task(job.name.clone());
        let completed = if self.time_base.is_exhausted(job.remaining) {
            debug!("t={:.2} aperiodic {} complete", now, label);
            aperiodic.pop_head()
        } else {
            None
        };
        Execution {
            label,
            job: Some(id),
            used,
            completed,
        }
    }
}
