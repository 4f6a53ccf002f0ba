//! # Dispatcher
//!
//! Picks the single unit of work that runs during a tick.
//!
//! ## Policies
//!
//! Candidates are sorted ascending by a per-policy key with a stable sort,
//! so the first candidate in ready-set order wins ties:
//!
//! | Policy | Key |
//! |---|---|
//! | RM  | period |
//! | DM  | relative deadline |
//! | EDF | absolute deadline |
//! | LLF | laxity = absolute deadline − now − remaining |
//!
//! The aperiodic server competes as a [`Candidate::Server`]: its period,
//! its current deadline and its remaining budget stand in for the job
//! fields. LLF adds hysteresis: the job picked on the previous tick keeps
//! the processor while its laxity is within `llf_threshold` of the best.

use crate::config::Algorithm;
use crate::job::Job;
use crate::queue::{AperiodicQueue, ReadyQueue};
use crate::server::ServerModel;
use core_types::{JobId, SimTime};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contender for the processor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate {
    /// A ready periodic job
    Job {
        id: JobId,
        period: SimTime,
        relative_deadline: SimTime,
        absolute_deadline: SimTime,
        remaining: SimTime,
    },
    /// The aperiodic server standing in for the head of the aperiodic FIFO
    Server {
        period: SimTime,
        deadline: SimTime,
        budget: SimTime,
    },
}

impl Candidate {
    fn from_job(job: &Job) -> Self {
        Candidate::Job {
            id: job.id,
            period: job.period,
            relative_deadline: job.relative_deadline,
            absolute_deadline: job.absolute_deadline,
            remaining: job.remaining,
        }
    }

    fn from_server(server: &ServerModel) -> Self {
        Candidate::Server {
            period: server.period(),
            deadline: server.deadline(),
            budget: server.current_budget(),
        }
    }

    /// Slack before the candidate's deadline becomes unmeetable
    ///
    /// For the server, the remaining budget stands in for remaining work.
    pub fn laxity(&self, now: SimTime) -> f64 {
        match *self {
            Candidate::Job {
                absolute_deadline,
                remaining,
                ..
            } => absolute_deadline - now - remaining,
            Candidate::Server {
                deadline, budget, ..
            } => deadline - now - budget,
        }
    }

    /// Sort key under a policy; smaller runs first
    pub fn key(&self, algorithm: Algorithm, now: SimTime) -> OrderedFloat<f64> {
        let value = match (algorithm, *self) {
            (Algorithm::RateMonotonic, Candidate::Job { period, .. })
            | (Algorithm::RateMonotonic, Candidate::Server { period, .. }) => period,
            (
                Algorithm::DeadlineMonotonic,
                Candidate::Job {
                    relative_deadline, ..
                },
            ) => relative_deadline,
            // The server's relative deadline is its period
            (Algorithm::DeadlineMonotonic, Candidate::Server { period, .. }) => period,
            (
                Algorithm::EarliestDeadlineFirst,
                Candidate::Job {
                    absolute_deadline, ..
                },
            ) => absolute_deadline,
            (Algorithm::EarliestDeadlineFirst, Candidate::Server { deadline, .. }) => deadline,
            (Algorithm::LeastLaxityFirst, candidate) => candidate.laxity(now),
        };
        OrderedFloat(value)
    }

    /// Job ID for periodic candidates
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Candidate::Job { id, .. } => Some(*id),
            Candidate::Server { .. } => None,
        }
    }
}

/// Outcome of a dispatch decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dispatch {
    /// Run a ready periodic job
    Periodic(JobId),
    /// The server won; run the head of the aperiodic FIFO on its budget
    Server,
    /// No periodic work and no server; run the aperiodic head in the background
    Background,
    /// Nothing to run
    Idle,
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Periodic(id) => write!(f, "{}", id),
            Dispatch::Server => write!(f, "Server"),
            Dispatch::Background => write!(f, "Background"),
            Dispatch::Idle => write!(f, "Idle"),
        }
    }
}

/// Per-run dispatch state
#[derive(Debug, Clone)]
pub struct Dispatcher {
    algorithm: Algorithm,
    llf_threshold: f64,
    /// Job chosen on the previous tick, for LLF hysteresis
    previous: Option<JobId>,
}

impl Dispatcher {
    /// Creates a dispatcher for a policy
    pub fn new(algorithm: Algorithm, llf_threshold: f64) -> Self {
        Self {
            algorithm,
            llf_threshold,
            previous: None,
        }
    }

    /// Builds the candidate list for this tick
    ///
    /// The server joins only while aperiodic work is queued and its budget
    /// is not exhausted. It is always last, so equal keys favour periodic
    /// jobs.
    pub fn candidates(
        &self,
        ready: &ReadyQueue,
        server: Option<&ServerModel>,
        aperiodic: &AperiodicQueue,
        epsilon: SimTime,
    ) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = ready.iter().map(Candidate::from_job).collect();
        if let Some(server) = server {
            if !aperiodic.is_empty() && server.has_budget(epsilon) {
                candidates.push(Candidate::from_server(server));
            }
        }
        candidates
    }

    /// Chooses what runs during the tick starting at `now`
    pub fn select(
        &mut self,
        now: SimTime,
        ready: &ReadyQueue,
        server: Option<&ServerModel>,
        aperiodic: &AperiodicQueue,
        epsilon: SimTime,
    ) -> Dispatch {
        let mut candidates = self.candidates(ready, server, aperiodic, epsilon);

        let dispatch = if candidates.is_empty() {
            if server.is_none() && !aperiodic.is_empty() {
                Dispatch::Background
            } else {
                Dispatch::Idle
            }
        } else {
            let algorithm = self.algorithm;
            candidates.sort_by_key(|c| c.key(algorithm, now));
            let chosen = match algorithm {
                Algorithm::LeastLaxityFirst => self.apply_hysteresis(now, &candidates),
                _ => candidates[0],
            };
            match chosen {
                Candidate::Job { id, .. } => Dispatch::Periodic(id),
                Candidate::Server { .. } => Dispatch::Server,
            }
        };

        self.previous = match dispatch {
            Dispatch::Periodic(id) => Some(id),
            _ => None,
        };
        dispatch
    }

    /// Keeps the previous job if it is still ready and nearly as urgent
    fn apply_hysteresis(&self, now: SimTime, sorted: &[Candidate]) -> Candidate {
        let best = sorted[0];
        let Some(previous) = self.previous else {
            return best;
        };
        let Some(current) = sorted.iter().find(|c| c.job_id() == Some(previous)) else {
            return best;
        };

        if current.laxity(now) - best.laxity(now) < self.llf_threshold {
            *current
        } else {
            best
        }
    }

    /// Clears the hysteresis memory after a completion
    pub fn forget(&mut self) {
        self.previous = None;
    }

    /// Job chosen on the previous tick, if any
    pub fn previous(&self) -> Option<JobId> {
        self.previous
    }

    /// Active policy
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}
