//! # Simulation Driver
//!
//! Owns every piece of mutable state of one run and advances it tick by
//! tick.
//!
//! ## Tick Order
//!
//! 1. Deadline check: a pending job past its deadline ends the run.
//! 2. Releases: due periodic jobs and aperiodic arrivals.
//! 3. Server replenishment.
//! 4. Dispatch.
//! 5. Execution of the chosen unit for one tick.
//! 6. Trace recording, then the clock advances.
//!
//! ## Ownership
//!
//! A [`Simulation`] clones the task definitions it is given. Two runs built
//! from the same [`TaskSet`] share nothing and produce identical traces.

use crate::analysis::{FeasibilityReport, Schedulability};
use crate::clock::SimClock;
use crate::config::{Algorithm, ConfigError, ServerConfig, SimulationConfig};
use crate::deadline::{DeadlineMiss, DeadlineMonitor};
use crate::dispatcher::{Dispatch, Dispatcher};
use crate::executor::Executor;
use crate::job::Job;
use crate::queue::{AperiodicQueue, ReadyQueue};
use crate::release::ReleaseManager;
use crate::server::ServerModel;
use crate::trace::{Trace, TraceLabel, TraceLogger};
use core_types::{JobId, SimTime, TaskSet, TaskSpec};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// External stop request, honoured between ticks
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the run to stop after the current tick
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The configured duration was reached
    Completed,
    /// A job missed its deadline
    DeadlineMiss,
    /// A [`CancelToken`] stopped the run
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Completed => write!(f, "completed"),
            Termination::DeadlineMiss => write!(f, "deadline miss"),
            Termination::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of a single [`Simulation::step`]
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The tick ran; more ticks remain
    Continue,
    /// The run is over without a deadline miss
    Finished,
    /// The run ended on a deadline miss
    Faulted(DeadlineMiss),
}

/// Counters collected over a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Ticks executed
    pub ticks: u64,
    /// Times the processor moved from one job to a different one
    pub context_switches: u64,
    /// Periodic releases plus aperiodic arrivals
    pub jobs_released: u64,
    pub jobs_completed: u64,
    /// Server replenishments
    pub replenishments: u64,
    /// Time no work ran
    pub idle_time: SimTime,
}

/// Final state of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub spec: TaskSpec,
    /// Next release instant (the release time for aperiodic tasks)
    pub next_release: SimTime,
    pub jobs_released: u64,
    pub jobs_completed: u64,
    /// Work still owed when the run ended
    pub pending: Vec<Job>,
}

/// Everything a run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub algorithm: Algorithm,
    pub server: ServerConfig,
    pub trace: Trace,
    pub tasks: Vec<TaskReport>,
    pub fault: Option<DeadlineMiss>,
    pub termination: Termination,
    pub end_time: SimTime,
    pub stats: RunStats,
    pub feasibility: FeasibilityReport,
}

impl SimulationReport {
    /// Returns true if the run ended on a deadline miss
    pub fn missed_deadline(&self) -> bool {
        self.fault.is_some()
    }

    /// Looks up a task's final state by name
    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.spec.name == name)
    }
}

/// Scheduling event for the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    /// A periodic job joined the ready set
    JobReleased {
        job: JobId,
        time: SimTime,
        absolute_deadline: SimTime,
    },
    /// Aperiodic work was armed
    AperiodicArmed { job: JobId, time: SimTime },
    /// The server budget was refilled
    ServerReplenished {
        time: SimTime,
        budget: SimTime,
        deadline: SimTime,
    },
    /// The dispatcher chose what runs during the tick at `time`
    Dispatched { time: SimTime, dispatch: Dispatch },
    /// A job finished at the end of the tick starting at `time`
    JobCompleted { job: JobId, time: SimTime },
    /// The run ended on a missed deadline
    DeadlineMissed { job: JobId, time: SimTime },
}

/// One simulation run
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    clock: SimClock,
    end_tick: u64,
    releases: ReleaseManager,
    ready: ReadyQueue,
    aperiodic: AperiodicQueue,
    server: Option<ServerModel>,
    dispatcher: Dispatcher,
    executor: Executor,
    monitor: DeadlineMonitor,
    trace: TraceLogger,
    feasibility: FeasibilityReport,
    fault: Option<DeadlineMiss>,
    termination: Option<Termination>,
    stats: RunStats,
    idle_ticks: u64,
    completed: Vec<u64>,
    last_job: Option<JobId>,
    audit_log: Vec<ScheduleEvent>,
}

impl Simulation {
    /// Prepares a run over private copies of `tasks`
    pub fn new(tasks: &TaskSet, config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let feasibility = FeasibilityReport::for_tasks(tasks, config.algorithm);
        info!(
            "Simulating {} tasks under {} with {} service for {:.2} time units",
            tasks.len(),
            config.algorithm,
            config.server.kind,
            config.duration
        );
        match feasibility.verdict {
            Schedulability::Overloaded => warn!(
                "Periodic utilization {:.3} exceeds 1; deadline misses are expected",
                feasibility.utilization
            ),
            Schedulability::Inconclusive => info!(
                "Periodic load {:.3} is above the {:.3} bound; schedulability depends on the run",
                feasibility.utilization, feasibility.bound
            ),
            Schedulability::Guaranteed => debug!(
                "Periodic load {:.3} within the {:.3} bound",
                feasibility.utilization, feasibility.bound
            ),
        }

        let time_base = config.time_base;
        Ok(Self {
            clock: SimClock::new(time_base),
            end_tick: time_base.ticks_in(config.duration),
            releases: ReleaseManager::new(tasks),
            ready: ReadyQueue::new(),
            aperiodic: AperiodicQueue::new(),
            server: ServerModel::from_config(&config.server),
            dispatcher: Dispatcher::new(config.algorithm, config.llf_threshold),
            executor: Executor::new(time_base),
            monitor: DeadlineMonitor::new(time_base),
            trace: TraceLogger::new(),
            feasibility,
            fault: None,
            termination: None,
            stats: RunStats::default(),
            idle_ticks: 0,
            completed: vec![0; tasks.len()],
            last_job: None,
            audit_log: Vec::new(),
            config,
        })
    }

    /// Executes one tick
    ///
    /// Once the run has ended, further calls change nothing and repeat the
    /// final outcome.
    pub fn step(&mut self) -> StepOutcome {
        if let Some(termination) = self.termination {
            return self.outcome_of(termination);
        }
        if self.clock.current_ticks() >= self.end_tick {
            self.termination = Some(Termination::Completed);
            info!("Run completed at t={:.2}", self.clock.now());
            return StepOutcome::Finished;
        }

        let now = self.clock.now();
        let epsilon = self.config.time_base.epsilon;

        if let Some(miss) = self.monitor.check(now, &self.ready) {
            warn!("Deadline miss: {}", miss);
            self.record(ScheduleEvent::DeadlineMissed {
                job: miss.job,
                time: now,
            });
            self.fault = Some(miss.clone());
            self.termination = Some(Termination::DeadlineMiss);
            return StepOutcome::Faulted(miss);
        }

        let released = self
            .releases
            .release_due(&self.clock, &mut self.ready, &mut self.aperiodic);
        self.stats.jobs_released += released.len() as u64;
        if self.config.audit {
            for job in released {
                let event = match self.ready.get(job) {
                    Some(j) => ScheduleEvent::JobReleased {
                        job,
                        time: now,
                        absolute_deadline: j.absolute_deadline,
                    },
                    None => ScheduleEvent::AperiodicArmed { job, time: now },
                };
                self.audit_log.push(event);
            }
        }

        let work_waiting = !self.aperiodic.is_empty();
        if let Some(server) = self.server.as_mut() {
            if server.replenish_if_due(&self.clock, work_waiting) {
                self.stats.replenishments += 1;
                let event = ScheduleEvent::ServerReplenished {
                    time: now,
                    budget: server.current_budget(),
                    deadline: server.deadline(),
                };
                self.record(event);
            }
        }

        let dispatch =
            self.dispatcher
                .select(now, &self.ready, self.server.as_ref(), &self.aperiodic, epsilon);
        self.record(ScheduleEvent::Dispatched {
            time: now,
            dispatch,
        });

        let execution = self.executor.execute(
            now,
            dispatch,
            &mut self.ready,
            &mut self.aperiodic,
            self.server.as_mut(),
        );

        match execution.job {
            Some(job) => {
                if self.last_job.is_some_and(|last| last != job) {
                    self.stats.context_switches += 1;
                }
                self.last_job = Some(job);
            }
            None => self.idle_ticks += 1,
        }

        if let Some(done) = &execution.completed {
            self.dispatcher.forget();
            self.stats.jobs_completed += 1;
            if let Some(count) = self.completed.get_mut(done.task().index()) {
                *count += 1;
            }
            self.record(ScheduleEvent::JobCompleted {
                job: done.id,
                time: now,
            });
        }

        self.trace.record(now, execution.label);
        self.clock.advance();
        self.stats.ticks += 1;
        StepOutcome::Continue
    }

    /// Runs to completion or to the first deadline miss
    pub fn run(self) -> SimulationReport {
        self.run_until_cancelled(&CancelToken::new())
    }

    /// Runs until completion, a deadline miss, or cancellation
    ///
    /// Cancellation is checked between ticks; a tick in progress always
    /// finishes.
    pub fn run_until_cancelled(mut self, cancel: &CancelToken) -> SimulationReport {
        while self.termination.is_none() {
            if cancel.is_cancelled() {
                info!("Run cancelled at t={:.2}", self.clock.now());
                self.termination = Some(Termination::Cancelled);
                break;
            }
            self.step();
        }
        self.finish()
    }

    /// Ends the run where it stands and builds the report
    ///
    /// A run that has not terminated yet is reported as cancelled.
    pub fn finish(self) -> SimulationReport {
        let end_time = self.clock.now();
        let termination = self.termination.unwrap_or(Termination::Cancelled);
        let time_base = self.config.time_base;

        let tasks = self
            .releases
            .specs()
            .map(|spec| {
                let pending = self
                    .ready
                    .jobs_of(spec.id)
                    .chain(self.aperiodic.iter().filter(|j| j.task() == spec.id))
                    .cloned()
                    .collect();
                TaskReport {
                    spec: spec.clone(),
                    next_release: self.releases.next_release(spec.id).unwrap_or(spec.release),
                    jobs_released: self.releases.released(spec.id),
                    jobs_completed: self.completed.get(spec.id.index()).copied().unwrap_or(0),
                    pending,
                }
            })
            .collect();

        let stats = RunStats {
            idle_time: time_base.time_at(self.idle_ticks),
            ..self.stats
        };

        SimulationReport {
            algorithm: self.config.algorithm,
            server: self.config.server,
            trace: self.trace.finish(end_time),
            tasks,
            fault: self.fault,
            termination,
            end_time,
            stats,
            feasibility: self.feasibility,
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// Ticks executed so far
    pub fn current_ticks(&self) -> u64 {
        self.clock.current_ticks()
    }

    /// Released periodic jobs still pending
    pub fn ready(&self) -> &ReadyQueue {
        &self.ready
    }

    /// Armed aperiodic work
    pub fn aperiodic_queue(&self) -> &AperiodicQueue {
        &self.aperiodic
    }

    /// Server state, absent for background service
    pub fn server(&self) -> Option<&ServerModel> {
        self.server.as_ref()
    }

    /// Label of the trace interval still open
    pub fn current_label(&self) -> Option<&TraceLabel> {
        self.trace.current_label()
    }

    /// Counters so far; `idle_time` is only filled in by [`Simulation::finish`]
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// The deadline miss that ended the run, if any
    pub fn fault(&self) -> Option<&DeadlineMiss> {
        self.fault.as_ref()
    }

    /// How the run ended, if it has
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Utilization test computed at construction
    pub fn feasibility(&self) -> &FeasibilityReport {
        &self.feasibility
    }

    /// Returns a reference to the audit log
    ///
    /// Empty unless auditing was enabled in the configuration.
    pub fn audit_log(&self) -> &[ScheduleEvent] {
        &self.audit_log
    }

    /// Run configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn record(&mut self, event: ScheduleEvent) {
        if self.config.audit {
            self.audit_log.push(event);
        }
    }

    fn outcome_of(&self, termination: Termination) -> StepOutcome {
        match (termination, &self.fault) {
            (Termination::DeadlineMiss, Some(miss)) => StepOutcome::Faulted(miss.clone()),
            _ => StepOutcome::Finished,
        }
    }
}
