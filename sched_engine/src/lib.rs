//! # Scheduling Engine
//!
//! Deterministic fixed-timestep simulation of a single processor running
//! periodic and aperiodic tasks.
//!
//! ## Philosophy
//!
//! - **Determinism first**: Same task set + same configuration => same
//!   trace, bit for bit.
//! - **Explicit time base**: Tick size and tolerance are configuration,
//!   never globals.
//! - **Misses are outcomes**: A deadline miss ends the run and is reported
//!   alongside the trace; it is not an error.
//! - **Definitions stay untouched**: Every run works on its own copies.
//!
//! ## Components
//!
//! - [`release::ReleaseManager`]: periodic releases and aperiodic arrivals
//! - [`server::ServerModel`]: polling and deferrable server budgets
//! - [`dispatcher::Dispatcher`]: RM, DM, EDF and LLF selection
//! - [`executor::Executor`]: one tick of execution
//! - [`deadline::DeadlineMonitor`]: first-miss detection
//! - [`trace::TraceLogger`]: run-length encoded trace
//! - [`engine::Simulation`]: the tick loop tying them together
//!
//! ## Example
//!
//! ```
//! use core_types::{TaskSet, TaskSpec};
//! use sched_engine::{Algorithm, Simulation, SimulationConfig};
//!
//! let mut tasks = TaskSet::new();
//! tasks.push(TaskSpec::periodic("P1", 0.0, 1.0, 4.0, 4.0)).unwrap();
//! tasks.push(TaskSpec::periodic("P2", 0.0, 2.0, 6.0, 6.0)).unwrap();
//!
//! let config = SimulationConfig::new(Algorithm::RateMonotonic).with_duration(12.0);
//! let report = Simulation::new(&tasks, config).unwrap().run();
//!
//! assert!(report.fault.is_none());
//! assert_eq!(report.trace.intervals()[0].label.as_str(), "P1");
//! ```

pub mod analysis;
pub mod clock;
pub mod config;
pub mod deadline;
pub mod dispatcher;
pub mod engine;
pub mod executor;
pub mod job;
pub mod queue;
pub mod release;
pub mod server;
pub mod test_utils;
pub mod trace;

pub use analysis::{FeasibilityReport, Schedulability};
pub use config::{Algorithm, ConfigError, ServerConfig, ServerKind, SimulationConfig, TimeBase};
pub use deadline::DeadlineMiss;
pub use dispatcher::Dispatch;
pub use engine::{
    CancelToken, RunStats, ScheduleEvent, Simulation, SimulationReport, StepOutcome, TaskReport,
    Termination,
};
pub use job::Job;
pub use trace::{Trace, TraceInterval, TraceLabel};
