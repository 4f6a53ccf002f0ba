//! # Host Runtime
//!
//! Loads a task file, runs one simulation and hands back everything the
//! renderers need.

use sched_engine::{CancelToken, ConfigError, Simulation, SimulationConfig, SimulationReport};
use serde::Serialize;
use std::path::PathBuf;
use task_loader::{LoadedTasks, ParseMode, SkippedLine, TaskLoadError, TaskLoader};
use thiserror::Error;

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Load(#[from] TaskLoadError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to encode report: {0}")]
    Render(#[from] serde_json::Error),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Interval table and per-task summary
    #[default]
    Text,
    /// The full report as JSON
    Json,
}

/// Exit status for a run that completed or was cancelled
pub const EXIT_OK: i32 = 0;
/// Exit status for input and configuration errors
pub const EXIT_INPUT_ERROR: i32 = 1;
/// Exit status for a run that ended on a deadline miss
pub const EXIT_DEADLINE_MISS: i32 = 2;

/// Host runtime configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Task description file
    pub input: PathBuf,
    /// Treatment of malformed input lines
    pub parse_mode: ParseMode,
    /// Engine configuration
    pub simulation: SimulationConfig,
    /// How the report is printed
    pub format: OutputFormat,
}

impl HostConfig {
    /// Creates a configuration with the engine defaults
    pub fn new(input: impl Into<PathBuf>, simulation: SimulationConfig) -> Self {
        Self {
            input: input.into(),
            parse_mode: ParseMode::default(),
            simulation,
            format: OutputFormat::default(),
        }
    }
}

/// A finished run together with the input lines that were skipped
#[derive(Debug, Clone, Serialize)]
pub struct HostOutcome {
    #[serde(flatten)]
    pub report: SimulationReport,
    pub skipped: Vec<SkippedLine>,
}

impl HostOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.report.missed_deadline() {
            EXIT_DEADLINE_MISS
        } else {
            EXIT_OK
        }
    }
}

/// Host runtime
pub struct HostRuntime {
    config: HostConfig,
    cancel: CancelToken,
}

impl HostRuntime {
    /// Creates a new host runtime
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Token that stops the run after the current tick
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Returns the configuration
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Loads the input file and runs the simulation
    ///
    /// The configuration is checked before the file is read, so a bad
    /// option is reported even when the file is also broken.
    pub fn run(&self) -> Result<HostOutcome, HostError> {
        self.config.simulation.validate()?;
        let loaded = TaskLoader::load_file(&self.config.input, self.config.parse_mode)?;
        self.simulate(loaded)
    }

    /// Runs the simulation over already loaded tasks
    pub fn simulate(&self, loaded: LoadedTasks) -> Result<HostOutcome, HostError> {
        let simulation = Simulation::new(&loaded.tasks, self.config.simulation.clone())?;
        let report = simulation.run_until_cancelled(&self.cancel);
        Ok(HostOutcome {
            report,
            skipped: loaded.skipped,
        })
    }

    /// Renders an outcome in the configured format
    pub fn render(&self, outcome: &HostOutcome) -> Result<String, HostError> {
        match self.config.format {
            OutputFormat::Text => Ok(crate::render::render_text(outcome)),
            OutputFormat::Json => crate::render::render_json(outcome),
        }
    }
}
