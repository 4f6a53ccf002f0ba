//! Simulation configuration
//!
//! Everything a run depends on is carried here explicitly: the dispatch
//! policy, the aperiodic server, the duration and the time base. Nothing is
//! read from ambient defaults once a [`SimulationConfig`] exists.

use core_types::SimTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown scheduling algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Unknown server type: {0}")]
    UnknownServerKind(String),

    #[error("Simulation duration must be positive, got {0}")]
    InvalidDuration(f64),

    #[error("Tick size must be positive, got {0}")]
    InvalidTick(f64),

    #[error("Epsilon {epsilon} must be non-negative and smaller than the tick {tick}")]
    InvalidEpsilon { epsilon: f64, tick: f64 },

    #[error("Server budget must be non-negative, got {0}")]
    InvalidServerBudget(f64),

    #[error("Server period must be positive, got {0}")]
    InvalidServerPeriod(f64),

    #[error("Server budget {budget} exceeds its period {period}")]
    BudgetExceedsPeriod { budget: f64, period: f64 },

    #[error("LLF threshold must be non-negative, got {0}")]
    InvalidLlfThreshold(f64),
}

/// Dispatch policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Static priority, shorter period first
    RateMonotonic,
    /// Static priority, shorter relative deadline first
    DeadlineMonotonic,
    /// Dynamic priority, earlier absolute deadline first
    EarliestDeadlineFirst,
    /// Dynamic priority, smaller laxity first, with switching hysteresis
    LeastLaxityFirst,
}

impl Algorithm {
    /// All policies, in presentation order
    pub const ALL: [Algorithm; 4] = [
        Algorithm::RateMonotonic,
        Algorithm::DeadlineMonotonic,
        Algorithm::EarliestDeadlineFirst,
        Algorithm::LeastLaxityFirst,
    ];

    /// Short identifier (`rm`, `dm`, `edf`, `llf`)
    pub fn short_name(&self) -> &'static str {
        match self {
            Algorithm::RateMonotonic => "rm",
            Algorithm::DeadlineMonotonic => "dm",
            Algorithm::EarliestDeadlineFirst => "edf",
            Algorithm::LeastLaxityFirst => "llf",
        }
    }

    /// Returns true if priorities are recomputed every tick
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            Algorithm::EarliestDeadlineFirst | Algorithm::LeastLaxityFirst
        )
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::RateMonotonic => write!(f, "Rate Monotonic (RM)"),
            Algorithm::DeadlineMonotonic => write!(f, "Deadline Monotonic (DM)"),
            Algorithm::EarliestDeadlineFirst => write!(f, "Earliest Deadline First (EDF)"),
            Algorithm::LeastLaxityFirst => write!(f, "Least Laxity First (LLF)"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Algorithm::ALL
            .into_iter()
            .find(|a| {
                normalized == a.short_name() || normalized == a.to_string().to_lowercase()
            })
            .or(match normalized.as_str() {
                "rate monotonic" | "rate-monotonic" => Some(Algorithm::RateMonotonic),
                "deadline monotonic" | "deadline-monotonic" => Some(Algorithm::DeadlineMonotonic),
                "earliest deadline first" => Some(Algorithm::EarliestDeadlineFirst),
                "least laxity first" => Some(Algorithm::LeastLaxityFirst),
                _ => None,
            })
            .ok_or_else(|| ConfigError::UnknownAlgorithm(s.to_string()))
    }
}

/// Aperiodic service mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerKind {
    /// Aperiodic work runs only when no periodic job is ready
    Background,
    /// Budgeted server that forfeits its budget when nothing is waiting
    Polling,
    /// Budgeted server that keeps unused budget until the next replenishment
    Deferrable,
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerKind::Background => write!(f, "Background"),
            ServerKind::Polling => write!(f, "Poller"),
            ServerKind::Deferrable => write!(f, "Deferrable"),
        }
    }
}

impl FromStr for ServerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "background" | "bg" => Ok(ServerKind::Background),
            "poller" | "polling" => Ok(ServerKind::Polling),
            "deferrable" => Ok(ServerKind::Deferrable),
            _ => Err(ConfigError::UnknownServerKind(s.to_string())),
        }
    }
}

/// Aperiodic server parameters
///
/// Budget and period are ignored for [`ServerKind::Background`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub kind: ServerKind,
    pub budget: SimTime,
    pub period: SimTime,
}

impl ServerConfig {
    /// Background service, no budget
    pub fn background() -> Self {
        Self {
            kind: ServerKind::Background,
            budget: 0.0,
            period: 1.0,
        }
    }

    /// Polling server with the given budget and period
    pub fn polling(budget: SimTime, period: SimTime) -> Self {
        Self {
            kind: ServerKind::Polling,
            budget,
            period,
        }
    }

    /// Deferrable server with the given budget and period
    pub fn deferrable(budget: SimTime, period: SimTime) -> Self {
        Self {
            kind: ServerKind::Deferrable,
            budget,
            period,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.kind == ServerKind::Background {
            return Ok(());
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(ConfigError::InvalidServerBudget(self.budget));
        }
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(ConfigError::InvalidServerPeriod(self.period));
        }
        if self.budget > self.period {
            return Err(ConfigError::BudgetExceedsPeriod {
                budget: self.budget,
                period: self.period,
            });
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::background()
    }
}

/// Fixed time quantum and equality tolerance
///
/// Every time comparison in a run goes through one `TimeBase`, so two runs
/// with the same inputs make exactly the same decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBase {
    /// Time advanced per simulation step
    pub tick: SimTime,
    /// Tolerance for due-time, deadline and completion checks
    pub epsilon: SimTime,
}

impl TimeBase {
    pub const DEFAULT_TICK: SimTime = 0.01;
    pub const DEFAULT_EPSILON: SimTime = 1e-5;

    /// Creates a time base
    pub fn new(tick: SimTime, epsilon: SimTime) -> Self {
        Self { tick, epsilon }
    }

    /// Time at the start of the given tick
    pub fn time_at(&self, ticks: u64) -> SimTime {
        ticks as f64 * self.tick
    }

    /// Tick index closest to an instant
    pub fn tick_of(&self, instant: SimTime) -> u64 {
        // Negative instants saturate to tick 0
        (instant / self.tick).round() as u64
    }

    /// Number of ticks needed to cover `duration`
    pub fn ticks_in(&self, duration: SimTime) -> u64 {
        ((duration - self.epsilon) / self.tick).ceil().max(0.0) as u64
    }

    /// Returns true once `target` has been reached at time `now`
    pub fn is_due(&self, target: SimTime, now: SimTime) -> bool {
        target <= now + self.epsilon
    }

    /// Returns true if `now` lies past `deadline` by more than the tolerance
    pub fn is_past(&self, deadline: SimTime, now: SimTime) -> bool {
        now > deadline + self.epsilon
    }

    /// Returns true if an amount of work is exhausted
    pub fn is_exhausted(&self, remaining: SimTime) -> bool {
        remaining <= self.epsilon
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick.is_finite() || self.tick <= 0.0 {
            return Err(ConfigError::InvalidTick(self.tick));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 || self.epsilon >= self.tick {
            return Err(ConfigError::InvalidEpsilon {
                epsilon: self.epsilon,
                tick: self.tick,
            });
        }
        Ok(())
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK, Self::DEFAULT_EPSILON)
    }
}

/// Complete configuration for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Dispatch policy
    pub algorithm: Algorithm,
    /// Aperiodic service mechanism
    pub server: ServerConfig,
    /// Length of the run
    pub duration: SimTime,
    /// Tick size and tolerance
    pub time_base: TimeBase,
    /// Laxity gap under which LLF keeps the running job
    pub llf_threshold: f64,
    /// Record a per-tick audit log (test and debugging aid)
    pub audit: bool,
}

impl SimulationConfig {
    pub const DEFAULT_DURATION: SimTime = 20.0;
    pub const DEFAULT_LLF_THRESHOLD: f64 = 0.1;

    /// Creates a configuration with background service and default timing
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            server: ServerConfig::background(),
            duration: Self::DEFAULT_DURATION,
            time_base: TimeBase::default(),
            llf_threshold: Self::DEFAULT_LLF_THRESHOLD,
            audit: false,
        }
    }

    /// Sets the aperiodic server
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Sets the run length
    pub fn with_duration(mut self, duration: SimTime) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the tick size and tolerance
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = time_base;
        self
    }

    /// Sets the LLF hysteresis threshold
    pub fn with_llf_threshold(mut self, threshold: f64) -> Self {
        self.llf_threshold = threshold;
        self
    }

    /// Enables the audit log
    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }

    /// Checks every parameter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ConfigError::InvalidDuration(self.duration));
        }
        self.time_base.validate()?;
        self.server.validate()?;
        if !self.llf_threshold.is_finite() || self.llf_threshold < 0.0 {
            return Err(ConfigError::InvalidLlfThreshold(self.llf_threshold));
        }
        Ok(())
    }
}
