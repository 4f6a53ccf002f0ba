//! # Simulation Clock
//!
//! Deterministic logical clock advanced one fixed tick at a time.
//!
//! ## Philosophy
//!
//! **Time is counted, not accumulated.**
//!
//! The clock stores whole ticks and derives the current time as
//! `ticks × tick`. Adding the tick size to a floating-point total on every
//! step would drift; counting keeps release and replenishment instants
//! reproducible across runs and platforms.

use crate::config::TimeBase;
use core_types::SimTime;

/// Logical clock for one simulation run
///
/// The clock only advances when told to.
///
/// # Examples
///
/// ```
/// use sched_engine::clock::SimClock;
/// use sched_engine::config::TimeBase;
///
/// let mut clock = SimClock::new(TimeBase::default());
/// assert_eq!(clock.current_ticks(), 0);
///
/// clock.advance();
/// clock.advance();
/// assert_eq!(clock.current_ticks(), 2);
/// assert!((clock.now() - 0.02).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SimClock {
    ticks: u64,
    time_base: TimeBase,
}

impl SimClock {
    /// Creates a clock at tick 0
    pub fn new(time_base: TimeBase) -> Self {
        Self {
            ticks: 0,
            time_base,
        }
    }

    /// Advances the clock by one tick
    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    /// Returns the number of elapsed ticks
    pub fn current_ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns the current simulated time
    pub fn now(&self) -> SimTime {
        self.time_base.time_at(self.ticks)
    }

    /// Returns true if `instant` falls on the current tick
    ///
    /// Each instant maps to exactly one tick, so one-shot events keyed on
    /// an instant fire exactly once.
    pub fn is_at(&self, instant: SimTime) -> bool {
        instant >= 0.0 && self.time_base.tick_of(instant) == self.ticks
    }

    /// Returns the time base this clock counts in
    pub fn time_base(&self) -> &TimeBase {
        &self.time_base
    }
}
