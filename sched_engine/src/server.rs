//! # Aperiodic Server
//!
//! Budget-and-period entity that competes with periodic jobs on behalf of
//! the aperiodic FIFO.
//!
//! ## Behaviour
//!
//! - The server starts with a full budget, a deadline of one period and its
//!   first replenishment one period in.
//! - On every replenishment instant the budget is refilled and the deadline
//!   and next replenishment move forward by exactly one period.
//! - A **polling** server forfeits the refill when no aperiodic work is
//!   waiting at that instant. A **deferrable** server keeps it.
//! - Background service has no server at all; see
//!   [`ServerModel::from_config`].

use crate::clock::SimClock;
use crate::config::{ServerConfig, ServerKind};
use core_types::SimTime;
use log::debug;
use serde::Serialize;

/// Budgeted aperiodic server state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerModel {
    kind: ServerKind,
    period: SimTime,
    full_budget: SimTime,
    current_budget: SimTime,
    deadline: SimTime,
    next_replenishment: SimTime,
    replenishments: u64,
}

impl ServerModel {
    /// Creates the server for a configuration
    ///
    /// Returns `None` for background service, which has no budget.
    pub fn from_config(config: &ServerConfig) -> Option<Self> {
        match config.kind {
            ServerKind::Background => None,
            kind => Some(Self {
                kind,
                period: config.period,
                full_budget: config.budget,
                current_budget: config.budget,
                deadline: config.period,
                next_replenishment: config.period,
                replenishments: 0,
            }),
        }
    }

    /// Refills the budget if the current tick is a replenishment instant
    ///
    /// `work_waiting` tells a polling server whether any aperiodic work is
    /// queued. Returns true if a replenishment happened.
    pub fn replenish_if_due(&mut self, clock: &SimClock, work_waiting: bool) -> bool {
        if !clock.is_at(self.next_replenishment) {
            return false;
        }

        self.current_budget = self.full_budget;
        self.deadline = self.next_replenishment + self.period;
        self.next_replenishment += self.period;
        self.replenishments += 1;

        if self.kind == ServerKind::Polling && !work_waiting {
            self.current_budget = 0.0;
        }

        debug!(
            "t={:.2} {} server replenished: budget {:.2}, deadline {:.2}",
            clock.now(),
            self.kind,
            self.current_budget,
            self.deadline
        );
        true
    }

    /// Returns true if the server can still run work
    pub fn has_budget(&self, epsilon: SimTime) -> bool {
        self.current_budget > epsilon
    }

    /// Charges executed aperiodic work to the budget
    pub fn consume(&mut self, amount: SimTime) {
        self.current_budget = (self.current_budget - amount).max(0.0);
    }

    /// Polling or deferrable
    pub fn kind(&self) -> ServerKind {
        self.kind
    }

    /// Replenishment period
    pub fn period(&self) -> SimTime {
        self.period
    }

    /// Budget restored at each replenishment
    pub fn full_budget(&self) -> SimTime {
        self.full_budget
    }

    /// Budget left in the current period
    pub fn current_budget(&self) -> SimTime {
        self.current_budget
    }

    /// Deadline the server competes with
    pub fn deadline(&self) -> SimTime {
        self.deadline
    }

    /// Next replenishment instant
    pub fn next_replenishment(&self) -> SimTime {
        self.next_replenishment
    }

    /// Number of replenishments so far
    pub fn replenishments(&self) -> u64 {
        self.replenishments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeBase;

    fn clock_at(ticks: u64) -> SimClock {
        let mut clock = SimClock::new(TimeBase::default());
        for _ in 0..ticks {
            clock.advance();
        }
        clock
    }

    #[test]
    fn test_background_has_no_server() {
        assert!(ServerModel::from_config(&ServerConfig::background()).is_none());
    }

    #[test]
    fn test_initial_state() {
        let server = ServerModel::from_config(&ServerConfig::polling(2.0, 5.0)).unwrap();
        assert_eq!(server.current_budget(), 2.0);
        assert_eq!(server.deadline(), 5.0);
        assert_eq!(server.next_replenishment(), 5.0);
        assert!(server.has_budget(1e-5));
    }

    #[test]
    fn test_replenishment_rolls_forward_one_period() {
        let mut server = ServerModel::from_config(&ServerConfig::deferrable(2.0, 5.0)).unwrap();
        server.consume(1.5);

        assert!(!server.replenish_if_due(&clock_at(499), true));
        assert!(server.replenish_if_due(&clock_at(500), true));
        assert_eq!(server.current_budget(), 2.0);
        assert_eq!(server.deadline(), 10.0);
        assert_eq!(server.next_replenishment(), 10.0);

        // The same instant never fires twice
        assert!(!server.replenish_if_due(&clock_at(501), true));
        assert_eq!(server.replenishments(), 1);
    }

    #[test]
    fn test_polling_forfeits_budget_when_idle() {
        let mut server = ServerModel::from_config(&ServerConfig::polling(2.0, 5.0)).unwrap();
        assert!(server.replenish_if_due(&clock_at(500), false));
        assert_eq!(server.current_budget(), 0.0);
        assert!(!server.has_budget(1e-5));
        assert_eq!(server.deadline(), 10.0);
    }

    #[test]
    fn test_deferrable_keeps_budget_when_idle() {
        let mut server = ServerModel::from_config(&ServerConfig::deferrable(2.0, 5.0)).unwrap();
        assert!(server.replenish_if_due(&clock_at(500), false));
        assert_eq!(server.current_budget(), 2.0);
    }

    #[test]
    fn test_consume_floors_at_zero() {
        let mut server = ServerModel::from_config(&ServerConfig::polling(1.0, 5.0)).unwrap();
        server.consume(0.6);
        server.consume(0.6);
        assert_eq!(server.current_budget(), 0.0);
    }
}
