//! # Execution Trace
//!
//! Run-length encoding of the per-tick dispatch decisions.
//!
//! ## Invariants
//!
//! - Intervals are maximal: two neighbours never share a label.
//! - Intervals partition `[0, end_time)` with no gaps or overlaps.
//!
//! Interval bounds are tick instants computed by the same clock, so
//! neighbouring intervals share bit-identical boundaries.

use core_types::SimTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Label of the sentinel "nothing ran" interval
pub const IDLE_LABEL: &str = "Idle";

/// What occupied the processor during an interval
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TraceLabel {
    /// No work ran
    Idle,
    /// The named task ran
    Task(String),
}

impl TraceLabel {
    /// Returns true for the idle sentinel
    pub fn is_idle(&self) -> bool {
        matches!(self, TraceLabel::Idle)
    }

    /// Label text as it appears in output
    pub fn as_str(&self) -> &str {
        match self {
            TraceLabel::Idle => IDLE_LABEL,
            TraceLabel::Task(name) => name,
        }
    }
}

impl fmt::Display for TraceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TraceLabel {
    fn from(label: String) -> Self {
        if label == IDLE_LABEL {
            TraceLabel::Idle
        } else {
            TraceLabel::Task(label)
        }
    }
}

impl From<TraceLabel> for String {
    fn from(label: TraceLabel) -> Self {
        match label {
            TraceLabel::Idle => IDLE_LABEL.to_string(),
            TraceLabel::Task(name) => name,
        }
    }
}

/// One closed interval `[start, end)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceInterval {
    pub start: SimTime,
    pub end: SimTime,
    pub label: TraceLabel,
}

impl TraceInterval {
    /// Length of the interval
    pub fn duration(&self) -> SimTime {
        self.end - self.start
    }
}

/// Finalized execution trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    intervals: Vec<TraceInterval>,
}

impl Trace {
    /// Intervals in time order
    pub fn intervals(&self) -> &[TraceInterval] {
        &self.intervals
    }

    /// Number of intervals
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns true if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterates over intervals in time order
    pub fn iter(&self) -> impl Iterator<Item = &TraceInterval> {
        self.intervals.iter()
    }

    /// Total time spent under a label
    pub fn total_time(&self, label: &str) -> SimTime {
        self.intervals
            .iter()
            .filter(|i| i.label.as_str() == label)
            .map(TraceInterval::duration)
            .sum()
    }

    /// Total time any task ran
    pub fn busy_time(&self) -> SimTime {
        self.intervals
            .iter()
            .filter(|i| !i.label.is_idle())
            .map(TraceInterval::duration)
            .sum()
    }

    /// End of the last interval, or 0 for an empty trace
    pub fn end_time(&self) -> SimTime {
        self.intervals.last().map(|i| i.end).unwrap_or(0.0)
    }

    /// Distinct labels in order of first appearance
    pub fn labels(&self) -> Vec<&TraceLabel> {
        let mut seen: Vec<&TraceLabel> = Vec::new();
        for interval in &self.intervals {
            if !seen.contains(&&interval.label) {
                seen.push(&interval.label);
            }
        }
        seen
    }

    /// Returns the label occupying instant `t`, if `t` lies inside the trace
    pub fn label_at(&self, t: SimTime) -> Option<&TraceLabel> {
        self.intervals
            .iter()
            .find(|i| i.start <= t && t < i.end)
            .map(|i| &i.label)
    }

    /// Checks the partition and maximality invariants
    pub fn is_well_formed(&self) -> bool {
        let Some(first) = self.intervals.first() else {
            return true;
        };
        if first.start != 0.0 {
            return false;
        }
        let ordered = self.intervals.iter().all(|i| i.start < i.end);
        let joined = self
            .intervals
            .windows(2)
            .all(|w| w[0].end == w[1].start && w[0].label != w[1].label);
        ordered && joined
    }

    /// SHA-256 digest of the exact interval bounds and labels, hex encoded
    ///
    /// Two traces have the same fingerprint only if they are bit-for-bit
    /// identical.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for interval in &self.intervals {
            hasher.update(interval.start.to_bits().to_le_bytes());
            hasher.update(interval.end.to_bits().to_le_bytes());
            hasher.update(interval.label.as_str().as_bytes());
            hasher.update([0u8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TraceInterval;
    type IntoIter = std::slice::Iter<'a, TraceInterval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

/// Incremental trace builder
///
/// Fed one label per tick; opens a new interval whenever the label changes.
#[derive(Debug, Clone, Default)]
pub struct TraceLogger {
    closed: Vec<TraceInterval>,
    open: Option<(SimTime, TraceLabel)>,
}

impl TraceLogger {
    /// Creates an empty logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the label that runs during the tick starting at `now`
    pub fn record(&mut self, now: SimTime, label: TraceLabel) {
        match &self.open {
            Some((_, current)) if *current == label => {}
            _ => {
                self.close(now);
                self.open = Some((now, label));
            }
        }
    }

    /// Closes the open interval at `now` and returns the finished trace
    pub fn finish(mut self, now: SimTime) -> Trace {
        self.close(now);
        Trace {
            intervals: self.closed,
        }
    }

    /// Intervals closed so far
    pub fn closed(&self) -> &[TraceInterval] {
        &self.closed
    }

    /// Label of the interval still open, if any
    pub fn current_label(&self) -> Option<&TraceLabel> {
        self.open.as_ref().map(|(_, label)| label)
    }

    fn close(&mut self, now: SimTime) {
        if let Some((start, label)) = self.open.take() {
            if now > start {
                self.closed.push(TraceInterval {
                    start,
                    end: now,
                    label,
                });
            }
        }
    }
}
