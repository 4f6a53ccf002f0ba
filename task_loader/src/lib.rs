//! # Task File Loader
//!
//! Parses the line-oriented task description format into a [`TaskSet`].
//!
//! ## Format
//!
//! Each non-comment line declares one task:
//! - `P <release> <exec> <period> [deadline]`: periodic, deadline defaults to period
//! - `P <exec> <period>`: periodic released at 0
//! - `D <exec> <period> <deadline>`: periodic released at 0
//! - `A <release> <exec>`: aperiodic
//! - Comments: `# anything`, on their own line or after a declaration
//!
//! Periodic tasks are named `P1`, `P2`, ... and aperiodic tasks `A1`, `A2`,
//! ... in the order they appear.
//!
//! ## Example
//!
//! ```text
//! # two periodic tasks and a late aperiodic request
//! P 0 1 4          # P1
//! D 2 6 5          # P2, deadline shorter than period
//! A 5 2            # A1
//! ```
//!
//! ## Malformed lines
//!
//! In [`ParseMode::Lenient`] unrecognised or malformed lines are skipped and
//! reported in [`LoadedTasks::skipped`]. [`ParseMode::Strict`] turns the first
//! one into an error.

use core_types::{TaskSet, TaskSpec, TaskSpecError};
use log::{debug, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Task file error types
#[derive(Debug, Error)]
pub enum TaskLoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("No tasks defined")]
    NoTasks,
}

/// How malformed lines are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Skip and report malformed lines
    #[default]
    Lenient,
    /// Fail on the first malformed line
    Strict,
}

/// A line that was not turned into a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    /// The line as written, without its comment
    pub content: String,
    /// Why it was skipped
    pub reason: String,
}

/// Result of a successful load
#[derive(Debug, Clone)]
pub struct LoadedTasks {
    /// The tasks, in file order
    pub tasks: TaskSet,
    /// Lines skipped in lenient mode
    pub skipped: Vec<SkippedLine>,
}

/// One recognised declaration, before naming
enum Declaration {
    Periodic {
        release: f64,
        execution: f64,
        period: f64,
        deadline: f64,
    },
    Aperiodic {
        release: f64,
        execution: f64,
    },
}

/// Task file parser
pub struct TaskLoader;

impl TaskLoader {
    /// Reads and parses a task file
    pub fn load_file(path: impl AsRef<Path>, mode: ParseMode) -> Result<LoadedTasks, TaskLoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TaskLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let loaded = Self::from_text(&text, mode)?;
        debug!(
            "loaded {} tasks from {} ({} lines skipped)",
            loaded.tasks.len(),
            path.display(),
            loaded.skipped.len()
        );
        Ok(loaded)
    }

    /// Parses task declarations from text
    pub fn from_text(text: &str, mode: ParseMode) -> Result<LoadedTasks, TaskLoadError> {
        let mut tasks = TaskSet::new();
        let mut skipped = Vec::new();
        let mut periodic_count = 0usize;
        let mut aperiodic_count = 0usize;

        for (index, raw) in text.lines().enumerate() {
            let line_num = index + 1;
            let line = strip_comment(raw).trim();

            // Skip empty lines and comments
            if line.is_empty() {
                continue;
            }

            let result = Self::parse_line(line).and_then(|decl| {
                let spec = match decl {
                    Declaration::Periodic {
                        release,
                        execution,
                        period,
                        deadline,
                    } => TaskSpec::periodic(
                        format!("P{}", periodic_count + 1),
                        release,
                        execution,
                        period,
                        deadline,
                    ),
                    Declaration::Aperiodic { release, execution } => TaskSpec::aperiodic(
                        format!("A{}", aperiodic_count + 1),
                        release,
                        execution,
                    ),
                };
                let periodic = spec.is_periodic();
                tasks
                    .push(spec)
                    .map(|_| periodic)
                    .map_err(|e: TaskSpecError| e.to_string())
            });

            match result {
                Ok(true) => periodic_count += 1,
                Ok(false) => aperiodic_count += 1,
                Err(reason) => match mode {
                    ParseMode::Strict => {
                        return Err(TaskLoadError::Malformed {
                            line: line_num,
                            reason,
                        })
                    }
                    ParseMode::Lenient => {
                        warn!("skipping line {}: {} ({})", line_num, line, reason);
                        skipped.push(SkippedLine {
                            line: line_num,
                            content: line.to_string(),
                            reason,
                        });
                    }
                },
            }
        }

        if tasks.is_empty() {
            return Err(TaskLoadError::NoTasks);
        }

        Ok(LoadedTasks { tasks, skipped })
    }

    /// Parses a single declaration line
    fn parse_line(line: &str) -> Result<Declaration, String> {
        let mut parts = line.split_whitespace();
        let tag = parts.next().unwrap_or_default();
        let args = parts
            .map(|token| {
                token
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| format!("invalid number '{}'", token))
            })
            .collect::<Result<Vec<f64>, String>>()?;

        match (tag, args.as_slice()) {
            ("P", &[release, execution, period, deadline]) => Ok(Declaration::Periodic {
                release,
                execution,
                period,
                deadline,
            }),
            ("P", &[release, execution, period]) => Ok(Declaration::Periodic {
                release,
                execution,
                period,
                deadline: period,
            }),
            ("P", &[execution, period]) => Ok(Declaration::Periodic {
                release: 0.0,
                execution,
                period,
                deadline: period,
            }),
            ("D", &[execution, period, deadline]) => Ok(Declaration::Periodic {
                release: 0.0,
                execution,
                period,
                deadline,
            }),
            ("A", &[release, execution]) => Ok(Declaration::Aperiodic { release, execution }),
            ("P" | "D" | "A", _) => Err(format!(
                "wrong number of fields for '{}' ({} given)",
                tag,
                args.len()
            )),
            (other, _) => Err(format!("unknown task type '{}'", other)),
        }
    }
}

/// Removes a trailing `#` comment
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}
