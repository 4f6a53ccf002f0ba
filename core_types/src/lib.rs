//! # Core Types
//!
//! This crate defines the task model shared by the loader, the simulation
//! engine and the host.
//!
//! ## Philosophy
//!
//! Core types are designed with these principles:
//! - **Definitions are immutable**: A [`TaskSpec`] never changes once it is
//!   part of a [`TaskSet`]. Runs work on their own copies.
//! - **Stable identity**: Jobs refer to their spec by [`TaskId`], never by
//!   name.
//! - **Validated at the edge**: A spec that made it into a set is known to
//!   be well-formed.
//!
//! ## Key Types
//!
//! - [`TaskSpec`]: A periodic or aperiodic task definition
//! - [`TaskSet`]: The ordered collection a simulation is built from
//! - [`TaskId`]: Index of a spec inside its set
//! - [`JobId`]: One released instance of a spec

pub mod ids;
pub mod task;

pub use ids::{JobId, TaskId};
pub use task::{TaskKind, TaskSet, TaskSpec, TaskSpecError, APERIODIC_DEADLINE};

/// Simulated time, in abstract time units.
pub type SimTime = f64;
