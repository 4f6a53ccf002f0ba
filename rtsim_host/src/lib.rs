//! # RTSim Host
//!
//! Command-line front end for the scheduling engine.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: The engine and loader never print
//! - **Input errors stop early**: A bad file or option is reported and no
//!   simulation is attempted
//! - **Misses are results**: A deadline miss is rendered like any other
//!   outcome and signalled through the exit status
//!
//! ## Responsibilities
//!
//! The host:
//! - Reads the task file
//! - Builds the engine configuration from command-line options
//! - Runs the simulation, honouring Ctrl-C between ticks
//! - Renders the trace and task summary as text or JSON

pub mod render;
pub mod runtime;

pub use render::{render_json, render_text};
pub use runtime::{
    HostConfig, HostError, HostOutcome, HostRuntime, OutputFormat, EXIT_DEADLINE_MISS,
    EXIT_INPUT_ERROR, EXIT_OK,
};
