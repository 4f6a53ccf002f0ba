//! # RTSim
//!
//! Main entry point for the real-time scheduling simulator.

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use log::info;
use rtsim_host::{HostConfig, HostRuntime, OutputFormat, EXIT_INPUT_ERROR, EXIT_OK};
use sched_engine::{Algorithm, ServerConfig, ServerKind, SimulationConfig, TimeBase};
use std::path::PathBuf;
use std::process;
use task_loader::ParseMode;

/// Simulates periodic and aperiodic tasks on one processor under RM, DM,
/// EDF or LLF scheduling, with optional polling or deferrable server for
/// aperiodic work, and prints the resulting execution trace.
///
/// Input lines: `P <release> <exec> <period> [deadline]`, `P <exec> <period>`,
/// `D <exec> <period> <deadline>`, `A <release> <exec>`. Lines starting with
/// `#` are comments.
#[derive(Debug, Parser)]
#[clap(name = "rtsim", version)]
struct Opts {
    /// Task description file.
    input: PathBuf,

    /// Scheduling algorithm: rm, dm, edf or llf.
    #[clap(short = 'a', long, default_value = "rm")]
    algorithm: Algorithm,

    /// Aperiodic service: background, poller or deferrable.
    #[clap(short = 's', long, default_value = "background")]
    server: ServerKind,

    /// Server budget per period. Ignored for background service.
    #[clap(short = 'b', long, default_value = "1")]
    budget: f64,

    /// Server replenishment period. Ignored for background service.
    #[clap(short = 'p', long, default_value = "5")]
    server_period: f64,

    /// Simulated time to run for.
    #[clap(short = 'd', long, default_value = "20")]
    duration: f64,

    /// Simulation time step.
    #[clap(long, default_value = "0.01")]
    tick: f64,

    /// Tolerance for time comparisons. Must be smaller than the tick.
    #[clap(long, default_value = "0.00001")]
    epsilon: f64,

    /// Laxity gap under which LLF keeps the running job.
    #[clap(long, default_value = "0.1")]
    llf_threshold: f64,

    /// Fail on malformed input lines instead of skipping them.
    #[clap(long, action = clap::ArgAction::SetTrue)]
    strict: bool,

    /// Output format.
    #[clap(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output. Specify multiple times to increase verbosity.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Opts {
    fn host_config(&self) -> HostConfig {
        let server = ServerConfig {
            kind: self.server,
            budget: self.budget,
            period: self.server_period,
        };
        let simulation = SimulationConfig::new(self.algorithm)
            .with_server(server)
            .with_duration(self.duration)
            .with_time_base(TimeBase::new(self.tick, self.epsilon))
            .with_llf_threshold(self.llf_threshold);

        HostConfig {
            input: self.input.clone(),
            parse_mode: if self.strict {
                ParseMode::Strict
            } else {
                ParseMode::Lenient
            },
            simulation,
            format: self.format,
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let llv = match verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Off)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        llv,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;
    Ok(())
}

fn run(opts: &Opts) -> Result<i32> {
    let runtime = HostRuntime::new(opts.host_config());

    let cancel = runtime.cancel_token();
    ctrlc::set_handler(move || {
        cancel.cancel();
    })
    .context("Error setting Ctrl-C handler")?;

    let outcome = runtime
        .run()
        .with_context(|| format!("Cannot simulate {}", opts.input.display()))?;
    let rendered = runtime.render(&outcome)?;
    print!("{}", rendered);

    info!(
        "{} after {} ticks",
        outcome.report.termination, outcome.report.stats.ticks
    );
    Ok(outcome.exit_code())
}

fn main() {
    // Usage errors are input errors; help and version still exit 0
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            process::exit(EXIT_INPUT_ERROR);
        }
        Err(e) => e.exit(),
    };

    if let Err(e) = init_logging(opts.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(&opts) {
        Ok(EXIT_OK) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(EXIT_INPUT_ERROR);
        }
    }
}
