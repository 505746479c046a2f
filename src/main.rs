//! Command-line entry point.
//!
//! Run with: cargo run --release -- -n 4 1234

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::error;

use percolate::config::{self, DEFAULT_DENSITY, DEFAULT_LENGTH, DEFAULT_PRINT_FREQ};
use percolate::{simulation, SimulationConfig};

/// Simulate a percolation automaton over a cohort of workers.
#[derive(Debug, Parser)]
#[command(name = "percolate", version, about)]
struct Cli {
    /// Seed for the initial lattice (negative values are accepted)
    #[arg(allow_negative_numbers = true)]
    seed: i64,

    /// Number of workers
    #[arg(short = 'n', long, env = "PERCOLATE_WORKERS", default_value_t = 1)]
    workers: usize,

    /// Lattice side length L
    #[arg(short, long, env = "PERCOLATE_LENGTH", default_value_t = DEFAULT_LENGTH)]
    length: usize,

    /// Initial density of live cells
    #[arg(long, env = "PERCOLATE_DENSITY", default_value_t = DEFAULT_DENSITY)]
    density: f64,

    /// Step limit [default: 10 * L]
    #[arg(long, env = "PERCOLATE_MAX_STEPS")]
    max_steps: Option<usize>,

    /// Report the live-cell count every this many steps
    #[arg(long, default_value_t = DEFAULT_PRINT_FREQ)]
    print_freq: usize,

    /// Process grid as ROWSxCOLUMNS [default: most square]
    #[arg(long, value_parser = config::parse_grid)]
    grid: Option<(usize, usize)>,

    /// Leave the bounded edges without the fixed live stripes
    #[arg(long)]
    no_open_boundary: bool,

    /// Output image
    #[arg(short, long, default_value = "cell.pbm")]
    output: PathBuf,
}

impl Cli {
    fn into_config(self) -> SimulationConfig {
        SimulationConfig {
            // two's complement keeps distinct seeds distinct
            seed: self.seed as u64,
            length: self.length,
            density: self.density,
            workers: self.workers,
            grid: self.grid,
            max_steps: self.max_steps,
            print_freq: self.print_freq,
            open_boundary: !self.no_open_boundary,
            output: Some(self.output),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let config = Cli::parse().into_config();
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &SimulationConfig) -> anyhow::Result<()> {
    let summary = simulation::run(config).with_context(|| {
        format!(
            "simulation with {} worker(s) on a {}x{} lattice failed",
            config.workers, config.length, config.length
        )
    })?;
    println!(
        "{} steps ({}), {} -> {} living cells, {:.6} ms per step",
        summary.steps,
        summary.stop,
        summary.initial_count,
        summary.final_count,
        summary.ms_per_step()
    );
    Ok(())
}
