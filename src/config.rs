//! Run configuration.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::init::Seeding;
use crate::topology::Topology;

/// Default lattice side length.
pub const DEFAULT_LENGTH: usize = 960;
/// Default target density of live cells.
pub const DEFAULT_DENSITY: f64 = 0.52;
/// Default progress-report interval, in steps.
pub const DEFAULT_PRINT_FREQ: usize = 500;

/// Everything needed to run one simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Random seed for the initial lattice
    pub seed: u64,
    /// Lattice side length L
    pub length: usize,
    /// Target fraction of live cells in the initial lattice
    pub density: f64,
    /// Number of workers in the cohort
    pub workers: usize,
    /// Explicit `(rows, columns)` process grid; balanced when `None`
    pub grid: Option<(usize, usize)>,
    /// Step limit; `10 * length` when `None`
    pub max_steps: Option<usize>,
    /// Report the global count every this many steps (0 disables)
    pub print_freq: usize,
    /// Place the fixed live stripes beyond the bounded edges
    pub open_boundary: bool,
    /// Where the final image goes; not written when `None`
    pub output: Option<PathBuf>,
}

impl SimulationConfig {
    /// Defaults for everything except the seed. Single worker, no output file.
    pub fn new(seed: u64) -> Self {
        SimulationConfig {
            seed,
            length: DEFAULT_LENGTH,
            density: DEFAULT_DENSITY,
            workers: 1,
            grid: None,
            max_steps: None,
            print_freq: DEFAULT_PRINT_FREQ,
            open_boundary: true,
            output: None,
        }
    }

    /// The step limit in effect.
    pub fn max_steps(&self) -> usize {
        self.max_steps.unwrap_or(10 * self.length)
    }

    /// The process grid for this configuration.
    pub fn topology(&self) -> Result<Topology> {
        match self.grid {
            Some((rows, columns)) => Topology::new(self.workers, rows, columns),
            None => Topology::balanced(self.workers),
        }
    }

    /// Initial-lattice parameters.
    pub fn seeding(&self) -> Seeding {
        Seeding {
            length: self.length,
            density: self.density,
            seed: self.seed,
            open_boundary: self.open_boundary,
        }
    }

    /// Check the settings that do not depend on the topology.
    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(Error::config("lattice length must be positive"));
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(Error::config(format!(
                "density {} is outside [0, 1]",
                self.density
            )));
        }
        if self.workers == 0 {
            return Err(Error::config("at least one worker is required"));
        }
        Ok(())
    }
}

/// Parse a process grid written as `ROWSxCOLUMNS`, e.g. `4x2`.
pub fn parse_grid(text: &str) -> std::result::Result<(usize, usize), String> {
    let (rows, columns) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected ROWSxCOLUMNS, got '{text}'"))?;
    let rows = rows
        .trim()
        .parse()
        .map_err(|e| format!("bad row count '{rows}': {e}"))?;
    let columns = columns
        .trim()
        .parse()
        .map_err(|e| format!("bad column count '{columns}': {e}"))?;
    Ok((rows, columns))
}
