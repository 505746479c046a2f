//! Driving a whole run: set-up, the step loop, and collection.
//!
//! Every worker executes [`run_worker`]. Each step goes through the same
//! phases on every worker:
//!
//! ```text
//! EXCHANGE_HALOS -> COMPUTE_SUMS -> APPLY_RULE -> REDUCE_COUNT -> CHECK_TERMINATION
//!       ^                                                               |
//!       +------------------------------ continue ----------------------+
//! ```
//!
//! The halo exchange is the only point-to-point synchronization; the count
//! reduction and broadcast act as a cohort-wide fence once per step.

use log::{debug, info, trace};

use crate::collect;
use crate::comm::Communicator;
use crate::config::SimulationConfig;
use crate::convergence::{self, Convergence, StopReason};
use crate::error::{Error, Result};
use crate::halo::HaloExchange;
use crate::init;
use crate::lattice::Lattice;
use crate::partition::Partition;
use crate::pbm;
use crate::step;
use crate::{Cohort, ROOT};

/// Outcome of a finished run, as seen by the coordinator.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Steps executed
    pub steps: usize,
    /// Live cells in the seeded lattice
    pub initial_count: u64,
    /// Live cells after the last step
    pub final_count: u64,
    /// Why the loop ended
    pub stop: StopReason,
    /// Wall-clock seconds spent in the step loop
    pub elapsed: f64,
    /// The reassembled final lattice
    pub lattice: Lattice,
}

impl RunSummary {
    /// Mean time per step in milliseconds (0 when no step ran).
    pub fn ms_per_step(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            1000.0 * self.elapsed / self.steps as f64
        }
    }
}

/// Run a full simulation on `config.workers` workers and write the image if
/// an output path is configured.
pub fn run(config: &SimulationConfig) -> Result<RunSummary> {
    config.validate()?;
    let reports = Cohort::run(config.workers, |world| run_worker(world, config))?;
    let summary = reports
        .into_iter()
        .flatten()
        .next()
        .ok_or_else(|| Error::Internal("coordinator produced no summary".into()))?;

    if let Some(path) = &config.output {
        pbm::write_pbm_file(path, &summary.lattice)?;
    }
    Ok(summary)
}

/// The program every worker runs. Returns the summary on the coordinator and
/// `None` elsewhere.
pub fn run_worker(world: &Communicator, config: &SimulationConfig) -> Result<Option<RunSummary>> {
    let rank = world.rank();
    let topology = config.topology()?;
    if topology.size() != world.size() {
        return Err(Error::config(format!(
            "a {}x{} process grid needs {} worker(s), running on {}",
            topology.rows(),
            topology.columns(),
            topology.size(),
            world.size()
        )));
    }
    let partition = Partition::new(config.length, &topology)?;
    let max_steps = config.max_steps();

    if rank == ROOT {
        info!(
            "running on {} worker(s) as a {}x{} grid",
            world.size(),
            topology.rows(),
            topology.columns()
        );
        info!(
            "L = {}, rho = {:.6}, seed = {}, maxstep = {}",
            config.length, config.density, config.seed, max_steps
        );
    }

    let (mut tile, initial) = init::initialize(world, &topology, &partition, &config.seeding())?;
    let halo = HaloExchange::new(topology.neighbors(rank));
    let convergence = Convergence::new(initial, max_steps);
    debug!(
        "rank {rank}: neighbors {:?}, thresholds {:?}",
        halo.neighbors(),
        convergence.thresholds()
    );

    world.barrier()?;
    let start = Cohort::wtime();

    let mut steps = 0;
    let mut global = initial;
    let mut stop = StopReason::MaxSteps;
    for step_no in 1..=max_steps {
        let fresh = halo.start(world, &mut tile)?.complete()?;
        let local = step::advance(fresh);
        global = convergence::global_count(world, local)?;
        steps = step_no;
        trace!("rank {rank}: step {step_no}, local {local}, global {global}");

        if rank == ROOT && config.print_freq > 0 && step_no % config.print_freq == 0 {
            info!("number of living cells on step {step_no} is {global}");
        }
        if let Some(reason) = convergence.check(step_no, global) {
            if rank == ROOT && reason == StopReason::ThresholdCrossed {
                info!("terminate at step {step_no} with {global} living cells");
            }
            stop = reason;
            break;
        }
    }

    world.barrier()?;
    let elapsed = Cohort::wtime() - start;

    let assembled = collect::collect(world, &tile, config.length)?;
    Ok(assembled.map(|lattice| {
        let summary = RunSummary {
            steps,
            initial_count: initial,
            final_count: global,
            stop,
            elapsed,
            lattice,
        };
        info!(
            "L={}, rho={:.6}, T={}, ms={}, seed={}",
            config.length,
            config.density,
            world.size(),
            max_steps,
            config.seed
        );
        info!(
            "time per step: {:.6} ms, total steps: {} ({})",
            summary.ms_per_step(),
            summary.steps,
            summary.stop
        );
        summary
    }))
}
