//! # percolate
//!
//! Domain-decomposed simulation of a 2-D percolation automaton over a fixed
//! cohort of cooperating workers.
//!
//! The L×L lattice is split into rectangular tiles, one per worker. Each step
//! the workers refresh a one-cell halo around their tile from their four
//! neighbors, apply a fixed 5-point survival rule, and agree on the global
//! live-cell count through a reduction. The run stops after a fixed number of
//! steps or as soon as the live population leaves a band around its initial
//! value, and the tiles are reassembled into a single lattice for output.
//!
//! The crate provides:
//! - An in-process SPMD runtime ([`Cohort`], [`Communicator`], [`Request`])
//!   with nonblocking strided transfers and broadcast/reduce collectives
//! - The process-grid [`Topology`] and lattice [`Partition`]
//! - Tile storage with halos ([`Tile`]) and the assembled [`Lattice`]
//! - The [`HaloExchange`] protocol, the step rule and the [`Convergence`] check
//! - A plain PBM writer and the seeded [`UniformSource`]
//!
//! ## Quick Start
//!
//! ```
//! use percolate::{simulation, SimulationConfig};
//!
//! fn main() -> Result<(), percolate::Error> {
//!     let config = SimulationConfig {
//!         length: 24,
//!         workers: 4,
//!         max_steps: Some(50),
//!         ..SimulationConfig::new(1234)
//!     };
//!     let summary = simulation::run(&config)?;
//!     println!("{} steps, {} cells alive", summary.steps, summary.final_count);
//!     assert_eq!(summary.lattice.length(), 24);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

mod comm;
mod datatype;
mod error;
mod request;
mod status;

pub mod collect;
pub mod config;
pub mod convergence;
pub mod halo;
pub mod init;
pub mod lattice;
pub mod partition;
pub mod pbm;
pub mod rng;
pub mod simulation;
pub mod step;
pub mod tile;
pub mod topology;

pub use comm::Communicator;
pub use config::SimulationConfig;
pub use convergence::{Convergence, StopReason, Thresholds};
pub use datatype::{DatatypeTag, MpiDatatype, VectorLayout};
pub use error::{Error, ErrorClass, Result};
pub use halo::HaloExchange;
pub use lattice::Lattice;
pub use partition::{Partition, TileExtent};
pub use request::Request;
pub use rng::UniformSource;
pub use status::Status;
pub use tile::Tile;
pub use topology::{Neighbors, Topology};

use comm::Envelope;
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Instant;

/// Rank of the coordinating worker.
pub const ROOT: usize = 0;

/// Reduction operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ReduceOp {
    /// Sum of values
    Sum = 0,
    /// Maximum value
    Max = 1,
    /// Minimum value
    Min = 2,
    /// Product of values
    Prod = 3,
}

/// A fixed set of worker threads running the same program.
///
/// [`Cohort::run`] is the in-process counterpart of launching `size` ranks:
/// every worker runs the same closure with its own [`Communicator`], and the
/// cohort lives exactly as long as the call.
///
/// # Example
///
/// ```
/// use percolate::Cohort;
///
/// let ranks = Cohort::run(3, |world| Ok((world.rank(), world.size()))).unwrap();
/// assert_eq!(ranks, vec![(0, 3), (1, 3), (2, 3)]);
/// ```
pub struct Cohort;

impl Cohort {
    /// Run `body` on `size` workers and collect their results in rank order.
    ///
    /// If any worker fails, the others are aborted at their next receive and
    /// the error returned is the lowest-rank failure that was not itself
    /// caused by an abort. A panicking worker is reported as
    /// [`Error::WorkerPanicked`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `size` is zero.
    pub fn run<T, F>(size: usize, body: F) -> Result<Vec<T>>
    where
        F: Fn(&Communicator) -> Result<T> + Sync,
        T: Send,
    {
        if size == 0 {
            return Err(Error::config("a cohort needs at least one worker"));
        }
        Self::epoch();

        let (senders, inboxes): (Vec<_>, Vec<_>) =
            (0..size).map(|_| mpsc::channel::<Envelope>()).unzip();
        let body = &body;

        let outcomes: Vec<Result<T>> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(size);
            for (rank, inbox) in inboxes.into_iter().enumerate() {
                let peers = senders.clone();
                let spawned = thread::Builder::new()
                    .name(format!("worker-{rank}"))
                    .spawn_scoped(scope, move || {
                        let world = Communicator::new(rank, peers, inbox);
                        let _guard = AbortOnPanic(&world);
                        let result = body(&world);
                        if result.is_err() {
                            world.abort();
                        }
                        result
                    });
                match spawned {
                    Ok(handle) => handles.push(Ok(handle)),
                    Err(err) => {
                        log::error!("failed to spawn worker {rank}: {err}");
                        for peer in &senders {
                            let _ = peer.send(Envelope::abort(rank));
                        }
                        handles.push(Err(Error::Io(err)));
                    }
                }
            }

            handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| match handle {
                    Ok(handle) => handle.join().unwrap_or(Err(Error::WorkerPanicked(rank))),
                    Err(err) => Err(err),
                })
                .collect()
        });

        let mut results = Vec::with_capacity(size);
        let mut root_cause = None;
        let mut secondary = None;
        for outcome in outcomes {
            match outcome {
                Ok(value) => results.push(value),
                Err(err) if err.is_secondary() => {
                    secondary.get_or_insert(err);
                }
                Err(err) => {
                    root_cause.get_or_insert(err);
                }
            }
        }
        match root_cause.or(secondary) {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }

    /// Get the current wall-clock time in seconds.
    ///
    /// Measured from a fixed point in this process, so differences between
    /// two calls are meaningful on any worker.
    pub fn wtime() -> f64 {
        Self::epoch().elapsed().as_secs_f64()
    }

    fn epoch() -> Instant {
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        *EPOCH.get_or_init(Instant::now)
    }
}

/// Aborts the cohort if the worker unwinds.
struct AbortOnPanic<'a>(&'a Communicator);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cohort_is_a_configuration_error() {
        let err = Cohort::run(0, |_| Ok(())).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Configuration);
    }

    #[test]
    fn failure_aborts_blocked_peers() {
        // Rank 1 fails; ranks 0 and 2 would otherwise wait on it forever.
        let err = Cohort::run(3, |world| {
            if world.rank() == 1 {
                return Err(Error::config("bad input on rank 1"));
            }
            let mut buf = [0u8];
            world.recv(&mut buf, 1, 0).map(drop)
        })
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "got {err:?}");
    }

    #[test]
    fn panic_is_reported_and_aborts_peers() {
        let err = Cohort::run(2, |world| {
            if world.rank() == 0 {
                panic!("worker 0 gives up");
            }
            world.barrier()
        })
        .unwrap_err();
        assert!(matches!(err, Error::WorkerPanicked(0)), "got {err:?}");
    }

    #[test]
    fn send_to_exited_worker_does_not_mask_its_failure() {
        let err = Cohort::run(2, |world| {
            if world.rank() == 1 {
                return Err(Error::config("bad input on rank 1"));
            }
            // let rank 1 exit and drop its inbox first
            thread::sleep(std::time::Duration::from_millis(200));
            world.send(&[1u8], 1, 0)
        })
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "got {err:?}");
    }

    #[test]
    fn barrier_completes() {
        let out = Cohort::run(5, |world| {
            world.barrier()?;
            world.barrier()?;
            Ok(world.rank())
        })
        .unwrap();
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn wtime_is_monotonic() {
        let t0 = Cohort::wtime();
        let t1 = Cohort::wtime();
        assert!(t1 >= t0);
    }
}
