//! Seeding the lattice and handing each worker its starting tile.

use std::ops::Range;

use log::{debug, info};

use crate::comm::Communicator;
use crate::error::Result;
use crate::lattice::Lattice;
use crate::partition::{Partition, TileExtent};
use crate::rng::UniformSource;
use crate::tile::{Side, Tile};
use crate::topology::Topology;
use crate::ROOT;

/// Draw a Bernoulli lattice: a cell is alive iff its sample is below `density`.
///
/// Samples are drawn x-major, one per cell.
pub fn seed_lattice(source: &mut UniformSource, length: usize, density: f64) -> Lattice {
    let cells = (0..length * length)
        .map(|_| u8::from(source.draw() < density))
        .collect();
    Lattice::from_cells(length, cells)
}

/// Global x range of the open-boundary stripes: `[L/6, 5L/6)`.
pub fn stripe_range(length: usize) -> Range<usize> {
    length / 6..(5 * length) / 6
}

/// Part of the stripe owned by a tile spanning `x0..x0 + nx`, in tile-local
/// x indices (0-based). Empty when the tile misses the stripe.
pub fn stripe_span(x0: usize, nx: usize, length: usize) -> Range<usize> {
    let stripe = stripe_range(length);
    let start = stripe.start.max(x0);
    let end = stripe.end.min(x0 + nx);
    if start >= end {
        0..0
    } else {
        start - x0..end - x0
    }
}

/// Force the stripe alive in the halo beyond each bounded lattice edge this
/// tile touches.
///
/// Those halo cells face no neighbor, so no exchange ever overwrites them.
pub fn apply_open_boundary(tile: &mut Tile, topology: &Topology, rank: usize, length: usize) {
    let extent = *tile.extent();
    let span = stripe_span(extent.x0, extent.nx, length);
    let mut sides = Vec::with_capacity(2);
    if topology.is_first_column(rank) {
        sides.push(Side::Left);
    }
    if topology.is_last_column(rank) {
        sides.push(Side::Right);
    }
    for side in sides {
        let halo = tile.halo(side);
        let cells = tile.cells_mut();
        for idx in halo.indices().skip(span.start).take(span.len()) {
            cells[idx] = 1;
        }
    }
}

/// Parameters of the initial lattice.
#[derive(Debug, Clone, Copy)]
pub struct Seeding {
    /// Lattice side length
    pub length: usize,
    /// Target fraction of live cells
    pub density: f64,
    /// Random seed
    pub seed: u64,
    /// Whether to place the boundary stripes
    pub open_boundary: bool,
}

/// Build this worker's starting tile.
///
/// The coordinator seeds the full lattice and broadcasts it together with its
/// live-cell count; every worker then carves out its own block. Returns the
/// tile and the initial global live-cell count.
pub fn initialize(
    world: &Communicator,
    topology: &Topology,
    partition: &Partition,
    seeding: &Seeding,
) -> Result<(Tile, u64)> {
    let rank = world.rank();
    let length = seeding.length;

    let mut lattice = if rank == ROOT {
        let mut source = UniformSource::seed(seeding.seed);
        let lattice = seed_lattice(&mut source, length, seeding.density);
        let count = lattice.live_count();
        info!(
            "rho = {:.6}, living cells = {}, actual density = {:.6}",
            seeding.density,
            count,
            count as f64 / (length * length) as f64
        );
        lattice
    } else {
        Lattice::new(length)
    };

    let initial = world.broadcast_scalar(lattice.live_count(), ROOT)?;
    world.broadcast(lattice.cells_mut(), ROOT)?;

    let (row, column) = topology.coords(rank);
    let extent: TileExtent = partition.extent(row, column);
    let mut tile = Tile::from_lattice(&lattice, extent);
    tile.clear_halo();
    if seeding.open_boundary {
        apply_open_boundary(&mut tile, topology, rank, length);
    }
    debug!(
        "rank {rank}: tile x {}..{}, y {}..{} ({} cells)",
        extent.x0,
        extent.x0 + extent.nx,
        extent.y0,
        extent.y0 + extent.ny,
        extent.area()
    );
    Ok((tile, initial))
}
