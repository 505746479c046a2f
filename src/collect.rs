//! Reassembling the distributed tiles on the coordinator.

use crate::comm::Communicator;
use crate::error::Result;
use crate::lattice::Lattice;
use crate::tile::Tile;
use crate::{ReduceOp, ROOT};

/// Gather every worker's owned cells into one lattice on the coordinator.
///
/// Each worker writes its block into an otherwise zero lattice and the
/// lattices are summed. Tiles are disjoint and cover the lattice, so every
/// cell receives exactly one contribution. Returns `Some` on the coordinator
/// only.
pub fn collect(world: &Communicator, tile: &Tile, length: usize) -> Result<Option<Lattice>> {
    let mut mine = Lattice::new(length);
    tile.write_into(&mut mine);

    let mut assembled = Lattice::new(length);
    world.reduce(mine.cells(), assembled.cells_mut(), ReduceOp::Sum, ROOT)?;
    Ok((world.rank() == ROOT).then_some(assembled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Partition;
    use crate::topology::Topology;
    use crate::Cohort;

    #[test]
    fn scatter_then_gather_is_identity() {
        let length = 11;
        let source = Lattice::from_cells(
            length,
            (0..length * length).map(|v| u8::from(v % 7 < 3)).collect(),
        );
        let out = Cohort::run(6, |world| {
            let topo = Topology::balanced(world.size())?;
            let part = Partition::new(length, &topo)?;
            let (row, column) = topo.coords(world.rank());
            let tile = Tile::from_lattice(&source, part.extent(row, column));
            collect(world, &tile, length)
        })
        .unwrap();
        assert_eq!(out[0].as_ref(), Some(&source));
        assert!(out[1..].iter().all(Option::is_none));
    }
}
