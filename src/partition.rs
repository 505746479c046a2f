//! Splitting the lattice into tiles.
//!
//! Each axis is cut into blocks of `floor(L / parts)` cells; the last block
//! along an axis takes whatever is left over.

use crate::error::{Error, Result};
use crate::topology::Topology;

/// Where a worker's owned rectangle sits in the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileExtent {
    /// First owned x coordinate
    pub x0: usize,
    /// First owned y coordinate
    pub y0: usize,
    /// Owned cells along x
    pub nx: usize,
    /// Owned cells along y
    pub ny: usize,
}

impl TileExtent {
    /// Number of owned cells.
    pub fn area(&self) -> usize {
        self.nx * self.ny
    }
}

/// Block sizes along both axes for one lattice and process grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    length: usize,
    x_blocks: Vec<usize>,
    y_blocks: Vec<usize>,
}

impl Partition {
    /// Partition an `length × length` lattice over `topology`.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if an axis has more blocks than cells.
    pub fn new(length: usize, topology: &Topology) -> Result<Self> {
        Ok(Partition {
            length,
            x_blocks: blocks(length, topology.rows())?,
            y_blocks: blocks(length, topology.columns())?,
        })
    }

    /// Lattice side length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Block sizes along x, one per process row.
    pub fn x_blocks(&self) -> &[usize] {
        &self.x_blocks
    }

    /// Block sizes along y, one per process column.
    pub fn y_blocks(&self) -> &[usize] {
        &self.y_blocks
    }

    /// Extent of the tile at grid coordinates `(row, column)`.
    ///
    /// Offsets are `coordinate × first block size`. Only the last block is
    /// ever larger, so this lands every tile where it belongs.
    pub fn extent(&self, row: usize, column: usize) -> TileExtent {
        TileExtent {
            x0: row * self.x_blocks[0],
            y0: column * self.y_blocks[0],
            nx: self.x_blocks[row],
            ny: self.y_blocks[column],
        }
    }
}

fn blocks(length: usize, parts: usize) -> Result<Vec<usize>> {
    if parts == 0 || parts > length {
        return Err(Error::config(format!(
            "cannot cut a lattice of length {length} into {parts} block(s)"
        )));
    }
    let uniform = length / parts;
    let mut sizes = vec![uniform; parts];
    sizes[parts - 1] = length - (parts - 1) * uniform;
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn remainder_goes_to_last_block() {
        assert_eq!(blocks(10, 3).unwrap(), vec![3, 3, 4]);
        assert_eq!(blocks(960, 4).unwrap(), vec![240; 4]);
        assert_eq!(blocks(7, 1).unwrap(), vec![7]);
        assert_eq!(blocks(5, 4).unwrap(), vec![1, 1, 1, 2]);
    }

    #[test]
    fn too_many_blocks_rejected() {
        assert!(matches!(blocks(3, 4), Err(Error::Configuration(_))));
        assert!(blocks(3, 0).is_err());
    }

    #[test]
    fn extents_on_uneven_grid() {
        let topo = Topology::new(6, 3, 2).unwrap();
        let part = Partition::new(10, &topo).unwrap();
        assert_eq!(
            part.extent(2, 1),
            TileExtent {
                x0: 6,
                y0: 5,
                nx: 4,
                ny: 5
            }
        );
        assert_eq!(part.extent(1, 0).x0, 3);
        assert_eq!(part.extent(2, 1).area(), 20);
    }

    proptest! {
        #[test]
        fn tiles_cover_the_lattice_exactly(workers in 1usize..40, length in 1usize..300) {
            let topo = Topology::balanced(workers).unwrap();
            prop_assume!(topo.rows() <= length);
            let part = Partition::new(length, &topo).unwrap();

            for axis in [part.x_blocks(), part.y_blocks()] {
                prop_assert_eq!(axis.iter().sum::<usize>(), length);
                let uniform = axis[0];
                prop_assert!(axis[..axis.len() - 1].iter().all(|&b| b == uniform));
                prop_assert!(axis[axis.len() - 1] >= uniform);
            }

            let mut owner = vec![0u8; length * length];
            let mut area = 0;
            for rank in 0..workers {
                let (row, column) = topo.coords(rank);
                let e = part.extent(row, column);
                area += e.area();
                for x in e.x0..e.x0 + e.nx {
                    for y in e.y0..e.y0 + e.ny {
                        owner[x * length + y] += 1;
                    }
                }
            }
            prop_assert!(owner.iter().all(|&n| n == 1));
            prop_assert_eq!(area, length * length);
        }
    }
}
