//! Per-worker tile storage with a one-cell halo.
//!
//! A tile owning `nx × ny` cells is stored as one row-major buffer of
//! `(nx + 2) × (ny + 2)` cells. Padded index `(i, j)` with `1 <= i <= nx` and
//! `1 <= j <= ny` is owned cell `(x0 + i - 1, y0 + j - 1)`; the ring around it
//! is the halo. Rows (fixed `i`) run along y and are contiguous; columns
//! (fixed `j`) run along x with stride `ny + 2`.

use crate::datatype::VectorLayout;
use crate::lattice::Lattice;
use crate::partition::TileExtent;

/// One of the four sides of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Low-x side (row `i = 0`)
    Up,
    /// High-x side (row `i = nx + 1`)
    Down,
    /// Low-y side (column `j = 0`)
    Left,
    /// High-y side (column `j = ny + 1`)
    Right,
}

impl Side {
    /// All four sides.
    pub const ALL: [Side; 4] = [Side::Up, Side::Down, Side::Left, Side::Right];

    /// The side facing this one across a tile boundary.
    pub fn opposite(self) -> Side {
        match self {
            Side::Up => Side::Down,
            Side::Down => Side::Up,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A worker's cells plus halo, and the scratch buffer for neighbor sums.
#[derive(Debug, Clone)]
pub struct Tile {
    extent: TileExtent,
    cells: Vec<u8>,
    sums: Vec<u8>,
}

impl Tile {
    /// An all-dead tile for `extent`.
    pub fn new(extent: TileExtent) -> Self {
        let padded = (extent.nx + 2) * (extent.ny + 2);
        Tile {
            extent,
            cells: vec![0; padded],
            sums: vec![0; padded],
        }
    }

    /// Copy the owned block of `lattice` into a fresh tile. The halo is dead.
    pub fn from_lattice(lattice: &Lattice, extent: TileExtent) -> Self {
        let mut tile = Tile::new(extent);
        for (i, source) in lattice.block_rows(&extent).enumerate() {
            let start = tile.index(i + 1, 1);
            tile.cells[start..start + extent.ny].copy_from_slice(source);
        }
        tile
    }

    /// Copy the owned cells into their place in `lattice`.
    pub fn write_into(&self, lattice: &mut Lattice) {
        let ny = self.extent.ny;
        let stride = self.stride();
        for (i, target) in lattice.block_rows_mut(&self.extent).enumerate() {
            let start = (i + 1) * stride + 1;
            target.copy_from_slice(&self.cells[start..start + ny]);
        }
    }

    /// Where this tile sits in the lattice.
    pub fn extent(&self) -> &TileExtent {
        &self.extent
    }

    /// Owned cells along x.
    pub fn nx(&self) -> usize {
        self.extent.nx
    }

    /// Owned cells along y.
    pub fn ny(&self) -> usize {
        self.extent.ny
    }

    /// Padded row length.
    pub fn stride(&self) -> usize {
        self.extent.ny + 2
    }

    /// Flat index of padded coordinates `(i, j)`.
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.stride() + j
    }

    /// Cell at padded coordinates `(i, j)`, halo included.
    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.cells[self.index(i, j)]
    }

    /// Set the cell at padded coordinates `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, alive: bool) {
        let idx = self.index(i, j);
        self.cells[idx] = u8::from(alive);
    }

    /// The whole padded buffer.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// The whole padded buffer, mutably.
    pub fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Cells and the neighbor-sum scratch buffer, borrowed together.
    pub(crate) fn cells_and_sums(&mut self) -> (&mut [u8], &mut [u8]) {
        (&mut self.cells, &mut self.sums)
    }

    /// Live owned cells (halo excluded).
    pub fn live_count(&self) -> u64 {
        (1..=self.nx())
            .map(|i| {
                let start = self.index(i, 1);
                self.cells[start..start + self.ny()]
                    .iter()
                    .map(|&c| u64::from(c))
                    .sum::<u64>()
            })
            .sum()
    }

    /// Owned cells adjacent to `side`: what a neighbor on that side needs.
    pub fn boundary(&self, side: Side) -> VectorLayout {
        let (nx, ny, stride) = (self.nx(), self.ny(), self.stride());
        match side {
            Side::Up => VectorLayout::contiguous(self.index(1, 1), ny),
            Side::Down => VectorLayout::contiguous(self.index(nx, 1), ny),
            Side::Left => VectorLayout::strided(self.index(1, 1), nx, stride),
            Side::Right => VectorLayout::strided(self.index(1, ny), nx, stride),
        }
    }

    /// Halo cells on `side`, corners excluded.
    pub fn halo(&self, side: Side) -> VectorLayout {
        let (nx, ny, stride) = (self.nx(), self.ny(), self.stride());
        match side {
            Side::Up => VectorLayout::contiguous(self.index(0, 1), ny),
            Side::Down => VectorLayout::contiguous(self.index(nx + 1, 1), ny),
            Side::Left => VectorLayout::strided(self.index(1, 0), nx, stride),
            Side::Right => VectorLayout::strided(self.index(1, ny + 1), nx, stride),
        }
    }

    /// Set every halo cell (corners included) dead.
    pub fn clear_halo(&mut self) {
        let (nx, ny) = (self.nx(), self.ny());
        for j in 0..ny + 2 {
            self.set(0, j, false);
            self.set(nx + 1, j, false);
        }
        for i in 0..nx + 2 {
            self.set(i, 0, false);
            self.set(i, ny + 1, false);
        }
    }
}
