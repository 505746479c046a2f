//! The full L×L lattice held by the coordinator.

use crate::partition::TileExtent;

/// A square grid of cells, stored x-major: cell `(x, y)` is at `x * L + y`.
///
/// Cells are `1` (alive) or `0` (dead).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    length: usize,
    cells: Vec<u8>,
}

impl Lattice {
    /// An all-dead lattice.
    pub fn new(length: usize) -> Self {
        Lattice {
            length,
            cells: vec![0; length * length],
        }
    }

    /// Wrap an existing x-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `cells.len() != length * length`.
    pub fn from_cells(length: usize, cells: Vec<u8>) -> Self {
        assert_eq!(cells.len(), length * length, "lattice buffer size");
        Lattice { length, cells }
    }

    /// Side length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Whether `(x, y)` is alive.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.cells[x * self.length + y] != 0
    }

    /// Set `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        self.cells[x * self.length + y] = u8::from(alive);
    }

    /// Number of live cells.
    pub fn live_count(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }

    /// Raw cells.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Raw cells, mutably (used as a collective buffer).
    pub fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// The owned cells of `extent`, one contiguous y-run per x.
    pub fn block_rows<'a>(&'a self, extent: &TileExtent) -> impl Iterator<Item = &'a [u8]> + 'a {
        let TileExtent { x0, y0, nx, ny } = *extent;
        let length = self.length;
        (x0..x0 + nx).map(move |x| &self.cells[x * length + y0..x * length + y0 + ny])
    }

    /// Mutable view of the owned cells of `extent`, one y-run per x.
    pub fn block_rows_mut<'a>(
        &'a mut self,
        extent: &TileExtent,
    ) -> impl Iterator<Item = &'a mut [u8]> + 'a {
        let TileExtent { x0, y0, nx, ny } = *extent;
        let length = self.length;
        self.cells
            .chunks_mut(length.max(1))
            .skip(x0)
            .take(nx)
            .map(move |row| &mut row[y0..y0 + ny])
    }
}
