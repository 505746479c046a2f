//! Process-grid topology.
//!
//! Workers are arranged on a `rows × columns` grid, ranked row-major. The row
//! axis follows the lattice x axis and is periodic; the column axis follows
//! the bounded y axis, so the first and last columns have no neighbor on
//! their outer side.

use crate::error::{Error, Result};

/// The four neighbors of one worker. `None` marks a bounded edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    /// Previous row (wraps)
    pub up: Option<usize>,
    /// Next row (wraps)
    pub down: Option<usize>,
    /// Previous column
    pub left: Option<usize>,
    /// Next column
    pub right: Option<usize>,
}

/// Immutable `rows × columns` arrangement of a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    rows: usize,
    columns: usize,
}

impl Topology {
    /// An explicit process grid for `workers` workers.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] unless `rows * columns == workers` with both
    /// factors non-zero.
    pub fn new(workers: usize, rows: usize, columns: usize) -> Result<Self> {
        if rows == 0 || columns == 0 || rows * columns != workers {
            return Err(Error::config(format!(
                "a {rows}x{columns} process grid cannot hold {workers} worker(s)"
            )));
        }
        Ok(Topology { rows, columns })
    }

    /// The most square grid for `workers`, with `rows >= columns`.
    pub fn balanced(workers: usize) -> Result<Self> {
        let (rows, columns) = balanced_dims(workers);
        Self::new(workers, rows, columns)
    }

    /// Number of process rows (blocks along x).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of process columns (blocks along y).
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of workers in the grid.
    pub fn size(&self) -> usize {
        self.rows * self.columns
    }

    /// Grid coordinates `(row, column)` of `rank`.
    pub fn coords(&self, rank: usize) -> (usize, usize) {
        (rank / self.columns, rank % self.columns)
    }

    /// Rank at grid coordinates `(row, column)`.
    pub fn rank_of(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    /// Neighbors of `rank`.
    pub fn neighbors(&self, rank: usize) -> Neighbors {
        let (row, column) = self.coords(rank);
        let up = (row + self.rows - 1) % self.rows;
        let down = (row + 1) % self.rows;
        Neighbors {
            up: Some(self.rank_of(up, column)),
            down: Some(self.rank_of(down, column)),
            left: column.checked_sub(1).map(|c| self.rank_of(row, c)),
            right: (column + 1 < self.columns).then(|| self.rank_of(row, column + 1)),
        }
    }

    /// Whether `rank` sits on the first column (owns the y = 0 edge).
    pub fn is_first_column(&self, rank: usize) -> bool {
        self.coords(rank).1 == 0
    }

    /// Whether `rank` sits on the last column (owns the y = L-1 edge).
    pub fn is_last_column(&self, rank: usize) -> bool {
        self.coords(rank).1 + 1 == self.columns
    }
}

/// Split `n` into two factors as close together as possible, larger first.
fn balanced_dims(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let mut columns = (n as f64).sqrt() as usize;
    while columns > 1 && n % columns != 0 {
        columns -= 1;
    }
    let columns = columns.max(1);
    (n / columns, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn balanced_factors() {
        assert_eq!(balanced_dims(1), (1, 1));
        assert_eq!(balanced_dims(2), (2, 1));
        assert_eq!(balanced_dims(4), (2, 2));
        assert_eq!(balanced_dims(6), (3, 2));
        assert_eq!(balanced_dims(7), (7, 1));
        assert_eq!(balanced_dims(12), (4, 3));
        assert_eq!(balanced_dims(16), (4, 4));
    }

    #[test]
    fn wrong_worker_count_rejected() {
        let err = Topology::new(6, 2, 2).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(Topology::new(0, 0, 1).is_err());
        assert!(Topology::balanced(0).is_err());
    }

    #[test]
    fn neighbors_on_3x2() {
        let topo = Topology::new(6, 3, 2).unwrap();
        // rank 0 = (0,0)
        assert_eq!(
            topo.neighbors(0),
            Neighbors {
                up: Some(4),
                down: Some(2),
                left: None,
                right: Some(1),
            }
        );
        // rank 5 = (2,1)
        assert_eq!(
            topo.neighbors(5),
            Neighbors {
                up: Some(3),
                down: Some(1),
                left: Some(4),
                right: None,
            }
        );
        assert!(topo.is_first_column(2));
        assert!(topo.is_last_column(3));
    }

    #[test]
    fn single_worker_wraps_onto_itself() {
        let topo = Topology::balanced(1).unwrap();
        let n = topo.neighbors(0);
        assert_eq!((n.up, n.down, n.left, n.right), (Some(0), Some(0), None, None));
    }

    proptest! {
        #[test]
        fn neighbor_relation_is_symmetric(workers in 1usize..64) {
            let topo = Topology::balanced(workers).unwrap();
            prop_assert_eq!(topo.size(), workers);
            prop_assert!(topo.rows() >= topo.columns());
            for rank in 0..workers {
                let n = topo.neighbors(rank);
                prop_assert_eq!(topo.neighbors(n.up.unwrap()).down, Some(rank));
                prop_assert_eq!(topo.neighbors(n.down.unwrap()).up, Some(rank));
                if let Some(left) = n.left {
                    prop_assert_eq!(topo.neighbors(left).right, Some(rank));
                }
                if let Some(right) = n.right {
                    prop_assert_eq!(topo.neighbors(right).left, Some(rank));
                }
                let (row, column) = topo.coords(rank);
                prop_assert_eq!(topo.rank_of(row, column), rank);
            }
        }
    }
}
