//! The automaton update rule.

use crate::tile::Tile;

/// Whether a cell is alive next step given its 5-point sum (itself plus its
/// four nearest neighbors).
pub fn survives(sum: u8) -> bool {
    matches!(sum, 2 | 4 | 5)
}

/// Advance every owned cell of `tile` by one step and return the number of
/// live owned cells afterwards.
///
/// Reads the halo, so it must run on a freshly exchanged tile. All sums are
/// taken before any cell changes.
pub fn advance(tile: &mut Tile) -> u64 {
    let (nx, ny, stride) = (tile.nx(), tile.ny(), tile.stride());
    let (cells, sums) = tile.cells_and_sums();

    for i in 1..=nx {
        for j in 1..=ny {
            let c = i * stride + j;
            sums[c] = cells[c] + cells[c - 1] + cells[c + 1] + cells[c - stride] + cells[c + stride];
        }
    }

    let mut live = 0;
    for i in 1..=nx {
        let row = i * stride;
        for c in row + 1..=row + ny {
            let alive = survives(sums[c]);
            cells[c] = u8::from(alive);
            live += u64::from(alive);
        }
    }
    live
}
