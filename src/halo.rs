//! Halo exchange between neighboring tiles.
//!
//! Each step a worker posts eight transfers: its four boundary slices go out
//! to the matching neighbors, and four receives fill its halo from the
//! opposite neighbors. Slices along y are contiguous; slices along x are one
//! strided [`VectorLayout`](crate::VectorLayout) each. Every direction of
//! travel has its own tag, so the transfers stay unambiguous when both
//! neighbors on an axis are the same worker, or the worker itself.

use crate::comm::Communicator;
use crate::error::Result;
use crate::request::Request;
use crate::tile::{Side, Tile};
use crate::topology::Neighbors;

/// Tag for boundary data travelling towards `side`.
fn tag(side: Side) -> i32 {
    match side {
        Side::Up => 10,
        Side::Down => 11,
        Side::Left => 12,
        Side::Right => 13,
    }
}

fn neighbor(neighbors: &Neighbors, side: Side) -> Option<usize> {
    match side {
        Side::Up => neighbors.up,
        Side::Down => neighbors.down,
        Side::Left => neighbors.left,
        Side::Right => neighbors.right,
    }
}

/// The per-worker halo exchange plan.
#[derive(Debug, Clone, Copy)]
pub struct HaloExchange {
    neighbors: Neighbors,
}

/// An exchange whose eight transfers have been posted but not completed.
///
/// Holds the tile mutably so nothing can read it until
/// [`complete`](Self::complete) has drained every transfer.
#[must_use = "halo cells are stale until the exchange is completed"]
pub struct InFlight<'c, 't> {
    tile: &'t mut Tile,
    requests: Vec<Request<'c, u8>>,
}

impl HaloExchange {
    /// Plan exchanges with `neighbors`; `None` sides are skipped.
    pub fn new(neighbors: Neighbors) -> Self {
        HaloExchange { neighbors }
    }

    /// The neighbors this plan talks to.
    pub fn neighbors(&self) -> &Neighbors {
        &self.neighbors
    }

    /// Post the four sends and four receives for `tile`.
    pub fn start<'c, 't>(
        &self,
        world: &'c Communicator,
        tile: &'t mut Tile,
    ) -> Result<InFlight<'c, 't>> {
        let mut requests = Vec::with_capacity(8);
        for side in Side::ALL {
            let from = side.opposite();
            requests.push(world.irecv(
                tile.halo(from),
                neighbor(&self.neighbors, from),
                tag(side),
            )?);
            requests.push(world.isend(
                tile.cells(),
                tile.boundary(side),
                neighbor(&self.neighbors, side),
                tag(side),
            )?);
        }
        Ok(InFlight { tile, requests })
    }

    /// Post and complete a full exchange.
    pub fn exchange(&self, world: &Communicator, tile: &mut Tile) -> Result<()> {
        self.start(world, tile)?.complete().map(drop)
    }
}

impl<'c, 't> InFlight<'c, 't> {
    /// Number of transfers that have not finished yet.
    pub fn pending(&self) -> usize {
        self.requests.iter().filter(|r| !r.is_completed()).count()
    }

    /// Wait for all eight transfers and hand the refreshed tile back.
    pub fn complete(self) -> Result<&'t mut Tile> {
        let InFlight { tile, requests } = self;
        Request::wait_all(requests, tile.cells_mut())?;
        Ok(tile)
    }
}
