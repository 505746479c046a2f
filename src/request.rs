//! Request handles for nonblocking operations.

use crate::comm::Communicator;
use crate::datatype::{MpiDatatype, VectorLayout};
use crate::error::{Error, Result};
use crate::status::Status;
use std::marker::PhantomData;

enum Pending {
    /// Complete on creation (sends, and transfers with no peer)
    Done,
    Receive {
        source: usize,
        tag: i32,
        layout: VectorLayout,
    },
}

/// A handle to a nonblocking operation.
///
/// Sends are buffered and complete as soon as they are posted. A receive stays
/// pending until [`wait`](Self::wait) or [`wait_all`](Self::wait_all) matches
/// its message and unpacks it into the buffer passed there. Passing the buffer
/// at completion time means nothing can read the target cells while the
/// transfer is still outstanding.
///
/// Dropping a pending receive leaves its message queued on the communicator.
///
/// # Example
///
/// ```
/// use percolate::{Cohort, Request, VectorLayout};
///
/// Cohort::run(2, |world| {
///     let peer = Some(1 - world.rank());
///     let mut buf = [world.rank() as u32 + 1, 0];
///     let send = world.isend(&buf, VectorLayout::contiguous(0, 1), peer, 0)?;
///     let recv = world.irecv::<u32>(VectorLayout::contiguous(1, 1), peer, 0)?;
///     Request::wait_all(vec![send, recv], &mut buf)?;
///     assert_eq!(buf[1], 2 - world.rank() as u32);
///     Ok(())
/// })
/// .unwrap();
/// ```
#[must_use = "a pending receive does nothing until it is waited on"]
pub struct Request<'c, T: MpiDatatype> {
    comm: &'c Communicator,
    pending: Pending,
    _element: PhantomData<T>,
}

impl<'c, T: MpiDatatype> Request<'c, T> {
    pub(crate) fn null(comm: &'c Communicator) -> Self {
        Request {
            comm,
            pending: Pending::Done,
            _element: PhantomData,
        }
    }

    pub(crate) fn sent(comm: &'c Communicator) -> Self {
        Self::null(comm)
    }

    pub(crate) fn receive(
        comm: &'c Communicator,
        source: usize,
        tag: i32,
        layout: VectorLayout,
    ) -> Self {
        Request {
            comm,
            pending: Pending::Receive {
                source,
                tag,
                layout,
            },
            _element: PhantomData,
        }
    }

    /// Check if this request has been completed.
    pub fn is_completed(&self) -> bool {
        matches!(self.pending, Pending::Done)
    }

    /// Wait for this operation to complete.
    ///
    /// For a receive, blocks until the matching message arrives and writes it
    /// into `buf` through the request's layout, returning its [`Status`].
    /// Completed requests return `None` and leave `buf` alone.
    pub fn wait(self, buf: &mut [T]) -> Result<Option<Status>> {
        let Pending::Receive {
            source,
            tag,
            layout,
        } = self.pending
        else {
            return Ok(None);
        };

        let data = self.comm.take::<T>(source, tag)?;
        if data.len() != layout.count {
            return Err(Error::InvalidCount {
                expected: layout.count,
                actual: data.len(),
            });
        }
        if !layout.fits(buf.len()) {
            return Err(Error::InvalidBuffer);
        }
        layout.unpack(buf, &data);
        Ok(Some(Status {
            source,
            tag,
            count: data.len(),
        }))
    }

    /// Wait for all requests in a collection to complete.
    ///
    /// Every request must target `buf`. Returns only once all of them have
    /// finished, or at the first failure.
    pub fn wait_all(requests: Vec<Self>, buf: &mut [T]) -> Result<()> {
        for request in requests {
            request.wait(buf)?;
        }
        Ok(())
    }
}
