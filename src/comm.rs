//! Communicator for an in-process worker cohort.
//!
//! Every worker owns one inbox. Senders push typed envelopes straight into the
//! destination inbox; receivers match on `(source, tag)` and park anything
//! else in an unexpected-message queue until a matching receive is posted.
//! Messages from a single source are delivered in the order they were sent.

use crate::datatype::{DatatypeTag, MpiDatatype, VectorLayout};
use crate::error::{Error, Result};
use crate::request::Request;
use crate::status::Status;
use crate::{ReduceOp, ROOT};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::mpsc::{Receiver, Sender};

const TAG_BARRIER: i32 = -1;
const TAG_BCAST: i32 = -2;
const TAG_REDUCE: i32 = -3;

/// A message in flight between two workers.
pub(crate) struct Envelope {
    pub(crate) source: usize,
    pub(crate) tag: i32,
    pub(crate) body: Body,
}

pub(crate) enum Body {
    Data {
        datatype: DatatypeTag,
        payload: Box<dyn Any + Send>,
    },
    /// The source worker failed; the receiver must stop.
    Abort,
}

impl Envelope {
    pub(crate) fn abort(source: usize) -> Self {
        Envelope {
            source,
            tag: TAG_BARRIER,
            body: Body::Abort,
        }
    }

    fn open<T: MpiDatatype>(self) -> Result<Vec<T>> {
        let Envelope { source, tag, body } = self;
        match body {
            Body::Data { datatype, payload } if datatype == T::TAG => payload
                .downcast::<Vec<T>>()
                .map(|data| *data)
                .map_err(|_| Error::DatatypeMismatch { rank: source, tag }),
            Body::Data { .. } => Err(Error::DatatypeMismatch { rank: source, tag }),
            Body::Abort => Err(Error::Aborted(source)),
        }
    }
}

/// A worker's endpoint into its cohort.
///
/// Provides point-to-point transfers (blocking and nonblocking) and the
/// collectives the simulation needs. Collectives must be called by every
/// worker in the same order.
///
/// # Example
///
/// ```
/// use percolate::{Cohort, ReduceOp};
///
/// let sums = Cohort::run(4, |world| {
///     let total = world.reduce_scalar(world.rank() as u64, ReduceOp::Sum, 0)?;
///     world.broadcast_scalar(total.unwrap_or_default(), 0)
/// })
/// .unwrap();
/// assert_eq!(sums, vec![6, 6, 6, 6]);
/// ```
pub struct Communicator {
    rank: usize,
    peers: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    unexpected: RefCell<VecDeque<Envelope>>,
    aborted_by: Cell<Option<usize>>,
    /// Marker to prevent Send/Sync (a communicator belongs to one worker thread)
    _marker: PhantomData<*mut ()>,
}

impl Communicator {
    pub(crate) fn new(rank: usize, peers: Vec<Sender<Envelope>>, inbox: Receiver<Envelope>) -> Self {
        Communicator {
            rank,
            peers,
            inbox,
            unexpected: RefCell::new(VecDeque::new()),
            aborted_by: Cell::new(None),
            _marker: PhantomData,
        }
    }

    /// Get the rank of the calling worker.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Get the number of workers in the cohort.
    pub fn size(&self) -> usize {
        self.peers.len()
    }

    /// Notify every other worker that this one has failed.
    ///
    /// Their next receive returns [`Error::Aborted`]. Peers that have already
    /// exited are skipped.
    pub fn abort(&self) {
        for (dest, peer) in self.peers.iter().enumerate() {
            if dest != self.rank {
                let _ = peer.send(Envelope::abort(self.rank));
            }
        }
    }

    // ========================================================================
    // Message plumbing
    // ========================================================================

    fn post<T: MpiDatatype>(&self, data: Vec<T>, dest: usize, tag: i32) -> Result<()> {
        let peer = self.peers.get(dest).ok_or(Error::InvalidRank(dest))?;
        peer.send(Envelope {
            source: self.rank,
            tag,
            body: Body::Data {
                datatype: T::TAG,
                payload: Box::new(data),
            },
        })
        .map_err(|_| Error::Disconnected(dest))
    }

    /// Block until a message from `source` with `tag` is available.
    pub(crate) fn match_envelope(&self, source: usize, tag: i32) -> Result<Envelope> {
        if let Some(culprit) = self.aborted_by.get() {
            return Err(Error::Aborted(culprit));
        }
        if source >= self.size() {
            return Err(Error::InvalidRank(source));
        }

        {
            let mut parked = self.unexpected.borrow_mut();
            if let Some(pos) = parked
                .iter()
                .position(|env| env.source == source && env.tag == tag)
            {
                if let Some(env) = parked.remove(pos) {
                    return Ok(env);
                }
            }
        }

        loop {
            // Our own sender lives in `peers`, so the inbox never disconnects.
            let env = self
                .inbox
                .recv()
                .map_err(|_| Error::Disconnected(self.rank))?;
            if let Body::Abort = env.body {
                self.aborted_by.set(Some(env.source));
                return Err(Error::Aborted(env.source));
            }
            if env.source == source && env.tag == tag {
                return Ok(env);
            }
            self.unexpected.borrow_mut().push_back(env);
        }
    }

    pub(crate) fn take<T: MpiDatatype>(&self, source: usize, tag: i32) -> Result<Vec<T>> {
        self.match_envelope(source, tag)?.open()
    }

    fn check_tag(tag: i32) -> Result<()> {
        if tag < 0 {
            Err(Error::InvalidTag(tag))
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Barrier synchronization.
    ///
    /// All workers must call this function. No worker returns until all
    /// workers have entered the barrier.
    pub fn barrier(&self) -> Result<()> {
        if self.rank == ROOT {
            for source in 1..self.size() {
                self.take::<u8>(source, TAG_BARRIER)?;
            }
            for dest in 1..self.size() {
                self.post::<u8>(Vec::new(), dest, TAG_BARRIER)?;
            }
            Ok(())
        } else {
            self.post::<u8>(Vec::new(), ROOT, TAG_BARRIER)?;
            self.take::<u8>(ROOT, TAG_BARRIER).map(drop)
        }
    }

    // ========================================================================
    // Point-to-Point Communication
    // ========================================================================

    /// Send a slice to another worker.
    ///
    /// The data is copied out before this returns, so the call never waits
    /// for the receiver.
    pub fn send<T: MpiDatatype>(&self, data: &[T], dest: usize, tag: i32) -> Result<()> {
        Self::check_tag(tag)?;
        self.post(data.to_vec(), dest, tag)
    }

    /// Receive a message from `source` with `tag` into the front of `data`.
    ///
    /// Fails with [`Error::InvalidCount`] if the message is longer than `data`.
    pub fn recv<T: MpiDatatype>(&self, data: &mut [T], source: usize, tag: i32) -> Result<Status> {
        Self::check_tag(tag)?;
        let received = self.take::<T>(source, tag)?;
        if received.len() > data.len() {
            return Err(Error::InvalidCount {
                expected: data.len(),
                actual: received.len(),
            });
        }
        data[..received.len()].copy_from_slice(&received);
        Ok(Status {
            source,
            tag,
            count: received.len(),
        })
    }

    /// Nonblocking send of the elements of `buf` selected by `layout`.
    ///
    /// A `None` destination is a no-op participant: the returned request is
    /// already complete and nothing is sent.
    pub fn isend<T: MpiDatatype>(
        &self,
        buf: &[T],
        layout: VectorLayout,
        dest: Option<usize>,
        tag: i32,
    ) -> Result<Request<'_, T>> {
        Self::check_tag(tag)?;
        let Some(dest) = dest else {
            return Ok(Request::null(self));
        };
        if !layout.fits(buf.len()) {
            return Err(Error::InvalidBuffer);
        }
        self.post(layout.pack(buf), dest, tag)?;
        Ok(Request::sent(self))
    }

    /// Nonblocking receive into the elements selected by `layout`.
    ///
    /// The target buffer is supplied when the request is completed with
    /// [`Request::wait`] or [`Request::wait_all`]. A `None` source completes
    /// without touching the buffer.
    pub fn irecv<T: MpiDatatype>(
        &self,
        layout: VectorLayout,
        source: Option<usize>,
        tag: i32,
    ) -> Result<Request<'_, T>> {
        Self::check_tag(tag)?;
        match source {
            None => Ok(Request::null(self)),
            Some(source) if source >= self.size() => Err(Error::InvalidRank(source)),
            Some(source) => Ok(Request::receive(self, source, tag, layout)),
        }
    }

    // ========================================================================
    // Blocking Collectives
    // ========================================================================

    /// Broadcast a slice from root to all workers.
    ///
    /// # Arguments
    ///
    /// * `data` - Buffer to broadcast (input at root, output at others)
    /// * `root` - Rank of the root worker
    pub fn broadcast<T: MpiDatatype>(&self, data: &mut [T], root: usize) -> Result<()> {
        if root >= self.size() {
            return Err(Error::InvalidRank(root));
        }
        if self.rank == root {
            for dest in (0..self.size()).filter(|&r| r != root) {
                self.post(data.to_vec(), dest, TAG_BCAST)?;
            }
            return Ok(());
        }
        let received = self.take::<T>(root, TAG_BCAST)?;
        if received.len() != data.len() {
            return Err(Error::InvalidCount {
                expected: data.len(),
                actual: received.len(),
            });
        }
        data.copy_from_slice(&received);
        Ok(())
    }

    /// Broadcast a single value from root; every worker gets root's value.
    pub fn broadcast_scalar<T: MpiDatatype>(&self, value: T, root: usize) -> Result<T> {
        let mut buf = [value];
        self.broadcast(&mut buf, root)?;
        Ok(buf[0])
    }

    /// Reduce values to the root worker.
    ///
    /// Contributions are combined in rank order, so floating-point results
    /// do not depend on arrival order.
    ///
    /// # Arguments
    ///
    /// * `send` - Data to send from this worker
    /// * `recv` - Buffer for result (only significant at root)
    /// * `op` - Reduction operation
    /// * `root` - Rank of the root worker
    pub fn reduce<T: MpiDatatype>(
        &self,
        send: &[T],
        recv: &mut [T],
        op: ReduceOp,
        root: usize,
    ) -> Result<()> {
        if send.len() != recv.len() {
            return Err(Error::InvalidBuffer);
        }
        if root >= self.size() {
            return Err(Error::InvalidRank(root));
        }
        if self.rank != root {
            return self.post(send.to_vec(), root, TAG_REDUCE);
        }

        for source in 0..self.size() {
            let contribution = if source == root {
                send.to_vec()
            } else {
                self.take::<T>(source, TAG_REDUCE)?
            };
            if contribution.len() != recv.len() {
                return Err(Error::InvalidCount {
                    expected: recv.len(),
                    actual: contribution.len(),
                });
            }
            if source == 0 {
                recv.copy_from_slice(&contribution);
            } else {
                for (acc, value) in recv.iter_mut().zip(contribution) {
                    *acc = acc.combine(value, op);
                }
            }
        }
        Ok(())
    }

    /// Reduce a single value to root.
    ///
    /// Returns `Some(result)` at root and `None` everywhere else.
    pub fn reduce_scalar<T: MpiDatatype>(
        &self,
        value: T,
        op: ReduceOp,
        root: usize,
    ) -> Result<Option<T>> {
        let mut result = [T::default()];
        self.reduce(&[value], &mut result, op, root)?;
        Ok((self.rank == root).then_some(result[0]))
    }
}

// Communicators are not Send or Sync: each one is built inside, and stays on,
// its worker thread.
