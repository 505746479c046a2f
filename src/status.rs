//! Message status information.
//!
//! This module provides the [`Status`] struct returned by completed receives,
//! describing the message that was matched.

/// Information about a received message.
///
/// Returned by [`Communicator::recv`](crate::Communicator::recv) and by
/// [`Request::wait`](crate::Request::wait) on a completed receive.
///
/// # Example
///
/// ```
/// use percolate::Cohort;
///
/// Cohort::run(2, |world| {
///     if world.rank() == 0 {
///         world.send(&[1.0f64, 2.0, 3.0], 1, 7)?;
///     } else {
///         let mut buf = [0.0f64; 8];
///         let status = world.recv(&mut buf, 0, 7)?;
///         assert_eq!((status.source, status.tag, status.count), (0, 7, 3));
///     }
///     Ok(())
/// })
/// .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Source rank of the message.
    pub source: usize,
    /// Tag of the message.
    pub tag: i32,
    /// Number of elements in the message.
    pub count: usize,
}
