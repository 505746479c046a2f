//! Error types for percolate

use thiserror::Error;

/// Result type for cohort and simulation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cohort and simulation operations
#[derive(Error, Debug)]
pub enum Error {
    /// The run cannot be set up as requested (topology, lattice, density)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid rank specified
    #[error("Invalid rank: {0}")]
    InvalidRank(usize),

    /// User tags must be non-negative; negative tags belong to collectives
    #[error("Invalid tag: {0}")]
    InvalidTag(i32),

    /// Send and receive buffers of a reduction differ in length
    #[error("Invalid buffer")]
    InvalidBuffer,

    /// A message did not carry the number of elements the receiver expected
    #[error("Invalid count: expected {expected}, received {actual}")]
    InvalidCount {
        /// Elements the receiving layout can hold
        expected: usize,
        /// Elements carried by the message
        actual: usize,
    },

    /// A message was received as a different element type than it was sent
    #[error("Datatype mismatch on message from rank {rank} (tag {tag})")]
    DatatypeMismatch {
        /// Sender rank
        rank: usize,
        /// Message tag
        tag: i32,
    },

    /// The peer's inbox is gone
    #[error("Rank {0} is no longer reachable")]
    Disconnected(usize),

    /// Another worker failed and aborted the cohort
    #[error("Run aborted by rank {0}")]
    Aborted(usize),

    /// A worker thread panicked
    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    /// I/O failure while writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Invalid setup; detected before any communication
    Configuration,
    /// A point-to-point or collective operation failed
    Communication,
    /// Output could not be written
    Io,
}

impl Error {
    /// Shorthand for [`Error::Configuration`].
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// The class this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Configuration(_) => ErrorClass::Configuration,
            Error::Io(_) => ErrorClass::Io,
            _ => ErrorClass::Communication,
        }
    }

    /// True for errors raised only because some other worker failed first:
    /// an abort notice, or a peer whose inbox closed when it exited.
    pub fn is_secondary(&self) -> bool {
        matches!(self, Error::Aborted(_) | Error::Disconnected(_))
    }
}
