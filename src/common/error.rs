//! Error types for the buffer pool and page store.

use thiserror::Error;

use super::{BlockId, FrameId};

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by the page store, the replacer and the pool.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction arguments or lifecycle misuse.
    ///
    /// Covers a zero pool size or `k`, a closed store handed to a pool, and
    /// any call on a stopped pool or closed store.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// I/O error from the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sentinel block id was used as a file address.
    #[error("invalid block id: {0}")]
    InvalidBlockId(BlockId),

    /// The block-id counter cannot advance any further.
    #[error("block id space exhausted")]
    AllocationExhausted,

    /// No free frame and every resident frame is pinned.
    #[error("no evictable frame: all {0} frames are pinned")]
    EvictionFailure(usize),

    /// Unpin or flush targeting a block that is not in the pool.
    #[error("{0} is not resident in the buffer pool")]
    NotResident(BlockId),

    /// Unpin of a block whose pin count is already zero.
    #[error("{0} is not pinned")]
    NotPinned(BlockId),

    /// Delete of a block that is still pinned.
    #[error("{0} is pinned and cannot be deleted")]
    PagePinned(BlockId),

    /// Replacer removal of a frame that is still pinned.
    #[error("{0} is not evictable")]
    FrameNotEvictable(FrameId),

    /// Internal bookkeeping disagrees with itself. Always a bug.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Error category, one per class of failure callers react to differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad construction arguments, or a closed store or stopped pool.
    Initialization,
    /// The page store failed, or was asked for an invalid block.
    Io,
    /// No block ids are left to hand out.
    AllocationExhausted,
    /// The call does not fit the page's current state.
    InvalidOperation,
    /// Every frame is pinned. Retry after unpinning.
    EvictionFailure,
    /// A bug in the pool's own bookkeeping.
    Internal,
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Initialization(_) => ErrorKind::Initialization,
            Error::Io(_) | Error::InvalidBlockId(_) => ErrorKind::Io,
            Error::AllocationExhausted => ErrorKind::AllocationExhausted,
            Error::EvictionFailure(_) => ErrorKind::EvictionFailure,
            Error::NotResident(_)
            | Error::NotPinned(_)
            | Error::PagePinned(_)
            | Error::FrameNotEvictable(_) => ErrorKind::InvalidOperation,
            Error::InvariantViolation(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn init(message: impl Into<String>) -> Self {
        Error::Initialization(message.into())
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Error::InvariantViolation(message.into())
    }

    /// Returns true if retrying after unpinning something may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::EvictionFailure(_))
    }
}
