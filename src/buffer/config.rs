//! Buffer pool configuration.

use crate::common::config::{DEFAULT_POOL_SIZE, DEFAULT_REPLACER_K, PAGE_SIZE};
use crate::common::{Error, Result};

/// Configuration for the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Number of page frames in the pool.
    pub pool_size: usize,
    /// Number of access timestamps the LRU-K replacer keeps per frame.
    pub replacer_k: usize,
}

impl BufferPoolConfig {
    /// Creates a configuration with `pool_size` frames and the default K.
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            replacer_k: DEFAULT_REPLACER_K,
        }
    }

    /// Sizes the pool to fit in `memory_bytes`, with at least one frame.
    pub fn from_memory_size(memory_bytes: usize) -> Self {
        Self::new((memory_bytes / PAGE_SIZE).max(1))
    }

    /// Sets the replacer's K.
    pub fn with_replacer_k(mut self, k: usize) -> Self {
        self.replacer_k = k;
        self
    }

    /// Bytes of page memory the pool will hold.
    pub fn memory_usage(&self) -> usize {
        self.pool_size * PAGE_SIZE
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// `Error::Initialization` if `pool_size` or `replacer_k` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::init("pool_size must be > 0"));
        }
        if self.replacer_k == 0 {
            return Err(Error::init("replacer_k must be >= 1"));
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}
