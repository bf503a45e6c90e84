//! Configuration constants for the buffer pool.

/// Size of a page in bytes (4KB).
///
/// Every frame holds exactly one page and every I/O against the backing
/// file moves exactly this many bytes.
///
/// # File Layout
/// Block `i` occupies the byte range `[i * PAGE_SIZE, (i + 1) * PAGE_SIZE)`.
pub const PAGE_SIZE: usize = 4096;

/// Number of frames used by [`BufferPoolConfig::default`].
///
/// [`BufferPoolConfig::default`]: crate::buffer::BufferPoolConfig
pub const DEFAULT_POOL_SIZE: usize = 64;

/// History depth used by the LRU-K replacer unless configured otherwise.
pub const DEFAULT_REPLACER_K: usize = 2;

/// Number of block ids a pool can hand out.
///
/// `u32::MAX` itself is reserved for [`BlockId::INVALID`], so the counter
/// saturates one short of it.
///
/// [`BlockId::INVALID`]: crate::common::BlockId::INVALID
pub const MAX_BLOCKS: u32 = u32::MAX;
