//! Block identifier type.

use std::fmt;

use super::config::PAGE_SIZE;

/// Logical address of a page in the backing file.
///
/// Block ids are handed out by a monotonically increasing counter and are
/// never reused within a session. `u32` keeps the file under 16TB.
///
/// # Example
/// ```
/// use lrukpool::BlockId;
///
/// let block_id = BlockId::new(3);
/// assert!(block_id.is_valid());
/// assert_eq!(block_id.offset(), 3 * 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    /// Sentinel for "no block": an empty frame, an exhausted counter.
    pub const INVALID: BlockId = BlockId(u32::MAX);

    /// Create a new BlockId.
    #[inline]
    pub fn new(id: u32) -> Self {
        BlockId(id)
    }

    /// Check if this block id addresses a real block.
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Byte offset of this block in the backing file.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.0 as u64 * PAGE_SIZE as u64
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Block(INVALID)")
        } else {
            write!(f, "Block({})", self.0)
        }
    }
}
