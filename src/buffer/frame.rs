//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds a [`Page`] plus the metadata needed for buffer management:
//! - Which block is loaded (if any)
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking

use crate::common::{BlockId, Error, Result};
use crate::storage::Page;

/// A frame in the buffer pool.
///
/// The pool allocates a fixed number of frames at startup and owns them for
/// its whole life. Callers get `&Frame` / `&mut Frame` back from fetches and
/// may read or write the page bytes; the pin count, dirty flag and resident
/// block are managed by the pool.
pub struct Frame {
    page: Box<Page>,
    block_id: Option<BlockId>,
    pin_count: u32,
    is_dirty: bool,
}

impl Frame {
    /// Create a new empty frame.
    pub(crate) fn new() -> Self {
        Self {
            page: Page::boxed(),
            block_id: None,
            pin_count: 0,
            is_dirty: false,
        }
    }

    // ========================================================================
    // Page access
    // ========================================================================

    /// Page bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.page.as_slice()
    }

    /// Mutable page bytes.
    ///
    /// Writing here does not mark the frame dirty; pass `is_dirty = true`
    /// when unpinning.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.page.as_mut_slice()
    }

    #[inline]
    pub(crate) fn page(&self) -> &Page {
        &self.page
    }

    #[inline]
    pub(crate) fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// The block currently loaded, or None if the frame is empty.
    #[inline]
    pub fn block_id(&self) -> Option<BlockId> {
        self.block_id
    }

    /// Current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    /// Check if the frame is currently pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    /// Check if the frame has unwritten changes.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Check if the frame is empty (no block loaded).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.block_id.is_none()
    }

    // ========================================================================
    // Pool-side mutation
    // ========================================================================

    /// Load `block_id` into this frame with a single pin and a clean page.
    pub(crate) fn assign(&mut self, block_id: BlockId) {
        self.block_id = Some(block_id);
        self.pin_count = 1;
        self.is_dirty = false;
    }

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub(crate) fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.pin_count
    }

    /// Decrement the pin count. Returns the new pin count.
    ///
    /// # Errors
    /// `Error::InvariantViolation` if the pin count is already 0.
    #[inline]
    pub(crate) fn unpin(&mut self) -> Result<u32> {
        self.pin_count = self
            .pin_count
            .checked_sub(1)
            .ok_or_else(|| Error::invariant("pin count underflow"))?;
        Ok(self.pin_count)
    }

    #[inline]
    pub(crate) fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    #[inline]
    pub(crate) fn clear_dirty(&mut self) {
        self.is_dirty = false;
    }

    /// Reset the frame to the empty state with a zeroed page.
    pub(crate) fn reset(&mut self) {
        self.page.reset();
        self.block_id = None;
        self.pin_count = 0;
        self.is_dirty = false;
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("block_id", &self.block_id)
            .field("pin_count", &self.pin_count)
            .field("is_dirty", &self.is_dirty)
            .finish()
    }
}
