//! Buffer Pool - the page caching layer.
//!
//! The [`BufferPool`] provides:
//! - Page caching between the page store and memory
//! - Pin-based reference counting
//! - Dirty page write-back before reuse
//! - LRU-K victim selection

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::buffer::replacer::LruKReplacer;
use crate::buffer::{BufferPoolConfig, BufferPoolStats, Frame};
use crate::common::config::MAX_BLOCKS;
use crate::common::{BlockId, Error, FrameId, Result};
use crate::storage::{PageIo, PageStore};

/// Manages a fixed pool of frames caching blocks of a [`PageIo`] store.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                        BufferPool                           │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │        frames: Vec<Frame>         │   │
/// │  │BlockId → Fid │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │    store     │      │
/// │  │ Vec<FrameId> │  │ LruKReplacer │  │  &'s mut S   │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Ownership
/// The pool owns its frames, page table, free list and replacer. It borrows
/// the store, which the caller opens before and closes after the pool.
///
/// # Thread Safety
/// None. Every operation is a multi-step sequence over the page table, free
/// list and replacer, and takes `&mut self`. Share a pool across threads
/// through [`SyncBufferPool`](crate::buffer::SyncBufferPool).
///
/// # Usage
/// ```no_run
/// use lrukpool::{BufferPool, PageStore};
///
/// let mut store = PageStore::open("my_database.db")?;
/// let mut pool = BufferPool::new(16, 2, &mut store)?;
///
/// let (block_id, frame) = pool.new_page()?;
/// frame.data_mut()[0] = 0xAB;
/// pool.unpin_page(block_id, true)?;
///
/// let frame = pool.fetch_page(block_id)?;
/// assert_eq!(frame.data()[0], 0xAB);
/// pool.unpin_page(block_id, false)?;
///
/// pool.stop()?;
/// drop(pool);
/// store.close()?;
/// # Ok::<(), lrukpool::Error>(())
/// ```
pub struct BufferPool<'s, S: ?Sized = PageStore> {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Maps resident block ids to the frame holding them.
    page_table: HashMap<BlockId, FrameId>,

    /// Stack of empty frames (LIFO).
    free_list: Vec<FrameId>,

    /// Picks victims once the free list runs dry.
    replacer: LruKReplacer,

    /// Backing page store.
    store: &'s mut S,

    /// Next block id handed out by `allocate_block`.
    next_block_id: u32,

    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,

    stopped: bool,
}

impl<'s, S: PageIo + ?Sized> BufferPool<'s, S> {
    /// Create a pool of `pool_size` frames with an LRU-`k` replacer.
    ///
    /// # Errors
    /// `Error::Initialization` if `pool_size` or `k` is zero, or the store
    /// is closed.
    pub fn new(pool_size: usize, k: usize, store: &'s mut S) -> Result<Self> {
        Self::with_config(BufferPoolConfig::new(pool_size).with_replacer_k(k), store)
    }

    /// Create a pool from a [`BufferPoolConfig`].
    pub fn with_config(config: BufferPoolConfig, store: &'s mut S) -> Result<Self> {
        config.validate()?;
        if !store.is_open() {
            return Err(Error::init("page store is not open"));
        }

        let replacer = LruKReplacer::new(config.pool_size, config.replacer_k)?;
        let frames: Vec<Frame> = (0..config.pool_size).map(|_| Frame::new()).collect();

        // Reversed so that frame 0 is handed out first.
        let free_list: Vec<FrameId> = (0..config.pool_size).rev().map(FrameId::new).collect();

        debug!(
            pool_size = config.pool_size,
            k = config.replacer_k,
            "buffer pool initialized"
        );
        Ok(Self {
            frames,
            page_table: HashMap::with_capacity(config.pool_size),
            free_list,
            replacer,
            store,
            next_block_id: 0,
            stats: BufferPoolStats::default(),
            pool_size: config.pool_size,
            stopped: false,
        })
    }

    // ========================================================================
    // Public API: Fetch and create pages
    // ========================================================================

    /// Pin `block_id` in the pool and return its frame.
    ///
    /// A resident block is pinned again without any I/O. Otherwise a frame
    /// is taken from the free list or evicted (writing back a dirty victim
    /// first) and the block is read into it.
    ///
    /// # Errors
    /// - `Error::EvictionFailure` if every frame is pinned
    /// - `Error::Io` / `Error::InvalidBlockId` from the store; the frame
    ///   goes back to the free list and nothing is registered
    pub fn fetch_page(&mut self, block_id: BlockId) -> Result<&mut Frame> {
        self.ensure_running()?;
        if !block_id.is_valid() {
            return Err(Error::InvalidBlockId(block_id));
        }

        if let Some(&frame_id) = self.page_table.get(&block_id) {
            self.pin_resident(frame_id)?;
            self.stats.cache_hits += 1;
            trace!(%block_id, %frame_id, "cache hit");
            return Ok(&mut self.frames[frame_id.0]);
        }

        self.stats.cache_misses += 1;
        let frame_id = self.acquire_frame()?;
        debug!(%block_id, %frame_id, "cache miss, reading from store");

        let frame = &mut self.frames[frame_id.0];
        if let Err(e) = self.store.read_page(block_id, frame.page_mut()) {
            warn!(%block_id, %frame_id, error = %e, "read failed, releasing frame");
            frame.reset();
            self.free_list.push(frame_id);
            return Err(e);
        }
        self.stats.pages_read += 1;

        self.install(frame_id, block_id)?;
        Ok(&mut self.frames[frame_id.0])
    }

    /// Allocate a fresh block id and pin a zeroed frame for it.
    ///
    /// Nothing is written to the store until the frame is flushed or evicted
    /// dirty.
    ///
    /// # Errors
    /// - `Error::AllocationExhausted` if the block-id counter is at its limit
    /// - `Error::EvictionFailure` if every frame is pinned
    /// - `Error::Io` if writing back a dirty victim fails
    pub fn new_page(&mut self) -> Result<(BlockId, &mut Frame)> {
        self.ensure_running()?;
        if self.next_block_id >= MAX_BLOCKS {
            return Err(Error::AllocationExhausted);
        }

        let frame_id = self.acquire_frame()?;
        let block_id = self.allocate_block()?;
        self.install(frame_id, block_id)?;

        debug!(%block_id, %frame_id, "new page");
        Ok((block_id, &mut self.frames[frame_id.0]))
    }

    /// Hand out the next block id without touching any frame.
    ///
    /// # Errors
    /// `Error::AllocationExhausted` once the counter reaches `MAX_BLOCKS`.
    pub fn allocate_block(&mut self) -> Result<BlockId> {
        self.ensure_running()?;
        if self.next_block_id >= MAX_BLOCKS {
            return Err(Error::AllocationExhausted);
        }

        let block_id = BlockId::new(self.next_block_id);
        self.next_block_id += 1;
        Ok(block_id)
    }

    /// Continue block-id allocation from `next`, e.g. after reopening a file
    /// whose live blocks the caller tracks.
    ///
    /// # Errors
    /// `Error::InvalidBlockId` if `next` would hand out an id again.
    pub fn resume_block_ids(&mut self, next: u32) -> Result<()> {
        self.ensure_running()?;
        if next < self.next_block_id {
            return Err(Error::InvalidBlockId(BlockId::new(next)));
        }
        self.next_block_id = next;
        Ok(())
    }

    // ========================================================================
    // Public API: Unpin, flush and delete
    // ========================================================================

    /// Drop one pin on `block_id`, marking it dirty if `is_dirty`.
    ///
    /// The dirty flag is never cleared here. When the last pin goes the
    /// frame becomes evictable.
    ///
    /// # Errors
    /// - `Error::NotResident` if the block is not in the pool
    /// - `Error::NotPinned` if its pin count is already 0
    pub fn unpin_page(&mut self, block_id: BlockId, is_dirty: bool) -> Result<()> {
        self.ensure_running()?;
        let frame_id = self.resident_frame(block_id)?;
        let frame = &mut self.frames[frame_id.0];

        if !frame.is_pinned() {
            return Err(Error::NotPinned(block_id));
        }
        if is_dirty {
            frame.mark_dirty();
        }

        let remaining = frame.unpin()?;
        if remaining == 0 {
            self.replacer.set_evictable(frame_id, true);
        }

        trace!(%block_id, remaining, is_dirty, "unpinned");
        Ok(())
    }

    /// Write `block_id` to the store and clear its dirty flag.
    ///
    /// Pin count and evictability are left alone.
    ///
    /// # Errors
    /// - `Error::NotResident` if the block is not in the pool
    /// - `Error::Io` from the store; the frame stays dirty
    pub fn flush_page(&mut self, block_id: BlockId) -> Result<()> {
        self.ensure_running()?;
        let frame_id = self.resident_frame(block_id)?;
        self.write_back(frame_id, block_id)
    }

    /// Write every dirty resident block to the store.
    pub fn flush_all_pages(&mut self) -> Result<()> {
        self.ensure_running()?;

        let mut dirty: Vec<(BlockId, FrameId)> = self
            .page_table
            .iter()
            .filter(|(_, fid)| self.frames[fid.0].is_dirty())
            .map(|(&bid, &fid)| (bid, fid))
            .collect();
        dirty.sort_unstable();

        for (block_id, frame_id) in dirty {
            self.write_back(frame_id, block_id)?;
        }
        Ok(())
    }

    /// Drop `block_id` from the pool and return its frame to the free list.
    ///
    /// A dirty page is written back first. Deleting a block that is not
    /// resident succeeds and does nothing. The block id is not recycled.
    ///
    /// # Errors
    /// - `Error::PagePinned` if the block is pinned; nothing changes
    /// - `Error::Io` if the write-back fails; nothing changes
    pub fn delete_page(&mut self, block_id: BlockId) -> Result<()> {
        self.ensure_running()?;
        let Some(&frame_id) = self.page_table.get(&block_id) else {
            return Ok(());
        };

        let frame = &self.frames[frame_id.0];
        if frame.is_pinned() {
            return Err(Error::PagePinned(block_id));
        }
        if frame.is_dirty() {
            self.write_back(frame_id, block_id)?;
        }

        // Untrack by frame index before the frame forgets its block.
        self.replacer.remove(frame_id)?;
        self.page_table.remove(&block_id);
        self.frames[frame_id.0].reset();
        self.free_list.push(frame_id);

        debug!(%block_id, %frame_id, "deleted page");
        Ok(())
    }

    /// Flush all dirty pages and release every frame.
    ///
    /// Any later call fails with `Error::Initialization`. If a flush fails
    /// the pool keeps running.
    pub fn stop(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.flush_all_pages()?;

        self.stopped = true;
        self.frames = Vec::new();
        self.page_table = HashMap::new();
        self.free_list = Vec::new();
        self.replacer.clear();

        debug!(stats = %self.stats, "buffer pool stopped");
        Ok(())
    }

    // ========================================================================
    // Public API: Introspection
    // ========================================================================

    /// Pin count of a resident block.
    pub fn pin_count(&self, block_id: BlockId) -> Option<u32> {
        self.page_table
            .get(&block_id)
            .map(|fid| self.frames[fid.0].pin_count())
    }

    /// Dirty flag of a resident block.
    pub fn is_dirty(&self, block_id: BlockId) -> Option<bool> {
        self.page_table
            .get(&block_id)
            .map(|fid| self.frames[fid.0].is_dirty())
    }

    /// Frame currently holding `block_id`.
    pub fn frame_of(&self, block_id: BlockId) -> Option<FrameId> {
        self.page_table.get(&block_id).copied()
    }

    /// The pool's replacer, for inspecting eviction order.
    pub fn replacer(&self) -> &LruKReplacer {
        &self.replacer
    }

    /// Counters since construction or the last [`reset_stats`](Self::reset_stats).
    pub fn stats(&self) -> BufferPoolStats {
        self.stats
    }

    /// Zero the pool's counters.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.free_list.len()
    }

    /// Get the number of resident blocks.
    pub fn resident_count(&self) -> usize {
        self.page_table.len()
    }

    /// Number of resident frames that could be evicted right now.
    pub fn evictable_count(&self) -> usize {
        self.replacer.size()
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Cross-check the page table, free list, frames and replacer.
    ///
    /// # Errors
    /// `Error::InvariantViolation` describing the first inconsistency found.
    pub fn check_invariants(&self) -> Result<()> {
        self.ensure_running()?;
        let mut mapped = HashSet::with_capacity(self.page_table.len());
        let mut unpinned = 0;

        for (&block_id, &frame_id) in &self.page_table {
            let frame = self
                .frames
                .get(frame_id.0)
                .ok_or_else(|| Error::invariant(format!("{} maps to missing {}", block_id, frame_id)))?;
            if !mapped.insert(frame_id) {
                return Err(Error::invariant(format!("{} is mapped twice", frame_id)));
            }
            if frame.block_id() != Some(block_id) {
                return Err(Error::invariant(format!(
                    "{} maps to {} holding {:?}",
                    block_id,
                    frame_id,
                    frame.block_id()
                )));
            }
            if !self.replacer.is_tracked(frame_id) {
                return Err(Error::invariant(format!("{} is not tracked", frame_id)));
            }
            if self.replacer.is_evictable(frame_id) == frame.is_pinned() {
                return Err(Error::invariant(format!(
                    "{} has pin count {} but evictable = {}",
                    frame_id,
                    frame.pin_count(),
                    self.replacer.is_evictable(frame_id)
                )));
            }
            if !frame.is_pinned() {
                unpinned += 1;
            }
        }

        let mut free = HashSet::with_capacity(self.free_list.len());
        for &frame_id in &self.free_list {
            if !free.insert(frame_id) || mapped.contains(&frame_id) {
                return Err(Error::invariant(format!(
                    "{} is on the free list twice or also mapped",
                    frame_id
                )));
            }
            let frame = &self.frames[frame_id.0];
            if !frame.is_empty() || frame.is_pinned() {
                return Err(Error::invariant(format!("free {} is in use", frame_id)));
            }
        }

        if mapped.len() + free.len() != self.pool_size {
            return Err(Error::invariant(format!(
                "{} mapped + {} free != {} frames",
                mapped.len(),
                free.len(),
                self.pool_size
            )));
        }
        if self.replacer.tracked_count() != mapped.len() || self.replacer.size() != unpinned {
            return Err(Error::invariant(format!(
                "replacer tracks {} ({} evictable), pool has {} resident ({} unpinned)",
                self.replacer.tracked_count(),
                self.replacer.size(),
                mapped.len(),
                unpinned
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn ensure_running(&self) -> Result<()> {
        if self.stopped {
            return Err(Error::init("buffer pool is stopped"));
        }
        Ok(())
    }

    fn resident_frame(&self, block_id: BlockId) -> Result<FrameId> {
        self.page_table
            .get(&block_id)
            .copied()
            .ok_or(Error::NotResident(block_id))
    }

    /// Pin an already resident frame. The 0→1 transition makes it
    /// non-evictable.
    fn pin_resident(&mut self, frame_id: FrameId) -> Result<()> {
        let pins = self.frames[frame_id.0].pin();
        self.replacer.record_access(frame_id)?;
        if pins == 1 {
            self.replacer.set_evictable(frame_id, false);
        }
        Ok(())
    }

    /// Register a blank, acquired frame as holding `block_id` with one pin.
    fn install(&mut self, frame_id: FrameId, block_id: BlockId) -> Result<()> {
        self.frames[frame_id.0].assign(block_id);
        self.page_table.insert(block_id, frame_id);
        self.replacer.record_access(frame_id)?;
        self.replacer.set_evictable(frame_id, false);
        Ok(())
    }

    /// Get an empty frame, evicting if necessary.
    fn acquire_frame(&mut self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.pop() {
            let frame = &self.frames[frame_id.0];
            if !frame.is_empty() || frame.is_pinned() {
                self.free_list.push(frame_id);
                return Err(Error::invariant(format!("free {} is in use", frame_id)));
            }
            return Ok(frame_id);
        }

        self.evict_frame()
    }

    /// Evict the replacer's victim and return its now-empty frame.
    ///
    /// The victim stays resident and tracked until its write-back succeeds.
    fn evict_frame(&mut self) -> Result<FrameId> {
        let frame_id = self
            .replacer
            .victim()
            .ok_or(Error::EvictionFailure(self.pool_size))?;

        let frame = &self.frames[frame_id.0];
        if frame.is_pinned() {
            return Err(Error::invariant(format!("replacer offered pinned {}", frame_id)));
        }
        let old_block = frame
            .block_id()
            .ok_or_else(|| Error::invariant(format!("replacer tracks empty {}", frame_id)))?;

        if frame.is_dirty() {
            self.write_back(frame_id, old_block)?;
        }

        self.replacer.remove(frame_id)?;
        self.page_table.remove(&old_block);
        self.frames[frame_id.0].reset();
        self.stats.evictions += 1;

        debug!(block_id = %old_block, %frame_id, "evicted");
        Ok(frame_id)
    }

    /// Write a frame to the store and clear its dirty flag on success.
    fn write_back(&mut self, frame_id: FrameId, block_id: BlockId) -> Result<()> {
        let frame = &mut self.frames[frame_id.0];
        if let Err(e) = self.store.write_page(block_id, frame.page()) {
            warn!(%block_id, %frame_id, error = %e, "write-back failed");
            return Err(e);
        }
        frame.clear_dirty();
        self.stats.pages_written += 1;

        trace!(%block_id, %frame_id, "flushed");
        Ok(())
    }
}

impl<S: ?Sized> std::fmt::Debug for BufferPool<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("pool_size", &self.pool_size)
            .field("resident", &self.page_table.len())
            .field("free", &self.free_list.len())
            .field("replacer", &self.replacer)
            .field("next_block_id", &self.next_block_id)
            .field("stopped", &self.stopped)
            .finish()
    }
}
