//! Serialized access to a [`BufferPool`] from several threads.

use parking_lot::{Mutex, MutexGuard};

use crate::buffer::{BufferPool, BufferPoolStats};
use crate::common::{BlockId, Result};
use crate::storage::{PageIo, PageStore};

/// A [`BufferPool`] behind a single mutex.
///
/// The pool itself has no internal locking. This wrapper puts every call
/// behind one `parking_lot::Mutex`, so a fetch, the caller's work on the
/// frame and the matching unpin all happen in one critical section.
///
/// `SyncBufferPool` is `Sync` whenever the store is `Send`.
///
/// # Example
/// ```no_run
/// use lrukpool::{BufferPool, PageStore, SyncBufferPool};
///
/// let mut store = PageStore::open("shared.db")?;
/// let pool = SyncBufferPool::new(BufferPool::new(8, 2, &mut store)?);
///
/// let (block_id, ()) = pool.new_page_with(|data| data[0] = 1)?;
/// std::thread::scope(|s| {
///     s.spawn(|| pool.with_page(block_id, |data| assert_eq!(data[0], 1)));
/// });
/// # Ok::<(), lrukpool::Error>(())
/// ```
pub struct SyncBufferPool<'s, S: ?Sized = PageStore> {
    inner: Mutex<BufferPool<'s, S>>,
}

impl<'s, S: PageIo + ?Sized> SyncBufferPool<'s, S> {
    /// Wrap `pool`.
    pub fn new(pool: BufferPool<'s, S>) -> Self {
        Self {
            inner: Mutex::new(pool),
        }
    }

    /// Lock the pool for a multi-call sequence.
    pub fn lock(&self) -> MutexGuard<'_, BufferPool<'s, S>> {
        self.inner.lock()
    }

    /// Unwrap the pool.
    pub fn into_inner(self) -> BufferPool<'s, S> {
        self.inner.into_inner()
    }

    /// Fetch `block_id`, run `f` on its bytes and unpin it clean.
    pub fn with_page<R>(&self, block_id: BlockId, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let mut pool = self.inner.lock();
        let result = f(pool.fetch_page(block_id)?.data());
        pool.unpin_page(block_id, false)?;
        Ok(result)
    }

    /// Fetch `block_id`, run `f` on its bytes and unpin it dirty.
    pub fn with_page_mut<R>(
        &self,
        block_id: BlockId,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> Result<R> {
        let mut pool = self.inner.lock();
        let result = f(pool.fetch_page(block_id)?.data_mut());
        pool.unpin_page(block_id, true)?;
        Ok(result)
    }

    /// Create a page, let `f` fill it and unpin it dirty.
    pub fn new_page_with<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Result<(BlockId, R)> {
        let mut pool = self.inner.lock();
        let (block_id, frame) = pool.new_page()?;
        let result = f(frame.data_mut());
        pool.unpin_page(block_id, true)?;
        Ok((block_id, result))
    }

    /// See [`BufferPool::flush_page`].
    pub fn flush_page(&self, block_id: BlockId) -> Result<()> {
        self.inner.lock().flush_page(block_id)
    }

    /// See [`BufferPool::flush_all_pages`].
    pub fn flush_all_pages(&self) -> Result<()> {
        self.inner.lock().flush_all_pages()
    }

    /// See [`BufferPool::delete_page`].
    pub fn delete_page(&self, block_id: BlockId) -> Result<()> {
        self.inner.lock().delete_page(block_id)
    }

    /// See [`BufferPool::stats`].
    pub fn stats(&self) -> BufferPoolStats {
        self.inner.lock().stats()
    }
}
