//! lrukpool - a page buffer pool with LRU-K eviction over a single file.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      engine (caller)                            │
//! └─────────────────────────────────────────────────────────────────┘
//!                                ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Buffer Pool (buffer/)                                          │
//! │    BufferPool: frames + page table + free list                  │
//! │    LruKReplacer: access history, backward k-distance            │
//! └─────────────────────────────────────────────────────────────────┘
//!                                ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Storage (storage/)                                             │
//! │    PageStore: block i at [i×4096, (i+1)×4096) of one file       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (BlockId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool and eviction policy
//! - [`storage`] - Page-addressed file I/O
//!
//! Nothing but raw page bytes persists: each pool starts with an empty page
//! table and replacer, and callers keep track of which block ids are live.
//!
//! # Quick Start
//! ```no_run
//! use lrukpool::{BufferPool, PageStore};
//!
//! let mut store = PageStore::open("my_database.db")?;
//! let mut pool = BufferPool::new(64, 2, &mut store)?;
//!
//! let (block_id, frame) = pool.new_page()?;
//! frame.data_mut()[..5].copy_from_slice(b"hello");
//! pool.unpin_page(block_id, true)?;
//! pool.flush_page(block_id)?;
//! # Ok::<(), lrukpool::Error>(())
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

pub use common::config::PAGE_SIZE;
pub use common::{BlockId, Error, ErrorKind, FrameId, Result};

pub use buffer::replacer::{KDistance, LruKReplacer};
pub use buffer::{BufferPool, BufferPoolConfig, BufferPoolStats, Frame, SyncBufferPool};
pub use storage::{Page, PageIo, PageStore};
