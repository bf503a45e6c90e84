//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache between the rest of an engine and
//! the page store. It manages a fixed pool of frames, each holding one page.
//!
//! # Components
//! - [`BufferPool`] - Fetch/New/Unpin/Flush/Delete over the frame pool
//! - [`Frame`] - A slot in the pool holding a page + metadata
//! - [`replacer`] - LRU-K victim selection
//! - [`BufferPoolConfig`] - Pool size and replacer K
//! - [`BufferPoolStats`] - Hit/miss/eviction counters
//! - [`SyncBufferPool`] - One-mutex wrapper for multi-threaded hosts

mod buffer_pool;
mod config;
mod frame;
pub mod replacer;
mod stats;
mod sync;

pub use buffer_pool::BufferPool;
pub use config::BufferPoolConfig;
pub use frame::Frame;
pub use stats::BufferPoolStats;
pub use sync::SyncBufferPool;
