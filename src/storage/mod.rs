//! Storage layer - page-addressed file I/O.
//!
//! - [`PageStore`] - File-backed page reads and writes
//! - [`PageIo`] - The interface the buffer pool drives
//! - [`Page`] - The 4KB buffer moved by every I/O

mod page;
mod page_store;

pub use page::Page;
pub use page_store::{PageIo, PageStore};
