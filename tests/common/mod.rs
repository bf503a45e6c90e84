//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use lrukpool::{BlockId, Error, Page, PageIo, PageStore, Result};
use tempfile::TempDir;

/// Open a page store on a fresh temporary file.
pub fn open_store() -> (PageStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = PageStore::open(dir.path().join("test.db")).unwrap();
    (store, dir)
}

/// Helper to write a null-terminated string into page data.
pub fn copy_string(data: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    data[..bytes.len()].copy_from_slice(bytes);
    data[bytes.len()] = 0;
}

/// Helper to read a null-terminated string from page data.
pub fn read_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).to_string()
}

/// In-memory page store with I/O counters and injectable failures.
#[derive(Default)]
pub struct MemStore {
    pages: HashMap<BlockId, Box<Page>>,
    pub fail_reads: HashSet<BlockId>,
    pub fail_writes: HashSet<BlockId>,
    pub reads: usize,
    pub writes: usize,
    pub closed: bool,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// First byte of a block as last written, if it was ever written.
    pub fn stored_byte(&self, block_id: BlockId) -> Option<u8> {
        self.pages.get(&block_id).map(|p| p.as_slice()[0])
    }

    pub fn put(&mut self, block_id: BlockId, byte: u8) {
        let mut page = Page::boxed();
        page.as_mut_slice()[0] = byte;
        self.pages.insert(block_id, page);
    }
}

fn injected(what: &str, block_id: BlockId) -> Error {
    Error::Io(std::io::Error::other(format!("injected {} failure on {}", what, block_id)))
}

impl PageIo for MemStore {
    fn is_open(&self) -> bool {
        !self.closed
    }

    fn read_page(&mut self, block_id: BlockId, page: &mut Page) -> Result<()> {
        if self.fail_reads.contains(&block_id) {
            return Err(injected("read", block_id));
        }
        self.reads += 1;
        match self.pages.get(&block_id) {
            Some(stored) => page.copy_from(stored),
            None => page.reset(),
        }
        Ok(())
    }

    fn write_page(&mut self, block_id: BlockId, page: &Page) -> Result<()> {
        if self.fail_writes.contains(&block_id) {
            return Err(injected("write", block_id));
        }
        self.writes += 1;
        self.pages
            .entry(block_id)
            .or_insert_with(Page::boxed)
            .copy_from(page);
        Ok(())
    }
}
