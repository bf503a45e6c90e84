//! Page Store - page-addressed I/O over a single backing file.
//!
//! The [`PageStore`] handles all direct file operations:
//! - Reading and writing whole pages at `block_id * PAGE_SIZE`
//! - Zero-filling reads past the end of the file
//! - Growing the file implicitly on first write to a block

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::config::PAGE_SIZE;
use crate::common::{BlockId, Error, Result};
use crate::storage::page::Page;

/// Page-level I/O as seen by the buffer pool.
///
/// [`PageStore`] is the file-backed implementation. Both calls are
/// synchronous: they either complete or fail, there is no retry.
pub trait PageIo {
    /// Whether the store can currently serve I/O.
    fn is_open(&self) -> bool;

    /// Fill `page` with the contents of `block_id`.
    ///
    /// Blocks that were never written read as zeros.
    fn read_page(&mut self, block_id: BlockId, page: &mut Page) -> Result<()>;

    /// Write `page` as the contents of `block_id`.
    fn write_page(&mut self, block_id: BlockId, page: &Page) -> Result<()>;
}

/// Reads and writes fixed-size pages in a single file.
///
/// # File Layout
/// The file is a flat sequence of pages with no header:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Block 0 │ Block 1 │ Block 2 │  ...    │ Block N │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Writing block N extends the file to `(N + 1) × PAGE_SIZE` bytes if it is
/// shorter; any gap reads back as zeros.
///
/// # Lifecycle
/// [`PageStore::open`] is the only constructor, so a store is open from
/// birth. [`PageStore::close`] syncs and releases the file; every later call
/// fails with [`Error::Initialization`].
///
/// # Durability
/// Writes go to the OS page cache. [`PageStore::sync`] and
/// [`PageStore::close`] force them to disk.
#[derive(Debug)]
pub struct PageStore {
    file: Option<File>,
    path: PathBuf,
}

impl PageStore {
    /// Open `path` for reading and writing, creating it if absent.
    ///
    /// An existing file is never truncated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        debug!(path = %path.display(), "opened page store");
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    /// Flush and release the file handle.
    ///
    /// # Errors
    /// `Error::Initialization` if the store is already closed.
    pub fn close(&mut self) -> Result<()> {
        let file = self
            .file
            .take()
            .ok_or_else(|| Error::init("page store is already closed"))?;
        file.sync_all()?;

        debug!(path = %self.path.display(), "closed page store");
        Ok(())
    }

    /// Force all written pages to disk.
    pub fn sync(&mut self) -> Result<()> {
        self.file()?.sync_all()?;
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of blocks the file currently spans, counting a partial tail.
    pub fn page_count(&mut self) -> Result<u64> {
        let len = self.file()?.metadata()?.len();
        Ok(len.div_ceil(PAGE_SIZE as u64))
    }

    fn file(&mut self) -> Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| Error::init("page store is closed"))
    }

    fn seek_to(&mut self, block_id: BlockId) -> Result<u64> {
        if !block_id.is_valid() {
            return Err(Error::InvalidBlockId(block_id));
        }

        let offset = block_id.offset();
        let pos = self.file()?.seek(SeekFrom::Start(offset))?;
        if pos != offset {
            return Err(Error::Io(std::io::Error::other(format!(
                "seek to {} landed at {}",
                offset, pos
            ))));
        }
        Ok(offset)
    }
}

impl PageIo for PageStore {
    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Read `block_id` into `page`.
    ///
    /// A short read at end of file is not an error: the unread tail is
    /// zero-filled, so blocks that were never written read as zeros.
    ///
    /// # Errors
    /// - `Error::InvalidBlockId` for the sentinel id
    /// - `Error::Io` on seek/read failure, or if the cursor ends up before
    ///   the block's offset after a short read
    fn read_page(&mut self, block_id: BlockId, page: &mut Page) -> Result<()> {
        let offset = self.seek_to(block_id)?;
        let file = self.file()?;
        let buf = page.as_mut_slice();

        let mut filled = 0;
        while filled < PAGE_SIZE {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < PAGE_SIZE {
            let pos = file.stream_position()?;
            if pos < offset {
                return Err(Error::Io(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("short read of {} left cursor at {}", block_id, pos),
                )));
            }
            buf[filled..].fill(0);
        }

        Ok(())
    }

    /// Write `page` at `block_id`, growing the file if needed.
    ///
    /// # Errors
    /// - `Error::InvalidBlockId` for the sentinel id
    /// - `Error::Io` on seek/write failure
    fn write_page(&mut self, block_id: BlockId, page: &Page) -> Result<()> {
        self.seek_to(block_id)?;
        self.file()?.write_all(page.as_slice())?;
        Ok(())
    }
}
