//! Buffer pool statistics.

use std::fmt;

/// Counters maintained by the buffer pool.
///
/// The pool is single-threaded, so these are plain integers; `stats()`
/// hands out a copy.
///
/// # Example
/// ```
/// use lrukpool::BufferPoolStats;
///
/// let stats = BufferPoolStats::default();
/// assert_eq!(stats.hit_rate(), 0.0);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Fetches served from a resident frame.
    pub cache_hits: u64,

    /// Fetches that had to read from the page store.
    pub cache_misses: u64,

    /// Resident blocks pushed out to make room.
    pub evictions: u64,

    /// Pages read from the page store.
    pub pages_read: u64,

    /// Pages written to the page store (eviction, flush, delete, stop).
    pub pages_written: u64,
}

impl BufferPoolStats {
    /// Fraction of fetches served without I/O (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for BufferPoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, reads: {}, writes: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.pages_read,
            self.pages_written,
            self.hit_rate() * 100.0
        )
    }
}
