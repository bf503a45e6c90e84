//! Integration tests for the buffer pool.
//!
//! These tests verify cross-component behavior that unit tests don't cover:
//! durability through the page store and recovery from store failures.

mod common;

use common::{copy_string, open_store, read_string, MemStore};
use lrukpool::{BlockId, BufferPool, Error, ErrorKind, PageStore, SyncBufferPool};
use std::thread;
use tempfile::tempdir;

/// Test data persistence across multiple eviction cycles.
#[test]
fn test_data_persistence_across_evictions() {
    let (mut store, _dir) = open_store();
    let mut pool = BufferPool::new(2, 2, &mut store).unwrap();

    // Create 5 pages with unique data (forces evictions)
    let mut block_ids = vec![];
    for i in 0u8..5 {
        let (bid, frame) = pool.new_page().unwrap();
        frame.data_mut()[0] = i;
        frame.data_mut()[1] = i.wrapping_mul(3);
        pool.unpin_page(bid, true).unwrap();
        block_ids.push(bid);
    }
    assert_eq!(pool.stats().evictions, 3);

    // Read all back twice, in opposite orders, to force refetches.
    for round in 0..2 {
        let order: Vec<usize> = if round == 0 {
            (0..5).collect()
        } else {
            (0..5).rev().collect()
        };
        for i in order {
            let frame = pool.fetch_page(block_ids[i]).unwrap();
            assert_eq!(frame.data()[0], i as u8);
            assert_eq!(frame.data()[1], (i as u8).wrapping_mul(3));
            pool.unpin_page(block_ids[i], false).unwrap();
        }
    }
    pool.check_invariants().unwrap();
}

/// Test flush and reload across pool and store instances.
#[test]
fn test_stop_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let data = "persistent!";

    let bid;

    // First session: create, write, stop.
    {
        let mut store = PageStore::open(&path).unwrap();
        let mut pool = BufferPool::new(10, 2, &mut store).unwrap();

        let (b, frame) = pool.new_page().unwrap();
        bid = b;
        copy_string(frame.data_mut(), data);
        pool.unpin_page(bid, true).unwrap();

        pool.stop().unwrap();
        drop(pool);
        store.close().unwrap();
    }

    // Second session: read back, and keep allocating past the old ids.
    {
        let mut store = PageStore::open(&path).unwrap();
        let live_blocks = store.page_count().unwrap() as u32;
        assert_eq!(live_blocks, 1);

        let mut pool = BufferPool::new(10, 2, &mut store).unwrap();
        pool.resume_block_ids(live_blocks).unwrap();

        let frame = pool.fetch_page(bid).unwrap();
        assert_eq!(read_string(frame.data()), data);
        pool.unpin_page(bid, false).unwrap();

        let (next, _) = pool.new_page().unwrap();
        assert_eq!(next, BlockId::new(1));
    }
}

/// Blocks never written read back as zeros.
#[test]
fn test_unwritten_block_reads_zeroed() {
    let (mut store, _dir) = open_store();
    let mut pool = BufferPool::new(2, 2, &mut store).unwrap();

    let frame = pool.fetch_page(BlockId::new(12)).unwrap();
    assert!(frame.data().iter().all(|&b| b == 0));
}

/// Writes through the sync wrapper from several threads all land.
#[test]
fn test_sync_pool_concurrent_new_pages() {
    let (mut store, _dir) = open_store();
    let pool = SyncBufferPool::new(BufferPool::new(4, 2, &mut store).unwrap());

    let created: Vec<Vec<(BlockId, u8)>> = thread::scope(|s| {
        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let pool = &pool;
                s.spawn(move || {
                    (0..8u8)
                        .map(|i| {
                            let tag = t * 16 + i;
                            let (bid, ()) = pool.new_page_with(|data| data[0] = tag).unwrap();
                            (bid, tag)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = std::collections::HashSet::new();
    for (bid, tag) in created.into_iter().flatten() {
        assert!(seen.insert(bid), "{} handed out twice", bid);
        assert_eq!(pool.with_page(bid, |data| data[0]).unwrap(), tag);
    }
    assert_eq!(seen.len(), 32);
}

// =============================================================================
// Store failures
// =============================================================================

/// A failed read returns the frame to the free list and registers nothing.
#[test]
fn test_failed_read_releases_frame() {
    let mut store = MemStore::new();
    store.fail_reads.insert(BlockId::new(3));
    let mut pool = BufferPool::new(2, 2, &mut store).unwrap();

    let err = pool.fetch_page(BlockId::new(3)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);

    assert_eq!(pool.frame_of(BlockId::new(3)), None);
    assert_eq!(pool.free_frame_count(), 2);
    assert_eq!(pool.replacer().tracked_count(), 0);
    pool.check_invariants().unwrap();

    // The pool is still usable.
    pool.fetch_page(BlockId::new(4)).unwrap();
    pool.check_invariants().unwrap();
}

/// A read failure after an eviction leaves the evicted frame free.
#[test]
fn test_failed_read_after_eviction() {
    let mut store = MemStore::new();
    store.put(BlockId::new(0), 0x42);
    store.fail_reads.insert(BlockId::new(1));
    let mut pool = BufferPool::new(1, 2, &mut store).unwrap();

    pool.fetch_page(BlockId::new(0)).unwrap();
    pool.unpin_page(BlockId::new(0), false).unwrap();

    assert!(pool.fetch_page(BlockId::new(1)).is_err());
    assert_eq!(pool.frame_of(BlockId::new(0)), None);
    assert_eq!(pool.free_frame_count(), 1);
    pool.check_invariants().unwrap();

    assert_eq!(pool.fetch_page(BlockId::new(0)).unwrap().data()[0], 0x42);
}

/// A failed write-back leaves the dirty victim resident and evictable.
#[test]
fn test_failed_eviction_write_back_keeps_victim() {
    let mut store = MemStore::new();
    store.fail_writes.insert(BlockId::new(0));
    let mut pool = BufferPool::new(1, 2, &mut store).unwrap();

    let (b0, frame) = pool.new_page().unwrap();
    frame.data_mut()[0] = 0x77;
    pool.unpin_page(b0, true).unwrap();

    let err = pool.new_page().unwrap_err();
    assert!(matches!(err, Error::Io(_)));

    assert!(pool.frame_of(b0).is_some());
    assert_eq!(pool.is_dirty(b0), Some(true));
    assert_eq!(pool.evictable_count(), 1);
    assert_eq!(pool.stats().evictions, 0);
    pool.check_invariants().unwrap();

    // The failed request consumed no block id.
    let next = pool.allocate_block().unwrap();
    assert_eq!(next, BlockId::new(1));

    let frame = pool.fetch_page(b0).unwrap();
    assert_eq!(frame.data()[0], 0x77);
}

/// A failed flush keeps the page dirty; delete aborts with the page resident.
#[test]
fn test_failed_flush_and_delete() {
    let mut store = MemStore::new();
    store.fail_writes.insert(BlockId::new(0));
    let mut pool = BufferPool::new(2, 2, &mut store).unwrap();

    let (b0, _) = pool.new_page().unwrap();
    pool.unpin_page(b0, true).unwrap();

    assert!(pool.flush_page(b0).is_err());
    assert_eq!(pool.is_dirty(b0), Some(true));

    assert!(pool.delete_page(b0).is_err());
    assert!(pool.frame_of(b0).is_some());
    assert_eq!(pool.free_frame_count(), 1);
    pool.check_invariants().unwrap();
}

/// A failing flush on stop keeps the pool running.
#[test]
fn test_failed_stop_keeps_running() {
    let mut store = MemStore::new();
    store.fail_writes.insert(BlockId::new(1));
    {
        let mut pool = BufferPool::new(3, 2, &mut store).unwrap();
        let (b0, _) = pool.new_page().unwrap();
        let (b1, _) = pool.new_page().unwrap();
        pool.unpin_page(b0, true).unwrap();
        pool.unpin_page(b1, true).unwrap();

        assert!(pool.stop().is_err());
        assert!(!pool.is_stopped());
        assert_eq!(pool.is_dirty(b0), Some(false));
        assert_eq!(pool.is_dirty(b1), Some(true));
        pool.check_invariants().unwrap();
    }

    store.fail_writes.clear();
    let mut pool = BufferPool::new(3, 2, &mut store).unwrap();
    pool.stop().unwrap();
    assert!(pool.is_stopped());
}

/// A closed store is rejected at construction.
#[test]
fn test_closed_store_rejected() {
    let mut store = MemStore::new();
    store.closed = true;
    let err = BufferPool::new(2, 2, &mut store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Initialization);
}

/// Cache hits never reach the store.
#[test]
fn test_io_counts() {
    let mut store = MemStore::new();
    {
        let mut pool = BufferPool::new(2, 2, &mut store).unwrap();
        for _ in 0..10 {
            pool.fetch_page(BlockId::new(5)).unwrap();
            pool.unpin_page(BlockId::new(5), true).unwrap();
        }
        pool.flush_all_pages().unwrap();
        // Already clean: nothing more to write.
        pool.flush_all_pages().unwrap();
    }
    assert_eq!(store.reads, 1);
    assert_eq!(store.writes, 1);
    assert_eq!(store.stored_byte(BlockId::new(5)), Some(0));
}
