//! Buffer pool benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lrukpool::{BlockId, BufferPool, FrameId, LruKReplacer, PageStore};

fn open_store() -> (PageStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = PageStore::open(dir.path().join("bench.db")).unwrap();
    (store, dir)
}

fn fetch_hit_benchmark(c: &mut Criterion) {
    let (mut store, _dir) = open_store();
    let mut pool = BufferPool::new(64, 2, &mut store).unwrap();
    for i in 0..64 {
        pool.fetch_page(BlockId::new(i)).unwrap();
        pool.unpin_page(BlockId::new(i), false).unwrap();
    }

    c.bench_function("fetch_hit_64", |b| {
        b.iter(|| {
            for i in 0..64 {
                let frame = pool.fetch_page(BlockId::new(i)).unwrap();
                black_box(frame.data()[0]);
                pool.unpin_page(BlockId::new(i), false).unwrap();
            }
        })
    });
}

fn fetch_evict_benchmark(c: &mut Criterion) {
    let (mut store, _dir) = open_store();
    let mut pool = BufferPool::new(16, 2, &mut store).unwrap();

    // Scan twice the pool size so every fetch misses and evicts.
    c.bench_function("fetch_evict_scan_32", |b| {
        b.iter(|| {
            for i in 0..32 {
                let frame = pool.fetch_page(BlockId::new(i)).unwrap();
                frame.data_mut()[0] = i as u8;
                pool.unpin_page(BlockId::new(i), true).unwrap();
            }
        })
    });
}

fn replacer_benchmark(c: &mut Criterion) {
    c.bench_function("lru_k_access_evict_1000", |b| {
        b.iter(|| {
            let mut replacer = LruKReplacer::new(1000, 2).unwrap();
            for i in 0..1000 {
                let fid = FrameId::new(i);
                replacer.record_access(fid).unwrap();
                replacer.set_evictable(fid, true);
            }
            let mut evicted = 0;
            while replacer.evict().is_some() {
                evicted += 1;
            }
            black_box(evicted)
        })
    });
}

criterion_group!(
    benches,
    fetch_hit_benchmark,
    fetch_evict_benchmark,
    replacer_benchmark
);
criterion_main!(benches);
