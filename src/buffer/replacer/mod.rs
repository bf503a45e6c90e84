//! Eviction policy (replacer).
//!
//! - [`LruKReplacer`] - LRU-K, ranks frames by backward k-distance

mod lru_k;

pub use lru_k::{KDistance, LruKReplacer};
