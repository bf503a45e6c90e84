//! LRU-K replacement policy.
//!
//! The victim is the evictable frame with the largest backward k-distance:
//! the time elapsed since its K-th most recent access. Frames with fewer
//! than K recorded accesses have an infinite distance and go first; among
//! those, the frame whose *earliest ever* access is oldest is evicted first.
//!
//! # Ordering
//! Every tracked frame sits in a `BTreeSet` under an [`EvictionKey`]:
//! ```text
//!   (Infinite, first_access, frame)   ← evicted first, oldest first access
//!   ...
//!   (Finite, kth_recent_ts, frame)    ← then by oldest K-th access
//! ```
//! Each tick of the logical clock grows every finite distance by one, so
//! ordering finite frames by the timestamp of their K-th access is the same
//! as ordering them by descending distance.

use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::trace;

use crate::common::{Error, FrameId, Result};

/// Backward k-distance of a tracked frame.
///
/// `Finite(_) < Infinite`, matching eviction priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KDistance {
    /// Current clock minus the timestamp of the K-th most recent access.
    Finite(u64),
    /// Fewer than K accesses recorded.
    Infinite,
}

impl KDistance {
    /// True if fewer than K accesses are known.
    pub fn is_infinite(&self) -> bool {
        matches!(self, KDistance::Infinite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DistanceClass {
    Infinite,
    Finite,
}

/// Position of a frame in eviction order. Smallest key = next victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EvictionKey {
    class: DistanceClass,
    timestamp: u64,
    frame_id: FrameId,
}

#[derive(Debug)]
struct LruKNode {
    /// Last K access timestamps, most recent first.
    history: VecDeque<u64>,
    first_access: u64,
    is_evictable: bool,
}

impl LruKNode {
    fn new(timestamp: u64, k: usize) -> Self {
        let mut history = VecDeque::with_capacity(k);
        history.push_front(timestamp);
        Self {
            history,
            first_access: timestamp,
            is_evictable: false,
        }
    }

    fn record(&mut self, timestamp: u64, k: usize) {
        self.history.push_front(timestamp);
        self.history.truncate(k);
    }

    fn kth_access(&self, k: usize) -> Option<u64> {
        self.history.get(k - 1).copied()
    }

    fn key(&self, frame_id: FrameId, k: usize) -> EvictionKey {
        match self.kth_access(k) {
            Some(timestamp) => EvictionKey {
                class: DistanceClass::Finite,
                timestamp,
                frame_id,
            },
            None => EvictionKey {
                class: DistanceClass::Infinite,
                timestamp: self.first_access,
                frame_id,
            },
        }
    }
}

/// Tracks access history per frame and picks eviction victims by LRU-K.
///
/// Frame states:
/// ```text
/// Untracked ──record_access──▶ Tracked, pinned ──set_evictable(true)──▶ Tracked, evictable
///     ▲                                                                       │
///     └────────────────────────── evict / remove ─────────────────────────────┘
/// ```
///
/// [`size`](Self::size) counts evictable frames only.
pub struct LruKReplacer {
    nodes: HashMap<FrameId, LruKNode>,
    order: BTreeSet<EvictionKey>,
    current_timestamp: u64,
    evictable_count: usize,
    capacity: usize,
    k: usize,
}

impl LruKReplacer {
    /// Create a replacer for frames `0..capacity` keeping `k` timestamps each.
    ///
    /// # Errors
    /// `Error::Initialization` if `capacity` or `k` is zero.
    pub fn new(capacity: usize, k: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::init("replacer capacity must be > 0"));
        }
        if k == 0 {
            return Err(Error::init("replacer k must be >= 1"));
        }

        Ok(Self {
            nodes: HashMap::with_capacity(capacity),
            order: BTreeSet::new(),
            current_timestamp: 0,
            evictable_count: 0,
            capacity,
            k,
        })
    }

    /// Record an access to `frame_id` at the next tick of the logical clock.
    ///
    /// An untracked frame starts being tracked as non-evictable; the caller
    /// marks it evictable once it is unpinned.
    ///
    /// # Errors
    /// `Error::InvariantViolation` if `frame_id` is outside the pool.
    pub fn record_access(&mut self, frame_id: FrameId) -> Result<()> {
        if frame_id.0 >= self.capacity {
            return Err(Error::invariant(format!(
                "{} is outside a replacer of {} frames",
                frame_id, self.capacity
            )));
        }

        self.current_timestamp += 1;
        let now = self.current_timestamp;
        let k = self.k;

        match self.nodes.get_mut(&frame_id) {
            Some(node) => {
                self.order.remove(&node.key(frame_id, k));
                node.record(now, k);
                self.order.insert(node.key(frame_id, k));
            }
            None => {
                let node = LruKNode::new(now, k);
                self.order.insert(node.key(frame_id, k));
                self.nodes.insert(frame_id, node);
            }
        }

        trace!(%frame_id, timestamp = now, "recorded access");
        Ok(())
    }

    /// The frame [`evict`](Self::evict) would return, without untracking it.
    pub fn victim(&self) -> Option<FrameId> {
        if self.evictable_count == 0 {
            return None;
        }
        self.order
            .iter()
            .find(|key| self.nodes.get(&key.frame_id).is_some_and(|n| n.is_evictable))
            .map(|key| key.frame_id)
    }

    /// Evict the evictable frame with the largest backward k-distance.
    ///
    /// The frame's history is discarded and it becomes untracked. Returns
    /// `None` if no tracked frame is evictable.
    pub fn evict(&mut self) -> Option<FrameId> {
        let frame_id = self.victim()?;
        self.untrack(frame_id);
        trace!(%frame_id, "evicted");
        Some(frame_id)
    }

    /// Mark a tracked frame evictable or not. Untracked frames are ignored.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let Some(node) = self.nodes.get_mut(&frame_id) else {
            return;
        };
        if node.is_evictable == evictable {
            return;
        }

        node.is_evictable = evictable;
        if evictable {
            self.evictable_count += 1;
        } else {
            self.evictable_count -= 1;
        }
    }

    /// Stop tracking an evictable frame, regardless of its k-distance.
    ///
    /// Untracked frames are ignored.
    ///
    /// # Errors
    /// `Error::FrameNotEvictable` if the frame is tracked but pinned.
    pub fn remove(&mut self, frame_id: FrameId) -> Result<()> {
        match self.nodes.get(&frame_id) {
            None => Ok(()),
            Some(node) if !node.is_evictable => Err(Error::FrameNotEvictable(frame_id)),
            Some(_) => {
                self.untrack(frame_id);
                Ok(())
            }
        }
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.evictable_count
    }

    /// Backward k-distance of a tracked frame.
    pub fn backward_k_distance(&self, frame_id: FrameId) -> Option<KDistance> {
        let node = self.nodes.get(&frame_id)?;
        Some(match node.kth_access(self.k) {
            Some(timestamp) => KDistance::Finite(self.current_timestamp - timestamp),
            None => KDistance::Infinite,
        })
    }

    /// Whether `frame_id` has any recorded history.
    pub fn is_tracked(&self, frame_id: FrameId) -> bool {
        self.nodes.contains_key(&frame_id)
    }

    /// Whether `frame_id` is tracked and evictable.
    pub fn is_evictable(&self, frame_id: FrameId) -> bool {
        self.nodes.get(&frame_id).is_some_and(|n| n.is_evictable)
    }

    /// Number of tracked frames, evictable or not.
    pub fn tracked_count(&self) -> usize {
        self.nodes.len()
    }

    /// History depth.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of frames this replacer can track.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current value of the logical clock.
    pub fn current_timestamp(&self) -> u64 {
        self.current_timestamp
    }

    /// Forget every frame. The logical clock keeps running.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.evictable_count = 0;
    }

    fn untrack(&mut self, frame_id: FrameId) {
        if let Some(node) = self.nodes.remove(&frame_id) {
            self.order.remove(&node.key(frame_id, self.k));
            if node.is_evictable {
                self.evictable_count -= 1;
            }
        }
    }
}

impl std::fmt::Debug for LruKReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruKReplacer")
            .field("k", &self.k)
            .field("capacity", &self.capacity)
            .field("tracked", &self.nodes.len())
            .field("evictable", &self.evictable_count)
            .field("clock", &self.current_timestamp)
            .finish()
    }
}
