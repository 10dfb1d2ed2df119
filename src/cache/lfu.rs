//! Bounded frequency cache
//!
//! LFU specialized for index/data nodes keyed by 64-bit ids. State per
//! entry: the node itself, its access frequency, and a membership in
//! the insertion-ordered bucket of ids sharing that frequency.
//! `min_freq` names the smallest non-empty bucket, which is where
//! eviction victims come from, oldest inserted at that frequency first.
//!
//! Buckets are linked lists over an index arena, so moving an id
//! between buckets and evicting are both O(1). A single lock
//! serializes every operation.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Fixed-capacity node cache evicting the least-frequently-used entry
///
/// # Example
///
/// ```
/// use meridiandb::cache::NodeCache;
///
/// let cache = NodeCache::new(2);
/// cache.put(1, "n1");
/// cache.put(2, "n2");
/// assert_eq!(cache.get(1), Some("n1"));
/// cache.put(3, "n3");
///
/// // id 2 sat alone at frequency 1 and was evicted
/// assert_eq!(cache.get(2), None);
/// assert_eq!(cache.get(1), Some("n1"));
/// ```
pub struct NodeCache<N> {
    capacity: usize,
    inner: Mutex<LfuInner<N>>,
}

struct LfuInner<N> {
    /// id → cached node
    nodes: HashMap<u64, N>,

    /// id → (frequency ≥ 1, arena slot of its bucket membership)
    freqs: HashMap<u64, (u64, u32)>,

    /// frequency → insertion-ordered ids at that frequency
    buckets: HashMap<u64, Bucket>,

    /// Link storage shared by all buckets
    arena: Arena,

    /// Smallest frequency with a non-empty bucket while the cache is
    /// non-empty; reset to 1 by every fresh insertion
    min_freq: u64,
}

impl<N: Clone> NodeCache<N> {
    /// Create a cache holding at most `capacity` nodes
    ///
    /// Capacity 0 never stores anything.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(LfuInner {
                nodes: HashMap::with_capacity(capacity),
                freqs: HashMap::with_capacity(capacity),
                buckets: HashMap::new(),
                arena: Arena::default(),
                min_freq: 1,
            }),
        }
    }

    /// Look up `id`, bumping its frequency on a hit
    pub fn get(&self, id: u64) -> Option<N> {
        let mut inner = self.inner.lock();
        if !inner.nodes.contains_key(&id) {
            return None;
        }
        inner.touch(id);
        inner.nodes.get(&id).cloned()
    }

    /// Insert or replace the node for `id`
    ///
    /// Replacing an existing id also counts as an access (frequency
    /// bump). A fresh insert at capacity first evicts the oldest id of
    /// the minimum-frequency bucket, then enters at frequency 1.
    pub fn put(&self, id: u64, node: N) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();

        if inner.nodes.contains_key(&id) {
            inner.nodes.insert(id, node);
            inner.touch(id);
            return;
        }

        if inner.nodes.len() >= self.capacity {
            inner.evict_min();
        }

        let slot = inner.bucket_push_back(1, id);
        inner.nodes.insert(id, node);
        inner.freqs.insert(id, (1, slot));
        inner.min_freq = 1;
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.nodes.clear();
        inner.freqs.clear();
        inner.buckets.clear();
        inner.arena.clear();
        inner.min_freq = 1;
    }

    /// Current number of cached nodes
    pub fn len(&self) -> usize {
        self.inner.lock().nodes.len()
    }

    /// True when no nodes are cached
    pub fn is_empty(&self) -> bool {
        self.inner.lock().nodes.is_empty()
    }

    /// Maximum number of cached nodes
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<N> LfuInner<N> {
    /// Move `id` from its bucket to the next-higher one and record the
    /// new frequency
    fn touch(&mut self, id: u64) {
        let Some(&(freq, slot)) = self.freqs.get(&id) else {
            return;
        };
        let emptied = self.bucket_remove(freq, slot);
        if emptied && freq == self.min_freq {
            self.min_freq = freq + 1;
        }
        let new_slot = self.bucket_push_back(freq + 1, id);
        self.freqs.insert(id, (freq + 1, new_slot));
    }

    /// Evict the oldest-inserted id of the minimum-frequency bucket
    fn evict_min(&mut self) {
        let victim = self
            .buckets
            .get(&self.min_freq)
            .and_then(|b| b.head)
            .map(|slot| self.arena.slots[slot as usize].id);
        let Some(victim) = victim else {
            return;
        };
        if let Some((freq, slot)) = self.freqs.remove(&victim) {
            self.bucket_remove(freq, slot);
        }
        self.nodes.remove(&victim);
    }

    /// Append `id` to the bucket for `freq`, creating it if needed
    fn bucket_push_back(&mut self, freq: u64, id: u64) -> u32 {
        let slot = self.arena.alloc(id);
        let bucket = self.buckets.entry(freq).or_default();
        match bucket.tail {
            Some(tail) => {
                self.arena.slots[tail as usize].next = Some(slot);
                self.arena.slots[slot as usize].prev = Some(tail);
            }
            None => bucket.head = Some(slot),
        }
        bucket.tail = Some(slot);
        bucket.len += 1;
        slot
    }

    /// Unlink `slot` from the bucket for `freq`, dropping the bucket if
    /// it empties. Returns whether the bucket emptied.
    fn bucket_remove(&mut self, freq: u64, slot: u32) -> bool {
        let (prev, next) = {
            let s = &self.arena.slots[slot as usize];
            (s.prev, s.next)
        };
        match prev {
            Some(p) => self.arena.slots[p as usize].next = next,
            None => {
                if let Some(bucket) = self.buckets.get_mut(&freq) {
                    bucket.head = next;
                }
            }
        }
        match next {
            Some(n) => self.arena.slots[n as usize].prev = prev,
            None => {
                if let Some(bucket) = self.buckets.get_mut(&freq) {
                    bucket.tail = prev;
                }
            }
        }
        self.arena.release(slot);

        let emptied = self
            .buckets
            .get_mut(&freq)
            .map(|bucket| {
                bucket.len -= 1;
                bucket.len == 0
            })
            .unwrap_or(false);
        if emptied {
            self.buckets.remove(&freq);
        }
        emptied
    }
}

/// One insertion-ordered bucket: head is oldest, tail is newest
#[derive(Default)]
struct Bucket {
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

/// Slot storage for bucket links, recycled through a free list
#[derive(Default)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

struct Slot {
    id: u64,
    prev: Option<u32>,
    next: Option<u32>,
}

impl Arena {
    fn alloc(&mut self, id: u64) -> u32 {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Slot {
                    id,
                    prev: None,
                    next: None,
                };
                slot
            }
            None => {
                self.slots.push(Slot {
                    id,
                    prev: None,
                    next: None,
                });
                (self.slots.len() - 1) as u32
            }
        }
    }

    fn release(&mut self, slot: u32) {
        self.free.push(slot);
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
