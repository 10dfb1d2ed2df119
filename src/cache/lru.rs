//! Bounded recency cache
//!
//! Classic LRU: a HashMap for O(1) lookup and an intrusive doubly
//! linked list for O(1) reordering and victim selection. The list's
//! head is the most recently used entry, the tail the least.
//!
//! Every operation takes one exclusive lock: a promotion rewrites list
//! links, so even a read is a structural write.

use std::collections::HashMap;
use std::hash::Hash;
use std::ptr::NonNull;

use parking_lot::Mutex;

/// A node in the recency list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<NonNull<Node<K, V>>>,
    next: Option<NonNull<Node<K, V>>>,
}

/// Fixed-capacity key→value cache evicting the least-recently-used entry
///
/// # Example
///
/// ```
/// use meridiandb::cache::LruCache;
///
/// let cache = LruCache::new(2);
/// cache.put(1, "a");
/// cache.put(2, "b");
/// cache.put(3, "c");
///
/// // key 1 was least recently used and got evicted
/// assert_eq!(cache.get(&1), None);
/// assert_eq!(cache.get(&2), Some("b"));
/// assert_eq!(cache.get(&3), Some("c"));
/// ```
pub struct LruCache<K, V> {
    capacity: usize,
    inner: Mutex<LruInner<K, V>>,
}

struct LruInner<K, V> {
    /// Key → list node; always in 1:1 correspondence with the list
    map: HashMap<K, NonNull<Node<K, V>>>,

    /// Most recently used end
    head: Option<NonNull<Node<K, V>>>,

    /// Least recently used end; the eviction victim
    tail: Option<NonNull<Node<K, V>>>,
}

// Safety: nodes are heap allocations owned solely by the inner state;
// the raw pointers never escape the lock.
unsafe impl<K: Send, V: Send> Send for LruInner<K, V> {}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(LruInner {
                map: HashMap::with_capacity(capacity),
                head: None,
                tail: None,
            }),
        }
    }

    /// Look up `key`, promoting a hit to most-recently-used
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let node = *inner.map.get(key)?;
        inner.detach(node);
        inner.push_front(node);
        Some(unsafe { (*node.as_ptr()).value.clone() })
    }

    /// Insert or update `key`
    ///
    /// Both paths leave the entry most-recently-used. An insert that
    /// pushes the cache past capacity evicts the least-recent entry.
    pub fn put(&self, key: K, value: V) {
        let mut inner = self.inner.lock();

        if let Some(&node) = inner.map.get(&key) {
            unsafe { (*node.as_ptr()).value = value };
            inner.detach(node);
            inner.push_front(node);
            return;
        }

        let node = Box::new(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        let node = unsafe { NonNull::new_unchecked(Box::into_raw(node)) };
        inner.map.insert(key, node);
        inner.push_front(node);

        if inner.map.len() > self.capacity {
            if let Some(victim) = inner.pop_back() {
                let victim = unsafe { Box::from_raw(victim.as_ptr()) };
                inner.map.remove(&victim.key);
            }
        }
    }

    /// Detach `key` if present
    pub fn remove(&self, key: &K) {
        let mut inner = self.inner.lock();
        if let Some(node) = inner.map.remove(key) {
            inner.detach(node);
            drop(unsafe { Box::from_raw(node.as_ptr()) });
        }
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// True when no entries are cached
    pub fn is_empty(&self) -> bool {
        self.inner.lock().map.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<K, V> LruInner<K, V> {
    /// Unlink `node` from the list, leaving its map entry untouched
    fn detach(&mut self, node: NonNull<Node<K, V>>) {
        unsafe {
            let (prev, next) = {
                let n = &*node.as_ptr();
                (n.prev, n.next)
            };
            match prev {
                Some(p) => (*p.as_ptr()).next = next,
                None => self.head = next,
            }
            match next {
                Some(n) => (*n.as_ptr()).prev = prev,
                None => self.tail = prev,
            }
            (*node.as_ptr()).prev = None;
            (*node.as_ptr()).next = None;
        }
    }

    /// Link `node` in at the most-recently-used end
    fn push_front(&mut self, node: NonNull<Node<K, V>>) {
        unsafe {
            (*node.as_ptr()).prev = None;
            (*node.as_ptr()).next = self.head;
            if let Some(h) = self.head {
                (*h.as_ptr()).prev = Some(node);
            }
            self.head = Some(node);
            if self.tail.is_none() {
                self.tail = Some(node);
            }
        }
    }

    /// Unlink and return the least-recently-used node
    fn pop_back(&mut self) -> Option<NonNull<Node<K, V>>> {
        let tail = self.tail?;
        self.detach(tail);
        Some(tail)
    }
}

impl<K, V> Drop for LruInner<K, V> {
    fn drop(&mut self) {
        let mut cur = self.head;
        while let Some(node) = cur {
            cur = unsafe { (*node.as_ptr()).next };
            drop(unsafe { Box::from_raw(node.as_ptr()) });
        }
    }
}
