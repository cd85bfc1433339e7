//! Persistent ordered map
//!
//! A treap whose nodes are shared through `Arc`. Cloning a map copies one
//! pointer; `insert` and `remove` copy only the nodes on the search path
//! (O(log n) expected) and leave every other node shared with the maps it
//! was cloned from. This is what makes forking a snapshot cheap and keeps
//! published snapshots untouched while a working copy is being modified.
//!
//! Node priorities are random, so the shape of the tree varies between
//! runs; iteration order is always ascending key order.

use std::cmp::Ordering;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

type Link<K, V> = Option<Arc<Node<K, V>>>;

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    priority: u64,
    left: Link<K, V>,
    right: Link<K, V>,
}

/// Immutable-by-sharing ordered map with cheap clones
pub struct PersistentMap<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Clone for PersistentMap<K, V> {
    fn clone(&self) -> Self {
        PersistentMap {
            root: self.root.clone(),
            len: self.len,
        }
    }
}

impl<K, V> Default for PersistentMap<K, V> {
    fn default() -> Self {
        PersistentMap { root: None, len: 0 }
    }
}

impl<K: Debug, V: Debug> Debug for PersistentMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Take ownership of a node, copying it only if another map still shares it
fn take_node<K: Clone, V: Clone>(node: Arc<Node<K, V>>) -> Node<K, V> {
    Arc::try_unwrap(node).unwrap_or_else(|shared| (*shared).clone())
}

/// Split a tree into keys below `key`, the node equal to `key`, and keys above it
fn split<K: Ord + Clone, V: Clone>(
    link: Link<K, V>,
    key: &K,
) -> (Link<K, V>, Option<Node<K, V>>, Link<K, V>) {
    let Some(node) = link else {
        return (None, None, None);
    };

    let mut node = take_node(node);
    match key.cmp(&node.key) {
        Ordering::Less => {
            let (below, found, above) = split(node.left.take(), key);
            node.left = above;
            (below, found, Some(Arc::new(node)))
        }
        Ordering::Greater => {
            let (below, found, above) = split(node.right.take(), key);
            node.right = below;
            (Some(Arc::new(node)), found, above)
        }
        Ordering::Equal => {
            let below = node.left.take();
            let above = node.right.take();
            (below, Some(node), above)
        }
    }
}

/// Join two trees where every key of `low` sorts before every key of `high`
fn merge<K: Ord + Clone, V: Clone>(low: Link<K, V>, high: Link<K, V>) -> Link<K, V> {
    match (low, high) {
        (None, high) => high,
        (low, None) => low,
        (Some(low), Some(high)) => {
            if low.priority >= high.priority {
                let mut low = take_node(low);
                low.right = merge(low.right.take(), Some(high));
                Some(Arc::new(low))
            } else {
                let mut high = take_node(high);
                high.left = merge(Some(low), high.left.take());
                Some(Arc::new(high))
            }
        }
    }
}

impl<K, V> PersistentMap<K, V> {
    /// Iterate over all entries in ascending key order
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }
}

impl<K: Ord + Clone, V: Clone> PersistentMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            cursor = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    /// Check if `key` is present
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace an entry, returning the replaced value
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (below, existing, above) = split(self.root.take(), &key);

        // A replaced node keeps its priority so the shape stays put
        let priority = existing.as_ref().map_or_else(rand::random, |node| node.priority);
        let node = Arc::new(Node {
            key,
            value,
            priority,
            left: None,
            right: None,
        });
        self.root = merge(merge(below, Some(node)), above);

        match existing {
            Some(old) => Some(old.value),
            None => {
                self.len += 1;
                None
            }
        }
    }

    /// Remove an entry, returning its value
    pub fn remove(&mut self, key: &K) -> Option<V> {
        // Misses must not copy the search path
        if !self.contains_key(key) {
            return None;
        }

        let (below, removed, above) = split(self.root.take(), key);
        self.root = merge(below, above);
        self.len -= 1;
        removed.map(|node| node.value)
    }

    /// Iterate over entries with keys `>= start`, in ascending key order
    pub fn range_from(&self, start: &K) -> Iter<'_, K, V> {
        let mut iter = Iter { stack: Vec::new() };
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            if node.key >= *start {
                iter.stack.push(node);
                cursor = node.left.as_deref();
            } else {
                cursor = node.right.as_deref();
            }
        }
        iter
    }

    /// Whether both maps point at the same root node
    pub fn shares_root_with(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// In-order iterator over a [`PersistentMap`]
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut cursor: Option<&'a Node<K, V>>) {
        while let Some(node) = cursor {
            self.stack.push(node);
            cursor = node.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some((&node.key, &node.value))
    }
}
