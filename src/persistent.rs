//! Persistent ordered map (treap with path copying).
//!
//! Every update returns a new map that shares all untouched subtrees with
//! its predecessor; existing nodes are never mutated. Nodes are `Arc`ed, so
//! maps are `Send + Sync` whenever their keys and values are and can be
//! handed across optimizer threads freely.
//!
//! # Algorithm
//! A treap is simultaneously a binary search tree on keys and a heap on
//! per-node random priorities (here: smaller priority = closer to the root).
//! Insertion rebuilds the search path; while unwinding, a child whose
//! priority beats its parent's is rotated above it. Deletion replaces the
//! removed node with the priority-ordered merge of its two subtrees.
//! Expected depth is O(log n) regardless of insertion order.
//!
//! # Reference
//! Seidel & Aragon (1996), "Randomized Search Trees", Algorithmica 16

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type Link<K, V> = Option<Arc<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    priority: u32,
    size: usize,
    left: Link<K, V>,
    right: Link<K, V>,
}

#[inline]
fn size<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |n| n.size)
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V, priority: u32, left: Link<K, V>, right: Link<K, V>) -> Arc<Self> {
        Arc::new(Self {
            size: 1 + size(&left) + size(&right),
            key,
            value,
            priority,
            left,
            right,
        })
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Rebuilds a node from parts, rotating a child up if it outranks the parent.
    fn balanced(key: K, value: V, priority: u32, left: Link<K, V>, right: Link<K, V>) -> Arc<Self> {
        if let Some(l) = &left {
            let right_ok = right.as_ref().map_or(true, |r| r.priority >= l.priority);
            if l.priority < priority && right_ok {
                let demoted = Node::new(key, value, priority, l.right.clone(), right);
                return Node::new(
                    l.key.clone(),
                    l.value.clone(),
                    l.priority,
                    l.left.clone(),
                    Some(demoted),
                );
            }
        }
        if let Some(r) = &right {
            if r.priority < priority {
                let demoted = Node::new(key, value, priority, left, r.left.clone());
                return Node::new(
                    r.key.clone(),
                    r.value.clone(),
                    r.priority,
                    Some(demoted),
                    r.right.clone(),
                );
            }
        }
        Node::new(key, value, priority, left, right)
    }
}

/// A purely functional sorted map.
///
/// Cloning is O(1). All operations leave the receiver untouched.
///
/// # Example
/// ```
/// use u_splash::persistent::PersistentMap;
///
/// let a = PersistentMap::new().insert(2, "two").insert(1, "one");
/// let b = a.insert(3, "three").remove(&1);
///
/// assert_eq!(a.len(), 2);
/// assert_eq!(b.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
/// assert_eq!(b.floor_entry(&5), Some((&3, &"three")));
/// ```
pub struct PersistentMap<K, V> {
    root: Link<K, V>,
}

impl<K, V> Clone for PersistentMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K, V> Default for PersistentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PersistentMap<K, V> {
    /// Creates an empty map.
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        size(&self.root)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Whether two maps share the same root node.
    ///
    /// Equal roots imply equal contents; the converse does not hold.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// In-order iterator over entries.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            stack: Vec::new(),
            remaining: self.len(),
        };
        iter.push_left(self.root.as_deref());
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Smallest entry.
    pub fn first(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some((&node.key, &node.value))
    }

    /// Largest entry.
    pub fn last(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some((&node.key, &node.value))
    }

    /// The entry at position `index` in key order, in O(log n).
    pub fn get_index(&self, mut index: usize) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        loop {
            let left = size(&node.left);
            match index.cmp(&left) {
                Ordering::Less => node = node.left.as_deref()?,
                Ordering::Equal => return Some((&node.key, &node.value)),
                Ordering::Greater => {
                    index -= left + 1;
                    node = node.right.as_deref()?;
                }
            }
        }
    }
}

impl<K: Ord, V> PersistentMap<K, V> {
    /// Value for `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            match key.cmp(&n.key) {
                Ordering::Less => node = n.left.as_deref(),
                Ordering::Greater => node = n.right.as_deref(),
                Ordering::Equal => return Some(&n.value),
            }
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Entry with the greatest key `<= key`.
    pub fn floor_entry(&self, key: &K) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref();
        let mut best = None;
        while let Some(n) = node {
            match key.cmp(&n.key) {
                Ordering::Less => node = n.left.as_deref(),
                Ordering::Equal => return Some((&n.key, &n.value)),
                Ordering::Greater => {
                    best = Some((&n.key, &n.value));
                    node = n.right.as_deref();
                }
            }
        }
        best
    }

    /// Entry with the least key `>= key`.
    pub fn ceiling_entry(&self, key: &K) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref();
        let mut best = None;
        while let Some(n) = node {
            match key.cmp(&n.key) {
                Ordering::Greater => node = n.right.as_deref(),
                Ordering::Equal => return Some((&n.key, &n.value)),
                Ordering::Less => {
                    best = Some((&n.key, &n.value));
                    node = n.left.as_deref();
                }
            }
        }
        best
    }
}

impl<K: Ord + Clone, V: Clone> PersistentMap<K, V> {
    /// Returns a map with `key` bound to `value`.
    ///
    /// A new key gets a fresh random priority; replacing a value keeps the
    /// existing node's priority, so the tree shape is unchanged.
    pub fn insert(&self, key: K, value: V) -> Self {
        self.insert_with_priority(key, value, rand::random())
    }

    fn insert_with_priority(&self, key: K, value: V, priority: u32) -> Self {
        Self {
            root: Some(insert_at(&self.root, key, value, priority)),
        }
    }

    /// Returns a map without `key`.
    ///
    /// Removing an absent key returns a map sharing this map's root.
    pub fn remove(&self, key: &K) -> Self {
        match remove_at(&self.root, key) {
            Some(root) => Self { root },
            None => self.clone(),
        }
    }
}

fn insert_at<K: Ord + Clone, V: Clone>(
    link: &Link<K, V>,
    key: K,
    value: V,
    priority: u32,
) -> Arc<Node<K, V>> {
    let Some(n) = link else {
        return Node::new(key, value, priority, None, None);
    };
    match key.cmp(&n.key) {
        Ordering::Less => {
            let left = insert_at(&n.left, key, value, priority);
            Node::balanced(
                n.key.clone(),
                n.value.clone(),
                n.priority,
                Some(left),
                n.right.clone(),
            )
        }
        Ordering::Greater => {
            let right = insert_at(&n.right, key, value, priority);
            Node::balanced(
                n.key.clone(),
                n.value.clone(),
                n.priority,
                n.left.clone(),
                Some(right),
            )
        }
        Ordering::Equal => Node::new(key, value, n.priority, n.left.clone(), n.right.clone()),
    }
}

/// `None` if the key was absent (nothing to rebuild).
fn remove_at<K: Ord + Clone, V: Clone>(link: &Link<K, V>, key: &K) -> Option<Link<K, V>> {
    let n = link.as_ref()?;
    match key.cmp(&n.key) {
        Ordering::Less => {
            let left = remove_at(&n.left, key)?;
            Some(Some(Node::new(
                n.key.clone(),
                n.value.clone(),
                n.priority,
                left,
                n.right.clone(),
            )))
        }
        Ordering::Greater => {
            let right = remove_at(&n.right, key)?;
            Some(Some(Node::new(
                n.key.clone(),
                n.value.clone(),
                n.priority,
                n.left.clone(),
                right,
            )))
        }
        Ordering::Equal => Some(merge(&n.left, &n.right)),
    }
}

/// Joins two treaps where every key of `left` precedes every key of `right`.
fn merge<K: Clone, V: Clone>(left: &Link<K, V>, right: &Link<K, V>) -> Link<K, V> {
    match (left, right) {
        (None, _) => right.clone(),
        (_, None) => left.clone(),
        (Some(l), Some(r)) => {
            if l.priority < r.priority {
                Some(Node::new(
                    l.key.clone(),
                    l.value.clone(),
                    l.priority,
                    l.left.clone(),
                    merge(&l.right, right),
                ))
            } else {
                Some(Node::new(
                    r.key.clone(),
                    r.value.clone(),
                    r.priority,
                    merge(left, &r.left),
                    r.right.clone(),
                ))
            }
        }
    }
}

/// In-order iterator over a [`PersistentMap`].
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut node: Option<&'a Node<K, V>>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a PersistentMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord + Clone, V: Clone> FromIterator<(K, V)> for PersistentMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (k, v)| map.insert(k, v))
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for PersistentMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.iter().eq(other.iter()))
    }
}

impl<K: Eq, V: Eq> Eq for PersistentMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
