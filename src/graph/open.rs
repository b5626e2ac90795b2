//! The open set: the frontier of a best-first search.
//!
//! Entries are ordered by a [Priority] fixed at insertion time, tie-broken
//! by key so that expansion order is deterministic. The reference backend is
//! an array-backed binary min-heap paired with a hash index from key to heap
//! slot, giving O(log n) push/pop/replace and O(1) membership and lookup.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::arena::NodeId;
use crate::key::Key;

/// Sort key for an open-set entry.
///
/// `primary` and `secondary` are comparator values chosen by the search
/// strategy (h, g, f, or depth/f combinations); the state key breaks ties.
/// Floats compare by `total_cmp`.
#[derive(Debug, Clone)]
pub struct Priority {
    primary: f64,
    secondary: f64,
    key: Key,
}

impl Priority {
    pub(crate) fn new(primary: f64, secondary: f64, key: Key) -> Self {
        Priority {
            primary,
            secondary,
            key,
        }
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary
            .total_cmp(&other.primary)
            .then_with(|| self.secondary.total_cmp(&other.secondary))
            .then_with(|| self.key.cmp(&other.key))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Which open-set backend a search uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenKind {
    /// Binary min-heap plus key→slot hash index (the default).
    IndexedHeap,
    /// Ordered tree of entries plus a key→entry point index.
    SortedTree,
}

impl Default for OpenKind {
    fn default() -> Self {
        OpenKind::IndexedHeap
    }
}

/// Frontier container for graph searches.
#[derive(Debug)]
pub enum OpenSet {
    Heap(IndexedHeap),
    Tree(SortedTree),
}

impl OpenSet {
    pub(crate) fn new(kind: OpenKind) -> Self {
        match kind {
            OpenKind::IndexedHeap => OpenSet::Heap(IndexedHeap::new()),
            OpenKind::SortedTree => OpenSet::Tree(SortedTree::new()),
        }
    }

    pub(crate) fn push(&mut self, priority: Priority, id: NodeId) {
        match self {
            OpenSet::Heap(heap) => heap.push(priority, id),
            OpenSet::Tree(tree) => tree.push(priority, id),
        }
    }

    /// Removes and returns the entry that sorts first.
    pub(crate) fn pop(&mut self) -> Option<NodeId> {
        match self {
            OpenSet::Heap(heap) => heap.pop(),
            OpenSet::Tree(tree) => tree.pop(),
        }
    }

    /// The entry that sorts first, left in place.
    pub fn peek(&self) -> Option<NodeId> {
        match self {
            OpenSet::Heap(heap) => heap.peek(),
            OpenSet::Tree(tree) => tree.peek(),
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &Key) -> Option<NodeId> {
        match self {
            OpenSet::Heap(heap) => heap.get(key),
            OpenSet::Tree(tree) => tree.get(key),
        }
    }

    pub(crate) fn priority(&self, key: &Key) -> Option<&Priority> {
        match self {
            OpenSet::Heap(heap) => heap.priority(key),
            OpenSet::Tree(tree) => tree.priority(key),
        }
    }

    /// Replaces the entry for `key` with a strictly better copy. The caller
    /// guarantees the improvement; the heap backend only re-sifts upward.
    pub(crate) fn replace(&mut self, key: &Key, priority: Priority, id: NodeId) {
        match self {
            OpenSet::Heap(heap) => heap.replace(key, priority, id),
            OpenSet::Tree(tree) => tree.replace(key, priority, id),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OpenSet::Heap(heap) => heap.len(),
            OpenSet::Tree(tree) => tree.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match self {
            OpenSet::Heap(heap) => heap.clear(),
            OpenSet::Tree(tree) => tree.clear(),
        }
    }
}

#[derive(Debug)]
struct HeapEntry {
    priority: Priority,
    id: NodeId,
}

/// Binary min-heap with a hash index from key to heap slot.
#[derive(Debug)]
pub struct IndexedHeap {
    heap: Vec<HeapEntry>,
    index: HashMap<Key, usize>,
}

impl IndexedHeap {
    fn new() -> Self {
        IndexedHeap {
            heap: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn push(&mut self, priority: Priority, id: NodeId) {
        let slot = self.heap.len();
        self.index.insert(priority.key().clone(), slot);
        self.heap.push(HeapEntry { priority, id });
        self.sift_up(slot);
    }

    fn pop(&mut self) -> Option<NodeId> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let first = self.heap.pop().unwrap();
        self.index.remove(first.priority.key());
        if !self.heap.is_empty() {
            self.index.insert(self.heap[0].priority.key().clone(), 0);
            self.sift_down(0);
        }
        Some(first.id)
    }

    fn peek(&self) -> Option<NodeId> {
        self.heap.first().map(|entry| entry.id)
    }

    fn get(&self, key: &Key) -> Option<NodeId> {
        self.index.get(key).map(|&slot| self.heap[slot].id)
    }

    fn priority(&self, key: &Key) -> Option<&Priority> {
        self.index.get(key).map(|&slot| &self.heap[slot].priority)
    }

    fn replace(&mut self, key: &Key, priority: Priority, id: NodeId) {
        if let Some(&slot) = self.index.get(key) {
            self.heap[slot] = HeapEntry { priority, id };
            self.sift_up(slot);
        }
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
    }

    fn sift_up(&mut self, mut child: usize) {
        while child > 0 {
            let parent = (child - 1) / 2;
            if self.heap[parent].priority <= self.heap[child].priority {
                break;
            }
            self.swap_slots(parent, child);
            child = parent;
        }
    }

    fn sift_down(&mut self, mut parent: usize) {
        loop {
            let left = 2 * parent + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < self.heap.len() && self.heap[right].priority < self.heap[left].priority {
                smallest = right;
            }
            if self.heap[parent].priority <= self.heap[smallest].priority {
                break;
            }
            self.swap_slots(parent, smallest);
            parent = smallest;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.index
            .insert(self.heap[a].priority.key().clone(), a);
        self.index
            .insert(self.heap[b].priority.key().clone(), b);
    }
}

/// Ordered-tree backend: a `BTreeSet` of (priority, node) pairs plus a hash
/// index for point lookups.
#[derive(Debug)]
pub struct SortedTree {
    tree: BTreeSet<(Priority, NodeId)>,
    index: HashMap<Key, (Priority, NodeId)>,
}

impl SortedTree {
    fn new() -> Self {
        SortedTree {
            tree: BTreeSet::new(),
            index: HashMap::new(),
        }
    }

    fn push(&mut self, priority: Priority, id: NodeId) {
        self.index
            .insert(priority.key().clone(), (priority.clone(), id));
        self.tree.insert((priority, id));
    }

    fn pop(&mut self) -> Option<NodeId> {
        let (priority, id) = self.tree.pop_first()?;
        self.index.remove(priority.key());
        Some(id)
    }

    fn peek(&self) -> Option<NodeId> {
        self.tree.iter().next().map(|&(_, id)| id)
    }

    fn get(&self, key: &Key) -> Option<NodeId> {
        self.index.get(key).map(|&(_, id)| id)
    }

    fn priority(&self, key: &Key) -> Option<&Priority> {
        self.index.get(key).map(|(priority, _)| priority)
    }

    fn replace(&mut self, key: &Key, priority: Priority, id: NodeId) {
        if let Some(old) = self.index.remove(key) {
            self.tree.remove(&old);
        }
        self.push(priority, id);
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn clear(&mut self) {
        self.tree.clear();
        self.index.clear();
    }
}
