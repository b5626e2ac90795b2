//! The refutation table: a move-ordering cache that survives across runs.
//!
//! Whenever a child improves the window at a shallow node, the (parent →
//! child) pair is remembered. The next run tries that child first, hoping
//! for earlier cutoffs. Entries are written to one generation and read from
//! the previous one; rolling the generations at the start of a run is the
//! only state this crate carries from one run to the next.

use std::collections::{BTreeMap, HashMap};

use crate::arena::NodeId;
use crate::key::Key;

use super::node::GameNodes;
use super::transposition::TableKind;

#[derive(Debug)]
enum Generation {
    Hashed(HashMap<Key, Key>),
    Sorted(BTreeMap<Key, Key>),
}

impl Generation {
    fn new(kind: TableKind) -> Self {
        match kind {
            TableKind::Hashed => Generation::Hashed(HashMap::new()),
            TableKind::Sorted => Generation::Sorted(BTreeMap::new()),
        }
    }

    fn get(&self, key: &Key) -> Option<&Key> {
        match self {
            Generation::Hashed(map) => map.get(key),
            Generation::Sorted(map) => map.get(key),
        }
    }

    fn insert(&mut self, parent: Key, child: Key) {
        match self {
            Generation::Hashed(map) => {
                map.insert(parent, child);
            }
            Generation::Sorted(map) => {
                map.insert(parent, child);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Generation::Hashed(map) => map.len(),
            Generation::Sorted(map) => map.len(),
        }
    }

    fn clear(&mut self) {
        match self {
            Generation::Hashed(map) => map.clear(),
            Generation::Sorted(map) => map.clear(),
        }
    }
}

/// Move-ordering cache mapping a parent position to the child that last
/// improved its window.
#[derive(Debug)]
pub struct RefutationTable {
    kind: TableKind,
    depth_limit: f64,
    uses: usize,
    write: Generation,
    read: Generation,
}

impl RefutationTable {
    pub(crate) fn new(kind: TableKind, depth_limit: f64) -> Self {
        RefutationTable {
            kind,
            depth_limit,
            uses: 0,
            write: Generation::new(kind),
            read: Generation::new(kind),
        }
    }

    /// Remembers `child` as the refuting move of `parent`. The depth is
    /// shifted down half a ply: the next run starts one ply later in the
    /// game, so moves at the current root are never worth remembering.
    pub(crate) fn record(&mut self, parent_key: &Key, parent_depth: f64, child_key: &Key) {
        let depth = parent_depth - 0.5;
        if depth >= 0.0 && depth <= self.depth_limit {
            self.write.insert(parent_key.clone(), child_key.clone());
        }
    }

    /// Moves the remembered best child of `parent` (if present among the
    /// fresh children) to the front of the list.
    pub(crate) fn promote<S>(
        &mut self,
        parent_key: &Key,
        parent_depth: f64,
        children: &mut Vec<NodeId>,
        nodes: &GameNodes<S>,
    ) {
        if children.len() <= 1 || parent_depth > self.depth_limit {
            return;
        }
        let best = match self.read.get(parent_key) {
            Some(best) => best,
            None => return,
        };
        let position = children
            .iter()
            .position(|&child| nodes.get(child).key == *best);
        match position {
            Some(0) | None => {}
            Some(position) => {
                let child = children.remove(position);
                children.insert(0, child);
                self.uses += 1;
            }
        }
    }

    /// Starts a new run: last run's writes become this run's reads.
    pub(crate) fn roll(&mut self) {
        self.read = std::mem::replace(&mut self.write, Generation::new(self.kind));
    }

    /// Total entries across both generations.
    pub fn len(&self) -> usize {
        self.write.len() + self.read.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.write.clear();
        self.read.clear();
    }

    /// Number of reorders performed since construction.
    pub fn uses(&self) -> usize {
        self.uses
    }

    pub fn depth_limit(&self) -> f64 {
        self.depth_limit
    }
}
