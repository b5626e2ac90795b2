use std::collections::{BTreeMap, HashMap};

use crate::arena::NodeId;
use crate::key::Key;

/// Which closed-set backend a search uses.
///
/// `Off` disables the visited check entirely; only sound when the search
/// space is a tree (no re-convergent paths), where it saves the memory of
/// remembering every expanded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedKind {
    Hashed,
    Sorted,
    Off,
}

impl Default for ClosedKind {
    fn default() -> Self {
        ClosedKind::Hashed
    }
}

/// Visited-state container for graph searches.
#[derive(Debug)]
pub enum ClosedSet {
    Hashed(HashMap<Key, NodeId>),
    Sorted(BTreeMap<Key, NodeId>),
    Off,
}

impl ClosedSet {
    pub(crate) fn new(kind: ClosedKind) -> Self {
        match kind {
            ClosedKind::Hashed => ClosedSet::Hashed(HashMap::new()),
            ClosedKind::Sorted => ClosedSet::Sorted(BTreeMap::new()),
            ClosedKind::Off => ClosedSet::Off,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, ClosedSet::Off)
    }

    pub(crate) fn put(&mut self, key: Key, id: NodeId) {
        match self {
            ClosedSet::Hashed(map) => {
                map.insert(key, id);
            }
            ClosedSet::Sorted(map) => {
                map.insert(key, id);
            }
            ClosedSet::Off => {}
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &Key) -> Option<NodeId> {
        match self {
            ClosedSet::Hashed(map) => map.get(key).copied(),
            ClosedSet::Sorted(map) => map.get(key).copied(),
            ClosedSet::Off => None,
        }
    }

    pub fn remove(&mut self, key: &Key) {
        match self {
            ClosedSet::Hashed(map) => {
                map.remove(key);
            }
            ClosedSet::Sorted(map) => {
                map.remove(key);
            }
            ClosedSet::Off => {}
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ClosedSet::Hashed(map) => map.len(),
            ClosedSet::Sorted(map) => map.len(),
            ClosedSet::Off => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match self {
            ClosedSet::Hashed(map) => map.clear(),
            ClosedSet::Sorted(map) => map.clear(),
            ClosedSet::Off => {}
        }
    }
}
