//! The transposition table: cached game values keyed by position and depth.
//!
//! An entry is either an exact value or what the searched windows have
//! proven so far: a lower bound, an upper bound, or both. Bounds only ever
//! tighten, and collapse to an exact value the moment they meet.

use std::collections::{BTreeMap, HashMap};

use crate::key::Key;

/// Backend selector for the transposition and refutation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Hashed,
    Sorted,
}

impl Default for TableKind {
    fn default() -> Self {
        TableKind::Hashed
    }
}

/// What is known about a position's game value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Exact(f64),
    /// The true value is at least this much (the search failed high).
    Lower(f64),
    /// The true value is at most this much (the search failed low).
    Upper(f64),
    /// Both bounds known, not yet equal.
    Window { lower: f64, upper: f64 },
}

impl Bound {
    pub fn exact(&self) -> Option<f64> {
        match *self {
            Bound::Exact(value) => Some(value),
            _ => None,
        }
    }

    pub fn lower(&self) -> Option<f64> {
        match *self {
            Bound::Exact(value) => Some(value),
            Bound::Lower(value) => Some(value),
            Bound::Window { lower, .. } => Some(lower),
            Bound::Upper(_) => None,
        }
    }

    pub fn upper(&self) -> Option<f64> {
        match *self {
            Bound::Exact(value) => Some(value),
            Bound::Upper(value) => Some(value),
            Bound::Window { upper, .. } => Some(upper),
            Bound::Lower(_) => None,
        }
    }
}

/// True when `value` is an exact game value for the window searched:
/// strictly inside it, or saturating an edge that is itself unbounded.
pub(crate) fn value_is_exact(value: f64, alpha: f64, beta: f64) -> bool {
    (alpha < value && value < beta)
        || (value == f64::NEG_INFINITY && alpha == f64::NEG_INFINITY)
        || (value == f64::INFINITY && beta == f64::INFINITY)
}

/// Table key: the same position reached at a different depth is a different
/// entry, because depth-damped win values and the quiescence horizon make
/// its searched value depth-dependent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct TableSlot {
    key: Key,
    half_plies: u32,
}

impl TableSlot {
    pub fn new(key: Key, depth: f64) -> Self {
        TableSlot {
            key,
            half_plies: (depth * 2.0) as u32,
        }
    }
}

#[derive(Debug)]
enum TableMap {
    Hashed(HashMap<TableSlot, Bound>),
    Sorted(BTreeMap<TableSlot, Bound>),
}

impl TableMap {
    fn get(&self, slot: &TableSlot) -> Option<&Bound> {
        match self {
            TableMap::Hashed(map) => map.get(slot),
            TableMap::Sorted(map) => map.get(slot),
        }
    }

    fn get_mut(&mut self, slot: &TableSlot) -> Option<&mut Bound> {
        match self {
            TableMap::Hashed(map) => map.get_mut(slot),
            TableMap::Sorted(map) => map.get_mut(slot),
        }
    }

    fn insert(&mut self, slot: TableSlot, bound: Bound) {
        match self {
            TableMap::Hashed(map) => {
                map.insert(slot, bound);
            }
            TableMap::Sorted(map) => {
                map.insert(slot, bound);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            TableMap::Hashed(map) => map.len(),
            TableMap::Sorted(map) => map.len(),
        }
    }

    fn clear(&mut self) {
        match self {
            TableMap::Hashed(map) => map.clear(),
            TableMap::Sorted(map) => map.clear(),
        }
    }
}

/// Cache of computed game values, rebuilt for every run.
#[derive(Debug)]
pub struct TranspositionTable {
    map: TableMap,
    uses: usize,
}

impl TranspositionTable {
    pub(crate) fn new(kind: TableKind) -> Self {
        let map = match kind {
            TableKind::Hashed => TableMap::Hashed(HashMap::new()),
            TableKind::Sorted => TableMap::Sorted(BTreeMap::new()),
        };
        TranspositionTable { map, uses: 0 }
    }

    /// A cached value usable for the (alpha, beta) window: the exact value
    /// if known, or a stored bound that already resolves the window (an
    /// upper bound at or below alpha, a lower bound at or above beta).
    pub(crate) fn probe(&mut self, slot: &TableSlot, alpha: f64, beta: f64) -> Option<f64> {
        let bound = *self.map.get(slot)?;
        if let Some(value) = bound.exact() {
            self.uses += 1;
            return Some(value);
        }
        if let Some(upper) = bound.upper() {
            if upper <= alpha {
                self.uses += 1;
                return Some(upper);
            }
        }
        if let Some(lower) = bound.lower() {
            if beta <= lower {
                self.uses += 1;
                return Some(lower);
            }
        }
        None
    }

    /// The raw entry for a slot, for diagnostics and tests.
    pub fn entry(&self, key: &Key, depth: f64) -> Option<Bound> {
        self.map
            .get(&TableSlot::new(key.clone(), depth))
            .copied()
    }

    /// Stores `value` as what the (alpha, beta) search proved: the exact
    /// value when the window says so, otherwise a tightened bound, merged
    /// with anything already known and promoted to exact once the bounds
    /// meet.
    pub(crate) fn record(&mut self, slot: TableSlot, value: f64, alpha: f64, beta: f64) {
        let exact = value_is_exact(value, alpha, beta);
        match self.map.get_mut(&slot) {
            None => {
                let bound = if exact {
                    Bound::Exact(value)
                } else if value <= alpha {
                    Bound::Upper(value)
                } else {
                    Bound::Lower(value)
                };
                self.map.insert(slot, bound);
            }
            Some(entry) => {
                if exact {
                    *entry = Bound::Exact(value);
                } else if value <= alpha {
                    *entry = Self::tighten_upper(*entry, value);
                } else if beta <= value {
                    *entry = Self::tighten_lower(*entry, value);
                }
            }
        }
    }

    fn tighten_upper(entry: Bound, value: f64) -> Bound {
        match entry {
            // An exact value is final.
            Bound::Exact(_) => entry,
            Bound::Upper(upper) if value < upper => Bound::Upper(value),
            Bound::Upper(_) => entry,
            Bound::Lower(lower) => Self::collapse(lower, value),
            Bound::Window { lower, upper } if value < upper => Self::collapse(lower, value),
            Bound::Window { .. } => entry,
        }
    }

    fn tighten_lower(entry: Bound, value: f64) -> Bound {
        match entry {
            Bound::Exact(_) => entry,
            Bound::Lower(lower) if lower < value => Bound::Lower(value),
            Bound::Lower(_) => entry,
            Bound::Upper(upper) => Self::collapse(value, upper),
            Bound::Window { lower, upper } if lower < value => Self::collapse(value, upper),
            Bound::Window { .. } => entry,
        }
    }

    fn collapse(lower: f64, upper: f64) -> Bound {
        if lower == upper {
            Bound::Exact(lower)
        } else {
            Bound::Window { lower, upper }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.uses = 0;
    }

    /// Number of successful probes since construction or the last clear.
    pub fn uses(&self) -> usize {
        self.uses
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn slot(name: &str) -> TableSlot {
        TableSlot::new(Key::Text(name.to_string()), 1.0)
    }

    fn table() -> TranspositionTable {
        TranspositionTable::new(TableKind::Hashed)
    }

    #[test]
    fn exact_value_is_stored_and_probed() {
        let mut tt = table();
        tt.record(slot("a"), 3.0, 0.0, 10.0);
        assert_eq!(tt.probe(&slot("a"), -5.0, 5.0), Some(3.0));
        assert_eq!(tt.uses(), 1);
    }

    #[test]
    fn repeated_identical_records_are_idempotent() {
        let mut tt = table();
        for _ in 0..3 {
            tt.record(slot("a"), 7.0, 10.0, 20.0); // fails low: upper bound
        }
        assert_eq!(tt.len(), 1);
        assert_eq!(tt.entry(&Key::Text("a".to_string()), 1.0), Some(Bound::Upper(7.0)));
    }

    #[test]
    fn bounds_converge_to_exact() {
        let mut tt = table();
        tt.record(slot("a"), 5.0, 10.0, 20.0); // upper bound 5
        tt.record(slot("a"), 5.0, -10.0, 5.0); // lower bound 5: meets upper
        let entry = tt.entry(&Key::Text("a".to_string()), 1.0).unwrap();
        assert_eq!(entry, Bound::Exact(5.0));
        assert_eq!(entry.lower(), Some(5.0));
        assert_eq!(entry.upper(), Some(5.0));
    }

    #[test]
    fn probe_is_sound_for_the_queried_window() {
        let mut tt = table();
        tt.record(slot("a"), 4.0, 10.0, 20.0); // upper bound 4
        tt.record(slot("a"), 2.0, -10.0, 2.0); // lower bound 2
        // Inside the (2, 4) uncertainty: nothing usable.
        assert_eq!(tt.probe(&slot("a"), 2.5, 3.5), None);
        // Window already at or above the upper bound: the bound answers.
        assert_eq!(tt.probe(&slot("a"), 4.0, 9.0), Some(4.0));
        // Window already at or below the lower bound: the bound answers.
        assert_eq!(tt.probe(&slot("a"), -3.0, 2.0), Some(2.0));
    }

    #[test]
    fn bounds_only_tighten() {
        let mut tt = table();
        tt.record(slot("a"), 4.0, 10.0, 20.0); // upper 4
        tt.record(slot("a"), 6.0, 10.0, 20.0); // looser upper: ignored
        assert_eq!(tt.entry(&Key::Text("a".to_string()), 1.0), Some(Bound::Upper(4.0)));
        tt.record(slot("a"), 3.0, 10.0, 20.0); // tighter: kept
        assert_eq!(tt.entry(&Key::Text("a".to_string()), 1.0), Some(Bound::Upper(3.0)));
    }

    #[test]
    fn same_position_at_other_depth_is_another_entry() {
        let mut tt = table();
        let key = Key::Text("a".to_string());
        tt.record(TableSlot::new(key.clone(), 1.0), 3.0, 0.0, 10.0);
        tt.record(TableSlot::new(key.clone(), 1.5), 8.0, 0.0, 10.0);
        assert_eq!(tt.len(), 2);
        assert_eq!(tt.entry(&key, 1.0), Some(Bound::Exact(3.0)));
        assert_eq!(tt.entry(&key, 1.5), Some(Bound::Exact(8.0)));
    }

    #[test]
    fn infinite_window_edges_count_as_exact() {
        assert!(value_is_exact(f64::NEG_INFINITY, f64::NEG_INFINITY, 5.0));
        assert!(value_is_exact(f64::INFINITY, -5.0, f64::INFINITY));
        assert!(!value_is_exact(5.0, 5.0, 10.0));
    }

    #[test]
    fn sorted_backend_behaves_the_same() {
        let mut tt = TranspositionTable::new(TableKind::Sorted);
        tt.record(slot("b"), 1.0, -10.0, 10.0);
        tt.record(slot("a"), 2.0, -10.0, 10.0);
        assert_eq!(tt.probe(&slot("a"), -1.0, 1.0), Some(2.0));
        tt.clear();
        assert!(tt.is_empty());
        assert_eq!(tt.uses(), 0);
    }
}
