use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use crate::arena::NodeId;
use crate::errors::{Result, SearchError};
use crate::key::{Key, KeyMode};
use crate::state::Successor;

use super::node::{GameNode, GameNodes};
use super::refutation::RefutationTable;
use super::state::{GameState, WIN_LEVEL};
use super::transposition::{value_is_exact, TableKind, TableSlot, TranspositionTable};

/// Which game search algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAlgorithm {
    /// Exhaustive minimax, no pruning. Scores every root move.
    MinMax,
    /// Minimax with alpha-beta cutoffs.
    AlphaBeta,
    /// Alpha-beta with null-window scouting of non-first children.
    Scout,
}

/// Options for a game search, fixed at engine construction.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub key_mode: KeyMode,
    /// Depth limit in full moves; every ply costs 0.5.
    pub depth_limit: f64,
    /// Search past the depth limit while the position is not quiet.
    pub quiescence: bool,
    pub transposition: bool,
    pub transposition_kind: TableKind,
    pub refutation: bool,
    pub refutation_kind: TableKind,
    /// Depth (in full moves) up to which refuting moves are remembered.
    pub refutation_depth_limit: f64,
    pub memorize_children: bool,
    pub time_limit: Option<Duration>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            key_mode: KeyMode::default(),
            depth_limit: 3.5,
            quiescence: true,
            transposition: true,
            transposition_kind: TableKind::default(),
            refutation: true,
            refutation_kind: TableKind::default(),
            refutation_depth_limit: 2.0,
            memorize_children: false,
            time_limit: None,
        }
    }
}

/// Signal that a run was cancelled mid-recursion (forced stop or time
/// limit). Unwinds through every in-flight `evaluate` call via `?`.
#[derive(Debug, Clone, Copy)]
struct Cancelled;

type EvalResult = std::result::Result<f64, Cancelled>;

/// A configured game search engine.
///
/// The engine owns the refutation table, which is the only state carried
/// from one run to the next; everything else is rebuilt per run. A single
/// engine must not be driven from more than one thread; the stop handle is
/// the only cross-thread touchpoint.
pub struct GameSearch<S: GameState> {
    algorithm: GameAlgorithm,
    config: GameConfig,
    evaluator: Option<Box<dyn Fn(&S) -> f64>>,
    refutation: RefutationTable,
    stop: Arc<AtomicBool>,
}

impl<S: GameState> GameSearch<S> {
    pub fn new(algorithm: GameAlgorithm) -> Self {
        Self::with_config(algorithm, GameConfig::default())
    }

    pub fn with_config(algorithm: GameAlgorithm, config: GameConfig) -> Self {
        let refutation =
            RefutationTable::new(config.refutation_kind, config.refutation_depth_limit);
        GameSearch {
            algorithm,
            config,
            evaluator: None,
            refutation,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Overrides the evaluation function of the state type for this engine.
    pub fn with_evaluator(mut self, evaluator: impl Fn(&S) -> f64 + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn algorithm(&self) -> GameAlgorithm {
        self.algorithm
    }

    /// The engine's refutation table (survives across runs).
    pub fn refutation(&self) -> &RefutationTable {
        &self.refutation
    }

    /// Clonable flag that cancels the current run when set. The recursion
    /// polls it at every node entry and unwinds, leaving whatever move
    /// scores exist as the answer.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Searches from `root` and scores its moves.
    pub fn run(&mut self, root: S) -> GameReport<S> {
        self.stop.store(false, Ordering::Relaxed);
        // Last run's refuting moves become this run's ordering hints.
        self.refutation.roll();

        let started = Instant::now();
        let depth_limit = self.config.depth_limit;
        let mut run = GameRun {
            algorithm: self.algorithm,
            config: &self.config,
            evaluator: self.evaluator.as_deref(),
            refutation: &mut self.refutation,
            stop: Arc::clone(&self.stop),
            table: if self.config.transposition {
                Some(TranspositionTable::new(self.config.transposition_kind))
            } else {
                None
            },
            nodes: GameNodes::new(),
            scores: BTreeMap::new(),
            closed: 0,
            depth_reached: 0.0,
            started,
        };

        let root_id = run.admit_root(root);
        let maximizing = run.nodes.get(root_id).state.maximizing_turn();
        let value = run
            .evaluate(root_id, f64::NEG_INFINITY, f64::INFINITY, 0.0, depth_limit)
            .ok();
        if let Some(value) = value {
            run.tt_record(root_id, value, f64::NEG_INFINITY, f64::INFINITY);
        }

        let elapsed = started.elapsed();
        let pv = run.nodes.get(root_id).pv.clone();
        let GameRun {
            table,
            nodes,
            scores,
            closed,
            depth_reached,
            ..
        } = run;
        let (transposition_len, transposition_uses) = match &table {
            Some(table) => (table.len(), table.uses()),
            None => (0, 0),
        };
        debug!(
            "{:?} run: value {:?}, {} closed, depth {} reached, {} nodes, tt {}/{} uses, {:?}",
            self.algorithm,
            value,
            closed,
            depth_reached,
            nodes.len(),
            transposition_len,
            transposition_uses,
            elapsed
        );
        GameReport {
            nodes,
            root: root_id,
            maximizing,
            value,
            scores,
            pv,
            closed,
            depth_reached,
            transposition: table,
            refutation_len: self.refutation.len(),
            refutation_uses: self.refutation.uses(),
            elapsed,
            cancelled: value.is_none(),
        }
    }

    /// Searches from `root` and returns the best move name, failing when
    /// the run scored nothing (for instance a forced stop before any child
    /// finished).
    pub fn choose(&mut self, root: S) -> Result<String> {
        let report = self.run(root);
        report
            .best_move()
            .map(str::to_string)
            .ok_or(SearchError::NoMoveFound)
    }
}

struct GameRun<'a, S: GameState> {
    algorithm: GameAlgorithm,
    config: &'a GameConfig,
    evaluator: Option<&'a (dyn Fn(&S) -> f64)>,
    refutation: &'a mut RefutationTable,
    stop: Arc<AtomicBool>,
    table: Option<TranspositionTable>,
    nodes: GameNodes<S>,
    scores: BTreeMap<String, f64>,
    closed: u64,
    depth_reached: f64,
    started: Instant,
}

impl<'a, S: GameState> GameRun<'a, S> {
    /// Entry point of every node: cancellation poll, bookkeeping, dispatch.
    fn evaluate(&mut self, id: NodeId, alpha: f64, beta: f64, depth: f64, limit: f64) -> EvalResult {
        if self.stop.load(Ordering::Relaxed) || self.out_of_time() {
            return Err(Cancelled);
        }
        self.closed += 1;
        self.nodes.get_mut(id).visited = true;
        match self.algorithm {
            GameAlgorithm::MinMax => self.minmax(id, alpha, beta, depth, limit),
            GameAlgorithm::AlphaBeta => self.alpha_beta(id, alpha, beta, depth, limit),
            GameAlgorithm::Scout => self.scout(id, alpha, beta, depth, limit),
        }
    }

    fn minmax(&mut self, id: NodeId, alpha: f64, beta: f64, depth: f64, limit: f64) -> EvalResult {
        if self.is_leaf(id, depth, limit) {
            let h = self.nodes.get(id).h;
            self.tt_record(id, h, alpha, beta);
            return Ok(h);
        }
        let children = self.generate_children(id);
        let maximizing = self.nodes.get(id).state.maximizing_turn();
        let mut value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        for child in children {
            let child_value = match self.tt_probe(child, alpha, beta) {
                Some(cached) => cached,
                None => {
                    let searched = self.evaluate(child, alpha, beta, depth + 0.5, limit)?;
                    self.tt_record(child, searched, alpha, beta);
                    searched
                }
            };
            let improved = if maximizing {
                child_value > value
            } else {
                child_value < value
            };
            if improved {
                value = child_value;
                self.update_pv(id, child);
            }
            if depth == 0.0 {
                self.record_root_score(child, child_value);
            }
        }
        Ok(value)
    }

    fn alpha_beta(
        &mut self,
        id: NodeId,
        mut alpha: f64,
        mut beta: f64,
        depth: f64,
        limit: f64,
    ) -> EvalResult {
        if self.is_leaf(id, depth, limit) {
            let h = self.nodes.get(id).h;
            self.tt_record(id, h, alpha, beta);
            return Ok(h);
        }
        let mut children = self.generate_children(id);
        self.reorder(id, &mut children);
        let maximizing = self.nodes.get(id).state.maximizing_turn();
        for child in children {
            let child_value = match self.tt_probe(child, alpha, beta) {
                Some(cached) => cached,
                None => {
                    let searched = self.evaluate(child, alpha, beta, depth + 0.5, limit)?;
                    self.tt_record(child, searched, alpha, beta);
                    searched
                }
            };
            // Root scores are only trustworthy when the value is exact for
            // the window that produced it.
            if depth == 0.0 && value_is_exact(child_value, alpha, beta) {
                self.record_root_score(child, child_value);
            }
            if maximizing {
                if child_value > alpha {
                    alpha = child_value;
                    self.update_pv(id, child);
                    self.remember(id, child);
                }
            } else if child_value < beta {
                beta = child_value;
                self.update_pv(id, child);
                self.remember(id, child);
            }
            if alpha >= beta {
                return Ok(if maximizing { alpha } else { beta });
            }
        }
        Ok(if maximizing { alpha } else { beta })
    }

    fn scout(
        &mut self,
        id: NodeId,
        mut alpha: f64,
        mut beta: f64,
        depth: f64,
        limit: f64,
    ) -> EvalResult {
        if self.is_leaf(id, depth, limit) {
            let h = self.nodes.get(id).h;
            self.tt_record(id, h, alpha, beta);
            return Ok(h);
        }
        let mut children = self.generate_children(id);
        self.reorder(id, &mut children);
        let maximizing = self.nodes.get(id).state.maximizing_turn();

        if maximizing {
            // Null window: (alpha, b) narrows to one value unit above alpha
            // after the first child.
            let mut b = beta;
            for (index, child) in children.into_iter().enumerate() {
                let mut research = false;
                let mut bound = alpha;
                let child_value = match self.tt_probe(child, alpha, b) {
                    Some(cached) => cached,
                    None => {
                        let mut value = self.evaluate(child, alpha, b, depth + 0.5, limit)?;
                        // Failed high against the null window: the true
                        // value may be larger, re-search with the full
                        // window unless no deepening is possible anyway.
                        if index > 0
                            && b <= value
                            && value < beta
                            && (self.config.quiescence || limit - depth > 0.5)
                        {
                            research = true;
                            bound = value;
                            value = self.evaluate(child, bound, beta, depth + 0.5, limit)?;
                        }
                        value
                    }
                };
                if research {
                    self.tt_record(child, child_value, bound, beta);
                } else {
                    self.tt_record(child, child_value, alpha, b);
                }
                if depth == 0.0 && value_is_exact(child_value, alpha, beta) {
                    self.record_root_score(child, child_value);
                }
                if child_value > alpha {
                    alpha = child_value;
                    self.update_pv(id, child);
                    self.remember(id, child);
                }
                if alpha >= beta {
                    return Ok(alpha);
                }
                // A one-unit offset is meaningless next to a win value.
                if alpha.abs() < WIN_LEVEL {
                    b = alpha + 1.0;
                }
            }
            Ok(alpha)
        } else {
            let mut a = alpha;
            for (index, child) in children.into_iter().enumerate() {
                let mut research = false;
                let mut bound = beta;
                let child_value = match self.tt_probe(child, a, beta) {
                    Some(cached) => cached,
                    None => {
                        let mut value = self.evaluate(child, a, beta, depth + 0.5, limit)?;
                        if index > 0
                            && value <= a
                            && alpha < value
                            && (self.config.quiescence || limit - depth > 0.5)
                        {
                            research = true;
                            bound = value;
                            value = self.evaluate(child, alpha, bound, depth + 0.5, limit)?;
                        }
                        value
                    }
                };
                if research {
                    self.tt_record(child, child_value, alpha, bound);
                } else {
                    self.tt_record(child, child_value, a, beta);
                }
                if depth == 0.0 && value_is_exact(child_value, alpha, beta) {
                    self.record_root_score(child, child_value);
                }
                if child_value < beta {
                    beta = child_value;
                    self.update_pv(id, child);
                    self.remember(id, child);
                }
                if alpha >= beta {
                    return Ok(beta);
                }
                if beta.abs() < WIN_LEVEL {
                    a = beta - 1.0;
                }
            }
            Ok(beta)
        }
    }

    /// Terminal test: won, over by rule, or at the depth horizon (which
    /// quiescence extends while the position is not quiet). Also tracks the
    /// deepest point the search reached.
    fn is_leaf(&mut self, id: NodeId, depth: f64, limit: f64) -> bool {
        self.depth_reached = self.depth_reached.max(depth);
        let node = self.nodes.get(id);
        if node.h.abs() >= WIN_LEVEL || node.state.is_terminal() {
            return true;
        }
        if depth >= limit {
            return !self.config.quiescence || node.state.is_quiet();
        }
        false
    }

    fn admit_root(&mut self, state: S) -> NodeId {
        let key = Key::of(&state, self.config.key_mode);
        let h = self.damped(self.eval(&state), 0.0);
        self.nodes.alloc(GameNode {
            state,
            key,
            parent: None,
            children: Vec::new(),
            depth: 0.0,
            label: None,
            h,
            visited: false,
            from_cache: false,
            pv: Vec::new(),
        })
    }

    fn generate_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let successors = self.nodes.get(id).state.expand();
        let depth = self.nodes.get(id).depth + 0.5;
        let mut children = Vec::with_capacity(successors.len());
        for Successor { state, label } in successors {
            let key = Key::of(&state, self.config.key_mode);
            let h = self.damped(self.eval(&state), depth);
            let child = self.nodes.alloc(GameNode {
                state,
                key,
                parent: Some(id),
                children: Vec::new(),
                depth,
                label,
                h,
                visited: false,
                from_cache: false,
                pv: Vec::new(),
            });
            if self.config.memorize_children {
                self.nodes.get_mut(id).children.push(child);
            }
            children.push(child);
        }
        children
    }

    fn eval(&self, state: &S) -> f64 {
        match self.evaluator {
            Some(evaluator) => evaluator(state),
            None => state.evaluate(),
        }
    }

    /// Rescales win-or-better evaluations by depth, so a win seen earlier
    /// in the game always outranks the same win seen later.
    fn damped(&self, h: f64, depth: f64) -> f64 {
        if h.abs() > WIN_LEVEL {
            h.signum() * WIN_LEVEL * (1.0 + 1.0 / depth)
        } else {
            h
        }
    }

    fn tt_probe(&mut self, id: NodeId, alpha: f64, beta: f64) -> Option<f64> {
        let table = self.table.as_mut()?;
        let node = self.nodes.get(id);
        let slot = TableSlot::new(node.key.clone(), node.depth);
        let value = table.probe(&slot, alpha, beta);
        if value.is_some() {
            self.nodes.get_mut(id).from_cache = true;
        }
        value
    }

    fn tt_record(&mut self, id: NodeId, value: f64, alpha: f64, beta: f64) {
        if let Some(table) = self.table.as_mut() {
            let node = self.nodes.get(id);
            table.record(TableSlot::new(node.key.clone(), node.depth), value, alpha, beta);
        }
    }

    fn reorder(&mut self, id: NodeId, children: &mut Vec<NodeId>) {
        if !self.config.refutation {
            return;
        }
        let (key, depth) = {
            let node = self.nodes.get(id);
            (node.key.clone(), node.depth)
        };
        self.refutation.promote(&key, depth, children, &self.nodes);
    }

    fn remember(&mut self, parent: NodeId, child: NodeId) {
        if !self.config.refutation {
            return;
        }
        let (parent_key, parent_depth) = {
            let node = self.nodes.get(parent);
            (node.key.clone(), node.depth)
        };
        let child_key = self.nodes.get(child).key.clone();
        self.refutation.record(&parent_key, parent_depth, &child_key);
    }

    fn update_pv(&mut self, parent: NodeId, child: NodeId) {
        let mut pv = vec![self.nodes.move_label(child)];
        pv.extend(self.nodes.get(child).pv.iter().cloned());
        self.nodes.get_mut(parent).pv = pv;
    }

    fn record_root_score(&mut self, child: NodeId, value: f64) {
        let label = self.nodes.move_label(child);
        self.scores.insert(label, value);
    }

    fn out_of_time(&self) -> bool {
        match self.config.time_limit {
            Some(limit) => self.started.elapsed() > limit,
            None => false,
        }
    }
}

/// Everything a finished game search produced.
pub struct GameReport<S> {
    nodes: GameNodes<S>,
    root: NodeId,
    maximizing: bool,
    value: Option<f64>,
    scores: BTreeMap<String, f64>,
    pv: Vec<String>,
    closed: u64,
    depth_reached: f64,
    transposition: Option<TranspositionTable>,
    refutation_len: usize,
    refutation_uses: usize,
    elapsed: Duration,
    cancelled: bool,
}

impl<S> GameReport<S> {
    /// The game value of the root, absent when the run was cancelled before
    /// finishing.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Scores discovered for the root moves, keyed by move name.
    pub fn scores(&self) -> &BTreeMap<String, f64> {
        &self.scores
    }

    /// The best scored move for the side to play at the root. With several
    /// tied-best moves the alphabetically first is returned; when every
    /// recorded score is a losing infinity, the first recorded move.
    pub fn best_move(&self) -> Option<&str> {
        let factor = if self.maximizing { 1.0 } else { -1.0 };
        let mut best: Option<&str> = None;
        let mut best_value = f64::NEG_INFINITY;
        for (name, &value) in &self.scores {
            if value * factor > best_value {
                best = Some(name.as_str());
                best_value = value * factor;
            }
        }
        if best.is_none() {
            best = self.scores.keys().next().map(String::as_str);
        }
        best
    }

    /// Every move tied for the best score.
    pub fn best_moves(&self) -> Vec<&str> {
        let factor = if self.maximizing { 1.0 } else { -1.0 };
        let mut best_value = f64::NEG_INFINITY;
        for &value in self.scores.values() {
            if value * factor >= best_value {
                best_value = value * factor;
            }
        }
        self.scores
            .iter()
            .filter(|(_, &value)| value * factor == best_value)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// The principal variation from the root, as move names.
    pub fn principal_variation(&self) -> &[String] {
        &self.pv
    }

    /// Number of positions evaluated (node entries) during the run.
    pub fn closed_count(&self) -> u64 {
        self.closed
    }

    /// The deepest depth reached, in full moves; exceeds the depth limit
    /// only through quiescence extensions.
    pub fn depth_reached(&self) -> f64 {
        self.depth_reached
    }

    /// Read-only view of the run's transposition table, when enabled.
    pub fn transposition(&self) -> Option<&TranspositionTable> {
        self.transposition.as_ref()
    }

    pub fn refutation_len(&self) -> usize {
        self.refutation_len
    }

    pub fn refutation_uses(&self) -> usize {
        self.refutation_uses
    }

    /// True when the run was cut short by the time limit or a forced stop;
    /// scores hold whatever was recorded before the cut.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn state(&self, id: NodeId) -> &S {
        &self.nodes.get(id).state
    }

    /// Children linked under a node; populated only with
    /// `memorize_children` on.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes.get(id).children
    }

    pub fn depth(&self, id: NodeId) -> f64 {
        self.nodes.get(id).depth
    }

    pub fn move_label(&self, id: NodeId) -> String {
        self.nodes.move_label(id)
    }

    /// Whether the node was entered by the search.
    pub fn visited(&self, id: NodeId) -> bool {
        self.nodes.get(id).visited
    }

    /// Whether the node was answered from the transposition table.
    pub fn answered_from_cache(&self, id: NodeId) -> bool {
        self.nodes.get(id).from_cache
    }
}
