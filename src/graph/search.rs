use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::arena::NodeId;
use crate::errors::{Result, SearchError};
use crate::key::{Key, KeyMode};
use crate::state::Successor;

use super::closed::{ClosedKind, ClosedSet};
use super::node::{GraphNode, GraphNodes};
use super::open::{OpenKind, OpenSet, Priority};
use super::state::GraphState;

/// Which graph search algorithm to run.
///
/// All four share the same poll/close/expand loop; the strategy decides the
/// frontier order (h, g, or f = g + h) and, for IDA*, switches the loop to
/// iterative deepening without a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphStrategy {
    BestFirst,
    Dijkstra,
    AStar,
    IdaStar,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The frontier drained with no bound escalation pending.
    OpenExhausted,
    /// The configured number of solutions was collected.
    SolutionQuota,
    /// The time limit expired; results are whatever was found so far.
    TimeLimit,
    /// IDA* escalated its cost bound more times than allowed.
    RoundLimit,
}

/// Options for a graph search, fixed at engine construction.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub key_mode: KeyMode,
    pub open: OpenKind,
    pub closed: ClosedKind,
    /// Keep parent→child links for every expansion (costs memory, enables
    /// walking the search tree downward afterwards).
    pub memorize_children: bool,
    /// Stop after this many solutions. Finding a solution does not stop
    /// sibling expansion unless the quota is hit.
    pub solution_quota: usize,
    pub time_limit: Option<Duration>,
    /// How many times IDA* may escalate its cost bound before the run is
    /// declared exhausted. Bounds the otherwise endless escalation on
    /// unsolvable spaces whose f values grow without limit.
    pub ida_round_limit: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            key_mode: KeyMode::default(),
            open: OpenKind::default(),
            closed: ClosedKind::default(),
            memorize_children: false,
            solution_quota: 1,
            time_limit: None,
            ida_round_limit: 1000,
        }
    }
}

/// A configured graph search engine.
///
/// The engine itself is cheap and reusable: each [run](GraphSearch::run)
/// builds fresh containers and a fresh node arena, so re-running with a
/// different root is always safe.
pub struct GraphSearch<S: GraphState> {
    strategy: GraphStrategy,
    config: GraphConfig,
    heuristic: Option<Box<dyn Fn(&S) -> f64>>,
    edge_cost: Option<Box<dyn Fn(&S, &S) -> f64>>,
}

impl<S: GraphState> GraphSearch<S> {
    pub fn new(strategy: GraphStrategy) -> Self {
        Self::with_config(strategy, GraphConfig::default())
    }

    pub fn with_config(strategy: GraphStrategy, config: GraphConfig) -> Self {
        GraphSearch {
            strategy,
            config,
            heuristic: None,
            edge_cost: None,
        }
    }

    /// Overrides the heuristic of the state type for this engine.
    pub fn with_heuristic(mut self, h: impl Fn(&S) -> f64 + 'static) -> Self {
        self.heuristic = Some(Box::new(h));
        self
    }

    /// Overrides the edge-cost function of the state type for this engine.
    /// The arguments are (state, parent state).
    pub fn with_edge_cost(mut self, cost: impl Fn(&S, &S) -> f64 + 'static) -> Self {
        self.edge_cost = Some(Box::new(cost));
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn strategy(&self) -> GraphStrategy {
        self.strategy
    }

    /// Runs the search from `root` until the frontier drains, the solution
    /// quota is met, or the time limit expires.
    pub fn run(&self, root: S) -> GraphReport<S> {
        let started = Instant::now();
        let mut run = Run {
            search: self,
            nodes: GraphNodes::new(),
            open: OpenSet::new(self.config.open),
            closed: ClosedSet::new(match self.strategy {
                // IDA* is bounded-memory by design and never closes states.
                GraphStrategy::IdaStar => ClosedKind::Off,
                _ => self.config.closed,
            }),
            solutions: Vec::new(),
            best: None,
            steps: 0,
            started,
        };
        let termination = match self.strategy {
            GraphStrategy::IdaStar => run.run_deepening(root),
            _ => run.run_best_first(root),
        };
        let elapsed = started.elapsed();
        debug!(
            "{:?} finished ({:?}): {} closed, {} solutions, {} still open, {} nodes, {:?}",
            self.strategy,
            termination,
            run.steps,
            run.solutions.len(),
            run.open.len(),
            run.nodes.len(),
            elapsed
        );
        GraphReport {
            nodes: run.nodes,
            solutions: run.solutions,
            best: run.best,
            open: run.open,
            closed: run.closed,
            steps: run.steps,
            elapsed,
            termination,
        }
    }

    /// Runs the search and fails if no solution was found.
    pub fn solve(&self, root: S) -> Result<GraphReport<S>> {
        let report = self.run(root);
        if report.solutions().is_empty() {
            Err(SearchError::NoSolutionFound)
        } else {
            Ok(report)
        }
    }

    fn h(&self, state: &S) -> f64 {
        match &self.heuristic {
            Some(h) => h(state),
            None => state.heuristic(),
        }
    }

    fn edge(&self, state: &S, from: &S) -> f64 {
        match &self.edge_cost {
            Some(cost) => cost(state, from),
            None => state.edge_cost(from),
        }
    }

    fn priority(&self, g: f64, h: f64, f: f64, depth: f64, key: Key) -> Priority {
        match self.strategy {
            GraphStrategy::BestFirst => Priority::new(h, 0.0, key),
            GraphStrategy::Dijkstra => Priority::new(g, 0.0, key),
            GraphStrategy::AStar => Priority::new(f, 0.0, key),
            // Deepest first; among equal depths, the larger f goes first.
            GraphStrategy::IdaStar => Priority::new(-depth, -f, key),
        }
    }
}

struct Run<'a, S: GraphState> {
    search: &'a GraphSearch<S>,
    nodes: GraphNodes<S>,
    open: OpenSet,
    closed: ClosedSet,
    solutions: Vec<NodeId>,
    best: Option<NodeId>,
    steps: u64,
    started: Instant,
}

impl<'a, S: GraphState> Run<'a, S> {
    fn run_best_first(&mut self, root: S) -> Termination {
        let root_id = self.admit_root(root);
        let root_h = self.nodes.get(root_id).h;
        self.seed(root_id);

        loop {
            if self.open.is_empty() {
                return Termination::OpenExhausted;
            }
            self.steps += 1;
            if self.out_of_time() {
                return Termination::TimeLimit;
            }

            let current = self.open.pop().expect("frontier is non-empty");

            // Close before the goal test so that a child equal to its own
            // parent is discarded on merge.
            let key = self.nodes.get(current).key.clone();
            self.closed.put(key, current);

            // Track the closest approach, meaningful only for an informed
            // root.
            if root_h > 0.0 {
                self.keep_best(current);
            }

            if let Some(termination) = self.register_if_solution(current) {
                return termination;
            }

            self.merge_children(current);
            self.progress();
        }
    }

    fn run_deepening(&mut self, root: S) -> Termination {
        let root_id = self.admit_root(root);
        self.seed(root_id);

        let mut cost_limit = self.nodes.get(root_id).h;
        let mut next_limit = f64::INFINITY;
        let mut rounds: u32 = 0;

        loop {
            if self.open.is_empty() {
                return Termination::OpenExhausted;
            }
            self.steps += 1;
            if self.out_of_time() {
                return Termination::TimeLimit;
            }

            let current = self.open.pop().expect("frontier is non-empty");

            let f = self.nodes.get(current).f;
            if f > cost_limit {
                // Over the bound: remember the lowest overshoot, and when
                // the frontier drains, escalate and start over from the
                // root.
                if f < next_limit {
                    next_limit = f;
                }
                if self.open.is_empty() {
                    rounds += 1;
                    if rounds >= self.search.config.ida_round_limit {
                        return Termination::RoundLimit;
                    }
                    trace!("deepening round {}: bound {} -> {}", rounds, cost_limit, next_limit);
                    cost_limit = next_limit;
                    next_limit = f64::INFINITY;
                    self.seed(root_id);
                }
                continue;
            }

            self.keep_best(current);

            if let Some(termination) = self.register_if_solution(current) {
                return termination;
            }

            // Children may be regenerated every round; relink from scratch.
            self.nodes.get_mut(current).children.clear();
            self.merge_children_deepening(current);
            self.progress();
        }
    }

    fn admit_root(&mut self, state: S) -> NodeId {
        let key = Key::of(&state, self.search.config.key_mode);
        let g = 0.0;
        let h = self.search.h(&state);
        self.nodes.alloc(GraphNode {
            state,
            key,
            parent: None,
            children: Vec::new(),
            depth: 0.0,
            label: None,
            g,
            h,
            f: g + h,
        })
    }

    fn seed(&mut self, id: NodeId) {
        let node = self.nodes.get(id);
        let priority = self
            .search
            .priority(node.g, node.h, node.f, node.depth, node.key.clone());
        self.open.push(priority, id);
    }

    fn keep_best(&mut self, current: NodeId) {
        let h = self.nodes.get(current).h;
        let better = match self.best {
            None => true,
            Some(best) => h < self.nodes.get(best).h,
        };
        if better {
            self.best = Some(current);
        }
    }

    fn register_if_solution(&mut self, current: NodeId) -> Option<Termination> {
        if !self.nodes.get(current).state.is_goal() {
            return None;
        }
        if self.solutions.is_empty() {
            self.best = Some(current);
        }
        self.solutions.push(current);
        if self.solutions.len() >= self.search.config.solution_quota {
            return Some(Termination::SolutionQuota);
        }
        None
    }

    fn merge_children(&mut self, current: NodeId) {
        let successors = self.nodes.get(current).state.expand();
        for Successor { state, label } in successors {
            let key = Key::of(&state, self.search.config.key_mode);
            if self.closed.contains(&key) {
                continue;
            }
            let (g, h, f, depth) = self.child_costs(current, &state);

            if !self.open.contains(&key) {
                let child = self.link_child(current, state, key.clone(), label, g, h, f, depth);
                self.open
                    .push(self.search.priority(g, h, f, depth, key), child);
            } else {
                // Replace only a strictly better copy, re-parenting it away
                // from whoever reached it first.
                let priority = self.search.priority(g, h, f, depth, key.clone());
                let existing = self.open.get(&key).expect("open set contains the key");
                if priority < *self.open.priority(&key).expect("open set contains the key") {
                    let former_parent = self.nodes.get(existing).parent;
                    let child = self.link_child(current, state, key.clone(), label, g, h, f, depth);
                    self.open.replace(&key, priority, child);
                    if let Some(former) = former_parent {
                        self.nodes.detach_child(former, existing);
                    }
                }
            }
        }
    }

    fn merge_children_deepening(&mut self, current: NodeId) {
        let successors = self.nodes.get(current).state.expand();
        for Successor { state, label } in successors {
            let key = Key::of(&state, self.search.config.key_mode);
            let (g, h, f, depth) = self.child_costs(current, &state);

            if !self.open.contains(&key) {
                let child = self.link_child(current, state, key.clone(), label, g, h, f, depth);
                self.open
                    .push(self.search.priority(g, h, f, depth, key), child);
            } else {
                let existing = self.open.get(&key).expect("open set contains the key");
                // The frontier is depth-ordered here, so improvement is
                // judged on raw f rather than the frontier order.
                if f < self.nodes.get(existing).f {
                    let priority = self.search.priority(g, h, f, depth, key.clone());
                    let child = self.link_child(current, state, key.clone(), label, g, h, f, depth);
                    self.open.replace(&key, priority, child);
                } else if self.search.config.memorize_children {
                    self.nodes.get_mut(current).children.push(existing);
                }
            }
        }
    }

    fn child_costs(&self, parent: NodeId, state: &S) -> (f64, f64, f64, f64) {
        let parent_node = self.nodes.get(parent);
        let g = parent_node.g + self.search.edge(state, &parent_node.state);
        let h = self.search.h(state);
        (g, h, g + h, parent_node.depth + 1.0)
    }

    #[allow(clippy::too_many_arguments)]
    fn link_child(
        &mut self,
        parent: NodeId,
        state: S,
        key: Key,
        label: Option<String>,
        g: f64,
        h: f64,
        f: f64,
        depth: f64,
    ) -> NodeId {
        let child = self.nodes.alloc(GraphNode {
            state,
            key,
            parent: Some(parent),
            children: Vec::new(),
            depth,
            label,
            g,
            h,
            f,
        });
        if self.search.config.memorize_children {
            self.nodes.get_mut(parent).children.push(child);
        }
        child
    }

    fn out_of_time(&self) -> bool {
        match self.search.config.time_limit {
            Some(limit) => self.started.elapsed() > limit,
            None => false,
        }
    }

    fn progress(&self) {
        if self.steps % 10_000 == 0 {
            trace!(
                "step {}: open {}, closed {}, solutions {}",
                self.steps,
                self.open.len(),
                self.closed.len(),
                self.solutions.len()
            );
        }
    }
}

/// Everything a finished graph search produced.
///
/// The report owns the run's node arena; solution handles returned from it
/// are resolved against the report itself.
pub struct GraphReport<S> {
    nodes: GraphNodes<S>,
    solutions: Vec<NodeId>,
    best: Option<NodeId>,
    open: OpenSet,
    closed: ClosedSet,
    steps: u64,
    elapsed: Duration,
    termination: Termination,
}

impl<S> GraphReport<S> {
    /// Solutions in the order they were discovered.
    pub fn solutions(&self) -> &[NodeId] {
        &self.solutions
    }

    pub fn first_solution(&self) -> Option<NodeId> {
        self.solutions.first().copied()
    }

    /// The state with the lowest heuristic seen, or the first solution once
    /// one was found.
    pub fn best_so_far(&self) -> Option<NodeId> {
        self.best
    }

    pub fn state(&self, id: NodeId) -> &S {
        &self.nodes.get(id).state
    }

    /// Exact cost from the root (the g value).
    pub fn cost(&self, id: NodeId) -> f64 {
        self.nodes.get(id).g
    }

    pub fn depth(&self, id: NodeId) -> f64 {
        self.nodes.get(id).depth
    }

    /// Children linked under a node; populated only with
    /// `memorize_children` on.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes.get(id).children
    }

    /// States along the path from the root to `id`.
    pub fn path(&self, id: NodeId) -> Vec<&S> {
        self.nodes
            .path(id)
            .into_iter()
            .map(|n| &self.nodes.get(n).state)
            .collect()
    }

    /// Node handles along the path from the root to `id`.
    pub fn path_handles(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes.path(id)
    }

    /// Move names along the path from the root to `id`.
    pub fn moves(&self, id: NodeId) -> Vec<String> {
        self.nodes.moves(id)
    }

    /// Read-only view of the frontier as the run left it.
    pub fn open(&self) -> &OpenSet {
        &self.open
    }

    /// Read-only view of the visited set as the run left it.
    pub fn closed(&self) -> &ClosedSet {
        &self.closed
    }

    /// Number of states closed (polled from the frontier) during the run.
    pub fn closed_count(&self) -> u64 {
        self.steps
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }
}

#[cfg(test)]
mod test {
    use std::fmt;

    use super::*;

    /// Counter domain: each state n steps to n+1 and n+2, goal is an exact
    /// target value.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Count {
        value: u32,
        target: u32,
    }

    impl fmt::Display for Count {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.value)
        }
    }

    impl GraphState for Count {
        fn expand(&self) -> Vec<Successor<Self>> {
            [1u32, 2]
                .iter()
                .filter(|&&step| self.value + step <= self.target)
                .map(|&step| {
                    Successor::labeled(
                        Count {
                            value: self.value + step,
                            target: self.target,
                        },
                        format!("+{}", step),
                    )
                })
                .collect()
        }

        fn is_goal(&self) -> bool {
            self.value == self.target
        }

        fn heuristic(&self) -> f64 {
            // Admissible: at most two units per move.
            f64::from(self.target.saturating_sub(self.value)) / 2.0
        }
    }

    fn count(target: u32) -> Count {
        Count { value: 0, target }
    }

    #[test]
    fn dijkstra_minimizes_moves() {
        let report = GraphSearch::new(GraphStrategy::Dijkstra)
            .solve(count(7))
            .unwrap();
        let solution = report.first_solution().unwrap();
        // 7 = 2+2+2+1 in four unit-cost moves.
        assert_eq!(report.cost(solution), 4.0);
        assert_eq!(report.moves(solution).len(), 4);
        assert_eq!(report.termination(), Termination::SolutionQuota);
    }

    #[test]
    fn astar_agrees_with_dijkstra() {
        let dijkstra = GraphSearch::new(GraphStrategy::Dijkstra)
            .solve(count(12))
            .unwrap();
        let astar = GraphSearch::new(GraphStrategy::AStar).solve(count(12)).unwrap();
        assert_eq!(
            dijkstra.cost(dijkstra.first_solution().unwrap()),
            astar.cost(astar.first_solution().unwrap())
        );
    }

    #[test]
    fn quota_collects_further_solutions() {
        let config = GraphConfig {
            solution_quota: 1,
            ..GraphConfig::default()
        };
        let first = GraphSearch::with_config(GraphStrategy::Dijkstra, config)
            .run(count(5));
        assert_eq!(first.solutions().len(), 1);

        let all = GraphSearch::with_config(
            GraphStrategy::Dijkstra,
            GraphConfig {
                solution_quota: usize::MAX,
                ..GraphConfig::default()
            },
        )
        .run(count(5));
        // The goal state is unique, so draining the space still finds one.
        assert_eq!(all.solutions().len(), 1);
        assert_eq!(all.termination(), Termination::OpenExhausted);
    }

    #[test]
    fn zero_time_limit_reports_partial_run() {
        let config = GraphConfig {
            time_limit: Some(Duration::from_secs(0)),
            ..GraphConfig::default()
        };
        let report = GraphSearch::with_config(GraphStrategy::Dijkstra, config).run(count(1000));
        assert_eq!(report.termination(), Termination::TimeLimit);
        assert!(report.solutions().is_empty());
    }

    #[test]
    fn best_first_is_greedy_but_finds_the_goal() {
        let report = GraphSearch::new(GraphStrategy::BestFirst)
            .solve(count(9))
            .unwrap();
        assert!(report.first_solution().is_some());
    }

    #[test]
    fn heuristic_override_beats_type_default() {
        let engine = GraphSearch::<Count>::new(GraphStrategy::BestFirst).with_heuristic(|_| 0.0);
        let report = engine.run(count(3));
        let solution = report.first_solution().unwrap();
        assert!(report.state(solution).is_goal());
    }

    #[test]
    fn ida_star_finds_an_optimal_path() {
        let report = GraphSearch::new(GraphStrategy::IdaStar).solve(count(7)).unwrap();
        let solution = report.first_solution().unwrap();
        assert_eq!(report.cost(solution), 4.0);
        assert!(report.closed().is_empty());
    }

    /// Two-state cycle with no goal: f grows forever, so only the round
    /// limit stops the escalation.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Spin(u8);

    impl fmt::Display for Spin {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "spin-{}", self.0)
        }
    }

    impl GraphState for Spin {
        fn expand(&self) -> Vec<Successor<Self>> {
            vec![Successor::new(Spin(1 - self.0))]
        }

        fn is_goal(&self) -> bool {
            false
        }
    }

    #[test]
    fn ida_star_round_limit_stops_unsolvable_escalation() {
        let config = GraphConfig {
            ida_round_limit: 5,
            ..GraphConfig::default()
        };
        let report = GraphSearch::with_config(GraphStrategy::IdaStar, config).run(Spin(0));
        assert_eq!(report.termination(), Termination::RoundLimit);
        assert!(report.solutions().is_empty());
    }
}
