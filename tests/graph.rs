//! End-to-end graph searches on small weighted digraphs, cross-checked by
//! brute-force path enumeration.

use std::fmt;

use statespace::{
    ClosedKind, GraphConfig, GraphSearch, GraphState, GraphStrategy, OpenKind, Successor,
    Termination,
};

/// Weighted digraph fixture: minimum-cost route from node 0 to node 7.
static EDGES: &[(u8, u8, f64)] = &[
    (0, 1, 3.0),
    (0, 2, 1.0),
    (0, 5, 2.5),
    (1, 3, 2.0),
    (1, 4, 1.5),
    (2, 1, 1.0),
    (2, 4, 3.0),
    (3, 7, 1.0),
    (4, 7, 2.0),
    (5, 6, 4.0),
    (6, 7, 0.5),
];

const GOAL: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Junction(u8);

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl GraphState for Junction {
    fn expand(&self) -> Vec<Successor<Self>> {
        EDGES
            .iter()
            .filter(|&&(from, _, _)| from == self.0)
            .map(|&(from, to, _)| {
                Successor::labeled(Junction(to), format!("{}->{}", from, to))
            })
            .collect()
    }

    fn is_goal(&self) -> bool {
        self.0 == GOAL
    }

    fn edge_cost(&self, from: &Self) -> f64 {
        EDGES
            .iter()
            .find(|&&(f, t, _)| f == from.0 && t == self.0)
            .map(|&(_, _, weight)| weight)
            .expect("edge exists")
    }
}

/// Every simple path from `from` to the goal, with its cost.
fn enumerate_paths(from: u8, trail: &mut Vec<u8>, cost: f64, found: &mut Vec<(Vec<u8>, f64)>) {
    if from == GOAL {
        found.push((trail.clone(), cost));
        return;
    }
    for &(f, t, weight) in EDGES {
        if f == from && !trail.contains(&t) {
            trail.push(t);
            enumerate_paths(t, trail, cost + weight, found);
            trail.pop();
        }
    }
}

fn brute_force() -> (Vec<(Vec<u8>, f64)>, f64) {
    let mut found = Vec::new();
    enumerate_paths(0, &mut vec![0], 0.0, &mut found);
    let minimum = found
        .iter()
        .map(|&(_, cost)| cost)
        .fold(f64::INFINITY, f64::min);
    (found, minimum)
}

fn path_ids(report: &statespace::GraphReport<Junction>, id: statespace::NodeId) -> Vec<u8> {
    report.path(id).iter().map(|j| j.0).collect()
}

#[test]
fn dijkstra_matches_brute_force_on_every_backend() {
    let (all_paths, minimum) = brute_force();
    assert!(minimum.is_finite());

    for open in [OpenKind::IndexedHeap, OpenKind::SortedTree] {
        for closed in [ClosedKind::Hashed, ClosedKind::Sorted] {
            let config = GraphConfig {
                open,
                closed,
                ..GraphConfig::default()
            };
            let report = GraphSearch::with_config(GraphStrategy::Dijkstra, config)
                .solve(Junction(0))
                .unwrap();
            let solution = report.first_solution().unwrap();
            assert_eq!(report.cost(solution), minimum);

            let ids = path_ids(&report, solution);
            let optimal: Vec<&Vec<u8>> = all_paths
                .iter()
                .filter(|&&(_, cost)| cost == minimum)
                .map(|(path, _)| path)
                .collect();
            assert!(optimal.contains(&&ids), "returned path {:?} is not optimal", ids);
        }
    }
}

#[test]
fn astar_with_admissible_heuristic_stays_optimal() {
    let (_, minimum) = brute_force();
    // Every remaining route costs at least half a unit per hop; zero is the
    // trivially admissible floor and already exercises f = g + h.
    let report = GraphSearch::new(GraphStrategy::AStar)
        .solve(Junction(0))
        .unwrap();
    let solution = report.first_solution().unwrap();
    assert_eq!(report.cost(solution), minimum);
}

#[test]
fn ida_star_reaches_the_same_minimum() {
    let (_, minimum) = brute_force();
    let report = GraphSearch::new(GraphStrategy::IdaStar)
        .solve(Junction(0))
        .unwrap();
    let solution = report.first_solution().unwrap();
    assert_eq!(report.cost(solution), minimum);
    // Bounded memory: IDA* never closes states.
    assert_eq!(report.closed().len(), 0);
}

#[test]
fn moves_name_the_traversed_edges() {
    let report = GraphSearch::new(GraphStrategy::Dijkstra)
        .solve(Junction(0))
        .unwrap();
    let solution = report.first_solution().unwrap();
    let moves = report.moves(solution);
    let ids = path_ids(&report, solution);
    assert_eq!(moves.len(), ids.len() - 1);
    for (index, window) in ids.windows(2).enumerate() {
        assert_eq!(moves[index], format!("{}->{}", window[0], window[1]));
    }
}

#[test]
fn quota_without_closed_set_collects_alternative_routes() {
    let config = GraphConfig {
        closed: ClosedKind::Off,
        solution_quota: 2,
        ..GraphConfig::default()
    };
    let report = GraphSearch::with_config(GraphStrategy::Dijkstra, config).run(Junction(0));
    assert_eq!(report.solutions().len(), 2);
    assert_eq!(report.termination(), Termination::SolutionQuota);
    // Discovery order is cost order for Dijkstra.
    let first = report.cost(report.solutions()[0]);
    let second = report.cost(report.solutions()[1]);
    assert!(first <= second);
}

/// Diamond where the goal is first reached through an expensive route and
/// must be re-parented when the cheap route arrives.
static DIAMOND: &[(u8, u8, f64)] = &[(0, 1, 1.0), (0, 2, 2.0), (1, 3, 5.0), (2, 3, 1.0)];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Diamond(u8);

impl fmt::Display for Diamond {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

impl GraphState for Diamond {
    fn expand(&self) -> Vec<Successor<Self>> {
        DIAMOND
            .iter()
            .filter(|&&(from, _, _)| from == self.0)
            .map(|&(_, to, _)| Successor::new(Diamond(to)))
            .collect()
    }

    fn is_goal(&self) -> bool {
        self.0 == 3
    }

    fn edge_cost(&self, from: &Self) -> f64 {
        DIAMOND
            .iter()
            .find(|&&(f, t, _)| f == from.0 && t == self.0)
            .map(|&(_, _, weight)| weight)
            .expect("edge exists")
    }
}

#[test]
fn better_route_replaces_the_open_entry_and_reparents() {
    // Pop order: d0, d1 (g=1, queues goal at g=6), d2 (g=2, improves the
    // goal to g=3 and replaces it), goal.
    let report = GraphSearch::new(GraphStrategy::Dijkstra)
        .solve(Diamond(0))
        .unwrap();
    let solution = report.first_solution().unwrap();
    assert_eq!(report.cost(solution), 3.0);
    let ids: Vec<u8> = report.path(solution).iter().map(|d| d.0).collect();
    assert_eq!(ids, vec![0, 2, 3]);
}

#[test]
fn memorized_children_mirror_the_surviving_tree() {
    let config = GraphConfig {
        memorize_children: true,
        ..GraphConfig::default()
    };
    let report = GraphSearch::with_config(GraphStrategy::Dijkstra, config)
        .solve(Diamond(0))
        .unwrap();
    let solution = report.first_solution().unwrap();

    let handles = report.path_handles(solution);
    assert_eq!(handles.len(), 3);
    let root = handles[0];
    let via = handles[1];
    assert_eq!(report.state(via).0, 2);

    // The root memorized both branches; the goal hangs under d2 and was
    // detached from d1 when the cheaper route replaced it.
    assert_eq!(report.children(root).len(), 2);
    assert!(report.children(via).contains(&solution));
    for &branch in report.children(root) {
        if branch != via {
            assert!(!report.children(branch).contains(&solution));
        }
    }
}
