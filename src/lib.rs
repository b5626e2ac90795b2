//! Generalized state-space search.
//!
//! Two families share one identity model ([Key]/[KeyMode]) and one state
//! capability floor ([State]):
//!
//! - **Graph searches** ([graph]): Best-First, Dijkstra, A* and IDA* over
//!   states implementing [GraphState], driven by an open/closed-set loop.
//! - **Game-tree searches** ([game]): MinMax, Alpha-Beta and Scout over
//!   states implementing [GameState], with transposition and refutation
//!   caches, quiescence, and cooperative cancellation.
//!
//! A search engine is configured once, then run against a root state; each
//! run rebuilds its containers, so engines are freely reusable. Runs return
//! report objects carrying the results and diagnostic counters.

mod arena;
mod errors;
pub mod game;
pub mod graph;
mod key;
mod state;

pub use arena::NodeId;
pub use errors::Result as SearchResult;
pub use errors::SearchError;
pub use key::{Key, KeyMode};
pub use state::{State, Successor};

pub use game::{GameAlgorithm, GameConfig, GameReport, GameSearch, GameState, TableKind, WIN_LEVEL};
pub use graph::{
    ClosedKind, GraphConfig, GraphReport, GraphSearch, GraphState, GraphStrategy, OpenKind,
    Termination,
};
