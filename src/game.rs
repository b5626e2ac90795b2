//! Two-player zero-sum game-tree searches.
//!
//! Implement [GameState] for a game, pick a [GameAlgorithm], and run a
//! [GameSearch]. The search scores the moves available at the root and
//! returns a [GameReport] with the score map, the best move(s) for the side
//! to play, the principal variation, and diagnostic counters.

pub(crate) mod node;
mod refutation;
mod search;
mod state;
mod transposition;

pub use refutation::RefutationTable;
pub use search::{GameAlgorithm, GameConfig, GameReport, GameSearch};
pub use state::{GameState, WIN_LEVEL};
pub use transposition::{Bound, TableKind, TranspositionTable};
