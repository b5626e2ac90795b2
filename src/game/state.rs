use crate::state::{State, Successor};

/// Heuristic magnitude treated as a win.
///
/// Any evaluation at or above this level (in absolute value) marks a won
/// position; the engines rescale such values by depth so that shallower wins
/// always compare as more extreme than deeper ones while staying finite.
pub const WIN_LEVEL: f64 = f64::MAX / 2.0;

/// A position in a two-player zero-sum game.
///
/// Evaluations are absolute, not side-relative: positive favors the
/// maximizing player, negative the minimizing player, regardless of whose
/// turn it is.
pub trait GameState: State {
    /// Generates the positions reachable in one ply, labeled with their
    /// move names.
    fn expand(&self) -> Vec<Successor<Self>>;

    /// True when the maximizing player is to move.
    fn maximizing_turn(&self) -> bool;

    /// Position evaluation (the h function). Return a magnitude of
    /// [WIN_LEVEL] or more to mark a won position.
    fn evaluate(&self) -> f64 {
        0.0
    }

    /// True when the position is quiet enough to be evaluated at the depth
    /// limit. Non-quiet positions are searched past the limit when
    /// quiescence is enabled.
    fn is_quiet(&self) -> bool {
        true
    }

    /// True when the position is over by rule without either side winning
    /// (stalemate-like terminals).
    fn is_terminal(&self) -> bool {
        false
    }
}
