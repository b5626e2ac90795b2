use crate::arena::{Arena, NodeId};
use crate::key::Key;

/// Per-run bookkeeping for one position in the game tree.
///
/// The `visited` and `from_cache` flags are diagnostic: copies of the same
/// position in different places of the tree may differ in them (one copy
/// searched, another answered from the transposition table).
#[derive(Debug)]
pub(crate) struct GameNode<S> {
    pub state: S,
    pub key: Key,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub depth: f64,
    pub label: Option<String>,
    /// Evaluation, damped toward [WIN_LEVEL](super::WIN_LEVEL) by depth.
    pub h: f64,
    pub visited: bool,
    pub from_cache: bool,
    /// Best continuation found from this node, as move names.
    pub pv: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct GameNodes<S> {
    arena: Arena<GameNode<S>>,
}

impl<S> GameNodes<S> {
    pub fn new() -> Self {
        GameNodes {
            arena: Arena::new(),
        }
    }

    pub fn alloc(&mut self, node: GameNode<S>) -> NodeId {
        self.arena.alloc(node)
    }

    pub fn get(&self, id: NodeId) -> &GameNode<S> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut GameNode<S> {
        self.arena.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// The name of the move that produced this node, falling back to the
    /// node's key text.
    pub fn move_label(&self, id: NodeId) -> String {
        let node = self.get(id);
        node.label.clone().unwrap_or_else(|| node.key.text())
    }
}
