use crate::arena::{Arena, NodeId};
use crate::key::Key;

/// Per-run bookkeeping for one reached state.
///
/// Costs are computed when the node is linked into the tree and are fixed
/// thereafter; reaching the same state by a better route creates a fresh
/// node that replaces this one in the open set.
#[derive(Debug)]
pub(crate) struct GraphNode<S> {
    pub state: S,
    pub key: Key,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub depth: f64,
    pub label: Option<String>,
    pub g: f64,
    pub h: f64,
    pub f: f64,
}

#[derive(Debug)]
pub(crate) struct GraphNodes<S> {
    arena: Arena<GraphNode<S>>,
}

impl<S> GraphNodes<S> {
    pub fn new() -> Self {
        GraphNodes {
            arena: Arena::new(),
        }
    }

    pub fn alloc(&mut self, node: GraphNode<S>) -> NodeId {
        self.arena.alloc(node)
    }

    pub fn get(&self, id: NodeId) -> &GraphNode<S> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut GraphNode<S> {
        self.arena.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Drops the parent→child edge kept for a node that lost its place in
    /// the open set to a better copy.
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.arena.get_mut(parent).children;
        if let Some(position) = children.iter().position(|&c| c == child) {
            children.remove(position);
        }
    }

    /// The chain of nodes from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Move names along the path to `id`, skipping the root.
    pub fn moves(&self, id: NodeId) -> Vec<String> {
        self.path(id)
            .into_iter()
            .filter(|&n| self.get(n).parent.is_some())
            .map(|n| self.move_label(n))
            .collect()
    }

    /// The name of the move that produced this node, falling back to the
    /// node's key text.
    pub fn move_label(&self, id: NodeId) -> String {
        let node = self.get(id);
        node.label.clone().unwrap_or_else(|| node.key.text())
    }
}
