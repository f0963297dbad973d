//! Search tree stored as an arena of nodes linked by parent index.

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What was played to reach a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Root,
    /// Controlled side has committed, opponent not yet applied.
    Player(usize),
    /// Both actions applied through the simulator.
    Joint { player: usize, opponent: usize },
}

impl NodeAction {
    pub fn player_action(self) -> Option<usize> {
        match self {
            NodeAction::Root => None,
            NodeAction::Player(a) => Some(a),
            NodeAction::Joint { player, .. } => Some(player),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub parent: Option<NodeId>,
    pub action: NodeAction,
    pub depth: u32,
    pub value: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::with_root_depth(0)
    }

    /// Tree for a subtree search rooted `depth` turns below the real root.
    pub fn with_root_depth(depth: u32) -> Self {
        SearchTree {
            nodes: vec![SearchNode {
                parent: None,
                action: NodeAction::Root,
                depth,
                value: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn push(&mut self, parent: NodeId, action: NodeAction, depth: u32) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SearchNode {
            parent: Some(parent),
            action,
            depth,
            value: None,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.index()]
    }

    pub fn set_value(&mut self, id: NodeId, value: f64) {
        self.nodes[id.index()].value = Some(value);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks parent links from `leaf` back to the root and returns the
    /// controlled action of the root's child on that path.
    pub fn first_action(&self, leaf: NodeId) -> Option<usize> {
        let mut current = leaf;
        loop {
            let node = self.get(current);
            match node.parent {
                None => return None,
                Some(parent) if parent == NodeId::ROOT => return node.action.player_action(),
                Some(parent) => current = parent,
            }
        }
    }
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}
