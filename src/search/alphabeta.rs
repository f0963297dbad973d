//! Sequential approximation: the controlled side picks first, the opponent
//! answers with full knowledge of that pick, then the turn is resolved.

use super::tree::{NodeAction, NodeId, SearchTree};
use super::{effective_horizon, is_terminal, with_completed_opponent, SearchOutcome, SearchStrategy};
use crate::env::BattleEnv;
use crate::error::SearchError;
use crate::estimate::MoveEstimator;
use crate::eval::StateEvaluator;
use crate::model::{BattleState, Side};
use tracing::trace;

pub struct AlphaBetaSearch<'a, E: ?Sized, V: ?Sized> {
    env: &'a E,
    evaluator: &'a V,
    estimator: Option<&'a MoveEstimator>,
    max_depth: u32,
    prune: bool,
}

struct Walk {
    tree: SearchTree,
    pruned: usize,
}

impl<'a, E, V> AlphaBetaSearch<'a, E, V>
where
    E: BattleEnv + ?Sized,
    V: StateEvaluator + ?Sized,
{
    pub fn new(env: &'a E, evaluator: &'a V, max_depth: u32) -> Self {
        AlphaBetaSearch {
            env,
            evaluator,
            estimator: None,
            max_depth,
            prune: true,
        }
    }

    /// Complete the opponent's unknown moves before every opponent layer.
    pub fn with_estimator(mut self, estimator: &'a MoveEstimator) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Plain minimax over the same tree and move ordering.
    pub fn without_pruning(mut self) -> Self {
        self.prune = false;
        self
    }

    pub fn horizon(&self) -> u32 {
        effective_horizon(self.max_depth)
    }

    /// Searches `state` as a subtree rooted `depth` turns below the real root.
    pub fn search_from(&self, state: &BattleState, depth: u32) -> SearchOutcome {
        let mut walk = Walk {
            tree: SearchTree::with_root_depth(depth),
            pruned: 0,
        };
        let (value, leaf) = self.max_value(
            &mut walk,
            state,
            NodeId::ROOT,
            f64::NEG_INFINITY,
            f64::INFINITY,
        );
        SearchOutcome {
            action: walk.tree.first_action(leaf).unwrap_or(0),
            value,
            nodes: count_states(&walk.tree),
            pruned: walk.pruned,
        }
    }

    fn max_value(
        &self,
        walk: &mut Walk,
        state: &BattleState,
        node: NodeId,
        mut alpha: f64,
        beta: f64,
    ) -> (f64, NodeId) {
        let depth = walk.tree.get(node).depth;
        let n = if is_terminal(state, depth, self.horizon()) {
            0
        } else {
            self.env.legal_action_count(state, Side::Player)
        };
        if n == 0 {
            let value = self.evaluator.evaluate(state, depth);
            walk.tree.set_value(node, value);
            return (value, node);
        }

        let mut best = (f64::NEG_INFINITY, node);
        for a in 0..n {
            let child = walk.tree.push(node, NodeAction::Player(a), depth);
            let (value, leaf) = self.min_value(walk, state, child, a, alpha, beta);
            if value > best.0 {
                best = (value, leaf);
            }
            if self.prune {
                if best.0 >= beta {
                    walk.pruned += n - a - 1;
                    break;
                }
                alpha = alpha.max(best.0);
            }
        }
        walk.tree.set_value(node, best.0);
        best
    }

    fn min_value(
        &self,
        walk: &mut Walk,
        state: &BattleState,
        node: NodeId,
        action: usize,
        alpha: f64,
        mut beta: f64,
    ) -> (f64, NodeId) {
        let depth = walk.tree.get(node).depth;
        let state = with_completed_opponent(state, self.estimator);
        let m = self.env.legal_action_count(&state, Side::Opponent);
        if m == 0 {
            let value = self.evaluator.evaluate(&state, depth);
            walk.tree.set_value(node, value);
            return (value, node);
        }

        let mut best = (f64::INFINITY, node);
        for b in 0..m {
            let next = self.env.step(&state, [action, b]);
            let child = walk.tree.push(
                node,
                NodeAction::Joint {
                    player: action,
                    opponent: b,
                },
                depth + 1,
            );
            let (value, leaf) = self.max_value(walk, &next, child, alpha, beta);
            if value < best.0 {
                best = (value, leaf);
            }
            if self.prune {
                if best.0 <= alpha {
                    walk.pruned += m - b - 1;
                    break;
                }
                beta = beta.min(best.0);
            }
        }
        walk.tree.set_value(node, best.0);
        best
    }
}

/// Nodes that hold a real state: the root and every joint-action child.
fn count_states(tree: &SearchTree) -> usize {
    (0..tree.len() as u32)
        .filter(|&i| !matches!(tree.get(NodeId(i)).action, NodeAction::Player(_)))
        .count()
}

impl<'a, E, V> SearchStrategy for AlphaBetaSearch<'a, E, V>
where
    E: BattleEnv + ?Sized,
    V: StateEvaluator + ?Sized,
{
    fn search(&self, root: &BattleState) -> Result<SearchOutcome, SearchError> {
        let n = self.env.legal_action_count(root, Side::Player);
        if n == 0 {
            return Err(SearchError::NoLegalActions);
        }
        if root.active_fainted() {
            return Ok(SearchOutcome {
                action: 0,
                value: self.evaluator.evaluate(root, 0),
                nodes: 1,
                pruned: 0,
            });
        }

        let mut outcome = self.search_from(root, 0);
        outcome.action = outcome.action.min(n - 1);
        trace!(
            action = outcome.action,
            value = outcome.value,
            nodes = outcome.nodes,
            pruned = outcome.pruned,
            "sequential search finished"
        );
        Ok(outcome)
    }
}
