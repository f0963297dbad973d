//! Joint-action tree search over a black-box battle simulator.

pub mod alphabeta;
pub mod lp;
pub mod matrix;
pub mod tree;

use crate::error::SearchError;
use crate::estimate::MoveEstimator;
use crate::model::{BattleState, Side};
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub use alphabeta::AlphaBetaSearch;
pub use matrix::MatrixGameSearch;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchAlgorithm {
    /// Controlled side maximizes, then the opponent minimizes on the same state.
    #[default]
    SequentialAlphaBeta,
    /// Every node is a zero-sum matrix game over both sides' actions.
    MatrixGame,
    /// One-ply damage and match-up rules, no tree.
    Greedy,
}

impl SearchAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            SearchAlgorithm::SequentialAlphaBeta => "sequential-alpha-beta",
            SearchAlgorithm::MatrixGame => "matrix-game",
            SearchAlgorithm::Greedy => "greedy",
        }
    }
}

impl fmt::Display for SearchAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential-alpha-beta" | "alpha-beta" | "sequential" => {
                Ok(SearchAlgorithm::SequentialAlphaBeta)
            }
            "matrix-game" | "matrix" | "smab" => Ok(SearchAlgorithm::MatrixGame),
            "greedy" => Ok(SearchAlgorithm::Greedy),
            other => Err(format!("unknown search algorithm: {}", other)),
        }
    }
}

/// Result of one search from the root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchOutcome {
    /// Controlled-side action index.
    pub action: usize,
    pub value: f64,
    /// States visited, root included.
    pub nodes: usize,
    /// Branches cut (sequential) or rows and columns removed (matrix game).
    pub pruned: usize,
}

/// Common contract of the decision procedures the policy can dispatch to.
pub trait SearchStrategy {
    fn search(&self, root: &BattleState) -> Result<SearchOutcome, SearchError>;
}

/// Depth 0 still expands the root once.
pub fn effective_horizon(max_depth: u32) -> u32 {
    max_depth.max(1)
}

pub(crate) fn is_terminal(state: &BattleState, depth: u32, horizon: u32) -> bool {
    state.active_fainted() || depth >= horizon
}

/// The state with the opponent's unrevealed moves filled in, cloned only when
/// there is something to fill.
pub(crate) fn with_completed_opponent<'s>(
    state: &'s BattleState,
    estimator: Option<&MoveEstimator>,
) -> Cow<'s, BattleState> {
    match estimator {
        Some(estimator)
            if state
                .team(Side::Opponent)
                .members()
                .any(|c| c.has_unknown_moves()) =>
        {
            let mut working = state.clone();
            estimator.complete_team(working.team_mut(Side::Opponent));
            Cow::Owned(working)
        }
        _ => Cow::Borrowed(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_round_trip_through_from_str() {
        for algorithm in [
            SearchAlgorithm::SequentialAlphaBeta,
            SearchAlgorithm::MatrixGame,
            SearchAlgorithm::Greedy,
        ] {
            assert_eq!(algorithm.name().parse::<SearchAlgorithm>(), Ok(algorithm));
        }
        assert!("minimax".parse::<SearchAlgorithm>().is_err());
    }

    #[test]
    fn algorithm_deserializes_kebab_case() {
        let algorithm: SearchAlgorithm = serde_json::from_str("\"matrix-game\"").unwrap();
        assert_eq!(algorithm, SearchAlgorithm::MatrixGame);
    }

    #[test]
    fn depth_zero_expands_one_turn() {
        assert_eq!(effective_horizon(0), 1);
        assert_eq!(effective_horizon(3), 3);
    }
}
