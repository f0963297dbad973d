//! Per-turn entry point: validation, lethal shortcut, opponent estimation and
//! dispatch to the configured search.

use crate::config::PolicyConfig;
use crate::env::BattleEnv;
use crate::error::PolicyError;
use crate::estimate::{MoveEstimator, OpponentHistory};
use crate::eval::HeuristicEvaluator;
use crate::greedy::{lethal_shortcut, GreedySearch};
use crate::model::{BattleState, Side, MAX_STAGE};
use crate::roster::MoveRoster;
use crate::search::{
    AlphaBetaSearch, MatrixGameSearch, SearchAlgorithm, SearchOutcome, SearchStrategy,
};
use crate::types::TypeChart;
use tracing::debug;

/// How a decision was reached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecisionPath {
    LethalShortcut,
    /// Too little is known about the opponent to trust a deep search.
    EstimationGap,
    Search(SearchAlgorithm),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub action: usize,
    pub path: DecisionPath,
    /// Absent for the lethal shortcut.
    pub outcome: Option<SearchOutcome>,
}

/// Decides one action per turn for the controlled side (team 0).
///
/// The only state kept between calls is the opponent history of the current
/// match; call [`BattlePolicy::start_match`] before a new match.
pub struct BattlePolicy<E> {
    env: E,
    config: PolicyConfig,
    chart: TypeChart,
    evaluator: HeuristicEvaluator,
    estimator: MoveEstimator,
    history: OpponentHistory,
}

impl<E: BattleEnv> BattlePolicy<E> {
    pub fn new(env: E, config: PolicyConfig) -> Result<Self, PolicyError> {
        config.validate()?;
        let chart = config.chart();
        Ok(BattlePolicy {
            env,
            evaluator: HeuristicEvaluator::new(config.weights.clone(), chart.clone()),
            estimator: MoveEstimator::new(MoveRoster::standard(), config.seed),
            chart,
            config,
            history: OpponentHistory::new(),
        })
    }

    /// Replaces the move pool used to guess unrevealed opponent moves.
    pub fn with_roster(mut self, roster: MoveRoster) -> Self {
        self.estimator = MoveEstimator::new(roster, self.config.seed);
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn history(&self) -> &OpponentHistory {
        &self.history
    }

    pub fn start_match(&mut self) {
        self.history.clear();
    }

    pub fn choose_action(&mut self, state: &BattleState) -> Result<usize, PolicyError> {
        self.decide(state).map(|d| d.action)
    }

    pub fn decide(&mut self, state: &BattleState) -> Result<Decision, PolicyError> {
        let legal = self.env.legal_action_count(state, Side::Player);
        if legal == 0 {
            return Err(PolicyError::InvalidState(format!(
                "controlled side has no legal action on turn {}",
                state.turn
            )));
        }
        if !state.stages_in_range() {
            return Err(PolicyError::InvalidState(format!(
                "stat stage outside -{MAX_STAGE}..={MAX_STAGE} on turn {}",
                state.turn
            )));
        }
        self.history.observe(state.team(Side::Opponent));
        let mut working = state.clone();
        self.history.recall_team(working.team_mut(Side::Opponent));

        if self.config.lethal_shortcut {
            if let Some(action) =
                lethal_shortcut(&working, &self.chart, self.config.min_lethal_accuracy)
            {
                if action < legal {
                    debug!(turn = state.turn, action, "lethal shortcut");
                    return Ok(Decision {
                        action,
                        path: DecisionPath::LethalShortcut,
                        outcome: None,
                    });
                }
            }
        }

        let known = working.active(Side::Opponent).known_moves().count();

        let (path, outcome) = if known < self.config.min_known_moves {
            let greedy = GreedySearch::new(&self.env, &self.chart, self.config.min_lethal_accuracy);
            (DecisionPath::EstimationGap, greedy.search(&working)?)
        } else {
            self.estimator.complete_team(working.team_mut(Side::Opponent));
            let algorithm = self.config.algorithm;
            (DecisionPath::Search(algorithm), self.strategy().search(&working)?)
        };

        let action = if outcome.action < legal {
            outcome.action
        } else {
            0
        };
        debug!(
            turn = state.turn,
            action,
            path = ?path,
            value = outcome.value,
            nodes = outcome.nodes,
            "action chosen"
        );
        Ok(Decision {
            action,
            path,
            outcome: Some(outcome),
        })
    }

    fn strategy(&self) -> Box<dyn SearchStrategy + '_> {
        let depth = self.config.max_depth;
        match self.config.algorithm {
            SearchAlgorithm::SequentialAlphaBeta => Box::new(
                AlphaBetaSearch::new(&self.env, &self.evaluator, depth)
                    .with_estimator(&self.estimator),
            ),
            SearchAlgorithm::MatrixGame => Box::new(
                MatrixGameSearch::new(&self.env, &self.evaluator, depth)
                    .with_estimator(&self.estimator)
                    .with_epsilon(self.config.matrix_epsilon),
            ),
            SearchAlgorithm::Greedy => Box::new(GreedySearch::new(
                &self.env,
                &self.chart,
                self.config.min_lethal_accuracy,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ReferenceSim;
    use crate::model::{Combatant, Move, Status, Team};
    use crate::types::PkmType;

    fn make_mon(name: &str, pkm_type: PkmType, hp: f64, moves: Vec<Move>) -> Combatant {
        Combatant {
            name: name.to_string(),
            pkm_type,
            hp,
            max_hp: 100.0,
            status: Status::None,
            moves,
        }
    }

    fn policy(config: PolicyConfig) -> BattlePolicy<ReferenceSim> {
        BattlePolicy::new(ReferenceSim::new(1, TypeChart::standard()), config).unwrap()
    }

    #[test]
    fn history_remembers_revealed_moves_until_match_start() {
        let state = BattleState::new(
            Team::new(
                make_mon("Mine", PkmType::Water, 100.0, vec![Move::new("Surf", PkmType::Water, 90.0)]),
                vec![],
            ),
            Team::new(
                make_mon("Theirs", PkmType::Fire, 300.0, vec![
                    Move::new("Ember", PkmType::Fire, 40.0),
                    Move::unknown(),
                ]),
                vec![],
            ),
        );
        let mut policy = policy(PolicyConfig::default().with_max_depth(1));
        policy.choose_action(&state).unwrap();
        assert_eq!(policy.history().revealed("Theirs").len(), 1);
        policy.start_match();
        assert!(policy.history().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = PolicyConfig::default();
        config.min_lethal_accuracy = -0.1;
        let result = BattlePolicy::new(ReferenceSim::new(1, TypeChart::standard()), config);
        assert!(matches!(result, Err(PolicyError::Config(_))));
    }
}
