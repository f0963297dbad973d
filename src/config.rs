//! Policy configuration.

use crate::error::PolicyError;
use crate::eval::EvalWeights;
use crate::search::matrix::DEFAULT_EPSILON;
use crate::search::SearchAlgorithm;
use crate::types::TypeChart;
use serde::Deserialize;

fn default_max_depth() -> u32 {
    2
}

fn default_seed() -> u64 {
    69
}

fn default_lethal_shortcut() -> bool {
    true
}

fn default_min_lethal_accuracy() -> f64 {
    0.7
}

fn default_matrix_epsilon() -> f64 {
    DEFAULT_EPSILON
}

/// Everything a `BattlePolicy` needs besides the simulator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub algorithm: SearchAlgorithm,

    /// Turns searched below the root. 0 behaves like 1.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    #[serde(default)]
    pub weights: EvalWeights,

    /// Seed of the opponent move completion.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Play a safe knockout immediately instead of searching.
    #[serde(default = "default_lethal_shortcut")]
    pub lethal_shortcut: bool,

    #[serde(default = "default_min_lethal_accuracy")]
    pub min_lethal_accuracy: f64,

    /// Known moves the opponent's active must have revealed before the tree
    /// search is trusted; below this the greedy rules decide.
    #[serde(default)]
    pub min_known_moves: usize,

    #[serde(default = "default_matrix_epsilon")]
    pub matrix_epsilon: f64,

    /// Replaces the standard effectiveness table when set.
    #[serde(default)]
    pub type_chart: Option<TypeChart>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            algorithm: SearchAlgorithm::default(),
            max_depth: default_max_depth(),
            weights: EvalWeights::default(),
            seed: default_seed(),
            lethal_shortcut: default_lethal_shortcut(),
            min_lethal_accuracy: default_min_lethal_accuracy(),
            min_known_moves: 0,
            matrix_epsilon: default_matrix_epsilon(),
            type_chart: None,
        }
    }
}

impl PolicyConfig {
    pub fn with_algorithm(mut self, algorithm: SearchAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_weights(mut self, weights: EvalWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn without_lethal_shortcut(mut self) -> Self {
        self.lethal_shortcut = false;
        self
    }

    pub fn with_min_known_moves(mut self, min_known_moves: usize) -> Self {
        self.min_known_moves = min_known_moves;
        self
    }

    pub fn chart(&self) -> TypeChart {
        self.type_chart.clone().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if !(0.0..=1.0).contains(&self.min_lethal_accuracy) {
            return Err(PolicyError::Config(format!(
                "min_lethal_accuracy must be within 0..=1, got {}",
                self.min_lethal_accuracy
            )));
        }
        if !(self.matrix_epsilon.is_finite() && self.matrix_epsilon > 0.0) {
            return Err(PolicyError::Config(format!(
                "matrix_epsilon must be positive, got {}",
                self.matrix_epsilon
            )));
        }
        let w = &self.weights;
        let terms = [
            ("match_up", w.match_up),
            ("hp", w.hp),
            ("stage", w.stage),
            ("incapacitated", w.incapacitated),
            ("chipped", w.chipped),
            ("remaining", w.remaining),
            ("late_game", w.late_game),
            ("depth", w.depth),
        ];
        if let Some((name, value)) = terms.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PolicyError::Config(format!(
                "weight {} must be finite, got {}",
                name, value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config: PolicyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PolicyConfig::default());
        assert_eq!(config.seed, 69);
        assert_eq!(config.max_depth, 2);
        assert!(config.lethal_shortcut);
    }

    #[test]
    fn partial_json_overrides_fields() {
        let raw = r#"{"algorithm": "matrix-game", "max_depth": 1, "weights": {"hp": 5.0}}"#;
        let config: PolicyConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.algorithm, SearchAlgorithm::MatrixGame);
        assert_eq!(config.max_depth, 1);
        assert_eq!(config.weights.hp, 5.0);
        assert_eq!(config.weights.remaining, EvalWeights::default().remaining);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut config = PolicyConfig::default();
        assert!(config.validate().is_ok());
        config.min_lethal_accuracy = 1.5;
        assert!(matches!(config.validate(), Err(PolicyError::Config(_))));
        config.min_lethal_accuracy = 0.7;
        config.matrix_epsilon = 0.0;
        assert!(config.validate().is_err());
        config.matrix_epsilon = 1e-6;
        config.weights.hp = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn builders_chain() {
        let config = PolicyConfig::default()
            .with_algorithm(SearchAlgorithm::Greedy)
            .with_max_depth(0)
            .with_seed(7);
        assert_eq!(config.algorithm, SearchAlgorithm::Greedy);
        assert_eq!(config.max_depth, 0);
        assert_eq!(config.seed, 7);
    }
}
