pub mod battle;
pub mod config;
pub mod damage;
pub mod env;
pub mod error;
pub mod estimate;
pub mod eval;
pub mod greedy;
pub mod model;
pub mod policy;
pub mod roster;
pub mod search;
pub mod types;

use crate::battle::ReferenceSim;
pub use crate::config::PolicyConfig;
pub use crate::env::BattleEnv;
pub use crate::error::{LpError, PolicyError, SearchError};
pub use crate::eval::{EvalWeights, HeuristicEvaluator, StateEvaluator};
use crate::model::{Action, BattleState, Side};
pub use crate::policy::{BattlePolicy, Decision, DecisionPath};
pub use crate::search::{SearchAlgorithm, SearchOutcome};
use anyhow::Context;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub state_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub algorithm: Option<SearchAlgorithm>,
    pub max_depth: Option<u32>,
    pub seed: Option<u64>,
    pub sim_seed: u64,
}

pub fn load_state(path: &Path) -> anyhow::Result<BattleState> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read battle state at {}", path.display()))?;
    let parsed: BattleState = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    Ok(parsed)
}

pub fn load_config(path: &Path) -> anyhow::Result<PolicyConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy config at {}", path.display()))?;
    let parsed: PolicyConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    Ok(parsed)
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    let mut config = match &opts.config_path {
        Some(path) => load_config(path)?,
        None => PolicyConfig::default(),
    };
    if let Some(algorithm) = opts.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(depth) = opts.max_depth {
        config.max_depth = depth;
    }
    if let Some(seed) = opts.seed {
        config.seed = seed;
    }
    let state = load_state(&opts.state_path)?;

    let sim = ReferenceSim::new(opts.sim_seed, config.chart());
    let mut policy = BattlePolicy::new(sim, config).context("Invalid policy configuration")?;
    let decision = policy
        .decide(&state)
        .with_context(|| format!("No decision for {}", opts.state_path.display()))?;

    let team = state.team(Side::Player);
    let label = match Action::from_index(decision.action, team) {
        Action::Move(i) => format!(
            "move {}",
            team.active
                .moves
                .get(i)
                .and_then(|m| m.name.as_deref())
                .unwrap_or("<unknown>")
        ),
        Action::Switch(slot) => format!(
            "switch to {}",
            team.reserve_index(slot)
                .and_then(|i| team.party.get(i))
                .map_or("<none>", |c| c.name.as_str())
        ),
    };
    println!("action {} ({}) via {:?}", decision.action, label, decision.path);
    if let Some(outcome) = decision.outcome {
        println!(
            "value {:.4}, {} nodes, {} pruned",
            outcome.value, outcome.nodes, outcome.pruned
        );
    }
    Ok(())
}
