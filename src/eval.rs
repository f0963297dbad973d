//! Heuristic utility of a battle position for the controlled side.

use crate::damage::match_up_score;
use crate::model::{BattleState, Combatant, Side};
use crate::types::TypeChart;
use serde::Deserialize;

/// Scores a position at a given search depth; higher favours the controlled side.
pub trait StateEvaluator {
    fn evaluate(&self, state: &BattleState, depth: u32) -> f64;
}

impl<F> StateEvaluator for F
where
    F: Fn(&BattleState, u32) -> f64,
{
    fn evaluate(&self, state: &BattleState, depth: u32) -> f64 {
        self(state, depth)
    }
}

/// Coefficients of the heuristic. Defaults are tuning starting points.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    pub match_up: f64,
    /// Active hit-point ratio difference.
    pub hp: f64,
    pub stage: f64,
    /// Penalty for confusion, paralysis, sleep or freeze.
    pub incapacitated: f64,
    /// Penalty for burn or poison.
    pub chipped: f64,
    /// Per remaining-combatant difference.
    pub remaining: f64,
    /// How much the hp and remaining terms grow as both teams thin out.
    pub late_game: f64,
    pub depth: f64,
}

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            match_up: 1.0,
            hp: 3.0,
            stage: 0.2,
            incapacitated: 1.0,
            chipped: 0.5,
            remaining: 2.0,
            late_game: 1.0,
            depth: 0.3,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HeuristicEvaluator {
    weights: EvalWeights,
    chart: TypeChart,
}

impl HeuristicEvaluator {
    pub fn new(weights: EvalWeights, chart: TypeChart) -> Self {
        HeuristicEvaluator { weights, chart }
    }

    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    fn status_penalty(&self, combatant: &Combatant) -> f64 {
        if combatant.status.is_incapacitating() {
            -self.weights.incapacitated
        } else if combatant.status.is_minor() {
            -self.weights.chipped
        } else {
            0.0
        }
    }
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        HeuristicEvaluator::new(EvalWeights::default(), TypeChart::standard())
    }
}

/// 1.0 with full teams, rising towards `1.0 + late_game` as both sides run out.
pub fn late_game_factor(state: &BattleState, late_game: f64) -> f64 {
    let capacity: usize = state.teams.iter().map(|t| t.size()).sum();
    if capacity == 0 {
        return 1.0;
    }
    let alive: usize = state.teams.iter().map(|t| t.alive_count()).sum();
    1.0 + late_game * (1.0 - alive as f64 / capacity as f64)
}

impl StateEvaluator for HeuristicEvaluator {
    fn evaluate(&self, state: &BattleState, depth: u32) -> f64 {
        let w = &self.weights;
        let mine = state.team(Side::Player);
        let theirs = state.team(Side::Opponent);
        let my_active = &mine.active;
        let opp_active = &theirs.active;
        let late = late_game_factor(state, w.late_game);

        let match_up = match_up_score(
            my_active.pkm_type,
            opp_active.pkm_type,
            &my_active.known_move_types(),
            &opp_active.known_move_types(),
            &self.chart,
        );
        let hp = (my_active.hp_ratio() - opp_active.hp_ratio()) * late;
        let stage = (mine.stage_sum() - theirs.stage_sum()) as f64;
        let status = self.status_penalty(my_active) - self.status_penalty(opp_active);
        let size = mine.size().max(theirs.size()) as f64;
        let remaining = ((size - mine.fainted_count() as f64)
            - (size - theirs.fainted_count() as f64))
            * late;

        w.match_up * match_up + w.hp * hp + w.stage * stage + status + w.remaining * remaining
            - w.depth * depth as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Move, Status, Team};
    use crate::types::PkmType;

    fn mon(name: &str, hp: f64) -> Combatant {
        Combatant {
            name: name.to_string(),
            pkm_type: PkmType::Normal,
            hp,
            max_hp: 100.0,
            status: Status::None,
            moves: vec![Move::new("Tackle", PkmType::Normal, 40.0)],
        }
    }

    fn state(my_hp: f64, opp_hp: f64) -> BattleState {
        BattleState::new(
            Team::new(mon("Mine", my_hp), vec![mon("MineB", 100.0)]),
            Team::new(mon("Theirs", opp_hp), vec![mon("TheirsB", 100.0)]),
        )
    }

    #[test]
    fn symmetric_position_scores_zero_at_root() {
        let eval = HeuristicEvaluator::default();
        assert!(eval.evaluate(&state(100.0, 100.0), 0).abs() < 1e-9);
    }

    #[test]
    fn more_hp_is_better_and_depth_costs() {
        let eval = HeuristicEvaluator::default();
        let ahead = eval.evaluate(&state(100.0, 40.0), 0);
        let behind = eval.evaluate(&state(40.0, 100.0), 0);
        assert!(ahead > 0.0 && behind < 0.0);
        assert!(eval.evaluate(&state(100.0, 40.0), 2) < ahead);
    }

    #[test]
    fn status_penalties_are_signed_per_side() {
        let eval = HeuristicEvaluator::default();
        let mut s = state(100.0, 100.0);
        s.teams[1].active.status = Status::Asleep;
        assert!((eval.evaluate(&s, 0) - 1.0).abs() < 1e-9);
        s.teams[0].active.status = Status::Burned;
        assert!((eval.evaluate(&s, 0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn late_game_amplifies_material() {
        let eval = HeuristicEvaluator::default();
        let mut early = state(100.0, 100.0);
        early.teams[1].party[0].hp = 0.0;
        let mut late = early.clone();
        late.teams[0].party[0].hp = 0.0;
        late.teams[1].active.hp = 50.0;
        let mut late_even = late.clone();
        late_even.teams[1].active.hp = 100.0;
        // the same 0.5 hp swing weighs more once half the field is gone
        let late_swing = eval.evaluate(&late, 0) - eval.evaluate(&late_even, 0);
        let mut early_half = early.clone();
        early_half.teams[1].active.hp = 50.0;
        let early_swing = eval.evaluate(&early_half, 0) - eval.evaluate(&early, 0);
        assert!(late_swing > early_swing);
        assert!(late_game_factor(&late, 1.0) > late_game_factor(&early, 1.0));
    }
}
