//! One-ply rule-based decisions: lethal checks, status moves under threat,
//! stay-or-switch by match-up and a three-turn damage race.

use crate::damage::{
    attack_order, lethal_moves, member_match_up, move_damages, AttackOrder, MoveDamage,
};
use crate::env::BattleEnv;
use crate::error::SearchError;
use crate::model::{BattleState, Combatant, Side, Status, Target};
use crate::search::{SearchOutcome, SearchStrategy};
use crate::types::{PkmType, TypeChart};
use tracing::trace;

/// Below this match-up the active combatant looks for a better teammate.
pub const STAY_MATCH_UP: f64 = 0.5;
/// Turns the damage race looks ahead.
pub const RACE_TURNS: f64 = 3.0;

/// Index of the first element with the largest key.
fn first_max_by<T>(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> f64) -> Option<T> {
    let mut best: Option<(f64, T)> = None;
    for item in items {
        let k = key(&item);
        match &best {
            Some((top, _)) if k <= *top => {}
            _ => best = Some((k, item)),
        }
    }
    best.map(|(_, item)| item)
}

/// A move that knocks the opposing active out this turn and is safe to use
/// given who moves first. Only moves at least `min_accuracy` accurate count.
pub fn lethal_shortcut(state: &BattleState, chart: &TypeChart, min_accuracy: f64) -> Option<usize> {
    let mine: Vec<MoveDamage> = lethal_moves(state, Side::Player, chart)
        .into_iter()
        .filter(|m| m.accuracy >= min_accuracy)
        .collect();
    let first = mine.first()?;
    let my_hp = state.active(Side::Player).hp;

    match attack_order(state) {
        AttackOrder::Faster => Some(first.index),
        AttackOrder::FasterButOpponentHasPriority => {
            let priority_damage = move_damages(state, Side::Opponent, chart)
                .into_iter()
                .filter(|m| m.priority)
                .map(|m| m.damage)
                .fold(0.0, f64::max);
            (priority_damage < my_hp).then_some(first.index)
        }
        // speed ties count as moving second
        AttackOrder::Tied | AttackOrder::Slower | AttackOrder::SlowerAndOpponentHasPriority => {
            if let Some(quick) = mine.iter().find(|m| m.priority) {
                return Some(quick.index);
            }
            lethal_moves(state, Side::Opponent, chart)
                .is_empty()
                .then_some(first.index)
        }
    }
}

/// Best incapacitating move aimed at the opponent: sleep, then freeze unless
/// the target is ice, then whatever comes first.
fn disabling_move(me: &Combatant, foe: &Combatant) -> Option<usize> {
    let candidates: Vec<(usize, Status)> = me
        .moves
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_known() && m.uses > 0 && m.target == Target::Opponent)
        .filter_map(|(i, m)| m.status.filter(|s| s.is_incapacitating()).map(|s| (i, s)))
        .collect();
    if let Some((i, _)) = candidates.iter().find(|(_, s)| *s == Status::Asleep) {
        return Some(*i);
    }
    if foe.pkm_type != PkmType::Ice {
        if let Some((i, _)) = candidates.iter().find(|(_, s)| *s == Status::Frozen) {
            return Some(*i);
        }
    }
    candidates.first().map(|(i, _)| *i)
}

/// The greedy choice for the controlled side and a score for it (expected
/// damage for a move, match-up for a switch).
pub fn greedy_action(state: &BattleState, chart: &TypeChart, min_accuracy: f64) -> (usize, f64) {
    let me = state.active(Side::Player);
    let foe = state.active(Side::Opponent);

    if let Some(index) = lethal_shortcut(state, chart, min_accuracy) {
        return (index, foe.hp);
    }

    let threatened = !lethal_moves(state, Side::Opponent, chart).is_empty();
    if threatened {
        if let Some(index) = disabling_move(me, foe) {
            return (index, 0.0);
        }
    }

    let team = state.team(Side::Player);
    let current = member_match_up(me, foe, chart);
    let better_mate = first_max_by(
        team.party
            .iter()
            .filter(|c| !c.is_fainted())
            .enumerate()
            .map(|(slot, c)| (slot, member_match_up(c, foe, chart))),
        |(_, score)| *score,
    )
    .filter(|(_, score)| *score > current);

    match better_mate {
        Some((i, score)) if current < STAY_MATCH_UP => (me.moves.len() + i, score),
        _ => {
            let damages = move_damages(state, Side::Player, chart);
            let racing = damages
                .iter()
                .filter(|m| m.damage * (RACE_TURNS * m.accuracy).floor() > foe.hp);
            if let Some(best) = first_max_by(racing, |m| m.damage) {
                return (best.index, best.damage);
            }
            if let Some(index) = disabling_move(me, foe) {
                return (index, 0.0);
            }
            first_max_by(damages.iter(), |m| m.damage * m.accuracy)
                .map(|m| (m.index, m.damage * m.accuracy))
                .unwrap_or((0, 0.0))
        }
    }
}

/// Greedy decisions behind the common search contract.
pub struct GreedySearch<'a, E: ?Sized> {
    env: &'a E,
    chart: &'a TypeChart,
    min_accuracy: f64,
}

impl<'a, E: BattleEnv + ?Sized> GreedySearch<'a, E> {
    pub fn new(env: &'a E, chart: &'a TypeChart, min_accuracy: f64) -> Self {
        GreedySearch {
            env,
            chart,
            min_accuracy,
        }
    }
}

impl<'a, E: BattleEnv + ?Sized> SearchStrategy for GreedySearch<'a, E> {
    fn search(&self, root: &BattleState) -> Result<SearchOutcome, SearchError> {
        let n = self.env.legal_action_count(root, Side::Player);
        if n == 0 {
            return Err(SearchError::NoLegalActions);
        }
        let (action, value) = greedy_action(root, self.chart, self.min_accuracy);
        let action = if action < n { action } else { 0 };
        trace!(action, value, "greedy choice");
        Ok(SearchOutcome {
            action,
            value,
            nodes: 1,
            pruned: 0,
        })
    }
}
