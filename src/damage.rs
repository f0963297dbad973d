//! Expected damage and match-up scores.
//!
//! These are estimates for the search, not the simulator's damage roll: no
//! random factor, no crits, and stats are represented only by their stages.

use crate::model::{BattleState, Combatant, Move, Side, Stat, Weather};
use crate::types::{PkmType, TypeChart};

pub const STAB_BONUS: f64 = 1.5;

/// Expected damage of `mv` used by an `attacker_type` combatant on a
/// `defender_type` combatant.
pub fn estimate_damage(
    mv: &Move,
    attacker_type: PkmType,
    defender_type: PkmType,
    attack_stage: i8,
    defense_stage: i8,
    weather: Weather,
    chart: &TypeChart,
) -> f64 {
    let effectiveness = chart.multiplier(mv.move_type, defender_type);
    damage_with_effectiveness(
        mv,
        effectiveness,
        attacker_type,
        attack_stage,
        defense_stage,
        weather,
    )
}

/// Same as [`estimate_damage`] with the type multiplier already resolved.
pub fn damage_with_effectiveness(
    mv: &Move,
    effectiveness: f64,
    attacker_type: PkmType,
    attack_stage: i8,
    defense_stage: i8,
    weather: Weather,
) -> f64 {
    if !mv.is_known() || mv.uses == 0 {
        return 0.0;
    }
    if effectiveness <= 0.0 {
        return 0.0;
    }
    if mv.fixed_damage > 0.0 {
        return mv.fixed_damage;
    }
    let stab = if mv.move_type == attacker_type {
        STAB_BONUS
    } else {
        1.0
    };
    let damage = effectiveness
        * stab
        * weather_modifier(mv.move_type, weather)
        * stage_multiplier(attack_stage as i32 - defense_stage as i32)
        * mv.power;
    damage.max(0.0)
}

/// Rain boosts water and weakens fire, sun does the opposite.
pub fn weather_modifier(move_type: PkmType, weather: Weather) -> f64 {
    match (move_type, weather) {
        (PkmType::Water, Weather::Rain) | (PkmType::Fire, Weather::Sunny) => 1.5,
        (PkmType::Water, Weather::Sunny) | (PkmType::Fire, Weather::Rain) => 0.5,
        _ => 1.0,
    }
}

/// Diminishing-returns curve over the attack/defense stage difference.
pub fn stage_multiplier(delta: i32) -> f64 {
    if delta >= 0 {
        (delta as f64 + 2.0) / 2.0
    } else {
        2.0 / (delta.unsigned_abs() as f64 + 2.0)
    }
}

/// Offensive advantage minus defensive exposure; positive favours `my_type`.
pub fn match_up_score(
    my_type: PkmType,
    opp_type: PkmType,
    my_move_types: &[PkmType],
    opp_move_types: &[PkmType],
    chart: &TypeChart,
) -> f64 {
    let offensive = best_multiplier(my_type, opp_type, my_move_types, chart);
    let defensive = best_multiplier(opp_type, my_type, opp_move_types, chart);
    offensive - defensive
}

fn best_multiplier(
    user_type: PkmType,
    target_type: PkmType,
    move_types: &[PkmType],
    chart: &TypeChart,
) -> f64 {
    move_types
        .iter()
        .map(|&move_type| {
            let base = chart.multiplier(move_type, target_type);
            if move_type == user_type {
                base * STAB_BONUS
            } else {
                base
            }
        })
        .fold(0.0, f64::max)
}

/// Who is expected to act first this turn, from the controlled side's view.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum AttackOrder {
    SlowerAndOpponentHasPriority,
    Slower,
    Tied,
    FasterButOpponentHasPriority,
    Faster,
}

pub fn attack_order(state: &BattleState) -> AttackOrder {
    let my_speed = state.team(Side::Player).stage(Stat::Speed);
    let opp_speed = state.team(Side::Opponent).stage(Stat::Speed);
    let opp_priority = state
        .active(Side::Opponent)
        .known_moves()
        .any(|m| m.priority && m.uses > 0);
    if opp_speed > my_speed {
        if opp_priority {
            AttackOrder::SlowerAndOpponentHasPriority
        } else {
            AttackOrder::Slower
        }
    } else if my_speed > opp_speed {
        if opp_priority {
            AttackOrder::FasterButOpponentHasPriority
        } else {
            AttackOrder::Faster
        }
    } else {
        AttackOrder::Tied
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveDamage {
    pub index: usize,
    pub damage: f64,
    pub accuracy: f64,
    pub max_uses: u32,
    pub priority: bool,
}

/// Estimated damage of every move `attacker_side` can use on the other active.
pub fn move_damages(state: &BattleState, attacker_side: Side, chart: &TypeChart) -> Vec<MoveDamage> {
    let attacker = state.active(attacker_side);
    let defender = state.active(attacker_side.opponent());
    let attack_stage = state.team(attacker_side).stage(Stat::Attack);
    let defense_stage = state.team(attacker_side.opponent()).stage(Stat::Defense);
    attacker
        .moves
        .iter()
        .enumerate()
        .map(|(index, mv)| MoveDamage {
            index,
            damage: estimate_damage(
                mv,
                attacker.pkm_type,
                defender.pkm_type,
                attack_stage,
                defense_stage,
                state.weather,
                chart,
            ),
            accuracy: mv.accuracy,
            max_uses: mv.max_uses,
            priority: mv.priority,
        })
        .collect()
}

/// Moves that knock the defending active out in one hit, most accurate first
/// and then the ones with the deeper use pool.
pub fn lethal_moves(state: &BattleState, attacker_side: Side, chart: &TypeChart) -> Vec<MoveDamage> {
    let defender_hp = state.active(attacker_side.opponent()).hp;
    let mut lethal: Vec<MoveDamage> = move_damages(state, attacker_side, chart)
        .into_iter()
        .filter(|m| m.damage > 0.0 && m.damage >= defender_hp)
        .collect();
    lethal.sort_by(|a, b| {
        b.accuracy
            .total_cmp(&a.accuracy)
            .then_with(|| b.max_uses.cmp(&a.max_uses))
    });
    lethal
}

/// Match-up of a (possibly benched) combatant against the opposing active.
pub fn member_match_up(member: &Combatant, foe: &Combatant, chart: &TypeChart) -> f64 {
    match_up_score(
        member.pkm_type,
        foe.pkm_type,
        &member.known_move_types(),
        &foe.known_move_types(),
        chart,
    )
}
