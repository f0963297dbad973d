//! A small deterministic turn resolver used by the CLI and the tests.
//!
//! It is not a rules engine: damage is the expected-damage estimate, there
//! are no abilities, items or multi-turn moves, and every random draw comes
//! from a stream seeded by the turn and the joint action.

use crate::damage::estimate_damage;
use crate::env::BattleEnv;
use crate::estimate::mix_seed;
use crate::model::{Action, BattleState, Side, Stat, Status, Target, Weather};
use crate::roster::struggle;
use crate::types::{PkmType, TypeChart};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Fraction of max hp lost to burn, poison, sandstorm or hail per turn.
const CHIP_FRACTION: f64 = 1.0 / 16.0;
/// Struggle hurts its user by this share of the damage dealt.
const STRUGGLE_RECOIL: f64 = 0.25;
const WAKE_CHANCE: f64 = 1.0 / 3.0;
const THAW_CHANCE: f64 = 0.2;
const FULL_PARALYSIS_CHANCE: f64 = 0.25;
const CONFUSION_SELF_HIT_CHANCE: f64 = 1.0 / 3.0;
const CONFUSION_SELF_HIT_FRACTION: f64 = 1.0 / 8.0;

#[derive(Clone, Debug)]
pub struct ReferenceSim {
    seed: u64,
    chart: TypeChart,
}

impl ReferenceSim {
    pub fn new(seed: u64, chart: TypeChart) -> Self {
        ReferenceSim { seed, chart }
    }

    fn rng_for(&self, state: &BattleState, actions: [usize; 2]) -> SmallRng {
        let joint = (actions[0] as u64) << 32 | actions[1] as u64;
        SmallRng::seed_from_u64(mix_seed(self.seed, state.turn as u64, joint))
    }

    fn execute_move(&self, state: &mut BattleState, side: Side, move_index: usize, rng: &mut SmallRng) {
        if !can_act(state, side, rng) {
            return;
        }
        let attacker = &state.team(side).active;
        let exhausted = attacker.moves.iter().all(|m| !m.is_known() || m.uses == 0);
        let mv = if exhausted {
            struggle()
        } else {
            match attacker.moves.get(move_index) {
                Some(mv) if mv.is_known() && mv.uses > 0 => mv.clone(),
                _ => return,
            }
        };
        if !exhausted {
            state.team_mut(side).active.moves[move_index].uses -= 1;
        }
        if mv.accuracy < 1.0 && rng.gen::<f64>() >= mv.accuracy {
            return;
        }

        let foe = side.opponent();
        match mv.target {
            Target::Opponent => {
                let damage = estimate_damage(
                    &mv,
                    state.active(side).pkm_type,
                    state.active(foe).pkm_type,
                    state.team(side).stage(Stat::Attack),
                    state.team(foe).stage(Stat::Defense),
                    state.weather,
                    &self.chart,
                );
                let defender = &mut state.team_mut(foe).active;
                defender.take_damage(damage);
                if let Some(status) = mv.status {
                    if !defender.is_fainted() && defender.status == Status::None {
                        defender.status = status;
                    }
                }
                if exhausted {
                    state
                        .team_mut(side)
                        .active
                        .take_damage(damage * STRUGGLE_RECOIL);
                }
            }
            Target::User => {
                if let Some(status) = mv.status {
                    state.team_mut(side).active.status = status;
                }
            }
        }
    }
}

/// Rolls the turn-skipping conditions; may cure sleep or freeze.
fn can_act(state: &mut BattleState, side: Side, rng: &mut SmallRng) -> bool {
    let active = &mut state.team_mut(side).active;
    match active.status {
        Status::Asleep => {
            if rng.gen_bool(WAKE_CHANCE) {
                active.status = Status::None;
            }
            false
        }
        Status::Frozen => {
            if rng.gen_bool(THAW_CHANCE) {
                active.status = Status::None;
                true
            } else {
                false
            }
        }
        Status::Paralyzed => !rng.gen_bool(FULL_PARALYSIS_CHANCE),
        Status::Confused => {
            if rng.gen_bool(CONFUSION_SELF_HIT_CHANCE) {
                let hit = active.max_hp * CONFUSION_SELF_HIT_FRACTION;
                active.take_damage(hit);
                false
            } else {
                true
            }
        }
        _ => true,
    }
}

fn weather_immune(pkm_type: PkmType, weather: Weather) -> bool {
    match weather {
        Weather::Sandstorm => matches!(pkm_type, PkmType::Rock | PkmType::Ground | PkmType::Steel),
        Weather::Hail => pkm_type == PkmType::Ice,
        _ => true,
    }
}

fn end_of_turn(state: &mut BattleState) {
    let weather = state.weather;
    for team in state.teams.iter_mut() {
        let active = &mut team.active;
        if active.is_fainted() {
            continue;
        }
        let chip = active.max_hp * CHIP_FRACTION;
        if active.status.is_minor() {
            active.take_damage(chip);
        }
        if !weather_immune(active.pkm_type, weather) {
            active.take_damage(chip);
        }
    }
}

fn switch_in(state: &mut BattleState, side: Side, party_index: usize) -> bool {
    let team = state.team_mut(side);
    match team.party.get(party_index) {
        Some(member) if !member.is_fainted() => {
            std::mem::swap(&mut team.active, &mut team.party[party_index]);
            true
        }
        _ => false,
    }
}

/// Replaces a fainted active with the first conscious party member.
fn send_next(state: &mut BattleState, side: Side) {
    if !state.active(side).is_fainted() {
        return;
    }
    let next = state
        .team(side)
        .party
        .iter()
        .position(|c| !c.is_fainted());
    if let Some(idx) = next {
        switch_in(state, side, idx);
    }
}

struct PlannedAction {
    side: Side,
    move_index: usize,
    priority: bool,
    speed: i8,
    tie_break: u64,
}

impl BattleEnv for ReferenceSim {
    fn legal_action_count(&self, state: &BattleState, side: Side) -> usize {
        let team = state.team(side);
        if team.alive_count() == 0 {
            0
        } else {
            team.active.moves.len() + team.reserve_count()
        }
    }

    fn step(&self, state: &BattleState, actions: [usize; 2]) -> BattleState {
        let mut next = state.clone();
        next.turn = state.turn + 1;
        let mut rng = self.rng_for(state, actions);

        let mut planned = Vec::with_capacity(2);
        for (side, index) in [(Side::Player, actions[0]), (Side::Opponent, actions[1])] {
            match Action::from_index(index, next.team(side)) {
                Action::Switch(slot) => {
                    if let Some(party_index) = next.team(side).reserve_index(slot) {
                        switch_in(&mut next, side, party_index);
                    }
                }
                Action::Move(move_index) => {
                    let team = next.team(side);
                    planned.push(PlannedAction {
                        side,
                        move_index,
                        priority: team.active.moves.get(move_index).map_or(false, |m| m.priority),
                        speed: team.stage(Stat::Speed),
                        tie_break: rng.gen(),
                    });
                }
            }
        }
        planned.sort_by(|lhs, rhs| {
            rhs.priority
                .cmp(&lhs.priority)
                .then_with(|| rhs.speed.cmp(&lhs.speed))
                .then_with(|| lhs.tie_break.cmp(&rhs.tie_break))
        });

        for action in planned {
            if next.active(action.side).is_fainted() || next.active(action.side.opponent()).is_fainted() {
                continue;
            }
            self.execute_move(&mut next, action.side, action.move_index, &mut rng);
        }

        end_of_turn(&mut next);
        send_next(&mut next, Side::Player);
        send_next(&mut next, Side::Opponent);
        next
    }
}
