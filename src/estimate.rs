//! Filling unrevealed opponent moves with plausible guesses.

use crate::model::{Combatant, Move, Team};
use crate::roster::MoveRoster;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

pub fn mix_seed(base: u64, a: u64, b: u64) -> u64 {
    let mut x = base ^ a.wrapping_mul(0x9E3779B97F4A7C15);
    x ^= b.wrapping_mul(0xC2B2AE3D27D4EB4F);
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51afd7ed558ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ceb9fe1a85ec53);
    x ^ (x >> 33)
}

fn name_key(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

/// Fills every unknown slot of `combatant` in place. Known slots are never
/// touched.
///
/// If none of the known moves shares the combatant's own type, the first
/// unknown slot gets an attacking move of that type; the rest are drawn from
/// the whole roster without repeating a move the combatant already has.
pub fn complete_move_set(combatant: &mut Combatant, roster: &MoveRoster, rng: &mut SmallRng) {
    let mut has_own_type = combatant
        .known_moves()
        .any(|m| m.move_type == combatant.pkm_type);
    for slot in 0..combatant.moves.len() {
        if combatant.moves[slot].is_known() {
            continue;
        }
        if !has_own_type {
            let typed: Vec<&Move> = roster
                .moves()
                .iter()
                .filter(|m| m.move_type == combatant.pkm_type && m.power > 0.0)
                .filter(|m| !combatant.moves.iter().any(|owned| owned.same_as(m)))
                .collect();
            if let Some(pick) = typed.choose(rng) {
                combatant.moves[slot] = (*pick).clone();
                has_own_type = true;
                continue;
            }
        }
        let fresh: Vec<&Move> = roster
            .moves()
            .iter()
            .filter(|m| !combatant.moves.iter().any(|owned| owned.same_as(m)))
            .collect();
        if let Some(pick) = fresh.choose(rng) {
            combatant.moves[slot] = (*pick).clone();
        }
    }
}

/// Seeded move completion. The stream is derived from the seed and the
/// combatant's name, so every branch of a search guesses the same moves.
#[derive(Clone, Debug)]
pub struct MoveEstimator {
    roster: MoveRoster,
    seed: u64,
}

impl MoveEstimator {
    pub fn new(roster: MoveRoster, seed: u64) -> Self {
        MoveEstimator { roster, seed }
    }

    pub fn roster(&self) -> &MoveRoster {
        &self.roster
    }

    pub fn complete(&self, combatant: &mut Combatant) {
        if !combatant.has_unknown_moves() {
            return;
        }
        let mut rng = SmallRng::seed_from_u64(mix_seed(self.seed, name_key(&combatant.name), 0));
        complete_move_set(combatant, &self.roster, &mut rng);
    }

    pub fn complete_team(&self, team: &mut Team) {
        for member in team.members_mut() {
            self.complete(member);
        }
    }
}

/// Moves each opponent combatant has revealed so far in the current match.
#[derive(Clone, Debug, Default)]
pub struct OpponentHistory {
    revealed: HashMap<String, Vec<Move>>,
}

impl OpponentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.revealed.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
    }

    pub fn revealed(&self, name: &str) -> &[Move] {
        self.revealed.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records every known move currently visible on the opposing team.
    pub fn observe(&mut self, team: &Team) {
        for member in team.members() {
            let seen = self.revealed.entry(member.name.clone()).or_default();
            for mv in member.known_moves() {
                if !seen.iter().any(|m| m.same_as(mv)) {
                    seen.push(mv.clone());
                }
            }
        }
    }

    /// Puts remembered moves back into unknown slots.
    pub fn recall(&self, combatant: &mut Combatant) {
        let Some(seen) = self.revealed.get(&combatant.name) else {
            return;
        };
        let missing: Vec<&Move> = seen
            .iter()
            .filter(|m| !combatant.moves.iter().any(|owned| owned.same_as(m)))
            .collect();
        let mut pending = missing.into_iter();
        for slot in combatant.moves.iter_mut() {
            if slot.is_known() {
                continue;
            }
            match pending.next() {
                Some(mv) => *slot = mv.clone(),
                None => break,
            }
        }
    }

    pub fn recall_team(&self, team: &mut Team) {
        for member in team.members_mut() {
            self.recall(member);
        }
    }
}
