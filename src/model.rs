use crate::types::PkmType;
use serde::Deserialize;

pub const N_STATS: usize = 3;
pub const MAX_STAGE: i8 = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    None,
    Confused,
    Paralyzed,
    Asleep,
    Frozen,
    Burned,
    Poisoned,
}

impl Status {
    /// Conditions that can cost the holder its whole turn.
    pub fn is_incapacitating(self) -> bool {
        matches!(
            self,
            Status::Confused | Status::Paralyzed | Status::Asleep | Status::Frozen
        )
    }

    /// Conditions that only chip hit points.
    pub fn is_minor(self) -> bool {
        matches!(self, Status::Burned | Status::Poisoned)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Clear,
    Sunny,
    Rain,
    Sandstorm,
    Hail,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stat {
    Attack = 0,
    Defense = 1,
    Speed = 2,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Opponent,
    User,
}

fn default_accuracy() -> f64 {
    1.0
}

fn default_uses() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Move {
    /// `None` marks a slot the opponent has not revealed yet.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub move_type: PkmType,
    #[serde(default)]
    pub power: f64,
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    #[serde(default = "default_uses")]
    pub max_uses: u32,
    #[serde(default = "default_uses")]
    pub uses: u32,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub fixed_damage: f64,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub target: Target,
}

impl Move {
    pub fn new(name: &str, move_type: PkmType, power: f64) -> Self {
        Move {
            name: Some(name.to_string()),
            move_type,
            power,
            accuracy: 1.0,
            max_uses: default_uses(),
            uses: default_uses(),
            priority: false,
            fixed_damage: 0.0,
            status: None,
            target: Target::Opponent,
        }
    }

    /// Placeholder for an unrevealed slot.
    pub fn unknown() -> Self {
        Move {
            name: None,
            move_type: PkmType::Normal,
            power: 0.0,
            accuracy: 1.0,
            max_uses: 0,
            uses: 0,
            priority: false,
            fixed_damage: 0.0,
            status: None,
            target: Target::Opponent,
        }
    }

    pub fn is_known(&self) -> bool {
        self.name.is_some()
    }

    pub fn is_attack(&self) -> bool {
        self.power > 0.0 || self.fixed_damage > 0.0
    }

    /// Same move from the roster's point of view, regardless of remaining uses.
    pub fn same_as(&self, other: &Move) -> bool {
        self.name.is_some() && self.name == other.name
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Combatant {
    pub name: String,
    #[serde(rename = "type")]
    pub pkm_type: PkmType,
    pub hp: f64,
    pub max_hp: f64,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub moves: Vec<Move>,
}

impl Combatant {
    pub fn is_fainted(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        }
    }

    pub fn known_moves(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter().filter(|m| m.is_known())
    }

    pub fn known_move_types(&self) -> Vec<PkmType> {
        self.known_moves().map(|m| m.move_type).collect()
    }

    pub fn has_unknown_moves(&self) -> bool {
        self.moves.iter().any(|m| !m.is_known())
    }

    pub fn take_damage(&mut self, amount: f64) {
        self.hp = (self.hp - amount.max(0.0)).max(0.0);
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Team {
    pub active: Combatant,
    #[serde(default)]
    pub party: Vec<Combatant>,
    #[serde(default)]
    pub stage: [i8; N_STATS],
}

impl Team {
    pub fn new(active: Combatant, party: Vec<Combatant>) -> Self {
        Team {
            active,
            party,
            stage: [0; N_STATS],
        }
    }

    pub fn stage(&self, stat: Stat) -> i8 {
        self.stage[stat as usize]
    }

    pub fn size(&self) -> usize {
        1 + self.party.len()
    }

    pub fn fainted_count(&self) -> usize {
        self.members().filter(|c| c.is_fainted()).count()
    }

    pub fn alive_count(&self) -> usize {
        self.size() - self.fainted_count()
    }

    pub fn members(&self) -> impl Iterator<Item = &Combatant> {
        std::iter::once(&self.active).chain(self.party.iter())
    }

    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        std::iter::once(&mut self.active).chain(self.party.iter_mut())
    }

    /// Conscious party members, the only valid switch targets.
    pub fn reserve_count(&self) -> usize {
        self.party.iter().filter(|c| !c.is_fainted()).count()
    }

    /// Party index of the `slot`-th conscious reserve.
    pub fn reserve_index(&self, slot: usize) -> Option<usize> {
        self.party
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_fainted())
            .nth(slot)
            .map(|(i, _)| i)
    }

    pub fn stage_sum(&self) -> i32 {
        self.stage.iter().map(|s| *s as i32).sum()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Opponent => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BattleState {
    /// Index 0 is the controlled side, index 1 the opponent.
    pub teams: [Team; 2],
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub turn: u32,
}

impl BattleState {
    pub fn new(player: Team, opponent: Team) -> Self {
        BattleState {
            teams: [player, opponent],
            weather: Weather::Clear,
            turn: 0,
        }
    }

    pub fn team(&self, side: Side) -> &Team {
        &self.teams[side.index()]
    }

    pub fn team_mut(&mut self, side: Side) -> &mut Team {
        &mut self.teams[side.index()]
    }

    pub fn active(&self, side: Side) -> &Combatant {
        &self.team(side).active
    }

    /// Either active combatant is down.
    pub fn active_fainted(&self) -> bool {
        self.teams.iter().any(|t| t.active.is_fainted())
    }

    /// Every stat stage of both teams lies in `-MAX_STAGE..=MAX_STAGE`.
    pub fn stages_in_range(&self) -> bool {
        self.teams
            .iter()
            .flat_map(|t| t.stage.iter())
            .all(|s| (-MAX_STAGE..=MAX_STAGE).contains(s))
    }
}

/// Action indices list the active's move slots first, then one switch per
/// conscious reserve in party order. Fainted reserves get no index.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Action {
    Move(usize),
    /// Slot among the conscious reserves, see [`Team::reserve_index`].
    Switch(usize),
}

impl Action {
    pub fn from_index(index: usize, team: &Team) -> Action {
        let n_moves = team.active.moves.len();
        if index < n_moves {
            Action::Move(index)
        } else {
            Action::Switch(index - n_moves)
        }
    }

    pub fn to_index(self, team: &Team) -> usize {
        match self {
            Action::Move(idx) => idx,
            Action::Switch(idx) => team.active.moves.len() + idx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mon(name: &str, hp: f64) -> Combatant {
        Combatant {
            name: name.to_string(),
            pkm_type: PkmType::Normal,
            hp,
            max_hp: 100.0,
            status: Status::None,
            moves: vec![Move::new("Tackle", PkmType::Normal, 40.0), Move::unknown()],
        }
    }

    #[test]
    fn action_indices_follow_moves_then_party() {
        let team = Team::new(mon("A", 100.0), vec![mon("B", 100.0), mon("C", 0.0)]);
        assert_eq!(Action::from_index(1, &team), Action::Move(1));
        assert_eq!(Action::from_index(3, &team), Action::Switch(1));
        assert_eq!(Action::Switch(0).to_index(&team), 2);
    }

    #[test]
    fn switch_slots_skip_fainted_reserves() {
        let team = Team::new(
            mon("A", 100.0),
            vec![mon("B", 0.0), mon("C", 100.0), mon("D", 0.0), mon("E", 40.0)],
        );
        assert_eq!(team.reserve_count(), 2);
        assert_eq!(team.reserve_index(0), Some(2));
        assert_eq!(team.reserve_index(1), Some(4));
        assert_eq!(team.reserve_index(2), None);
    }

    #[test]
    fn stage_range_is_checked_on_both_teams() {
        let mut state = BattleState::new(Team::new(mon("A", 100.0), vec![]), Team::new(mon("B", 100.0), vec![]));
        state.teams[0].stage[0] = MAX_STAGE;
        state.teams[1].stage[2] = -MAX_STAGE;
        assert!(state.stages_in_range());
        state.teams[1].stage[1] = MAX_STAGE + 1;
        assert!(!state.stages_in_range());
    }

    #[test]
    fn fainted_counts_whole_team() {
        let team = Team::new(mon("A", 0.0), vec![mon("B", 100.0), mon("C", 0.0)]);
        assert_eq!(team.fainted_count(), 2);
        assert_eq!(team.alive_count(), 1);
    }

    #[test]
    fn damage_clamps_at_zero() {
        let mut c = mon("A", 30.0);
        c.take_damage(80.0);
        assert_eq!(c.hp, 0.0);
        assert!(c.is_fainted());
    }

    #[test]
    fn state_parses_from_json() {
        let raw = r#"{
            "teams": [
                {"active": {"name": "Blaze", "type": "fire", "hp": 100, "max_hp": 100,
                            "moves": [{"name": "Ember", "type": "fire", "power": 40}]}},
                {"active": {"name": "Sprout", "type": "grass", "hp": 90, "max_hp": 100,
                            "moves": [{"type": "normal"}]}, "stage": [0, 1, 0]}
            ],
            "weather": "sunny"
        }"#;
        let state: BattleState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.weather, Weather::Sunny);
        assert_eq!(state.team(Side::Opponent).stage(Stat::Defense), 1);
        assert!(state.active(Side::Opponent).has_unknown_moves());
        assert_eq!(state.active(Side::Player).moves[0].uses, 10);
    }
}
