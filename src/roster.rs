//! Standard move pool used to guess unrevealed opponent moves.

use crate::model::{Move, Status, Target};
use crate::types::PkmType;
use phf::phf_map;

#[derive(Clone, Copy, Debug)]
pub struct MoveSpec {
    pub move_type: PkmType,
    pub power: f64,
    pub accuracy: f64,
    pub max_uses: u32,
    pub priority: bool,
    pub fixed_damage: f64,
    pub status: Option<Status>,
    pub target: Target,
}

const fn attack(move_type: PkmType, power: f64, accuracy: f64, max_uses: u32) -> MoveSpec {
    MoveSpec {
        move_type,
        power,
        accuracy,
        max_uses,
        priority: false,
        fixed_damage: 0.0,
        status: None,
        target: Target::Opponent,
    }
}

const fn quick(move_type: PkmType, power: f64) -> MoveSpec {
    MoveSpec {
        move_type,
        power,
        accuracy: 1.0,
        max_uses: 30,
        priority: true,
        fixed_damage: 0.0,
        status: None,
        target: Target::Opponent,
    }
}

const fn inflict(move_type: PkmType, status: Status, accuracy: f64) -> MoveSpec {
    MoveSpec {
        move_type,
        power: 0.0,
        accuracy,
        max_uses: 20,
        priority: false,
        fixed_damage: 0.0,
        status: Some(status),
        target: Target::Opponent,
    }
}

const fn fixed(move_type: PkmType, damage: f64) -> MoveSpec {
    MoveSpec {
        move_type,
        power: 0.0,
        accuracy: 1.0,
        max_uses: 20,
        priority: false,
        fixed_damage: damage,
        status: None,
        target: Target::Opponent,
    }
}

pub static STANDARD_MOVES: phf::Map<&'static str, MoveSpec> = phf_map! {
    "Tackle" => attack(PkmType::Normal, 40.0, 1.0, 35),
    "Body Slam" => attack(PkmType::Normal, 85.0, 1.0, 15),
    "Hyper Beam" => attack(PkmType::Normal, 150.0, 0.9, 5),
    "Quick Attack" => quick(PkmType::Normal, 40.0),
    "Ember" => attack(PkmType::Fire, 40.0, 1.0, 25),
    "Flamethrower" => attack(PkmType::Fire, 90.0, 1.0, 15),
    "Fire Blast" => attack(PkmType::Fire, 110.0, 0.85, 5),
    "Water Gun" => attack(PkmType::Water, 40.0, 1.0, 25),
    "Surf" => attack(PkmType::Water, 90.0, 1.0, 15),
    "Hydro Pump" => attack(PkmType::Water, 110.0, 0.8, 5),
    "Aqua Jet" => quick(PkmType::Water, 40.0),
    "Thunder Shock" => attack(PkmType::Electric, 40.0, 1.0, 30),
    "Thunderbolt" => attack(PkmType::Electric, 90.0, 1.0, 15),
    "Thunder Wave" => inflict(PkmType::Electric, Status::Paralyzed, 0.9),
    "Vine Whip" => attack(PkmType::Grass, 45.0, 1.0, 25),
    "Energy Ball" => attack(PkmType::Grass, 90.0, 1.0, 10),
    "Sleep Powder" => inflict(PkmType::Grass, Status::Asleep, 0.75),
    "Ice Beam" => attack(PkmType::Ice, 90.0, 1.0, 10),
    "Ice Shard" => quick(PkmType::Ice, 40.0),
    "Brick Break" => attack(PkmType::Fighting, 75.0, 1.0, 15),
    "Close Combat" => attack(PkmType::Fighting, 120.0, 1.0, 5),
    "Seismic Toss" => fixed(PkmType::Fighting, 50.0),
    "Sludge Bomb" => attack(PkmType::Poison, 90.0, 1.0, 10),
    "Toxic" => inflict(PkmType::Poison, Status::Poisoned, 0.9),
    "Earthquake" => attack(PkmType::Ground, 100.0, 1.0, 10),
    "Air Slash" => attack(PkmType::Flying, 75.0, 0.95, 15),
    "Psychic" => attack(PkmType::Psychic, 90.0, 1.0, 10),
    "Hypnosis" => inflict(PkmType::Psychic, Status::Asleep, 0.6),
    "Bug Buzz" => attack(PkmType::Bug, 90.0, 1.0, 10),
    "Rock Slide" => attack(PkmType::Rock, 75.0, 0.9, 10),
    "Shadow Ball" => attack(PkmType::Ghost, 80.0, 1.0, 15),
    "Night Shade" => fixed(PkmType::Ghost, 50.0),
    "Confuse Ray" => inflict(PkmType::Ghost, Status::Confused, 1.0),
    "Dragon Pulse" => attack(PkmType::Dragon, 85.0, 1.0, 10),
    "Dragon Rage" => fixed(PkmType::Dragon, 40.0),
    "Crunch" => attack(PkmType::Dark, 80.0, 1.0, 15),
    "Sucker Punch" => quick(PkmType::Dark, 70.0),
    "Iron Head" => attack(PkmType::Steel, 80.0, 1.0, 15),
    "Moonblast" => attack(PkmType::Fairy, 95.0, 1.0, 15),
    "Will-O-Wisp" => inflict(PkmType::Fire, Status::Burned, 0.85),
};

impl MoveSpec {
    pub fn to_move(&self, name: &str) -> Move {
        Move {
            name: Some(name.to_string()),
            move_type: self.move_type,
            power: self.power,
            accuracy: self.accuracy,
            max_uses: self.max_uses,
            uses: self.max_uses,
            priority: self.priority,
            fixed_damage: self.fixed_damage,
            status: self.status,
            target: self.target,
        }
    }
}

pub fn standard_move(name: &str) -> Option<Move> {
    STANDARD_MOVES.get(name).map(|spec| spec.to_move(name))
}

/// Last resort when every slot is out of uses.
pub fn struggle() -> Move {
    Move {
        name: Some("Struggle".to_string()),
        move_type: PkmType::Normal,
        power: 50.0,
        accuracy: 1.0,
        max_uses: u32::MAX,
        uses: u32::MAX,
        priority: false,
        fixed_damage: 0.0,
        status: None,
        target: Target::Opponent,
    }
}

/// Ordered pool of legal moves.
#[derive(Clone, Debug)]
pub struct MoveRoster {
    moves: Vec<Move>,
}

impl MoveRoster {
    pub fn new(moves: Vec<Move>) -> Self {
        MoveRoster { moves }
    }

    /// The built-in pool, sorted by name so draws do not depend on hash layout.
    pub fn standard() -> Self {
        let mut names: Vec<&&str> = STANDARD_MOVES.keys().collect();
        names.sort();
        let moves = names
            .into_iter()
            .filter_map(|name| standard_move(name))
            .collect();
        MoveRoster { moves }
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Default for MoveRoster {
    fn default() -> Self {
        MoveRoster::standard()
    }
}
