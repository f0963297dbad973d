use serde::Deserialize;

pub const N_TYPES: usize = 18;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PkmType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PkmType {
    pub const ALL: [PkmType; N_TYPES] = [
        PkmType::Normal,
        PkmType::Fire,
        PkmType::Water,
        PkmType::Electric,
        PkmType::Grass,
        PkmType::Ice,
        PkmType::Fighting,
        PkmType::Poison,
        PkmType::Ground,
        PkmType::Flying,
        PkmType::Psychic,
        PkmType::Bug,
        PkmType::Rock,
        PkmType::Ghost,
        PkmType::Dragon,
        PkmType::Dark,
        PkmType::Steel,
        PkmType::Fairy,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Attack-type by defender-type effectiveness multipliers.
///
/// The search never hard-codes multipliers; everything goes through a chart so
/// callers can plug in the table their simulator uses.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>")]
pub struct TypeChart {
    rows: [[f64; N_TYPES]; N_TYPES],
}

impl TypeChart {
    pub fn standard() -> Self {
        let mut rows = [[1.0; N_TYPES]; N_TYPES];
        for attacking in PkmType::ALL {
            for defending in PkmType::ALL {
                rows[attacking.index()][defending.index()] =
                    standard_effectiveness(attacking, defending);
            }
        }
        TypeChart { rows }
    }

    pub fn multiplier(&self, attacking: PkmType, defending: PkmType) -> f64 {
        self.rows[attacking.index()][defending.index()]
    }
}

impl Default for TypeChart {
    fn default() -> Self {
        TypeChart::standard()
    }
}

impl TryFrom<Vec<Vec<f64>>> for TypeChart {
    type Error = String;

    fn try_from(raw: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        if raw.len() != N_TYPES {
            return Err(format!("type chart needs {N_TYPES} rows, got {}", raw.len()));
        }
        let mut rows = [[1.0; N_TYPES]; N_TYPES];
        for (i, row) in raw.iter().enumerate() {
            if row.len() != N_TYPES {
                return Err(format!(
                    "type chart row {i} needs {N_TYPES} entries, got {}",
                    row.len()
                ));
            }
            for (j, value) in row.iter().enumerate() {
                if !value.is_finite() || *value < 0.0 {
                    return Err(format!("type chart entry ({i}, {j}) must be finite and >= 0"));
                }
                rows[i][j] = *value;
            }
        }
        Ok(TypeChart { rows })
    }
}

// Ref: pokemon-showdown/sim/dex-data.ts: type chart multipliers (trimmed to multipliers only).
fn standard_effectiveness(attacking: PkmType, defending: PkmType) -> f64 {
    use PkmType::*;
    match attacking {
        Normal => match defending {
            Rock | Steel => 0.5,
            Ghost => 0.0,
            _ => 1.0,
        },
        Fire => match defending {
            Fire | Water | Rock | Dragon => 0.5,
            Grass | Ice | Bug | Steel => 2.0,
            _ => 1.0,
        },
        Water => match defending {
            Water | Grass | Dragon => 0.5,
            Fire | Ground | Rock => 2.0,
            _ => 1.0,
        },
        Electric => match defending {
            Electric | Grass | Dragon => 0.5,
            Water | Flying => 2.0,
            Ground => 0.0,
            _ => 1.0,
        },
        Grass => match defending {
            Fire | Grass | Poison | Flying | Bug | Dragon | Steel => 0.5,
            Water | Ground | Rock => 2.0,
            _ => 1.0,
        },
        Ice => match defending {
            Fire | Water | Ice | Steel => 0.5,
            Grass | Ground | Flying | Dragon => 2.0,
            _ => 1.0,
        },
        Fighting => match defending {
            Normal | Ice | Rock | Dark | Steel => 2.0,
            Poison | Flying | Psychic | Bug | Fairy => 0.5,
            Ghost => 0.0,
            _ => 1.0,
        },
        Poison => match defending {
            Grass | Fairy => 2.0,
            Poison | Ground | Rock | Ghost => 0.5,
            Steel => 0.0,
            _ => 1.0,
        },
        Ground => match defending {
            Fire | Electric | Poison | Rock | Steel => 2.0,
            Grass | Bug => 0.5,
            Flying => 0.0,
            _ => 1.0,
        },
        Flying => match defending {
            Grass | Fighting | Bug => 2.0,
            Electric | Rock | Steel => 0.5,
            _ => 1.0,
        },
        Psychic => match defending {
            Fighting | Poison => 2.0,
            Psychic | Steel => 0.5,
            Dark => 0.0,
            _ => 1.0,
        },
        Bug => match defending {
            Grass | Psychic | Dark => 2.0,
            Fire | Fighting | Poison | Flying | Ghost | Steel | Fairy => 0.5,
            _ => 1.0,
        },
        Rock => match defending {
            Fire | Ice | Flying | Bug => 2.0,
            Fighting | Ground | Steel => 0.5,
            _ => 1.0,
        },
        Ghost => match defending {
            Ghost | Psychic => 2.0,
            Dark => 0.5,
            Normal => 0.0,
            _ => 1.0,
        },
        Dragon => match defending {
            Dragon => 2.0,
            Steel => 0.5,
            Fairy => 0.0,
            _ => 1.0,
        },
        Dark => match defending {
            Psychic | Ghost => 2.0,
            Fighting | Dark | Fairy => 0.5,
            _ => 1.0,
        },
        Steel => match defending {
            Rock | Ice | Fairy => 2.0,
            Fire | Water | Electric | Steel => 0.5,
            _ => 1.0,
        },
        Fairy => match defending {
            Fighting | Dragon | Dark => 2.0,
            Fire | Poison | Steel => 0.5,
            _ => 1.0,
        },
    }
}
