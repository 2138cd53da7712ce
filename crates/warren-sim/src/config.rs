//! Scenario loading: simulation knobs, map layout and initial population.

use std::path::Path;

use serde::{Deserialize, Serialize};
use warren_core::{ActionType, DecisionConfig};

use crate::{Cell, ConfigError, EntityKind, GameMap, Tile, TileKind};

/// Simulation knobs, all optional in a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for tie-breaking between equally good targets
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Seconds of game time per tick
    #[serde(default = "default_dt_seconds")]
    pub dt_seconds: f32,

    /// Ticks to run when the caller does not say
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Dig progress added per turn of digging
    #[serde(default = "default_dig_per_turn")]
    pub dig_per_turn: u32,

    /// Hardness of `#` and `D` tiles
    #[serde(default = "default_dirt_hardness")]
    pub dirt_hardness: u32,

    /// Turns of claiming to convert a tile
    #[serde(default = "default_claim_turns")]
    pub claim_turns: u32,

    /// Damage dealt per turn of attacking an object
    #[serde(default = "default_attack_per_turn")]
    pub attack_per_turn: u32,

    /// Turns a timed action (sleep, eat, ...) lasts
    #[serde(default = "default_rest_turns")]
    pub rest_turns: u32,

    /// Record a trace of stack transitions
    #[serde(default)]
    pub trace: bool,

    /// Give-up thresholds per action type
    #[serde(default = "default_decision")]
    pub decision: DecisionConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            dt_seconds: default_dt_seconds(),
            ticks: default_ticks(),
            dig_per_turn: default_dig_per_turn(),
            dirt_hardness: default_dirt_hardness(),
            claim_turns: default_claim_turns(),
            attack_per_turn: default_attack_per_turn(),
            rest_turns: default_rest_turns(),
            trace: false,
            decision: default_decision(),
        }
    }
}

fn default_seed() -> u64 {
    0x5EED
}
fn default_dt_seconds() -> f32 {
    0.1
}
fn default_ticks() -> u64 {
    200
}
fn default_dig_per_turn() -> u32 {
    2
}
fn default_dirt_hardness() -> u32 {
    6
}
fn default_claim_turns() -> u32 {
    3
}
fn default_attack_per_turn() -> u32 {
    2
}
fn default_rest_turns() -> u32 {
    5
}
fn default_decision() -> DecisionConfig {
    DecisionConfig::default()
        .with_timeout(ActionType::WalkToTile, 60)
        .with_timeout(ActionType::DigTile, 40)
        .with_timeout(ActionType::ClaimGroundTile, 20)
        .with_timeout(ActionType::ClaimWallTile, 20)
        .with_timeout(ActionType::GrabEntity, 20)
        .with_timeout(ActionType::CarryEntity, 120)
        .with_timeout(ActionType::AttackObject, 60)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureSpec {
    pub name: String,
    #[serde(default)]
    pub worker: bool,
    pub at: Cell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default = "default_entity_hp")]
    pub hp: u32,
    pub at: Cell,
}

fn default_entity_hp() -> u32 {
    4
}

/// A scenario file.
///
/// Map rows use one character per tile: `#` dirt, `D` dirt marked for
/// digging, `R` rock, `.` floor, `c` claimed floor, `W` claimed wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: SimConfig,
    pub map: Vec<String>,
    #[serde(default)]
    pub creatures: Vec<CreatureSpec>,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
}

impl Scenario {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Build the tile grid. Entities and creatures are placed by the
    /// simulation.
    pub fn build_map(&self) -> Result<GameMap, ConfigError> {
        let expected = match self.map.first() {
            Some(row) => row.chars().count(),
            None => return Err(ConfigError::EmptyMap),
        };
        if expected == 0 {
            return Err(ConfigError::EmptyMap);
        }

        let mut map = GameMap::new(
            expected as i32,
            self.map.len() as i32,
            Tile::new(TileKind::Rock),
        );
        let hardness = self.config.dirt_hardness;
        for (y, row) in self.map.iter().enumerate() {
            let found = row.chars().count();
            if found != expected {
                return Err(ConfigError::RaggedMap {
                    row: y,
                    expected,
                    found,
                });
            }
            for (x, symbol) in row.chars().enumerate() {
                let cell = Cell::new(x as i32, y as i32);
                let tile = parse_tile(symbol, hardness)
                    .ok_or(ConfigError::UnknownTile { symbol, cell })?;
                map.set_tile(cell, tile);
            }
        }

        for spec in &self.creatures {
            if !map.in_bounds(spec.at) {
                return Err(ConfigError::OutOfBounds {
                    what: spec.name.clone(),
                    cell: spec.at,
                });
            }
        }
        for spec in &self.entities {
            if !map.in_bounds(spec.at) {
                return Err(ConfigError::OutOfBounds {
                    what: spec.name.clone(),
                    cell: spec.at,
                });
            }
        }
        Ok(map)
    }
}

fn parse_tile(symbol: char, hardness: u32) -> Option<Tile> {
    let tile = match symbol {
        '#' => Tile::new(TileKind::Dirt { hardness }),
        'D' => Tile {
            marked: true,
            ..Tile::new(TileKind::Dirt { hardness })
        },
        'R' => Tile::new(TileKind::Rock),
        '.' => Tile::new(TileKind::Floor),
        'c' => Tile::new(TileKind::ClaimedFloor),
        'W' => Tile::new(TileKind::ClaimedWall),
        _ => return None,
    };
    Some(tile)
}
