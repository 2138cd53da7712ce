use std::path::PathBuf;

use thiserror::Error;

use crate::{Cell, CreatureId, EntityId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("scenario map has no rows")]
    EmptyMap,

    #[error("map row {row} has width {found}, expected {expected}")]
    RaggedMap {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown tile {symbol:?} at {cell}")]
    UnknownTile { symbol: char, cell: Cell },

    #[error("{what} placed outside the map at {cell}")]
    OutOfBounds { what: String, cell: Cell },
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown creature {0}")]
    UnknownCreature(CreatureId),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("cell {0} is outside the map")]
    OutOfBounds(Cell),

    #[error("entity {0} is not in the keeper's hand")]
    NotInHand(EntityId),

    #[error("entity {0} is carry-locked by a creature")]
    CarryLocked(EntityId),

    #[error("cannot place a creature on impassable cell {0}")]
    SpawnBlocked(Cell),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
