//! Reference dungeon world for `warren-core`.
//!
//! A small tile grid with diggable dirt, claimable floor and walls, a
//! generation-checked entity arena, a player log that counts busy workers,
//! and behaviors for every action type. [`Simulation`] runs it tick by tick
//! and exposes the keeper's hand for the external events that invalidate
//! actions mid-flight.

#![forbid(unsafe_code)]

pub mod behaviors;
pub mod config;
pub mod entity;
pub mod error;
pub mod map;
pub mod player;
pub mod sim;
pub mod trace;

pub use behaviors::standard_loop;
pub use config::{CreatureSpec, EntitySpec, Scenario, SimConfig};
pub use entity::{Entity, EntityArena, EntityId, EntityKind, Location};
pub use error::{ConfigError, SimError};
pub use map::{Cell, CreatureId, GameMap, Holder, Tile, TileKind};
pub use player::{PlayerLog, PlayerSnapshot};
pub use sim::{CreatureSummary, EntitySummary, Simulation, Summary, TileSummary};
pub use trace::{TraceEvent, TraceLog};
