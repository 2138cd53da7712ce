//! Reference world: a tile grid, entities and creature positions.
//!
//! Implements the tile and entity collaborator traits of `warren-core`.
//! Claims of every kind live in one [`ClaimTable`]; entity events raised by
//! the map are queued and finalized only after their fan-out.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use warren_core::{
    ActionId, AgentId, ClaimKind, ClaimSite, ClaimTable, EntityEvent, EntityWorld,
    ListenerRegistry, TileWorld, WorldView,
};

use crate::{Entity, EntityArena, EntityId, EntityKind, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn neighbors(self) -> [Cell; 4] {
        [
            Cell::new(self.x, self.y - 1),
            Cell::new(self.x + 1, self.y),
            Cell::new(self.x, self.y + 1),
            Cell::new(self.x - 1, self.y),
        ]
    }

    /// One step toward `target` along the axis with the larger gap.
    pub fn step_toward(self, target: Cell) -> Cell {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        if dx == 0 && dy == 0 {
            return self;
        }
        if dx.abs() >= dy.abs() {
            Cell::new(self.x + dx.signum(), self.y)
        } else {
            Cell::new(self.x, self.y + dy.signum())
        }
    }
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CreatureId(pub u32);

impl AgentId for CreatureId {
    fn stable_id(self) -> u64 {
        self.0 as u64
    }
}

impl core::fmt::Display for CreatureId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

pub type Holder = ActionId<CreatureId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileKind {
    Dirt { hardness: u32 },
    Rock,
    Floor,
    ClaimedFloor,
    ClaimedWall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    /// Marked for digging by the keeper.
    pub marked: bool,
    pub progress: u32,
}

impl Tile {
    pub const fn new(kind: TileKind) -> Self {
        Self {
            kind,
            marked: false,
            progress: 0,
        }
    }

    pub fn is_diggable(&self) -> bool {
        self.marked && matches!(self.kind, TileKind::Dirt { .. })
    }

    pub fn is_passable(&self) -> bool {
        matches!(self.kind, TileKind::Floor | TileKind::ClaimedFloor)
    }
}

pub struct GameMap {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    claims: ClaimTable<ClaimSite<Cell, EntityId>, Holder>,
    listeners: ListenerRegistry<EntityId, Holder>,
    entities: EntityArena,
    positions: BTreeMap<CreatureId, Cell>,
    pending: Vec<(EntityId, EntityEvent)>,
    dying: BTreeSet<EntityId>,
}

impl core::fmt::Debug for GameMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GameMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("claims", &self.claims.len())
            .field("listeners", &self.listeners.len())
            .field("entities", &self.entities.len())
            .field("pending", &self.pending)
            .finish()
    }
}

impl GameMap {
    /// A map filled with `fill`.
    pub fn new(width: i32, height: i32, fill: Tile) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![fill; (width * height) as usize],
            claims: ClaimTable::new(),
            listeners: ListenerRegistry::new(),
            entities: EntityArena::new(),
            positions: BTreeMap::new(),
            pending: Vec::new(),
            dying: BTreeSet::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.in_bounds(cell).then(|| (cell.y * self.width + cell.x) as usize)
    }

    pub fn tile(&self, cell: Cell) -> Option<&Tile> {
        self.tiles.get(self.index(cell)?)
    }

    pub fn tile_mut(&mut self, cell: Cell) -> Option<&mut Tile> {
        let index = self.index(cell)?;
        self.tiles.get_mut(index)
    }

    pub fn set_tile(&mut self, cell: Cell, tile: Tile) -> bool {
        match self.tile_mut(cell) {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Cell::new(x, y)))
    }

    pub fn count_tiles(&self, pred: impl Fn(&Tile) -> bool) -> usize {
        self.tiles.iter().filter(|t| pred(t)).count()
    }

    // Claims.

    pub fn claims(&self) -> &ClaimTable<ClaimSite<Cell, EntityId>, Holder> {
        &self.claims
    }

    pub fn digging_worker(&self, cell: Cell) -> Option<CreatureId> {
        self.claims
            .holder(ClaimSite::Cell(cell), ClaimKind::Digging)
            .map(|h| h.agent)
    }

    pub fn claiming_worker(&self, cell: Cell) -> Option<CreatureId> {
        self.claims
            .holder(ClaimSite::Cell(cell), ClaimKind::Claiming)
            .map(|h| h.agent)
    }

    pub fn carry_lock_holder(&self, entity: EntityId) -> Option<Holder> {
        self.claims.holder(ClaimSite::Entity(entity), ClaimKind::CarryLock)
    }

    pub fn is_carry_locked(&self, entity: EntityId) -> bool {
        self.carry_lock_holder(entity).is_some()
    }

    // Creatures.

    pub fn position(&self, creature: CreatureId) -> Option<Cell> {
        self.positions.get(&creature).copied()
    }

    pub fn place_creature(&mut self, creature: CreatureId, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        self.positions.insert(creature, cell);
        true
    }

    pub fn lift_creature(&mut self, creature: CreatureId) -> Option<Cell> {
        self.positions.remove(&creature)
    }

    // Entities.

    pub fn spawn_entity(
        &mut self,
        name: impl Into<String>,
        kind: EntityKind,
        hp: u32,
        cell: Cell,
    ) -> EntityId {
        self.entities.insert(Entity {
            name: name.into(),
            kind,
            hp,
            location: Location::Map(cell),
        })
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_dying(&self, id: EntityId) -> bool {
        self.dying.contains(&id)
    }

    /// Carrier picks `id` up. Not a lifecycle event: the carrier holds the
    /// carry lock.
    pub fn lift_entity(&mut self, id: EntityId, carrier: CreatureId) -> bool {
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.location = Location::Carried(carrier);
                true
            }
            None => false,
        }
    }

    pub fn set_down_entity(&mut self, id: EntityId, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.location = Location::Map(cell);
                true
            }
            None => false,
        }
    }

    /// Queue destruction. The record stays readable until the event has
    /// been fanned out and finalized.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        if !self.entities.contains(id) || !self.dying.insert(id) {
            return false;
        }
        self.pending.push((id, EntityEvent::Destroyed));
        true
    }

    pub fn remove_entity_from_map(&mut self, id: EntityId) -> bool {
        self.relocate(id, Location::Limbo, EntityEvent::RemovedFromMap)
    }

    pub fn pick_up_entity(&mut self, id: EntityId) -> bool {
        self.relocate(id, Location::Hand, EntityEvent::PickedUp)
    }

    /// Keeper drops an entity out of the hand. Refused unless `id` is in
    /// the hand and nobody holds its carry lock.
    pub fn drop_entity(&mut self, id: EntityId, cell: Cell) -> bool {
        if !self.in_bounds(cell) || !self.is_droppable(id) {
            return false;
        }
        self.relocate(id, Location::Map(cell), EntityEvent::Dropped)
    }

    fn is_droppable(&self, id: EntityId) -> bool {
        self.entities
            .get(id)
            .is_some_and(|e| e.location == Location::Hand)
            && !self.is_carry_locked(id)
    }

    fn relocate(&mut self, id: EntityId, location: Location, event: EntityEvent) -> bool {
        if self.dying.contains(&id) {
            return false;
        }
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.location = location;
                self.pending.push((id, event));
                true
            }
            None => false,
        }
    }

    // Targets for the reference behaviors.

    pub fn dig_targets(&self) -> Vec<Cell> {
        self.cells()
            .filter(|c| self.tile(*c).is_some_and(Tile::is_diggable))
            .filter(|c| self.digging_worker(*c).is_none())
            .filter(|c| self.stand_cell_near(*c, *c).is_some())
            .collect()
    }

    pub fn ground_claim_targets(&self) -> Vec<Cell> {
        self.cells()
            .filter(|c| self.tile(*c).is_some_and(|t| t.kind == TileKind::Floor))
            .filter(|c| self.claiming_worker(*c).is_none())
            .collect()
    }

    pub fn is_claimable_wall(&self, cell: Cell) -> bool {
        let Some(tile) = self.tile(cell) else {
            return false;
        };
        matches!(tile.kind, TileKind::Dirt { .. })
            && !tile.marked
            && cell
                .neighbors()
                .iter()
                .any(|n| self.tile(*n).is_some_and(|t| t.kind == TileKind::ClaimedFloor))
    }

    pub fn wall_claim_targets(&self) -> Vec<Cell> {
        self.cells()
            .filter(|c| self.is_claimable_wall(*c))
            .filter(|c| self.claiming_worker(*c).is_none())
            .collect()
    }

    /// Loose carryable entities not yet resting on claimed floor.
    pub fn carry_targets(&self) -> Vec<(EntityId, Cell)> {
        self.entities
            .iter()
            .filter(|(id, e)| {
                e.kind.carryable() && !self.is_carry_locked(*id) && !self.is_dying(*id)
            })
            .filter_map(|(id, e)| e.cell().map(|cell| (id, cell)))
            .filter(|(_, cell)| {
                self.tile(*cell)
                    .is_some_and(|t| t.kind != TileKind::ClaimedFloor)
            })
            .collect()
    }

    pub fn attack_targets(&self) -> Vec<(EntityId, Cell)> {
        self.entities
            .iter()
            .filter(|(id, e)| e.kind.attackable() && !self.is_dying(*id))
            .filter_map(|(id, e)| e.cell().map(|cell| (id, cell)))
            .collect()
    }

    /// Nearest claimed floor cell to `from`.
    pub fn nearest_stockpile(&self, from: Cell) -> Option<Cell> {
        self.cells()
            .filter(|c| self.tile(*c).is_some_and(|t| t.kind == TileKind::ClaimedFloor))
            .min_by_key(|c| (c.distance(from), *c))
    }

    /// Passable neighbor of `target` closest to `from`.
    pub fn stand_cell_near(&self, target: Cell, from: Cell) -> Option<Cell> {
        target
            .neighbors()
            .into_iter()
            .filter(|n| self.tile(*n).is_some_and(Tile::is_passable))
            .min_by_key(|n| (n.distance(from), *n))
    }

    /// Add `amount` of digging to `cell`. Returns `true` when the tile gave
    /// way and became floor.
    pub fn dig(&mut self, cell: Cell, amount: u32) -> bool {
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };
        let TileKind::Dirt { hardness } = tile.kind else {
            return false;
        };
        tile.progress = tile.progress.saturating_add(amount);
        if tile.progress < hardness {
            return false;
        }
        *tile = Tile::new(TileKind::Floor);
        true
    }

    /// Add one turn of claiming to `cell`. Returns `true` once converted.
    pub fn claim(&mut self, cell: Cell, turns_needed: u32) -> bool {
        let wall = self.is_claimable_wall(cell);
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };
        let converted = match tile.kind {
            TileKind::Floor => TileKind::ClaimedFloor,
            TileKind::Dirt { .. } if wall => TileKind::ClaimedWall,
            _ => return false,
        };
        tile.progress = tile.progress.saturating_add(1);
        if tile.progress < turns_needed {
            return false;
        }
        *tile = Tile::new(converted);
        true
    }
}

impl WorldView for GameMap {
    type Agent = CreatureId;
    type Cell = Cell;
    type Entity = EntityId;
}

impl TileWorld for GameMap {
    fn add_worker_digging(&mut self, cell: Cell, holder: Holder) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        self.claims
            .acquire(ClaimSite::Cell(cell), ClaimKind::Digging, holder)
            .is_granted()
    }

    fn remove_worker_digging(&mut self, cell: Cell, holder: Holder) {
        self.claims.release(ClaimSite::Cell(cell), ClaimKind::Digging, holder);
    }

    fn add_worker_claiming(&mut self, cell: Cell, holder: Holder) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        self.claims
            .acquire(ClaimSite::Cell(cell), ClaimKind::Claiming, holder)
            .is_granted()
    }

    fn remove_worker_claiming(&mut self, cell: Cell, holder: Holder) {
        self.claims.release(ClaimSite::Cell(cell), ClaimKind::Claiming, holder);
    }
}

impl EntityWorld for GameMap {
    fn listeners(&self) -> &ListenerRegistry<EntityId, Holder> {
        &self.listeners
    }

    fn listeners_mut(&mut self) -> &mut ListenerRegistry<EntityId, Holder> {
        &mut self.listeners
    }

    fn set_carry_lock(&mut self, entity: EntityId, holder: Holder, locked: bool) -> bool {
        let site = ClaimSite::Entity(entity);
        if !locked {
            self.claims.release(site, ClaimKind::CarryLock, holder);
            return false;
        }
        if !self.entities.contains(entity) || self.dying.contains(&entity) {
            return false;
        }
        self.claims
            .acquire(site, ClaimKind::CarryLock, holder)
            .is_granted()
    }

    fn drain_entity_events(&mut self) -> Vec<(EntityId, EntityEvent)> {
        std::mem::take(&mut self.pending)
    }

    fn finalize_entity_event(&mut self, entity: EntityId, event: EntityEvent) {
        if event != EntityEvent::Destroyed {
            return;
        }
        self.dying.remove(&entity);
        self.claims.forget_resource(ClaimSite::Entity(entity));
        if let Some(removed) = self.entities.remove(entity) {
            tracing::debug!(entity = %entity, name = %removed.name, "entity finalized");
        }
    }
}
