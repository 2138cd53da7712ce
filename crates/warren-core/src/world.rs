use core::fmt::Debug;

use crate::{ActionId, AgentId, EntityEvent, ListenerRegistry};

/// Identity types of a world.
///
/// The core never looks inside cells or entities; it only needs to copy,
/// order and print their handles.
pub trait WorldView {
    type Agent: AgentId;
    type Cell: Copy + Ord + Debug + 'static;
    type Entity: Copy + Ord + Debug + 'static;
}

/// Tile side of the world: digging and claiming workers per cell.
///
/// `add_*` returns whether the claim is now held by `holder`. `remove_*` must
/// be a no-op when `holder` does not hold the claim.
pub trait TileWorld: WorldView {
    fn add_worker_digging(&mut self, cell: Self::Cell, holder: ActionId<Self::Agent>) -> bool;
    fn remove_worker_digging(&mut self, cell: Self::Cell, holder: ActionId<Self::Agent>);
    fn add_worker_claiming(&mut self, cell: Self::Cell, holder: ActionId<Self::Agent>) -> bool;
    fn remove_worker_claiming(&mut self, cell: Self::Cell, holder: ActionId<Self::Agent>);
}

/// Entity side of the world: listeners and carry locks.
pub trait EntityWorld: WorldView {
    fn listeners(&self) -> &ListenerRegistry<Self::Entity, ActionId<Self::Agent>>;
    fn listeners_mut(&mut self) -> &mut ListenerRegistry<Self::Entity, ActionId<Self::Agent>>;

    /// Lock (`locked = true`) or unlock an entity for carrying. Returns whether
    /// `holder` holds the lock after a lock request; unlocking by a
    /// non-holder is a no-op.
    fn set_carry_lock(
        &mut self,
        entity: Self::Entity,
        holder: ActionId<Self::Agent>,
        locked: bool,
    ) -> bool;

    fn add_entity_listener(&mut self, entity: Self::Entity, listener: ActionId<Self::Agent>) {
        self.listeners_mut().subscribe(entity, listener);
    }

    fn remove_entity_listener(&mut self, entity: Self::Entity, listener: ActionId<Self::Agent>) {
        self.listeners_mut().unsubscribe(entity, listener);
    }

    /// Lifecycle events raised by the world itself (e.g. an attack destroying
    /// an object) that still have to be fanned out.
    fn drain_entity_events(&mut self) -> Vec<(Self::Entity, EntityEvent)> {
        Vec::new()
    }

    /// Called once every observer has seen `event`.
    fn finalize_entity_event(&mut self, _entity: Self::Entity, _event: EntityEvent) {}
}

/// Full collaborator surface an action needs.
pub trait WorldMut: TileWorld + EntityWorld {}

impl<T> WorldMut for T where T: TileWorld + EntityWorld {}
