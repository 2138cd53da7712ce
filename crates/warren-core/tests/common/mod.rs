#![allow(dead_code)]

use warren_core::{
    ActionId, ClaimKind, ClaimSite, ClaimTable, EntityEvent, EntityWorld, ListenerRegistry,
    TileWorld, WorldView,
};

pub type Cell = (i32, i32);
pub type Entity = u32;
pub type Holder = ActionId<u64>;

/// Minimal world: claims and listeners only, plus a queue of raised events.
#[derive(Debug, Default)]
pub struct RecordingWorld {
    pub claims: ClaimTable<ClaimSite<Cell, Entity>, Holder>,
    pub listeners: ListenerRegistry<Entity, Holder>,
    pub pending: Vec<(Entity, EntityEvent)>,
    pub finalized: Vec<(Entity, EntityEvent)>,
    /// Entities that refuse every carry lock.
    pub unlockable: Vec<Entity>,
}

impl RecordingWorld {
    pub fn digging_worker(&self, cell: Cell) -> Option<u64> {
        self.claims
            .holder(ClaimSite::Cell(cell), ClaimKind::Digging)
            .map(|h| h.agent)
    }

    pub fn claiming_worker(&self, cell: Cell) -> Option<u64> {
        self.claims
            .holder(ClaimSite::Cell(cell), ClaimKind::Claiming)
            .map(|h| h.agent)
    }

    pub fn carry_lock(&self, entity: Entity) -> Option<Holder> {
        self.claims
            .holder(ClaimSite::Entity(entity), ClaimKind::CarryLock)
    }

    pub fn raise(&mut self, entity: Entity, event: EntityEvent) {
        self.pending.push((entity, event));
    }
}

impl WorldView for RecordingWorld {
    type Agent = u64;
    type Cell = Cell;
    type Entity = Entity;
}

impl TileWorld for RecordingWorld {
    fn add_worker_digging(&mut self, cell: Cell, holder: Holder) -> bool {
        self.claims
            .acquire(ClaimSite::Cell(cell), ClaimKind::Digging, holder)
            .is_granted()
    }

    fn remove_worker_digging(&mut self, cell: Cell, holder: Holder) {
        self.claims
            .release(ClaimSite::Cell(cell), ClaimKind::Digging, holder);
    }

    fn add_worker_claiming(&mut self, cell: Cell, holder: Holder) -> bool {
        self.claims
            .acquire(ClaimSite::Cell(cell), ClaimKind::Claiming, holder)
            .is_granted()
    }

    fn remove_worker_claiming(&mut self, cell: Cell, holder: Holder) {
        self.claims
            .release(ClaimSite::Cell(cell), ClaimKind::Claiming, holder);
    }
}

impl EntityWorld for RecordingWorld {
    fn listeners(&self) -> &ListenerRegistry<Entity, Holder> {
        &self.listeners
    }

    fn listeners_mut(&mut self) -> &mut ListenerRegistry<Entity, Holder> {
        &mut self.listeners
    }

    fn set_carry_lock(&mut self, entity: Entity, holder: Holder, locked: bool) -> bool {
        let site = ClaimSite::Entity(entity);
        if locked {
            if self.unlockable.contains(&entity) {
                return false;
            }
            self.claims
                .acquire(site, ClaimKind::CarryLock, holder)
                .is_granted()
        } else {
            self.claims.release(site, ClaimKind::CarryLock, holder);
            false
        }
    }

    fn drain_entity_events(&mut self) -> Vec<(Entity, EntityEvent)> {
        std::mem::take(&mut self.pending)
    }

    fn finalize_entity_event(&mut self, entity: Entity, event: EntityEvent) {
        if event == EntityEvent::Destroyed {
            self.claims.forget_resource(ClaimSite::Entity(entity));
        }
        self.finalized.push((entity, event));
    }
}
