//! Generation-checked entity storage.

use serde::{Deserialize, Serialize};

use crate::{Cell, CreatureId};

/// Handle to an entity. A freed slot gets a new generation, so handles to the
/// old occupant never resolve again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "e{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    GoldPile,
    Crate,
    Trap,
}

impl EntityKind {
    pub fn carryable(self) -> bool {
        matches!(self, EntityKind::GoldPile | EntityKind::Crate)
    }

    pub fn attackable(self) -> bool {
        matches!(self, EntityKind::Trap | EntityKind::Crate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    Map(Cell),
    Carried(CreatureId),
    /// In the keeper's hand.
    Hand,
    /// Removed from the map but not destroyed.
    Limbo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub hp: u32,
    pub location: Location,
}

impl Entity {
    pub fn cell(&self) -> Option<Cell> {
        match self.location {
            Location::Map(cell) => Some(cell),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

#[derive(Debug, Clone, Default)]
pub struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.entity = Some(entity);
                return EntityId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entity: Some(entity),
        });
        EntityId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_mut()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entity.as_ref().map(|entity| {
                (
                    EntityId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    entity,
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entity.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gold() -> Entity {
        Entity {
            name: "gold".to_string(),
            kind: EntityKind::GoldPile,
            hp: 1,
            location: Location::Limbo,
        }
    }

    #[test]
    fn recycled_slot_does_not_resolve_stale_handle() {
        let mut arena = EntityArena::new();
        let first = arena.insert(gold());
        assert!(arena.remove(first).is_some());

        let second = arena.insert(gold());
        assert_eq!(second.index, first.index);
        assert_ne!(second, first);
        assert!(arena.get(first).is_none());
        assert!(arena.remove(first).is_none());
        assert!(arena.contains(second));
    }
}
