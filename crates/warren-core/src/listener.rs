//! Per-entity observer sets with synchronous fan-out.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lifecycle transition of a watched entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum EntityEvent {
    Destroyed,
    RemovedFromMap,
    PickedUp,
    Dropped,
}

impl EntityEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityEvent::Destroyed => "destroyed",
            EntityEvent::RemovedFromMap => "removedFromMap",
            EntityEvent::PickedUp => "pickedUp",
            EntityEvent::Dropped => "dropped",
        }
    }
}

impl core::fmt::Display for EntityEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives fan-out for observers registered in a [`ListenerRegistry`].
///
/// Return `true` to stay subscribed, `false` once the observer no longer
/// tracks `entity` (for destroyed/removed/picked-up this means its reference
/// has already been cleared).
pub trait EntityObserver<E, O> {
    fn on_entity_event(&mut self, observer: O, entity: E, event: EntityEvent) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub detached: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRegistry<E, O> {
    entries: BTreeMap<E, Vec<O>>,
}

impl<E, O> Default for ListenerRegistry<E, O> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<E, O> ListenerRegistry<E, O>
where
    E: Copy + Ord,
    O: Copy + Eq,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `observer` was already subscribed.
    pub fn subscribe(&mut self, entity: E, observer: O) -> bool {
        let observers = self.entries.entry(entity).or_default();
        if observers.contains(&observer) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Returns `false` if `observer` was not subscribed.
    pub fn unsubscribe(&mut self, entity: E, observer: O) -> bool {
        let Some(observers) = self.entries.get_mut(&entity) else {
            return false;
        };
        let before = observers.len();
        observers.retain(|o| *o != observer);
        let removed = observers.len() != before;
        if observers.is_empty() {
            self.entries.remove(&entity);
        }
        removed
    }

    pub fn is_subscribed(&self, entity: E, observer: O) -> bool {
        self.entries
            .get(&entity)
            .is_some_and(|observers| observers.contains(&observer))
    }

    /// Observers of `entity`, in subscription order.
    pub fn observers(&self, entity: E) -> &[O] {
        self.entries.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn notify_destroyed<S>(&mut self, entity: E, sink: &mut S) -> NotifyReport
    where
        S: EntityObserver<E, O> + ?Sized,
    {
        self.notify(entity, EntityEvent::Destroyed, sink)
    }

    pub fn notify_removed_from_map<S>(&mut self, entity: E, sink: &mut S) -> NotifyReport
    where
        S: EntityObserver<E, O> + ?Sized,
    {
        self.notify(entity, EntityEvent::RemovedFromMap, sink)
    }

    pub fn notify_picked_up<S>(&mut self, entity: E, sink: &mut S) -> NotifyReport
    where
        S: EntityObserver<E, O> + ?Sized,
    {
        self.notify(entity, EntityEvent::PickedUp, sink)
    }

    pub fn notify_dropped<S>(&mut self, entity: E, sink: &mut S) -> NotifyReport
    where
        S: EntityObserver<E, O> + ?Sized,
    {
        self.notify(entity, EntityEvent::Dropped, sink)
    }

    /// Deliver `event` to every observer of `entity` in subscription order.
    ///
    /// Observers answering `false` are unsubscribed afterwards. A destroyed
    /// entity loses its whole entry once every observer has been told.
    pub fn notify<S>(&mut self, entity: E, event: EntityEvent, sink: &mut S) -> NotifyReport
    where
        S: EntityObserver<E, O> + ?Sized,
    {
        let mut report = NotifyReport::default();
        let Some(observers) = self.entries.get(&entity) else {
            return report;
        };

        let snapshot = observers.clone();
        let mut detached = Vec::new();
        for observer in snapshot {
            report.delivered += 1;
            if !sink.on_entity_event(observer, entity, event) {
                detached.push(observer);
            }
        }
        report.detached = detached.len();

        if event == EntityEvent::Destroyed {
            self.entries.remove(&entity);
        } else if !detached.is_empty() {
            if let Some(observers) = self.entries.get_mut(&entity) {
                observers.retain(|o| !detached.contains(o));
                if observers.is_empty() {
                    self.entries.remove(&entity);
                }
            }
        }

        report
    }

    /// Remove `observer` from every entity it watches.
    pub fn detach_everywhere(&mut self, observer: O) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, observers| {
            let before = observers.len();
            observers.retain(|o| *o != observer);
            removed += before - observers.len();
            !observers.is_empty()
        });
        removed
    }

    pub fn watched_entities(&self) -> impl Iterator<Item = E> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
