use std::collections::BTreeMap;

use serde::Serialize;
use warren_core::{ActionType, WorkerEvent, WorkerNotifier};

use crate::CreatureId;

/// The keeper's view of its workers: how many are busy with each action
/// type, plus the raw notification stream.
#[derive(Debug, Default)]
pub struct PlayerLog {
    active: BTreeMap<ActionType, u32>,
    events: Vec<WorkerEvent<CreatureId>>,
    unmatched_stops: u32,
}

impl PlayerLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers_doing(&self, action: ActionType) -> u32 {
        self.active.get(&action).copied().unwrap_or(0)
    }

    pub fn total_active(&self) -> u32 {
        self.active.values().sum()
    }

    pub fn events(&self) -> &[WorkerEvent<CreatureId>] {
        &self.events
    }

    /// Stops that had no matching start. Always zero unless the notifier
    /// contract was broken.
    pub fn unmatched_stops(&self) -> u32 {
        self.unmatched_stops
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            active: self
                .active
                .iter()
                .filter(|(_, n)| **n > 0)
                .map(|(kind, n)| (kind.as_str().to_string(), *n))
                .collect(),
            notifications: self.events.len(),
        }
    }
}

impl WorkerNotifier<CreatureId> for PlayerLog {
    fn worker_started(&mut self, agent: CreatureId, action: ActionType) {
        *self.active.entry(action).or_insert(0) += 1;
        self.events.push(WorkerEvent::Started(agent, action));
    }

    fn worker_stopped(&mut self, agent: CreatureId, action: ActionType) {
        match self.active.get_mut(&action) {
            Some(count) if *count > 0 => *count -= 1,
            _ => {
                self.unmatched_stops += 1;
                tracing::error!(agent = %agent, action = %action, "worker stopped an action it never started");
            }
        }
        self.events.push(WorkerEvent::Stopped(agent, action));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub active: BTreeMap<String, u32>,
    pub notifications: usize,
}
