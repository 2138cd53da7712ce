use core::fmt::Debug;
use std::collections::BTreeMap;

use crate::{ActionId, ActionStack, EntityEvent, EntityObserver, WorkerNotifier, WorldMut, WorldView};

/// Stable identifier for an agent.
///
/// Deterministic simulation requires:
/// - stable ordering (`Ord`)
/// - a stable numeric ID (`stable_id`) for seeding and logs
pub trait AgentId: Copy + Ord + Eq + Debug + 'static {
    fn stable_id(self) -> u64;
}

impl AgentId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl AgentId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

/// Identity plus capabilities relevant to the action engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile<A> {
    pub id: A,
    /// Workers report action transitions to their player.
    pub worker: bool,
}

impl<A> AgentProfile<A> {
    pub const fn worker(id: A) -> Self {
        Self { id, worker: true }
    }

    pub const fn fighter(id: A) -> Self {
        Self { id, worker: false }
    }
}

/// An agent: a name for logs and its action stack.
#[derive(Debug)]
pub struct Agent<W: WorldView> {
    pub name: String,
    pub stack: ActionStack<W>,
}

impl<W: WorldView> Agent<W> {
    pub fn new(name: impl Into<String>, profile: AgentProfile<W::Agent>) -> Self {
        Self {
            name: name.into(),
            stack: ActionStack::new(profile),
        }
    }

    pub fn id(&self) -> W::Agent {
        self.stack.owner().id
    }

    pub fn profile(&self) -> AgentProfile<W::Agent> {
        self.stack.owner()
    }
}

/// All simulated agents, iterated in stable-id order.
///
/// Also the fan-out target for entity listeners: an [`ActionId`] names the
/// agent and the action on its stack.
#[derive(Debug)]
pub struct AgentTable<W: WorldView> {
    agents: BTreeMap<W::Agent, Agent<W>>,
}

impl<W: WorldView> Default for AgentTable<W> {
    fn default() -> Self {
        Self {
            agents: BTreeMap::new(),
        }
    }
}

impl<W: WorldView> AgentTable<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: W::Agent) -> Option<&Agent<W>> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: W::Agent) -> Option<&mut Agent<W>> {
        self.agents.get_mut(&id)
    }

    pub fn contains(&self, id: W::Agent) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<W::Agent> {
        self.agents.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent<W>> + '_ {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl<W: WorldMut> AgentTable<W> {
    /// Add an agent and start its fallback action. Returns `false` if the id
    /// is already taken; the new agent is discarded untouched.
    pub fn insert(
        &mut self,
        mut agent: Agent<W>,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> bool {
        let id = agent.id();
        if self.agents.contains_key(&id) {
            return false;
        }
        agent.stack.start(world, notifier);
        self.agents.insert(id, agent);
        true
    }

    /// Tear the agent's stack down and remove it.
    pub fn remove(
        &mut self,
        id: W::Agent,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> Option<Agent<W>> {
        let mut agent = self.agents.remove(&id)?;
        let ended = agent.stack.teardown(world, notifier);
        tracing::debug!(agent = ?id, ended, "agent removed");
        Some(agent)
    }

    /// Tear every agent down, in stable-id order.
    pub fn clear(&mut self, world: &mut W, notifier: &mut dyn WorkerNotifier<W::Agent>) {
        for id in self.ids() {
            self.remove(id, world, notifier);
        }
    }
}

impl<W: WorldView> EntityObserver<W::Entity, ActionId<W::Agent>> for AgentTable<W> {
    fn on_entity_event(
        &mut self,
        observer: ActionId<W::Agent>,
        entity: W::Entity,
        event: EntityEvent,
    ) -> bool {
        match self.agents.get_mut(&observer.agent) {
            Some(agent) => agent.stack.on_entity_event(observer.serial, entity, event),
            None => false,
        }
    }
}

/// Fan out every pending world-raised entity event, then let the world
/// finalize the entity. Repeats until the world has nothing left to report.
pub fn flush_entity_events<W: WorldMut>(world: &mut W, agents: &mut AgentTable<W>) -> usize {
    let mut flushed = 0;
    loop {
        let events = world.drain_entity_events();
        if events.is_empty() {
            return flushed;
        }
        for (entity, event) in events {
            let report = world.listeners_mut().notify(entity, event, agents);
            tracing::trace!(
                entity = ?entity,
                event = %event,
                delivered = report.delivered,
                detached = report.detached,
                "entity event"
            );
            world.finalize_entity_event(entity, event);
            flushed += 1;
        }
    }
}
