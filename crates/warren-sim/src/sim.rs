//! Tick sequencing plus the keeper's hand: the external flows that destroy,
//! move and pick up entities and creatures between ticks.

use serde::Serialize;
use warren_core::{
    flush_entity_events, Agent, AgentId, AgentProfile, AgentTable, DecisionLoop, TickContext,
    Transition,
};

use crate::{
    standard_loop, Cell, CreatureId, EntityId, EntityKind, GameMap, Location, PlayerLog,
    PlayerSnapshot, Scenario, SimConfig, SimError, TileKind, TraceEvent, TraceLog,
};

pub struct Simulation {
    config: SimConfig,
    map: GameMap,
    agents: AgentTable<GameMap>,
    decisions: DecisionLoop<GameMap>,
    player: PlayerLog,
    trace: Option<TraceLog>,
    tick: u64,
    next_creature: u32,
}

impl core::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("map", &self.map)
            .field("agents", &self.agents.len())
            .finish()
    }
}

impl Simulation {
    pub fn new(config: SimConfig, map: GameMap) -> Self {
        let decisions = standard_loop(&config);
        let trace = config.trace.then(TraceLog::default);
        Self {
            config,
            map,
            agents: AgentTable::new(),
            decisions,
            player: PlayerLog::new(),
            trace,
            tick: 0,
            next_creature: 0,
        }
    }

    pub fn from_scenario(scenario: &Scenario) -> Result<Self, SimError> {
        let map = scenario.build_map()?;
        let mut sim = Self::new(scenario.config.clone(), map);
        for spec in &scenario.entities {
            sim.spawn_entity(spec.name.clone(), spec.kind, spec.hp, spec.at)?;
        }
        for spec in &scenario.creatures {
            sim.spawn_creature(spec.name.clone(), spec.worker, spec.at)?;
        }
        Ok(sim)
    }

    /// Swap in a custom decision loop.
    pub fn with_decisions(mut self, decisions: DecisionLoop<GameMap>) -> Self {
        self.decisions = decisions;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    /// Direct map access for terrain edits (marking tiles, painting floor).
    /// Entity lifecycle changes go through the keeper methods instead.
    pub fn map_mut(&mut self) -> &mut GameMap {
        &mut self.map
    }

    pub fn agents(&self) -> &AgentTable<GameMap> {
        &self.agents
    }

    pub fn creature(&self, id: CreatureId) -> Option<&Agent<GameMap>> {
        self.agents.get(id)
    }

    pub fn player(&self) -> &PlayerLog {
        &self.player
    }

    pub fn trace(&self) -> Option<&TraceLog> {
        self.trace.as_ref()
    }

    fn record(&mut self, event: TraceEvent) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(event);
        }
    }

    /// Run one tick. Returns every agent's transition in stable-id order.
    pub fn step(&mut self) -> Vec<(CreatureId, Transition)> {
        let ctx = TickContext::new(self.tick, self.config.dt_seconds, self.config.seed);
        let transitions = self.decisions.tick_all(
            &ctx,
            &mut self.agents,
            &mut self.map,
            &mut self.player,
        );
        self.settle_orphans();

        if self.trace.is_some() {
            for (id, transition) in &transitions {
                if transition.changed_stack() {
                    self.record(TraceEvent::transition(self.tick, *id, *transition));
                }
            }
        }
        self.tick += 1;
        transitions
    }

    /// Run `ticks` ticks. Returns how many stack changes happened.
    pub fn run(&mut self, ticks: u64) -> usize {
        let mut changes = 0;
        for _ in 0..ticks {
            changes += self
                .step()
                .iter()
                .filter(|(_, t)| t.changed_stack())
                .count();
        }
        tracing::info!(tick = self.tick, changes, "run finished");
        changes
    }

    // Creatures.

    pub fn spawn_creature(
        &mut self,
        name: impl Into<String>,
        worker: bool,
        at: Cell,
    ) -> Result<CreatureId, SimError> {
        self.check_standable(at)?;
        let id = CreatureId(self.next_creature);
        self.next_creature += 1;
        let profile = if worker {
            AgentProfile::worker(id)
        } else {
            AgentProfile::fighter(id)
        };
        let agent = Agent::new(name, profile);
        tracing::debug!(creature = %id, name = %agent.name, worker, at = %at, "creature spawned");
        self.map.place_creature(id, at);
        self.agents.insert(agent, &mut self.map, &mut self.player);
        self.record(TraceEvent::new(self.tick, "spawn").with_a(id.stable_id()));
        Ok(id)
    }

    /// Remove a creature for good. Its stack is torn down and anything it
    /// carried falls where it stood.
    pub fn remove_creature(&mut self, id: CreatureId) -> Result<(), SimError> {
        let agent = self
            .agents
            .remove(id, &mut self.map, &mut self.player)
            .ok_or(SimError::UnknownCreature(id))?;
        let at = self.map.lift_creature(id);
        self.drop_carried_by(id, at);
        self.flush();
        tracing::debug!(creature = %id, name = %agent.name, "creature removed");
        self.record(TraceEvent::new(self.tick, "remove_creature").with_a(id.stable_id()));
        Ok(())
    }

    /// The keeper picks a creature up: its queue is cleared down to the
    /// fallback and it leaves the map until dropped.
    pub fn pick_up_creature(&mut self, id: CreatureId) -> Result<(), SimError> {
        let agent = self
            .agents
            .get_mut(id)
            .ok_or(SimError::UnknownCreature(id))?;
        let ended = agent.stack.clear_to_fallback(&mut self.map, &mut self.player);
        let at = self.map.lift_creature(id);
        self.drop_carried_by(id, at);
        self.flush();
        tracing::debug!(creature = %id, ended, "creature picked up");
        self.record(
            TraceEvent::new(self.tick, "pick_up_creature")
                .with_a(id.stable_id())
                .with_b(ended as u64),
        );
        Ok(())
    }

    pub fn drop_creature(&mut self, id: CreatureId, at: Cell) -> Result<(), SimError> {
        if !self.agents.contains(id) {
            return Err(SimError::UnknownCreature(id));
        }
        self.check_standable(at)?;
        self.map.place_creature(id, at);
        self.record(TraceEvent::new(self.tick, "drop_creature").with_a(id.stable_id()));
        Ok(())
    }

    fn check_standable(&self, at: Cell) -> Result<(), SimError> {
        match self.map.tile(at) {
            None => Err(SimError::OutOfBounds(at)),
            Some(tile) if !tile.is_passable() => Err(SimError::SpawnBlocked(at)),
            Some(_) => Ok(()),
        }
    }

    // Entities.

    pub fn spawn_entity(
        &mut self,
        name: impl Into<String>,
        kind: EntityKind,
        hp: u32,
        at: Cell,
    ) -> Result<EntityId, SimError> {
        if !self.map.in_bounds(at) {
            return Err(SimError::OutOfBounds(at));
        }
        Ok(self.map.spawn_entity(name, kind, hp, at))
    }

    pub fn destroy_entity(&mut self, id: EntityId) -> Result<(), SimError> {
        if !self.map.destroy_entity(id) {
            return Err(SimError::UnknownEntity(id));
        }
        self.after_keeper(id, "destroy");
        Ok(())
    }

    pub fn remove_entity_from_map(&mut self, id: EntityId) -> Result<(), SimError> {
        if !self.map.remove_entity_from_map(id) {
            return Err(SimError::UnknownEntity(id));
        }
        self.after_keeper(id, "remove_from_map");
        Ok(())
    }

    pub fn pick_up_entity(&mut self, id: EntityId) -> Result<(), SimError> {
        if !self.map.pick_up_entity(id) {
            return Err(SimError::UnknownEntity(id));
        }
        self.after_keeper(id, "pick_up");
        Ok(())
    }

    pub fn drop_entity(&mut self, id: EntityId, at: Cell) -> Result<(), SimError> {
        if !self.map.in_bounds(at) {
            return Err(SimError::OutOfBounds(at));
        }
        let Some(entity) = self.map.entity(id) else {
            return Err(SimError::UnknownEntity(id));
        };
        if entity.location != Location::Hand {
            return Err(SimError::NotInHand(id));
        }
        if self.map.is_carry_locked(id) {
            return Err(SimError::CarryLocked(id));
        }
        if !self.map.drop_entity(id, at) {
            return Err(SimError::UnknownEntity(id));
        }
        self.after_keeper(id, "drop");
        Ok(())
    }

    fn after_keeper(&mut self, id: EntityId, tag: &'static str) {
        let flushed = self.flush();
        tracing::debug!(entity = %id, event = tag, flushed, "keeper event");
        self.record(
            TraceEvent::new(self.tick, tag)
                .with_a(id.index as u64)
                .with_b(id.generation as u64),
        );
    }

    /// Fan out queued entity events now.
    pub fn flush(&mut self) -> usize {
        flush_entity_events(&mut self.map, &mut self.agents)
    }

    fn drop_carried_by(&mut self, carrier: CreatureId, at: Option<Cell>) {
        let carried: Vec<EntityId> = self
            .map
            .entities()
            .filter(|(_, e)| e.location == Location::Carried(carrier))
            .map(|(id, _)| id)
            .collect();
        for id in carried {
            match at {
                Some(cell) => {
                    self.map.set_down_entity(id, cell);
                }
                None => {
                    self.map.remove_entity_from_map(id);
                }
            }
        }
    }

    /// Entities still marked as carried by a creature that no longer holds
    /// their carry lock are set down where the creature stands.
    fn settle_orphans(&mut self) {
        let orphans: Vec<(EntityId, CreatureId)> = self
            .map
            .entities()
            .filter_map(|(id, e)| match e.location {
                Location::Carried(carrier) => Some((id, carrier)),
                _ => None,
            })
            .filter(|(id, carrier)| {
                self.map.carry_lock_holder(*id).map(|h| h.agent) != Some(*carrier)
            })
            .collect();
        for (id, carrier) in orphans {
            match self.map.position(carrier) {
                Some(cell) => {
                    self.map.set_down_entity(id, cell);
                    tracing::debug!(entity = %id, creature = %carrier, cell = %cell, "carried entity set down");
                }
                None => {
                    self.map.remove_entity_from_map(id);
                }
            }
        }
        self.flush();
    }

    /// Tear every creature down, releasing all claims.
    pub fn shutdown(&mut self) {
        self.agents.clear(&mut self.map, &mut self.player);
        self.flush();
    }

    pub fn summary(&self) -> Summary {
        let creatures = self
            .agents
            .iter()
            .map(|agent| CreatureSummary {
                id: agent.id(),
                name: agent.name.clone(),
                worker: agent.profile().worker,
                position: self.map.position(agent.id()),
                stack: agent
                    .stack
                    .kinds()
                    .into_iter()
                    .map(|k| k.as_str().to_string())
                    .collect(),
            })
            .collect();
        let entities = self
            .map
            .entities()
            .map(|(id, e)| EntitySummary {
                id: id.to_string(),
                name: e.name.clone(),
                kind: e.kind,
                hp: e.hp,
                location: e.location,
            })
            .collect();
        let tiles = TileSummary {
            dirt: self
                .map
                .count_tiles(|t| matches!(t.kind, TileKind::Dirt { .. }) && !t.marked),
            marked: self
                .map
                .count_tiles(|t| matches!(t.kind, TileKind::Dirt { .. }) && t.marked),
            floor: self.map.count_tiles(|t| t.kind == TileKind::Floor),
            claimed_floor: self.map.count_tiles(|t| t.kind == TileKind::ClaimedFloor),
            claimed_wall: self.map.count_tiles(|t| t.kind == TileKind::ClaimedWall),
        };
        Summary {
            tick: self.tick,
            creatures,
            entities,
            tiles,
            claims: self.map.claims().len(),
            player: self.player.snapshot(),
            trace_events: self.trace.as_ref().map_or(0, TraceLog::len),
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub tick: u64,
    pub creatures: Vec<CreatureSummary>,
    pub entities: Vec<EntitySummary>,
    pub tiles: TileSummary,
    pub claims: usize,
    pub player: PlayerSnapshot,
    pub trace_events: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatureSummary {
    pub id: CreatureId,
    pub name: String,
    pub worker: bool,
    pub position: Option<Cell>,
    pub stack: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntitySummary {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub hp: u32,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileSummary {
    pub dirt: usize,
    pub marked: usize,
    pub floor: usize,
    pub claimed_floor: usize,
    pub claimed_wall: usize,
}
