//! Reference behaviors for [`GameMap`] creatures.
//!
//! Movement is a greedy step toward the goal; there is no pathfinding. Work
//! actions walk next to their target by pushing `walkToTile` on top of
//! themselves and resume once it pops.

use warren_core::{
    Action, ActionRequest, ActionType, AgentProfile, Behavior, DecisionLoop, DeterministicRng,
    Step, TickContext,
};

use crate::{Cell, CreatureId, EntityId, GameMap, SimConfig, TileKind};

type Request = ActionRequest<GameMap>;

const STREAM_TARGET: u64 = 1;
const STREAM_REST: u64 = 2;

/// Decision loop with a behavior for every action type.
pub fn standard_loop(config: &SimConfig) -> DecisionLoop<GameMap> {
    let mut decisions = DecisionLoop::new(config.decision.clone());
    decisions
        .register(ActionType::Idle, Box::new(IdleBehavior::default()))
        .register(ActionType::WalkToTile, Box::new(WalkBehavior))
        .register(ActionType::SearchTileToDig, Box::new(SearchBehavior::Dig))
        .register(ActionType::SearchGroundTileToClaim, Box::new(SearchBehavior::Ground))
        .register(ActionType::SearchWallTileToClaim, Box::new(SearchBehavior::Wall))
        .register(ActionType::SearchEntityToCarry, Box::new(SearchBehavior::Carry))
        .register(
            ActionType::DigTile,
            Box::new(DigBehavior {
                per_turn: config.dig_per_turn,
            }),
        )
        .register(
            ActionType::ClaimGroundTile,
            Box::new(ClaimBehavior {
                turns: config.claim_turns,
            }),
        )
        .register(
            ActionType::ClaimWallTile,
            Box::new(ClaimBehavior {
                turns: config.claim_turns,
            }),
        )
        .register(ActionType::GrabEntity, Box::new(GrabBehavior))
        .register(ActionType::CarryEntity, Box::new(CarryBehavior))
        .register(
            ActionType::AttackObject,
            Box::new(AttackBehavior {
                damage: config.attack_per_turn,
            }),
        );
    for kind in TIMED {
        decisions.register(
            kind,
            Box::new(TimedBehavior {
                turns: config.rest_turns,
            }),
        );
    }
    decisions
}

const TIMED: [ActionType; 9] = [
    ActionType::Sleep,
    ActionType::Eat,
    ActionType::Job,
    ActionType::FindHome,
    ActionType::GetFee,
    ActionType::LeaveDungeon,
    ActionType::Fight,
    ActionType::FightArena,
    ActionType::Flee,
];

/// Nearest candidate to `from`; equally near candidates are tie-broken with
/// the agent's deterministic stream.
fn nearest<T: Copy>(
    ctx: &TickContext,
    agent: CreatureId,
    from: Cell,
    candidates: impl IntoIterator<Item = (T, Cell)>,
) -> Option<(T, Cell)> {
    let candidates: Vec<(T, Cell)> = candidates.into_iter().collect();
    let best = candidates.iter().map(|(_, c)| c.distance(from)).min()?;
    let closest: Vec<(T, Cell)> = candidates
        .into_iter()
        .filter(|(_, c)| c.distance(from) == best)
        .collect();
    let mut rng = ctx.rng_for_agent(agent, STREAM_TARGET);
    rng.pick(&closest).copied()
}

fn walk_to(cell: Cell, adjacent: bool) -> Step<GameMap> {
    Step::Push(Request::new(ActionType::WalkToTile).at_cell(cell).with_flag(adjacent))
}

/// Bottom-of-stack job selection.
///
/// Workers look for digging, then hauling loose objects to claimed floor,
/// then ground claiming, then wall claiming. Fighters go after traps and
/// crates and otherwise nap now and then.
#[derive(Debug)]
pub struct IdleBehavior {
    /// One in `nap_odds` idle turns a fighter goes to sleep.
    pub nap_odds: usize,
}

impl Default for IdleBehavior {
    fn default() -> Self {
        Self { nap_odds: 16 }
    }
}

impl Behavior<GameMap> for IdleBehavior {
    fn step(
        &mut self,
        ctx: &TickContext,
        agent: AgentProfile<CreatureId>,
        _action: &Action<GameMap>,
        world: &mut GameMap,
    ) -> Step<GameMap> {
        let Some(pos) = world.position(agent.id) else {
            return Step::Continue;
        };

        if agent.worker {
            if !world.dig_targets().is_empty() {
                return Step::Push(Request::new(ActionType::SearchTileToDig));
            }
            if !world.carry_targets().is_empty() && world.nearest_stockpile(pos).is_some() {
                return Step::Push(Request::new(ActionType::SearchEntityToCarry));
            }
            if !world.ground_claim_targets().is_empty() {
                return Step::Push(Request::new(ActionType::SearchGroundTileToClaim));
            }
            if !world.wall_claim_targets().is_empty() {
                return Step::Push(Request::new(ActionType::SearchWallTileToClaim));
            }
            return Step::Continue;
        }

        if let Some((entity, cell)) = nearest(ctx, agent.id, pos, world.attack_targets()) {
            return Step::Push(
                Request::new(ActionType::AttackObject)
                    .on_entity(entity)
                    .at_cell(cell),
            );
        }
        let mut rng = ctx.rng_for_agent(agent.id, STREAM_REST);
        if self.nap_odds > 0 && rng.pick_index(self.nap_odds) == Some(0) {
            return Step::Push(Request::new(ActionType::Sleep));
        }
        Step::Continue
    }
}

/// Greedy one-cell step per tick toward the action cell. With the flag set,
/// stopping next to the cell is enough.
#[derive(Debug)]
pub struct WalkBehavior;

impl Behavior<GameMap> for WalkBehavior {
    fn step(
        &mut self,
        _ctx: &TickContext,
        agent: AgentProfile<CreatureId>,
        action: &Action<GameMap>,
        world: &mut GameMap,
    ) -> Step<GameMap> {
        let (Some(pos), Some(target)) = (world.position(agent.id), action.cell()) else {
            return Step::Abandon;
        };
        let goal = if action.flag() { 1 } else { 0 };
        let distance = pos.distance(target);
        if distance <= goal {
            return Step::Complete;
        }

        let next = pos
            .neighbors()
            .into_iter()
            .filter(|n| world.tile(*n).is_some_and(|t| t.is_passable()))
            .filter(|n| n.distance(target) < distance)
            .min_by_key(|n| (n.distance(target), *n != pos.step_toward(target)));
        match next {
            Some(next) => {
                world.place_creature(agent.id, next);
                if next.distance(target) <= goal {
                    Step::Complete
                } else {
                    Step::Continue
                }
            }
            None => {
                tracing::debug!(creature = %agent.id, from = %pos, to = %target, "walk blocked");
                Step::Abandon
            }
        }
    }
}

/// Pick a target and replace the search with the work action on it.
#[derive(Debug, Clone, Copy)]
pub enum SearchBehavior {
    Dig,
    Ground,
    Wall,
    Carry,
}

impl Behavior<GameMap> for SearchBehavior {
    fn step(
        &mut self,
        ctx: &TickContext,
        agent: AgentProfile<CreatureId>,
        _action: &Action<GameMap>,
        world: &mut GameMap,
    ) -> Step<GameMap> {
        let Some(pos) = world.position(agent.id) else {
            return Step::Abandon;
        };
        let request = match self {
            SearchBehavior::Dig => {
                let cells = world.dig_targets().into_iter().map(|c| (c, c));
                nearest(ctx, agent.id, pos, cells)
                    .map(|(cell, _)| Request::new(ActionType::DigTile).at_cell(cell))
            }
            SearchBehavior::Ground => {
                let cells = world.ground_claim_targets().into_iter().map(|c| (c, c));
                nearest(ctx, agent.id, pos, cells)
                    .map(|(cell, _)| Request::new(ActionType::ClaimGroundTile).at_cell(cell))
            }
            SearchBehavior::Wall => {
                let cells = world.wall_claim_targets().into_iter().map(|c| (c, c));
                nearest(ctx, agent.id, pos, cells)
                    .map(|(cell, _)| Request::new(ActionType::ClaimWallTile).at_cell(cell))
            }
            SearchBehavior::Carry => nearest(ctx, agent.id, pos, world.carry_targets())
                .map(|(entity, cell): (EntityId, Cell)| {
                    Request::new(ActionType::GrabEntity)
                        .on_entity(entity)
                        .at_cell(cell)
                }),
        };
        match request {
            Some(request) => Step::Replace(request),
            None => Step::Complete,
        }
    }
}

#[derive(Debug)]
pub struct DigBehavior {
    pub per_turn: u32,
}

impl Behavior<GameMap> for DigBehavior {
    fn step(
        &mut self,
        _ctx: &TickContext,
        agent: AgentProfile<CreatureId>,
        action: &Action<GameMap>,
        world: &mut GameMap,
    ) -> Step<GameMap> {
        if action.claim_missed() {
            return Step::Abandon;
        }
        let (Some(pos), Some(cell)) = (world.position(agent.id), action.cell()) else {
            return Step::Abandon;
        };
        if !world.tile(cell).is_some_and(|t| t.is_diggable()) {
            return Step::Complete;
        }
        if pos.distance(cell) > 1 {
            return walk_to(cell, true);
        }
        if world.dig(cell, self.per_turn) {
            tracing::debug!(creature = %agent.id, cell = %cell, "tile dug out");
            Step::Complete
        } else {
            Step::Continue
        }
    }
}

/// Ground and wall claiming. Ground is claimed standing on the tile, walls
/// from next to them.
#[derive(Debug)]
pub struct ClaimBehavior {
    pub turns: u32,
}

impl Behavior<GameMap> for ClaimBehavior {
    fn step(
        &mut self,
        _ctx: &TickContext,
        agent: AgentProfile<CreatureId>,
        action: &Action<GameMap>,
        world: &mut GameMap,
    ) -> Step<GameMap> {
        if action.claim_missed() {
            return Step::Abandon;
        }
        let (Some(pos), Some(cell)) = (world.position(agent.id), action.cell()) else {
            return Step::Abandon;
        };
        let wall = action.kind() == ActionType::ClaimWallTile;
        let still_valid = if wall {
            world.is_claimable_wall(cell)
        } else {
            world.tile(cell).is_some_and(|t| t.kind == TileKind::Floor)
        };
        if !still_valid {
            return Step::Complete;
        }
        let reach = if wall { 1 } else { 0 };
        if pos.distance(cell) > reach {
            return walk_to(cell, wall);
        }
        if world.claim(cell, self.turns) {
            tracing::debug!(creature = %agent.id, cell = %cell, wall, "tile claimed");
            Step::Complete
        } else {
            Step::Continue
        }
    }
}

/// Walk to the entity, lift it, and turn into a carry to the nearest
/// stockpile.
#[derive(Debug)]
pub struct GrabBehavior;

impl Behavior<GameMap> for GrabBehavior {
    fn step(
        &mut self,
        _ctx: &TickContext,
        agent: AgentProfile<CreatureId>,
        action: &Action<GameMap>,
        world: &mut GameMap,
    ) -> Step<GameMap> {
        if action.claim_missed() {
            return Step::Abandon;
        }
        let (Some(pos), Some(entity)) = (world.position(agent.id), action.entity()) else {
            return Step::Abandon;
        };
        let Some(at) = world.entity(entity).and_then(|e| e.cell()) else {
            return Step::Abandon;
        };
        if pos != at {
            return walk_to(at, false);
        }
        let Some(stockpile) = world.nearest_stockpile(pos) else {
            return Step::Abandon;
        };
        world.lift_entity(entity, agent.id);
        Step::Replace(
            Request::new(ActionType::CarryEntity)
                .on_entity(entity)
                .at_cell(stockpile),
        )
    }
}

#[derive(Debug)]
pub struct CarryBehavior;

impl Behavior<GameMap> for CarryBehavior {
    fn step(
        &mut self,
        _ctx: &TickContext,
        agent: AgentProfile<CreatureId>,
        action: &Action<GameMap>,
        world: &mut GameMap,
    ) -> Step<GameMap> {
        if action.claim_missed() {
            return Step::Abandon;
        }
        let (Some(pos), Some(entity), Some(dest)) =
            (world.position(agent.id), action.entity(), action.cell())
        else {
            return Step::Abandon;
        };
        if pos != dest {
            return walk_to(dest, false);
        }
        world.set_down_entity(entity, dest);
        tracing::debug!(creature = %agent.id, entity = %entity, cell = %dest, "entity delivered");
        Step::Complete
    }
}

/// Hit an object until it breaks. The destruction is queued by the map and
/// reaches this action through its listener before the next step.
#[derive(Debug)]
pub struct AttackBehavior {
    pub damage: u32,
}

impl Behavior<GameMap> for AttackBehavior {
    fn step(
        &mut self,
        _ctx: &TickContext,
        agent: AgentProfile<CreatureId>,
        action: &Action<GameMap>,
        world: &mut GameMap,
    ) -> Step<GameMap> {
        let Some(entity) = action.entity() else {
            return Step::Complete;
        };
        if world.is_dying(entity) {
            return Step::Continue;
        }
        let Some(pos) = world.position(agent.id) else {
            return Step::Abandon;
        };
        let Some(at) = world.entity(entity).and_then(|e| e.cell()) else {
            return Step::Abandon;
        };
        if pos.distance(at) > 1 {
            return walk_to(at, true);
        }
        let damage = self.damage;
        let broken = match world.entity_mut(entity) {
            Some(target) => {
                target.hp = target.hp.saturating_sub(damage);
                target.hp == 0
            }
            None => return Step::Abandon,
        };
        if broken {
            tracing::debug!(creature = %agent.id, entity = %entity, "object broken");
            world.destroy_entity(entity);
        }
        Step::Continue
    }
}

/// Completes after a fixed number of active turns.
#[derive(Debug)]
pub struct TimedBehavior {
    pub turns: u32,
}

impl Behavior<GameMap> for TimedBehavior {
    fn step(
        &mut self,
        _ctx: &TickContext,
        _agent: AgentProfile<CreatureId>,
        action: &Action<GameMap>,
        _world: &mut GameMap,
    ) -> Step<GameMap> {
        if action.active_turns() >= self.turns {
            Step::Complete
        } else {
            Step::Continue
        }
    }
}
