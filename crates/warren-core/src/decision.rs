//! Per-tick driver of the action stacks.
//!
//! Each tick, for every agent in stable-id order: age the stack, look at the
//! top action, run the behavior registered for its type, and apply the
//! resulting [`Step`]. Entity events the world raised during a step are fanned
//! out before the next agent runs.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    flush_entity_events, Action, ActionRequest, ActionType, Agent, AgentProfile, AgentTable,
    TickContext, WorkerNotifier, WorldMut, WorldView,
};

/// What a behavior wants done with the active action.
pub enum Step<W: WorldView> {
    /// Keep the action active.
    Continue,
    /// The action finished; pop it.
    Complete,
    /// The action cannot go on (target gone, claim contended); pop it.
    Abandon,
    /// Interrupt: suspend the action and run `request` on top of it.
    Push(ActionRequest<W>),
    /// Swap the action for `request`.
    Replace(ActionRequest<W>),
}

impl<W: WorldView> core::fmt::Debug for Step<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Step::Continue => f.write_str("Continue"),
            Step::Complete => f.write_str("Complete"),
            Step::Abandon => f.write_str("Abandon"),
            Step::Push(request) => f.debug_tuple("Push").field(request).finish(),
            Step::Replace(request) => f.debug_tuple("Replace").field(request).finish(),
        }
    }
}

/// Type-specific unit of work for the active action.
pub trait Behavior<W>: 'static
where
    W: WorldMut + 'static,
{
    fn step(
        &mut self,
        ctx: &TickContext,
        agent: AgentProfile<W::Agent>,
        action: &Action<W>,
        world: &mut W,
    ) -> Step<W>;
}

/// Thresholds for giving up on an action that stays active too long.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecisionConfig {
    /// Active turns after which the action is popped.
    pub timeouts: BTreeMap<ActionType, u32>,
}

impl DecisionConfig {
    pub fn with_timeout(mut self, kind: ActionType, active_turns: u32) -> Self {
        self.timeouts.insert(kind, active_turns);
        self
    }

    pub fn timeout(&self, kind: ActionType) -> Option<u32> {
        self.timeouts.get(&kind).copied()
    }
}

/// Stack change made by one agent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No stack to drive (agent torn down or never started).
    Idle,
    Kept(ActionType),
    Popped(ActionType),
    GaveUp(ActionType),
    Pushed { over: ActionType, pushed: ActionType },
    Replaced { old: ActionType, new: ActionType },
}

impl Transition {
    pub const fn tag(self) -> &'static str {
        match self {
            Transition::Idle => "idle",
            Transition::Kept(_) => "kept",
            Transition::Popped(_) => "popped",
            Transition::GaveUp(_) => "gave_up",
            Transition::Pushed { .. } => "pushed",
            Transition::Replaced { .. } => "replaced",
        }
    }

    pub const fn changed_stack(self) -> bool {
        !matches!(self, Transition::Idle | Transition::Kept(_))
    }
}

pub struct DecisionLoop<W>
where
    W: WorldMut + 'static,
{
    behaviors: BTreeMap<ActionType, Box<dyn Behavior<W>>>,
    config: DecisionConfig,
}

impl<W> Default for DecisionLoop<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

impl<W> DecisionLoop<W>
where
    W: WorldMut + 'static,
{
    pub fn new(config: DecisionConfig) -> Self {
        Self {
            behaviors: BTreeMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn register(&mut self, kind: ActionType, behavior: Box<dyn Behavior<W>>) -> &mut Self {
        self.behaviors.insert(kind, behavior);
        self
    }

    pub fn with(mut self, kind: ActionType, behavior: Box<dyn Behavior<W>>) -> Self {
        self.register(kind, behavior);
        self
    }

    pub fn handles(&self, kind: ActionType) -> bool {
        self.behaviors.contains_key(&kind)
    }

    /// Drive one agent for one tick.
    pub fn tick_agent(
        &mut self,
        ctx: &TickContext,
        agent: &mut Agent<W>,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> Transition {
        let stack = &mut agent.stack;
        if stack.is_empty() {
            stack.start(world, notifier);
        }
        stack.advance_turns();

        let Some(top) = stack.top() else {
            return Transition::Idle;
        };
        let kind = top.kind();
        let profile = stack.owner();

        if !kind.is_fallback() {
            if let Some(limit) = self.config.timeout(kind) {
                if top.active_turns() > limit {
                    tracing::debug!(agent = ?profile.id, action = %kind, limit, "giving up");
                    return match stack.pop(world, notifier) {
                        Ok(popped) => Transition::GaveUp(popped),
                        Err(_) => Transition::Kept(kind),
                    };
                }
            }
        }

        let step = match self.behaviors.get_mut(&kind) {
            Some(behavior) => behavior.step(ctx, profile, top, world),
            None if kind.is_fallback() => Step::Continue,
            None => {
                tracing::debug!(agent = ?profile.id, action = %kind, "no behavior registered");
                Step::Abandon
            }
        };

        match step {
            Step::Continue => Transition::Kept(kind),
            Step::Complete | Step::Abandon => match stack.pop(world, notifier) {
                Ok(popped) => Transition::Popped(popped),
                Err(_) => Transition::Kept(kind),
            },
            Step::Push(request) => {
                stack.push(request, world, notifier);
                Transition::Pushed {
                    over: kind,
                    pushed: request.kind,
                }
            }
            Step::Replace(request) => match stack.replace_top(request, world, notifier) {
                Ok(_) => Transition::Replaced {
                    old: kind,
                    new: request.kind,
                },
                Err(_) => Transition::Kept(kind),
            },
        }
    }

    /// Drive every agent once, flushing world-raised entity events before
    /// the first agent and after each one.
    pub fn tick_all(
        &mut self,
        ctx: &TickContext,
        agents: &mut AgentTable<W>,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> Vec<(W::Agent, Transition)> {
        flush_entity_events(world, agents);
        let mut transitions = Vec::with_capacity(agents.len());
        for id in agents.ids() {
            let Some(agent) = agents.get_mut(id) else {
                continue;
            };
            let transition = self.tick_agent(ctx, agent, world, notifier);
            transitions.push((id, transition));
            flush_entity_events(world, agents);
        }
        transitions
    }
}
