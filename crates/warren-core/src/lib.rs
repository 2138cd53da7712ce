//! Deterministic action-stack engine for autonomous creatures.
//!
//! Every agent owns an [`ActionStack`] of exclusive behavior states. Actions
//! take exclusive claims on tiles and entities when they start and release
//! exactly those claims when they end; entity handles held by actions are
//! weak and cleared through the [`ListenerRegistry`] fan-out before any later
//! step can read them. The [`DecisionLoop`] drives the stacks once per tick.
//!
//! The world, the player and the per-type behaviors are collaborators passed
//! in explicitly; see [`WorldMut`], [`WorkerNotifier`] and [`Behavior`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod agent;
pub mod claim;
pub mod decision;
pub mod error;
pub mod listener;
pub mod notify;
pub mod rng;
pub mod stack;
pub mod tick;
pub mod world;

pub use action::{
    Action, ActionId, ActionRequest, ActionType, ClaimTarget, Requirements, SkillRef,
};
pub use agent::{flush_entity_events, Agent, AgentId, AgentProfile, AgentTable};
pub use claim::{Acquire, ClaimKind, ClaimSite, ClaimTable, Release};
pub use decision::{Behavior, DecisionConfig, DecisionLoop, Step, Transition};
pub use error::{ContractViolation, ParseActionTypeError, StackError};
pub use listener::{EntityEvent, EntityObserver, ListenerRegistry, NotifyReport};
pub use notify::{NullNotifier, VecNotifier, WorkerEvent, WorkerNotifier};
pub use rng::{DeterministicRng, SplitMix64};
pub use stack::ActionStack;
pub use tick::TickContext;
pub use world::{EntityWorld, TileWorld, WorldMut, WorldView};
