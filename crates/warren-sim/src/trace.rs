use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use warren_core::{AgentId, Transition};

use crate::CreatureId;

/// A small trace record of one stack transition or world event.
///
/// `a` is usually the creature, `b` a type- or entity-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub tick: u64,
    pub tag: Cow<'static, str>,
    pub a: u64,
    pub b: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            tag: tag.into(),
            a: 0,
            b: 0,
            detail: None,
        }
    }

    pub fn with_a(mut self, a: u64) -> Self {
        self.a = a;
        self
    }

    pub fn with_b(mut self, b: u64) -> Self {
        self.b = b;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn transition(tick: u64, creature: CreatureId, transition: Transition) -> Self {
        let detail = match transition {
            Transition::Idle => String::new(),
            Transition::Kept(kind)
            | Transition::Popped(kind)
            | Transition::GaveUp(kind) => kind.to_string(),
            Transition::Pushed { over, pushed } => format!("{over}>{pushed}"),
            Transition::Replaced { old, new } => format!("{old}=>{new}"),
        };
        Self::new(tick, transition.tag())
            .with_a(creature.stable_id())
            .with_detail(detail)
    }
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a TraceEvent> + 'a {
        self.events.iter().filter(move |e| e.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
