//! Exclusive claims on shared world resources.
//!
//! A claim is keyed by `(resource, kind)`: the same tile may carry a digging
//! claim and a claiming claim at once, but never two digging claims. Holders
//! are compared by equality only, so callers decide what "the same holder"
//! means (the engine uses [`crate::ActionId`], which makes two actions of one
//! agent distinct holders).

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named purpose of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ClaimKind {
    Digging,
    Claiming,
    CarryLock,
}

impl ClaimKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ClaimKind::Digging => "digging",
            ClaimKind::Claiming => "claiming",
            ClaimKind::CarryLock => "carryLock",
        }
    }
}

impl core::fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A claimable resource: a map cell or an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClaimSite<C, E> {
    Cell(C),
    Entity(E),
}

/// Result of [`ClaimTable::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire<H> {
    Granted,
    /// The caller already held this claim; nothing changed.
    AlreadyHeld,
    Contended { holder: H },
}

impl<H> Acquire<H> {
    pub fn is_granted(&self) -> bool {
        matches!(self, Acquire::Granted | Acquire::AlreadyHeld)
    }
}

/// Result of [`ClaimTable::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Released,
    /// Not held by the caller (already released, never acquired, or held by
    /// someone else). Always a no-op.
    NotHeld,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTable<R, H> {
    holders: BTreeMap<(R, ClaimKind), H>,
}

impl<R, H> Default for ClaimTable<R, H> {
    fn default() -> Self {
        Self {
            holders: BTreeMap::new(),
        }
    }
}

impl<R, H> ClaimTable<R, H>
where
    R: Copy + Ord,
    H: Copy + Eq,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, resource: R, kind: ClaimKind, holder: H) -> Acquire<H> {
        match self.holders.get(&(resource, kind)) {
            Some(current) if *current == holder => Acquire::AlreadyHeld,
            Some(current) => Acquire::Contended { holder: *current },
            None => {
                self.holders.insert((resource, kind), holder);
                Acquire::Granted
            }
        }
    }

    pub fn release(&mut self, resource: R, kind: ClaimKind, holder: H) -> Release {
        match self.holders.get(&(resource, kind)) {
            Some(current) if *current == holder => {
                self.holders.remove(&(resource, kind));
                Release::Released
            }
            _ => Release::NotHeld,
        }
    }

    pub fn holder(&self, resource: R, kind: ClaimKind) -> Option<H> {
        self.holders.get(&(resource, kind)).copied()
    }

    pub fn is_claimed(&self, resource: R, kind: ClaimKind) -> bool {
        self.holders.contains_key(&(resource, kind))
    }

    /// Drop every claim on `resource`, whatever the kind or holder.
    ///
    /// Used when the resource itself is finalized; later releases by the old
    /// holders become no-ops.
    pub fn forget_resource(&mut self, resource: R) -> usize {
        let before = self.holders.len();
        self.holders.retain(|(r, _), _| *r != resource);
        before - self.holders.len()
    }

    pub fn held_by(&self, holder: H) -> impl Iterator<Item = (R, ClaimKind)> + '_ {
        self.holders
            .iter()
            .filter(move |(_, h)| **h == holder)
            .map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (R, ClaimKind, H)> + '_ {
        self.holders.iter().map(|((r, k), h)| (*r, *k, *h))
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}
