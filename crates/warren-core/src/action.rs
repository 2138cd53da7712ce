use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    ClaimKind, ClaimSite, ContractViolation, EntityEvent, ParseActionTypeError,
    WorkerNotifier, WorldMut, WorldView,
};

/// Every behavior a creature can be engaged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ActionType {
    WalkToTile,
    Fight,
    FightArena,
    SearchTileToDig,
    DigTile,
    SearchWallTileToClaim,
    ClaimWallTile,
    SearchGroundTileToClaim,
    ClaimGroundTile,
    AttackObject,
    FindHome,
    Sleep,
    Job,
    Eat,
    Flee,
    SearchEntityToCarry,
    GrabEntity,
    CarryEntity,
    GetFee,
    LeaveDungeon,
    /// Bottom-of-stack fallback. Claims nothing.
    Idle,
}

/// Which resource a claim is taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimTarget {
    Cell,
    Entity,
}

/// Mandatory targets and claim taken by an action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
    pub cell: bool,
    pub entity: bool,
    pub claim: Option<(ClaimKind, ClaimTarget)>,
}

impl Requirements {
    const NONE: Self = Self {
        cell: false,
        entity: false,
        claim: None,
    };
}

impl ActionType {
    pub const ALL: [ActionType; 21] = [
        ActionType::WalkToTile,
        ActionType::Fight,
        ActionType::FightArena,
        ActionType::SearchTileToDig,
        ActionType::DigTile,
        ActionType::SearchWallTileToClaim,
        ActionType::ClaimWallTile,
        ActionType::SearchGroundTileToClaim,
        ActionType::ClaimGroundTile,
        ActionType::AttackObject,
        ActionType::FindHome,
        ActionType::Sleep,
        ActionType::Job,
        ActionType::Eat,
        ActionType::Flee,
        ActionType::SearchEntityToCarry,
        ActionType::GrabEntity,
        ActionType::CarryEntity,
        ActionType::GetFee,
        ActionType::LeaveDungeon,
        ActionType::Idle,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ActionType::WalkToTile => "walkToTile",
            ActionType::Fight => "fight",
            ActionType::FightArena => "fightArena",
            ActionType::SearchTileToDig => "searchTileToDig",
            ActionType::DigTile => "digTile",
            ActionType::SearchWallTileToClaim => "searchWallTileToClaim",
            ActionType::ClaimWallTile => "claimWallTile",
            ActionType::SearchGroundTileToClaim => "searchGroundTileToClaim",
            ActionType::ClaimGroundTile => "claimGroundTile",
            ActionType::AttackObject => "attackObject",
            ActionType::FindHome => "findHome",
            ActionType::Sleep => "sleep",
            ActionType::Job => "job",
            ActionType::Eat => "eat",
            ActionType::Flee => "flee",
            ActionType::SearchEntityToCarry => "searchEntityToCarry",
            ActionType::GrabEntity => "grabEntity",
            ActionType::CarryEntity => "carryEntity",
            ActionType::GetFee => "getFee",
            ActionType::LeaveDungeon => "leaveDungeon",
            ActionType::Idle => "idle",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == token)
    }

    pub const fn is_fallback(self) -> bool {
        matches!(self, ActionType::Idle)
    }

    pub const fn requirements(self) -> Requirements {
        match self {
            ActionType::DigTile => Requirements {
                cell: true,
                entity: false,
                claim: Some((ClaimKind::Digging, ClaimTarget::Cell)),
            },
            ActionType::ClaimGroundTile | ActionType::ClaimWallTile => Requirements {
                cell: true,
                entity: false,
                claim: Some((ClaimKind::Claiming, ClaimTarget::Cell)),
            },
            ActionType::AttackObject => Requirements {
                cell: true,
                entity: true,
                claim: None,
            },
            ActionType::GrabEntity | ActionType::CarryEntity => Requirements {
                cell: false,
                entity: true,
                claim: Some((ClaimKind::CarryLock, ClaimTarget::Entity)),
            },
            _ => Requirements::NONE,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ParseActionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| ParseActionTypeError(s.to_string()))
    }
}

/// Identity of one action instance: the claim holder and listener key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActionId<A> {
    pub agent: A,
    pub serial: u64,
}

impl<A> ActionId<A> {
    pub const fn new(agent: A, serial: u64) -> Self {
        Self { agent, serial }
    }
}

/// Opaque reference to the skill an action was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkillRef(pub u32);

/// Parameters for starting an action.
pub struct ActionRequest<W: WorldView> {
    pub kind: ActionType,
    pub forced: bool,
    pub entity: Option<W::Entity>,
    pub cell: Option<W::Cell>,
    pub skill: Option<SkillRef>,
    pub flag: bool,
}

impl<W: WorldView> Copy for ActionRequest<W> {}

impl<W: WorldView> Clone for ActionRequest<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: WorldView> fmt::Debug for ActionRequest<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRequest")
            .field("kind", &self.kind)
            .field("forced", &self.forced)
            .field("entity", &self.entity)
            .field("cell", &self.cell)
            .field("skill", &self.skill)
            .field("flag", &self.flag)
            .finish()
    }
}

impl<W: WorldView> ActionRequest<W> {
    pub fn new(kind: ActionType) -> Self {
        Self {
            kind,
            forced: false,
            entity: None,
            cell: None,
            skill: None,
            flag: false,
        }
    }

    pub fn at_cell(mut self, cell: W::Cell) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn on_entity(mut self, entity: W::Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn forced(mut self) -> Self {
        self.forced = true;
        self
    }

    pub fn with_skill(mut self, skill: SkillRef) -> Self {
        self.skill = Some(skill);
        self
    }

    pub fn with_flag(mut self, flag: bool) -> Self {
        self.flag = flag;
        self
    }
}

/// One behavior instance bound to one agent.
///
/// `entity` is a weak handle: it is cleared by the listener callbacks when the
/// entity is destroyed, removed from the map or picked up, and must not be
/// used after that. The claim taken at [`Action::begin`] is recorded
/// separately so [`Action::end`] releases exactly it, even if the entity
/// handle has been cleared in the meantime.
pub struct Action<W: WorldView> {
    id: ActionId<W::Agent>,
    kind: ActionType,
    forced: bool,
    worker: bool,
    entity: Option<W::Entity>,
    cell: Option<W::Cell>,
    skill: Option<SkillRef>,
    flag: bool,
    held: Option<(ClaimKind, ClaimSite<W::Cell, W::Entity>)>,
    violations: Vec<ContractViolation>,
    turns: u32,
    active_turns: u32,
}

impl<W: WorldView> fmt::Debug for Action<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("forced", &self.forced)
            .field("entity", &self.entity)
            .field("cell", &self.cell)
            .field("held", &self.held)
            .field("turns", &self.turns)
            .field("active_turns", &self.active_turns)
            .finish()
    }
}

impl<W: WorldView> Action<W> {
    pub fn id(&self) -> ActionId<W::Agent> {
        self.id
    }

    pub fn kind(&self) -> ActionType {
        self.kind
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    pub fn entity(&self) -> Option<W::Entity> {
        self.entity
    }

    pub fn cell(&self) -> Option<W::Cell> {
        self.cell
    }

    pub fn skill(&self) -> Option<SkillRef> {
        self.skill
    }

    pub fn flag(&self) -> bool {
        self.flag
    }

    pub fn held_claim(&self) -> Option<(ClaimKind, ClaimSite<W::Cell, W::Entity>)> {
        self.held
    }

    /// True if this type takes a claim and the claim was granted.
    pub fn holds_claim(&self) -> bool {
        self.held.is_some()
    }

    /// True if this type takes a claim but did not get it.
    pub fn claim_missed(&self) -> bool {
        self.kind.requirements().claim.is_some() && self.held.is_none()
    }

    pub fn violations(&self) -> &[ContractViolation] {
        &self.violations
    }

    /// Ticks since the action was started.
    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Ticks spent on top of the stack.
    pub fn active_turns(&self) -> u32 {
        self.active_turns
    }

    pub(crate) fn advance_turn(&mut self, active: bool) {
        self.turns = self.turns.saturating_add(1);
        if active {
            self.active_turns = self.active_turns.saturating_add(1);
        }
    }

    pub fn listener_name(&self, agent_name: &str) -> String {
        format!("Action{agent_name}{}", self.kind)
    }

    /// Listener callback. Returns `false` once the handle has been cleared.
    pub fn on_entity_event(&mut self, entity: W::Entity, event: EntityEvent) -> bool {
        match event {
            EntityEvent::Destroyed | EntityEvent::RemovedFromMap | EntityEvent::PickedUp => {
                if self.entity == Some(entity) {
                    tracing::trace!(
                        agent = ?self.id.agent,
                        action = %self.kind,
                        entity = ?entity,
                        event = %event,
                        "entity handle cleared"
                    );
                    self.entity = None;
                    return false;
                }
                true
            }
            EntityEvent::Dropped => {
                // Tracked entities are carried or attacked; both end the action
                // before the entity can be dropped.
                tracing::error!(
                    agent = ?self.id.agent,
                    action = %self.kind,
                    entity = ?entity,
                    "dropped notification on a live action"
                );
                true
            }
        }
    }
}

impl<W: WorldMut> Action<W> {
    /// Start an action: subscribe to the target entity, take the claim for
    /// this type, and report worker activity.
    ///
    /// Never fails. A missing mandatory target is recorded as a
    /// [`ContractViolation`] and the claim is skipped; a contended claim
    /// leaves [`Action::claim_missed`] set so the caller can pick another
    /// target.
    pub fn begin(
        id: ActionId<W::Agent>,
        worker: bool,
        request: ActionRequest<W>,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> Self {
        let kind = request.kind;
        if let Some(entity) = request.entity {
            world.add_entity_listener(entity, id);
        }

        let requirements = kind.requirements();
        let mut violations = Vec::new();
        if requirements.cell && request.cell.is_none() {
            violations.push(ContractViolation::MissingCell { action: kind });
        }
        if requirements.entity && request.entity.is_none() {
            violations.push(ContractViolation::MissingEntity { action: kind });
        }
        for violation in &violations {
            tracing::error!(agent = ?id.agent, action = %kind, "contract violation: {violation}");
        }

        let held = match requirements.claim {
            Some((claim, ClaimTarget::Cell)) => match request.cell {
                Some(cell) => acquire_cell(world, claim, cell, id)
                    .then_some((claim, ClaimSite::Cell(cell))),
                None => None,
            },
            Some((claim, ClaimTarget::Entity)) => match request.entity {
                Some(entity) => world
                    .set_carry_lock(entity, id, true)
                    .then_some((claim, ClaimSite::Entity(entity))),
                None => None,
            },
            None => None,
        };

        if requirements.claim.is_some() && held.is_none() && violations.is_empty() {
            tracing::debug!(agent = ?id.agent, action = %kind, "claim contended");
        }

        if worker {
            notifier.worker_started(id.agent, kind);
        }

        tracing::trace!(agent = ?id.agent, serial = id.serial, action = %kind, "action started");

        Self {
            id,
            kind,
            forced: request.forced,
            worker,
            entity: request.entity,
            cell: request.cell,
            skill: request.skill,
            flag: request.flag,
            held,
            violations,
            turns: 0,
            active_turns: 0,
        }
    }

    /// Tear the action down: mirror of [`Action::begin`].
    pub fn end(mut self, world: &mut W, notifier: &mut dyn WorkerNotifier<W::Agent>) -> ActionType {
        if let Some(entity) = self.entity.take() {
            world.remove_entity_listener(entity, self.id);
        }

        match self.held.take() {
            Some((ClaimKind::Digging, ClaimSite::Cell(cell))) => {
                world.remove_worker_digging(cell, self.id)
            }
            Some((ClaimKind::Claiming, ClaimSite::Cell(cell))) => {
                world.remove_worker_claiming(cell, self.id)
            }
            Some((ClaimKind::CarryLock, ClaimSite::Entity(entity))) => {
                world.set_carry_lock(entity, self.id, false);
            }
            Some((claim, site)) => {
                tracing::error!(claim = %claim, site = ?site, "claim recorded on an unexpected site");
            }
            None => {}
        }

        if self.worker {
            notifier.worker_stopped(self.id.agent, self.kind);
        }

        tracing::trace!(
            agent = ?self.id.agent,
            serial = self.id.serial,
            action = %self.kind,
            turns = self.turns,
            "action ended"
        );
        self.kind
    }
}

fn acquire_cell<W: WorldMut>(
    world: &mut W,
    claim: ClaimKind,
    cell: W::Cell,
    id: ActionId<W::Agent>,
) -> bool {
    match claim {
        ClaimKind::Digging => world.add_worker_digging(cell, id),
        ClaimKind::Claiming => world.add_worker_claiming(cell, id),
        ClaimKind::CarryLock => false,
    }
}
