use crate::{
    Action, ActionId, ActionRequest, ActionType, AgentProfile, EntityEvent, StackError,
    WorkerNotifier, WorldMut, WorldView,
};

/// Per-agent interrupt stack. The last action is the active one.
///
/// While the agent is simulated the bottom entry is the [`ActionType::Idle`]
/// fallback, which `pop` refuses to remove. Every action leaves the stack
/// through [`Action::end`], so its claims are released on every path.
pub struct ActionStack<W: WorldView> {
    owner: AgentProfile<W::Agent>,
    actions: Vec<Action<W>>,
    next_serial: u64,
}

impl<W: WorldView> core::fmt::Debug for ActionStack<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActionStack")
            .field("owner", &self.owner)
            .field("actions", &self.actions)
            .finish()
    }
}

impl<W: WorldView> ActionStack<W> {
    pub fn new(owner: AgentProfile<W::Agent>) -> Self {
        Self {
            owner,
            actions: Vec::new(),
            next_serial: 0,
        }
    }

    pub fn owner(&self) -> AgentProfile<W::Agent> {
        self.owner
    }

    pub fn top(&self) -> Option<&Action<W>> {
        self.actions.last()
    }

    pub fn top_kind(&self) -> Option<ActionType> {
        self.top().map(Action::kind)
    }

    pub fn get(&self, serial: u64) -> Option<&Action<W>> {
        self.actions.iter().find(|a| a.id().serial == serial)
    }

    /// Bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Action<W>> + '_ {
        self.actions.iter()
    }

    pub fn kinds(&self) -> Vec<ActionType> {
        self.actions.iter().map(Action::kind).collect()
    }

    pub fn contains(&self, kind: ActionType) -> bool {
        self.actions.iter().any(|a| a.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Advance turn counters: every action ages, only the top is active.
    pub fn advance_turns(&mut self) {
        let top = self.actions.len().saturating_sub(1);
        for (index, action) in self.actions.iter_mut().enumerate() {
            action.advance_turn(index == top);
        }
    }

    /// Route a listener callback to the action with `serial`.
    ///
    /// An unknown serial means the action already ended; the stale
    /// subscription is dropped.
    pub fn on_entity_event(&mut self, serial: u64, entity: W::Entity, event: EntityEvent) -> bool {
        match self.actions.iter_mut().find(|a| a.id().serial == serial) {
            Some(action) => action.on_entity_event(entity, event),
            None => {
                tracing::warn!(
                    agent = ?self.owner.id,
                    serial,
                    entity = ?entity,
                    "listener callback for an action that already ended"
                );
                false
            }
        }
    }

    fn next_id(&mut self) -> ActionId<W::Agent> {
        let id = ActionId::new(self.owner.id, self.next_serial);
        self.next_serial += 1;
        id
    }

    fn top_is_fallback(&self) -> bool {
        self.actions.len() == 1 && self.top_kind().is_some_and(ActionType::is_fallback)
    }
}

impl<W: WorldMut> ActionStack<W> {
    /// Put the fallback action in place if the stack is empty.
    pub fn start(
        &mut self,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> Option<ActionId<W::Agent>> {
        if !self.actions.is_empty() {
            return None;
        }
        Some(self.push(ActionRequest::new(ActionType::Idle), world, notifier))
    }

    /// Suspend the current top and make `request` the active action.
    pub fn push(
        &mut self,
        request: ActionRequest<W>,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> ActionId<W::Agent> {
        let id = self.next_id();
        let action = Action::begin(id, self.owner.worker, request, world, notifier);
        tracing::debug!(
            agent = ?self.owner.id,
            action = %request.kind,
            depth = self.actions.len() + 1,
            "push"
        );
        self.actions.push(action);
        id
    }

    /// End the active action and resume the one beneath.
    pub fn pop(
        &mut self,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> Result<ActionType, StackError> {
        if self.actions.is_empty() {
            return Err(StackError::Empty);
        }
        if self.top_is_fallback() {
            return Err(StackError::FallbackPinned);
        }
        let action = self.actions.pop().ok_or(StackError::Empty)?;
        let kind = action.end(world, notifier);
        tracing::debug!(
            agent = ?self.owner.id,
            action = %kind,
            resumed = ?self.top_kind(),
            "pop"
        );
        Ok(kind)
    }

    /// End the active action, then start `request` in its place.
    ///
    /// The old action is fully torn down before the new one claims anything.
    /// On the bare fallback this is a plain push.
    pub fn replace_top(
        &mut self,
        request: ActionRequest<W>,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> Result<ActionId<W::Agent>, StackError> {
        if self.actions.is_empty() {
            return Err(StackError::Empty);
        }
        if !self.top_is_fallback() {
            if let Some(old) = self.actions.pop() {
                old.end(world, notifier);
            }
        }
        Ok(self.push(request, world, notifier))
    }

    /// Pop everything above the fallback. Returns how many actions ended.
    pub fn clear_to_fallback(
        &mut self,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> usize {
        let mut ended = 0;
        while self.pop(world, notifier).is_ok() {
            ended += 1;
        }
        if self.actions.is_empty() {
            self.start(world, notifier);
        }
        ended
    }

    /// End every action, top to bottom, fallback included.
    pub fn teardown(
        &mut self,
        world: &mut W,
        notifier: &mut dyn WorkerNotifier<W::Agent>,
    ) -> usize {
        let mut ended = 0;
        while let Some(action) = self.actions.pop() {
            action.end(world, notifier);
            ended += 1;
        }
        ended
    }
}

impl<W: WorldView> Drop for ActionStack<W> {
    fn drop(&mut self) {
        if !self.actions.is_empty() {
            tracing::warn!(
                agent = ?self.owner.id,
                remaining = self.actions.len(),
                "action stack dropped without teardown; its claims are leaked"
            );
        }
    }
}
