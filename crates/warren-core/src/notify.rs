use crate::ActionType;

/// Player-side sink for worker activity, used for UI and AI hints.
///
/// Only agents with the worker capability are reported. Every
/// `worker_started` for an action is matched by exactly one `worker_stopped`
/// when that action ends.
pub trait WorkerNotifier<A> {
    fn worker_started(&mut self, agent: A, action: ActionType);
    fn worker_stopped(&mut self, agent: A, action: ActionType);
}

#[derive(Debug, Default)]
pub struct NullNotifier;

impl<A> WorkerNotifier<A> for NullNotifier {
    fn worker_started(&mut self, _agent: A, _action: ActionType) {}
    fn worker_stopped(&mut self, _agent: A, _action: ActionType) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent<A> {
    Started(A, ActionType),
    Stopped(A, ActionType),
}

#[derive(Debug)]
pub struct VecNotifier<A> {
    pub events: Vec<WorkerEvent<A>>,
}

impl<A> Default for VecNotifier<A> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<A> WorkerNotifier<A> for VecNotifier<A> {
    fn worker_started(&mut self, agent: A, action: ActionType) {
        self.events.push(WorkerEvent::Started(agent, action));
    }

    fn worker_stopped(&mut self, agent: A, action: ActionType) {
        self.events.push(WorkerEvent::Stopped(agent, action));
    }
}
