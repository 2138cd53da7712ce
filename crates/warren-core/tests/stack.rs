mod common;

use common::RecordingWorld;
use warren_core::{
    ActionId, ActionRequest, ActionStack, ActionType, AgentProfile, EntityEvent, EntityWorld,
    NullNotifier, StackError, VecNotifier, WorkerEvent,
};

type Request = ActionRequest<RecordingWorld>;

fn started_stack(world: &mut RecordingWorld, worker: bool) -> ActionStack<RecordingWorld> {
    let profile = AgentProfile { id: 1, worker };
    let mut stack = ActionStack::new(profile);
    stack.start(world, &mut NullNotifier);
    stack
}

#[test]
fn start_places_the_fallback_once() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, false);

    assert_eq!(stack.kinds(), vec![ActionType::Idle]);
    assert_eq!(stack.start(&mut world, &mut NullNotifier), None);
    assert_eq!(stack.len(), 1);

    stack.teardown(&mut world, &mut NullNotifier);
}

#[test]
fn push_suspends_and_pop_resumes() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, false);

    stack.push(Request::new(ActionType::WalkToTile).at_cell((1, 0)), &mut world, &mut NullNotifier);
    stack.push(Request::new(ActionType::Fight), &mut world, &mut NullNotifier);
    assert_eq!(stack.top_kind(), Some(ActionType::Fight));

    assert_eq!(stack.pop(&mut world, &mut NullNotifier), Ok(ActionType::Fight));
    assert_eq!(stack.top_kind(), Some(ActionType::WalkToTile));
    assert_eq!(stack.top().and_then(|a| a.cell()), Some((1, 0)));

    stack.teardown(&mut world, &mut NullNotifier);
}

#[test]
fn fallback_cannot_be_popped() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, false);

    assert_eq!(stack.pop(&mut world, &mut NullNotifier), Err(StackError::FallbackPinned));
    assert_eq!(stack.kinds(), vec![ActionType::Idle]);

    stack.teardown(&mut world, &mut NullNotifier);
    assert_eq!(stack.pop(&mut world, &mut NullNotifier), Err(StackError::Empty));
}

#[test]
fn pop_releases_dig_claim() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, true);

    stack.push(Request::new(ActionType::DigTile).at_cell((5, 5)), &mut world, &mut NullNotifier);
    assert_eq!(world.digging_worker((5, 5)), Some(1));

    stack.pop(&mut world, &mut NullNotifier).unwrap();
    assert_eq!(world.digging_worker((5, 5)), None);

    stack.teardown(&mut world, &mut NullNotifier);
}

#[test]
fn replace_top_releases_old_claim_before_taking_new_one() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, false);

    let first = stack.push(
        Request::new(ActionType::ClaimGroundTile).at_cell((0, 1)),
        &mut world,
        &mut NullNotifier,
    );
    // Same cell, same agent: only succeeds because the old claim is gone.
    let second = stack
        .replace_top(
            Request::new(ActionType::ClaimGroundTile).at_cell((0, 1)),
            &mut world,
            &mut NullNotifier,
        )
        .unwrap();

    assert_ne!(first, second);
    assert!(stack.top().is_some_and(|a| a.holds_claim()));
    assert_eq!(
        world.claims.holder(
            warren_core::ClaimSite::Cell((0, 1)),
            warren_core::ClaimKind::Claiming
        ),
        Some(second)
    );
    assert_eq!(stack.len(), 2);

    stack.teardown(&mut world, &mut NullNotifier);
    assert!(world.claims.is_empty());
}

#[test]
fn replace_on_bare_fallback_pushes() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, false);

    stack
        .replace_top(Request::new(ActionType::Sleep), &mut world, &mut NullNotifier)
        .unwrap();

    assert_eq!(stack.kinds(), vec![ActionType::Idle, ActionType::Sleep]);
    stack.teardown(&mut world, &mut NullNotifier);
}

#[test]
fn same_agent_cannot_double_book_a_cell() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, false);

    stack.push(Request::new(ActionType::DigTile).at_cell((2, 2)), &mut world, &mut NullNotifier);
    stack.push(Request::new(ActionType::DigTile).at_cell((2, 2)), &mut world, &mut NullNotifier);

    let top = stack.top().unwrap();
    assert!(top.claim_missed());

    // Popping the loser must not release the winner's claim.
    stack.pop(&mut world, &mut NullNotifier).unwrap();
    assert_eq!(world.digging_worker((2, 2)), Some(1));

    stack.teardown(&mut world, &mut NullNotifier);
    assert_eq!(world.digging_worker((2, 2)), None);
}

#[test]
fn teardown_ends_top_to_bottom_with_paired_notifications() {
    let mut world = RecordingWorld::default();
    let mut notifier = VecNotifier::default();
    let mut stack = ActionStack::new(AgentProfile::worker(4u64));
    stack.start(&mut world, &mut notifier);
    stack.push(Request::new(ActionType::SearchEntityToCarry), &mut world, &mut notifier);
    stack.push(Request::new(ActionType::GrabEntity).on_entity(2), &mut world, &mut notifier);

    assert_eq!(stack.teardown(&mut world, &mut notifier), 3);
    assert!(stack.is_empty());
    assert!(world.claims.is_empty());
    assert!(world.listeners.is_empty());

    assert_eq!(
        notifier.events,
        vec![
            WorkerEvent::Started(4, ActionType::Idle),
            WorkerEvent::Started(4, ActionType::SearchEntityToCarry),
            WorkerEvent::Started(4, ActionType::GrabEntity),
            WorkerEvent::Stopped(4, ActionType::GrabEntity),
            WorkerEvent::Stopped(4, ActionType::SearchEntityToCarry),
            WorkerEvent::Stopped(4, ActionType::Idle),
        ]
    );
}

#[test]
fn clear_to_fallback_keeps_only_idle() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, false);
    stack.push(Request::new(ActionType::WalkToTile).at_cell((3, 3)), &mut world, &mut NullNotifier);
    stack.push(Request::new(ActionType::CarryEntity).on_entity(1), &mut world, &mut NullNotifier);

    assert_eq!(stack.clear_to_fallback(&mut world, &mut NullNotifier), 2);
    assert_eq!(stack.kinds(), vec![ActionType::Idle]);
    assert!(world.claims.is_empty());

    stack.teardown(&mut world, &mut NullNotifier);
}

#[test]
fn only_the_top_accumulates_active_turns() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, false);
    stack.advance_turns();
    stack.push(Request::new(ActionType::Eat), &mut world, &mut NullNotifier);
    stack.advance_turns();
    stack.advance_turns();

    let idle = stack.iter().next().unwrap();
    let eat = stack.top().unwrap();
    assert_eq!((idle.turns(), idle.active_turns()), (3, 1));
    assert_eq!((eat.turns(), eat.active_turns()), (2, 2));

    stack.teardown(&mut world, &mut NullNotifier);
}

#[test]
fn listener_callbacks_reach_the_right_action() {
    let mut world = RecordingWorld::default();
    let mut stack = started_stack(&mut world, false);
    let attack = stack.push(
        Request::new(ActionType::AttackObject).on_entity(7).at_cell((1, 1)),
        &mut world,
        &mut NullNotifier,
    );

    assert!(!stack.on_entity_event(attack.serial, 7, EntityEvent::Destroyed));
    assert_eq!(stack.top().and_then(|a| a.entity()), None);

    // Unknown serial: the subscription is stale.
    assert!(!stack.on_entity_event(99, 7, EntityEvent::Destroyed));

    world.listeners_mut().unsubscribe(7, attack);
    stack.teardown(&mut world, &mut NullNotifier);
    assert_eq!(attack, ActionId::new(1, attack.serial));
}
