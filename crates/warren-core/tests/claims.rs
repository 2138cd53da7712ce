use proptest::prelude::*;
use warren_core::{Acquire, ClaimKind, ClaimTable, Release};

#[test]
fn second_holder_is_contended() {
    let mut table = ClaimTable::<u32, u64>::new();

    assert_eq!(table.acquire(7, ClaimKind::Digging, 1), Acquire::Granted);
    assert_eq!(
        table.acquire(7, ClaimKind::Digging, 2),
        Acquire::Contended { holder: 1 }
    );
    assert_eq!(table.holder(7, ClaimKind::Digging), Some(1));
}

#[test]
fn same_holder_reacquire_is_a_no_op() {
    let mut table = ClaimTable::<u32, u64>::new();

    assert_eq!(table.acquire(7, ClaimKind::Claiming, 1), Acquire::Granted);
    assert_eq!(table.acquire(7, ClaimKind::Claiming, 1), Acquire::AlreadyHeld);
    assert_eq!(table.len(), 1);
}

#[test]
fn kinds_are_independent_on_one_resource() {
    let mut table = ClaimTable::<u32, u64>::new();

    assert!(table.acquire(7, ClaimKind::Digging, 1).is_granted());
    assert!(table.acquire(7, ClaimKind::Claiming, 2).is_granted());

    assert_eq!(table.release(7, ClaimKind::Digging, 1), Release::Released);
    assert_eq!(table.holder(7, ClaimKind::Claiming), Some(2));
}

#[test]
fn release_is_idempotent_and_ignores_other_holders() {
    let mut table = ClaimTable::<u32, u64>::new();
    table.acquire(3, ClaimKind::CarryLock, 1);

    assert_eq!(table.release(3, ClaimKind::CarryLock, 2), Release::NotHeld);
    assert_eq!(table.holder(3, ClaimKind::CarryLock), Some(1));

    assert_eq!(table.release(3, ClaimKind::CarryLock, 1), Release::Released);
    assert_eq!(table.release(3, ClaimKind::CarryLock, 1), Release::NotHeld);
    assert_eq!(table.release(9, ClaimKind::Digging, 1), Release::NotHeld);
    assert!(table.is_empty());
}

#[test]
fn forget_resource_drops_every_kind() {
    let mut table = ClaimTable::<u32, u64>::new();
    table.acquire(3, ClaimKind::CarryLock, 1);
    table.acquire(3, ClaimKind::Digging, 2);
    table.acquire(4, ClaimKind::Digging, 2);

    assert_eq!(table.forget_resource(3), 2);
    assert_eq!(table.release(3, ClaimKind::CarryLock, 1), Release::NotHeld);
    assert_eq!(table.held_by(2).collect::<Vec<_>>(), vec![(4, ClaimKind::Digging)]);
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Acquire(u8, u8),
    Release(u8, u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3, 0u8..4).prop_map(|(r, h)| Op::Acquire(r, h)),
        (0u8..3, 0u8..4).prop_map(|(r, h)| Op::Release(r, h)),
    ]
}

proptest! {
    #[test]
    fn at_most_one_holder_per_resource(ops in proptest::collection::vec(op(), 1..64)) {
        let mut table = ClaimTable::<u8, u8>::new();
        let mut model: [Option<u8>; 3] = [None; 3];

        for op in ops {
            match op {
                Op::Acquire(r, h) => {
                    let result = table.acquire(r, ClaimKind::Digging, h);
                    match model[r as usize] {
                        None => {
                            prop_assert_eq!(result, Acquire::Granted);
                            model[r as usize] = Some(h);
                        }
                        Some(current) if current == h => {
                            prop_assert_eq!(result, Acquire::AlreadyHeld);
                        }
                        Some(current) => {
                            prop_assert_eq!(result, Acquire::Contended { holder: current });
                        }
                    }
                }
                Op::Release(r, h) => {
                    let result = table.release(r, ClaimKind::Digging, h);
                    if model[r as usize] == Some(h) {
                        prop_assert_eq!(result, Release::Released);
                        model[r as usize] = None;
                    } else {
                        prop_assert_eq!(result, Release::NotHeld);
                    }
                }
            }
            for r in 0..3u8 {
                prop_assert_eq!(table.holder(r, ClaimKind::Digging), model[r as usize]);
            }
        }
    }

    #[test]
    fn exactly_one_of_two_contenders_wins(r in 0u8..8, a in 0u8..8, b in 0u8..8) {
        prop_assume!(a != b);
        let mut table = ClaimTable::<u8, u8>::new();
        let first = table.acquire(r, ClaimKind::Claiming, a).is_granted();
        let second = table.acquire(r, ClaimKind::Claiming, b).is_granted();
        prop_assert!(first ^ second);
    }
}
