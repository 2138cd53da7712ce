mod common;

use common::sim;
use warren_core::{ActionType, EntityWorld, Transition};
use warren_sim::{Cell, EntityKind, Location, TileKind};

#[test]
fn worker_digs_marked_tile_and_releases_the_cell() {
    let mut sim = sim(&["RRRRR", "R.DRR", "RRRRR"]);
    let imp = sim.spawn_creature("imp", true, Cell::new(1, 1)).unwrap();
    let target = Cell::new(2, 1);

    let first = sim.step();
    assert_eq!(
        first,
        vec![(
            imp,
            Transition::Pushed {
                over: ActionType::Idle,
                pushed: ActionType::SearchTileToDig
            }
        )]
    );

    sim.step();
    assert_eq!(
        sim.creature(imp).unwrap().stack.kinds(),
        vec![ActionType::Idle, ActionType::DigTile]
    );
    assert_eq!(sim.map().digging_worker(target), Some(imp));
    assert_eq!(sim.player().workers_doing(ActionType::DigTile), 1);
    assert_eq!(sim.player().workers_doing(ActionType::SearchTileToDig), 0);

    // Hardness 6 at 2 per turn.
    sim.run(2);
    assert!(matches!(
        sim.map().tile(target).unwrap().kind,
        TileKind::Dirt { .. }
    ));
    let last = sim.step();
    assert_eq!(last, vec![(imp, Transition::Popped(ActionType::DigTile))]);

    assert_eq!(sim.map().tile(target).unwrap().kind, TileKind::Floor);
    assert_eq!(sim.map().digging_worker(target), None);
    assert!(sim.map().claims().is_empty());
    assert_eq!(sim.player().workers_doing(ActionType::DigTile), 0);
}

#[test]
fn second_worker_reselects_when_the_only_cell_is_taken() {
    let mut sim = sim(&["RRR", "R.R", "RRR"]);
    let first = sim.spawn_creature("first", true, Cell::new(1, 1)).unwrap();
    let second = sim.spawn_creature("second", true, Cell::new(1, 1)).unwrap();
    let cell = Cell::new(1, 1);

    sim.step();
    let transitions = sim.step();
    assert_eq!(
        transitions,
        vec![
            (
                first,
                Transition::Replaced {
                    old: ActionType::SearchGroundTileToClaim,
                    new: ActionType::ClaimGroundTile
                }
            ),
            (
                second,
                Transition::Popped(ActionType::SearchGroundTileToClaim)
            ),
        ]
    );
    assert_eq!(sim.map().claiming_worker(cell), Some(first));
    assert_eq!(sim.map().claims().len(), 1);
    assert_eq!(
        sim.creature(second).unwrap().stack.kinds(),
        vec![ActionType::Idle]
    );

    // Three turns of claiming.
    sim.run(3);
    assert_eq!(sim.map().tile(cell).unwrap().kind, TileKind::ClaimedFloor);
    assert_eq!(sim.map().claiming_worker(cell), None);
    assert!(sim.map().claims().is_empty());
}

#[test]
fn fighter_breaks_trap_and_attack_ends_after_the_destroy_fan_out() {
    let mut sim = sim(&["RRRRR", "R...R", "RRRRR"]);
    let trap = sim
        .spawn_entity("trap", EntityKind::Trap, 4, Cell::new(3, 1))
        .unwrap();
    let knight = sim.spawn_creature("knight", false, Cell::new(1, 1)).unwrap();

    // Push attack, push walk, walk one step, two hits.
    sim.run(5);
    assert!(sim.map().entity(trap).is_none());
    assert_eq!(sim.map().entity_count(), 0);
    assert!(sim.map().listeners().is_empty());
    assert_eq!(sim.map().position(knight), Some(Cell::new(2, 1)));

    let top = sim.creature(knight).unwrap().stack.top().unwrap();
    assert_eq!(top.kind(), ActionType::AttackObject);
    assert_eq!(top.entity(), None);

    let transitions = sim.step();
    assert_eq!(
        transitions,
        vec![(knight, Transition::Popped(ActionType::AttackObject))]
    );
    assert!(sim.player().events().is_empty());
}

#[test]
fn traps_and_crates_are_attack_targets_but_gold_is_not() {
    let mut sim = sim(&["RRRRRR", "R....R", "RRRRRR"]);
    let trap = sim
        .spawn_entity("trap", EntityKind::Trap, 4, Cell::new(1, 1))
        .unwrap();
    sim.spawn_entity("gold", EntityKind::GoldPile, 1, Cell::new(2, 1))
        .unwrap();
    let chest = sim
        .spawn_entity("chest", EntityKind::Crate, 2, Cell::new(4, 1))
        .unwrap();

    let targets: Vec<_> = sim
        .map()
        .attack_targets()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(targets, vec![trap, chest]);

    // Knight next to the chest breaks it in one hit.
    let knight = sim.spawn_creature("knight", false, Cell::new(3, 1)).unwrap();
    sim.run(3);
    assert!(sim.map().entity(chest).is_none());
    assert!(sim.map().entity(trap).is_some());
    assert!(sim.creature(knight).is_some());
}

#[test]
fn removing_a_carrier_drops_its_load_and_releases_everything() {
    let mut sim = sim(&["RRRRRRR", "Rc....R", "RRRRRRR"]);
    let gold = sim
        .spawn_entity("gold", EntityKind::GoldPile, 1, Cell::new(4, 1))
        .unwrap();
    let imp = sim.spawn_creature("imp", true, Cell::new(5, 1)).unwrap();

    // Search, grab, walk onto the gold, lift it, start walking home, one step.
    sim.run(7);
    assert_eq!(
        sim.creature(imp).unwrap().stack.kinds(),
        vec![
            ActionType::Idle,
            ActionType::CarryEntity,
            ActionType::WalkToTile
        ]
    );
    assert_eq!(
        sim.map().entity(gold).unwrap().location,
        Location::Carried(imp)
    );
    assert_eq!(sim.map().carry_lock_holder(gold).map(|h| h.agent), Some(imp));
    assert_eq!(sim.map().position(imp), Some(Cell::new(3, 1)));

    sim.remove_creature(imp).unwrap();

    assert!(sim.creature(imp).is_none());
    assert_eq!(
        sim.map().entity(gold).unwrap().location,
        Location::Map(Cell::new(3, 1))
    );
    assert!(!sim.map().is_carry_locked(gold));
    assert!(sim.map().claims().is_empty());
    assert!(sim.map().listeners().is_empty());
    assert_eq!(sim.player().total_active(), 0);
    assert_eq!(sim.player().unmatched_stops(), 0);
}

#[test]
fn hauler_delivers_to_claimed_floor() {
    let mut sim = sim(&["RRRRR", "Rc.RR", "RRRRR"]);
    let gold = sim
        .spawn_entity("gold", EntityKind::GoldPile, 1, Cell::new(2, 1))
        .unwrap();
    let imp = sim.spawn_creature("imp", true, Cell::new(2, 1)).unwrap();

    // Search, grab, lift, push a walk home, step, set down.
    sim.run(6);
    assert_eq!(
        sim.map().entity(gold).unwrap().location,
        Location::Map(Cell::new(1, 1))
    );
    assert!(!sim.map().is_carry_locked(gold));
    assert_eq!(sim.map().position(imp), Some(Cell::new(1, 1)));
}
