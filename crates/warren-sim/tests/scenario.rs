mod common;

use common::{scenario, sim_with};
use warren_core::ActionType;
use warren_sim::{Cell, ConfigError, EntityKind, Scenario, SimConfig, Simulation, TileKind, TraceLog};

const DUNGEON: &str = r#"
config:
  seed: 11
  dig_per_turn: 3
  decision:
    timeouts:
      digTile: 5
map:
  - "RRRRRR"
  - "R.DD.R"
  - "Rc...R"
  - "RRRRRR"
creatures:
  - name: imp
    worker: true
    at: { x: 1, y: 1 }
  - name: knight
    at: { x: 4, y: 2 }
entities:
  - name: gold
    kind: goldPile
    hp: 1
    at: { x: 3, y: 2 }
"#;

#[test]
fn scenario_yaml_fills_defaults_and_builds_the_world() {
    let scenario = Scenario::from_yaml_str(DUNGEON).unwrap();

    assert_eq!(scenario.config.seed, 11);
    assert_eq!(scenario.config.dig_per_turn, 3);
    assert_eq!(scenario.config.claim_turns, SimConfig::default().claim_turns);
    assert_eq!(scenario.config.decision.timeout(ActionType::DigTile), Some(5));
    assert_eq!(scenario.config.decision.timeout(ActionType::WalkToTile), None);
    assert!(!scenario.creatures[1].worker);
    assert_eq!(scenario.entities[0].kind, EntityKind::GoldPile);

    let sim = Simulation::from_scenario(&scenario).unwrap();
    let map = sim.map();
    assert_eq!((map.width(), map.height()), (6, 4));
    let marked = map.tile(Cell::new(2, 1)).unwrap();
    assert!(marked.marked);
    assert_eq!(
        marked.kind,
        TileKind::Dirt {
            hardness: SimConfig::default().dirt_hardness
        }
    );
    assert_eq!(map.tile(Cell::new(1, 2)).unwrap().kind, TileKind::ClaimedFloor);
    assert_eq!(sim.agents().len(), 2);
    assert_eq!(map.entity_count(), 1);
}

#[test]
fn map_layout_errors() {
    let ragged = scenario(&["RRR", "R."], SimConfig::default());
    assert!(matches!(
        ragged.build_map(),
        Err(ConfigError::RaggedMap {
            row: 1,
            expected: 3,
            found: 2
        })
    ));

    let unknown = scenario(&["R?R"], SimConfig::default());
    assert!(matches!(
        unknown.build_map(),
        Err(ConfigError::UnknownTile { symbol: '?', cell }) if cell == Cell::new(1, 0)
    ));

    let empty = scenario(&[], SimConfig::default());
    assert!(matches!(empty.build_map(), Err(ConfigError::EmptyMap)));

    assert!(matches!(
        Scenario::from_yaml_str("map: 3"),
        Err(ConfigError::Yaml(_))
    ));
    assert!(matches!(
        Scenario::load("/definitely/not/here.yaml"),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn creature_outside_the_map_is_rejected() {
    let mut bad = Scenario::from_yaml_str(DUNGEON).unwrap();
    bad.creatures[0].at = Cell::new(6, 0);
    assert!(matches!(
        bad.build_map(),
        Err(ConfigError::OutOfBounds { .. })
    ));
}

#[test]
fn trace_records_transitions_and_serializes() {
    let config = SimConfig {
        trace: true,
        ..SimConfig::default()
    };
    let mut sim = sim_with(&["RRRRR", "R.DRR", "RRRRR"], config);
    sim.spawn_creature("imp", true, Cell::new(1, 1)).unwrap();
    sim.run(2);

    let trace = sim.trace().unwrap();
    let tags: Vec<&str> = trace.events.iter().map(|e| &*e.tag).collect();
    assert_eq!(tags, vec!["spawn", "pushed", "replaced"]);
    assert_eq!(
        trace.with_tag("replaced").next().unwrap().detail.as_deref(),
        Some("searchTileToDig=>digTile")
    );

    let json = serde_json::to_string(trace).unwrap();
    assert!(json.contains("\"tag\":\"pushed\""));
    let back: TraceLog = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, trace);
}

#[test]
fn untraced_runs_keep_no_log() {
    let mut sim = sim_with(&["RRR", "R.R", "RRR"], SimConfig::default());
    sim.spawn_creature("imp", true, Cell::new(1, 1)).unwrap();
    sim.run(3);
    assert!(sim.trace().is_none());
    assert_eq!(sim.summary().trace_events, 0);
}

#[test]
fn summary_reflects_the_world() {
    let scenario = Scenario::from_yaml_str(DUNGEON).unwrap();
    let mut sim = Simulation::from_scenario(&scenario).unwrap();
    sim.run(1);

    let summary = sim.summary();
    assert_eq!(summary.tick, 1);
    assert_eq!(summary.creatures.len(), 2);
    assert_eq!(summary.creatures[0].name, "imp");
    assert_eq!(summary.creatures[0].stack[0], "idle");
    assert_eq!(summary.tiles.marked, 2);
    assert_eq!(summary.tiles.claimed_floor, 1);
    assert_eq!(summary.entities.len(), 1);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["creatures"][1]["name"], "knight");
}
