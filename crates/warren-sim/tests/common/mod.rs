#![allow(dead_code)]

use warren_sim::{Scenario, SimConfig, Simulation};

pub fn scenario(rows: &[&str], config: SimConfig) -> Scenario {
    Scenario {
        config,
        map: rows.iter().map(|row| row.to_string()).collect(),
        creatures: Vec::new(),
        entities: Vec::new(),
    }
}

/// Empty simulation over `rows` with default knobs.
pub fn sim(rows: &[&str]) -> Simulation {
    sim_with(rows, SimConfig::default())
}

pub fn sim_with(rows: &[&str], config: SimConfig) -> Simulation {
    Simulation::from_scenario(&scenario(rows, config)).expect("valid scenario")
}
