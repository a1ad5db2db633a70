//! Closed-loop game driver: host + pilot for a full turn budget, reduced to
//! a serializable report.

use crate::engine::Pilot;
use crate::host::{Host, Scenario, PILOT_OWNER};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u32,
    pub width: u32,
    pub height: u32,
    pub ticks: u32,
    pub banked: u64,
    pub collected: u64,
    pub delivered: u64,
    pub recall_tick: Option<u32>,
    pub softlocks: u32,
    pub spawned: u32,
    pub final_units: usize,
    pub leftover_resource: u64,
}

pub fn run_game(scenario: &Scenario) -> Result<RunReport> {
    scenario
        .cfg
        .validate()
        .context("scenario carries an invalid game config")?;
    let mut host = Host::new(scenario)
        .with_context(|| format!("failed building host for seed {:#010x}", scenario.seed))?;
    let mut pilot = Pilot::new(scenario.cfg, PILOT_OWNER, scenario.seed)
        .context("failed building pilot")?;

    while !host.game_over() {
        let spawn = host.wants_spawn(pilot.ledger());
        let tick = host.tick();
        let intents = pilot.plan_turn(host.world_mut(), tick, spawn);
        host.apply(&intents, spawn);
    }

    let final_units = host
        .world()
        .units()
        .iter()
        .filter(|unit| unit.owner == PILOT_OWNER)
        .count();

    Ok(RunReport {
        seed: scenario.seed,
        width: scenario.width,
        height: scenario.height,
        ticks: host.tick(),
        banked: host.banked(),
        collected: pilot.ledger().total_collected(),
        delivered: pilot.ledger().total_delivered(),
        recall_tick: pilot.recall_tick(),
        softlocks: pilot.softlocks(),
        spawned: host.spawned(),
        final_units,
        leftover_resource: host.world().total_resource(),
    })
}

pub fn write_report_json(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
    }
    fs::write(
        path,
        serde_json::to_vec_pretty(report).context("failed to serialize run report")?,
    )
    .with_context(|| format!("failed writing {}", path.display()))
}
