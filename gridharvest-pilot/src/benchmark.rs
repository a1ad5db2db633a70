//! Multi-seed benchmark sweep. Runs are independent games, so they fan out
//! across a rayon pool; aggregation and file output stay on the caller.

use crate::host::Scenario;
use crate::runner::{run_game, RunReport};
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub seeds: Vec<u32>,
    pub width: u32,
    pub height: u32,
    pub units: u32,
    pub hostiles: u32,
    pub turns: u32,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub jobs: Option<usize>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub avg_banked: f64,
    pub max_banked: u64,
    pub best_seed: u32,
    pub avg_collected: f64,
    pub avg_softlocks: f64,
    pub recall_rate: f64,
    pub runs: Vec<RunReport>,
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_one = |seed: &u32| -> Result<RunReport> {
        let mut scenario = Scenario::new(config.width, config.height, *seed);
        scenario.units = config.units;
        scenario.hostiles = config.hostiles;
        scenario.cfg.max_turns = config.turns;
        run_game(&scenario)
            .with_context(|| format!("benchmark run failed for seed {}", seed_to_hex(*seed)))
    };

    let results: Vec<Result<RunReport>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| config.seeds.par_iter().map(run_one).collect())
    } else {
        config.seeds.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(results.len());
    for result in results {
        runs.push(result?);
    }

    let count = runs.len() as f64;
    let sum_banked: u64 = runs.iter().map(|run| run.banked).sum();
    let sum_collected: u64 = runs.iter().map(|run| run.collected).sum();
    let sum_softlocks: u64 = runs.iter().map(|run| u64::from(run.softlocks)).sum();
    let recalled = runs.iter().filter(|run| run.recall_tick.is_some()).count();
    let best = runs
        .iter()
        .max_by(|a, b| a.banked.cmp(&b.banked).then_with(|| b.seed.cmp(&a.seed)))
        .map(|run| (run.seed, run.banked))
        .unwrap_or_default();

    runs.sort_by(|a, b| b.banked.cmp(&a.banked).then_with(|| a.seed.cmp(&b.seed)));
    write_runs_csv(&config.out_dir.join("runs.csv"), &runs)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        jobs: config.jobs,
        seeds: config.seeds,
        run_count: runs.len(),
        avg_banked: sum_banked as f64 / count,
        max_banked: best.1,
        best_seed: best.0,
        avg_collected: sum_collected as f64 / count,
        avg_softlocks: sum_softlocks as f64 / count,
        recall_rate: recalled as f64 / count,
        runs,
    };

    let report_path = config.out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(&report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))?;

    Ok(report)
}

fn write_runs_csv(path: &Path, rows: &[RunReport]) -> Result<()> {
    let mut csv = String::from(
        "seed_hex,seed,ticks,banked,collected,delivered,recall_tick,softlocks,spawned,final_units,leftover_resource\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            seed_to_hex(row.seed),
            row.seed,
            row.ticks,
            row.banked,
            row.collected,
            row.delivered,
            row.recall_tick
                .map(|tick| tick.to_string())
                .unwrap_or_default(),
            row.softlocks,
            row.spawned,
            row.final_units,
            row.leftover_resource
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
