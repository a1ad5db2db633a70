use anyhow::Result;
use clap::{Parser, Subcommand};
use gridharvest_pilot::benchmark::{run_benchmark, BenchmarkConfig};
use gridharvest_pilot::host::Scenario;
use gridharvest_pilot::runner::{run_game, write_report_json};
use gridharvest_pilot::util::{parse_seed, parse_seed_csv, parse_seed_file, seed_to_hex};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "gridharvest-pilot")]
#[command(about = "Deterministic grid-harvest coordination lab: single runs and multi-seed benchmarks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play one full game against the local host and report the outcome
    Run {
        #[arg(long, default_value = "0xA57E0001")]
        seed: String,
        #[arg(long, default_value_t = 32)]
        width: u32,
        #[arg(long, default_value_t = 32)]
        height: u32,
        #[arg(long, default_value_t = 2)]
        units: u32,
        #[arg(long, default_value_t = 0)]
        hostiles: u32,
        #[arg(long, default_value_t = 400)]
        turns: u32,
        /// Write the JSON run report here instead of stdout summary only
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Sweep many seeds in parallel and aggregate the results
    Benchmark {
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_file: Option<PathBuf>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 12)]
        seed_count: u32,
        #[arg(long, default_value_t = 32)]
        width: u32,
        #[arg(long, default_value_t = 32)]
        height: u32,
        #[arg(long, default_value_t = 2)]
        units: u32,
        #[arg(long, default_value_t = 0)]
        hostiles: u32,
        #[arg(long, default_value_t = 400)]
        turns: u32,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let Cli { command } = Cli::parse();

    match command {
        Commands::Run {
            seed,
            width,
            height,
            units,
            hostiles,
            turns,
            output,
        } => {
            let seed = parse_seed(&seed)?;
            let mut scenario = Scenario::new(width, height, seed);
            scenario.units = units;
            scenario.hostiles = hostiles;
            scenario.cfg.max_turns = turns;

            let report = run_game(&scenario)?;
            println!("seed={}", seed_to_hex(report.seed));
            println!("ticks={}", report.ticks);
            println!("banked={}", report.banked);
            println!("collected={}", report.collected);
            println!("delivered={}", report.delivered);
            println!(
                "recall_tick={}",
                report
                    .recall_tick
                    .map(|tick| tick.to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            println!("softlocks={}", report.softlocks);
            println!("spawned={}", report.spawned);
            println!("final_units={}", report.final_units);
            println!("leftover_resource={}", report.leftover_resource);
            if let Some(path) = output {
                write_report_json(&path, &report)?;
                println!("output={}", path.display());
            }
        }
        Commands::Benchmark {
            seeds,
            seed_file,
            seed_start,
            seed_count,
            width,
            height,
            units,
            hostiles,
            turns,
            out_dir,
            jobs,
        } => {
            let seeds = resolve_seeds(
                seeds.as_deref(),
                seed_file.as_deref(),
                seed_start.as_deref(),
                seed_count,
            )?;
            let out_dir = out_dir
                .unwrap_or_else(|| PathBuf::from(format!("benchmarks/{}", timestamp_suffix())));

            let report = run_benchmark(BenchmarkConfig {
                seeds,
                width,
                height,
                units,
                hostiles,
                turns,
                out_dir: out_dir.clone(),
                jobs,
            })?;

            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("avg_banked={:.1}", report.avg_banked);
            println!(
                "best seed={} banked={}",
                seed_to_hex(report.best_seed),
                report.max_banked
            );
            println!("avg_collected={:.1}", report.avg_collected);
            println!("avg_softlocks={:.2}", report.avg_softlocks);
            println!("recall_rate={:.0}%", report.recall_rate * 100.0);
            println!("out_dir={}", out_dir.display());
            println!("top runs:");
            for (idx, run) in report.runs.iter().take(5).enumerate() {
                println!(
                    "  {}. {} banked={} collected={} softlocks={} units={}",
                    idx + 1,
                    seed_to_hex(run.seed),
                    run.banked,
                    run.collected,
                    run.softlocks,
                    run.final_units,
                );
            }
        }
    }

    Ok(())
}

fn resolve_seeds(
    seeds: Option<&str>,
    seed_file: Option<&Path>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(path) = seed_file {
        return parse_seed_file(path);
    }
    if let Some(csv) = seeds {
        return parse_seed_csv(csv);
    }

    let start = if let Some(start) = seed_start {
        parse_seed(start)?
    } else {
        0xA57E_0001
    };

    let mut out = Vec::with_capacity(seed_count as usize);
    let mut cur = start;
    for _ in 0..seed_count {
        out.push(cur);
        cur = cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    }
    Ok(out)
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}
