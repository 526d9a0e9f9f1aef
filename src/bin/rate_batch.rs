//! Rate every absence file in a directory
//!
//! One pipeline run per file, executed in parallel. Each run gets its own
//! clone of the rule list and rating configuration, so nothing mutable is
//! shared across runs.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;

use rating_engine::{CleaningRule, Pipeline, RatingConfig};

#[derive(Debug, Parser)]
#[command(name = "rate_batch", about = "Rate a directory of district absence files")]
struct Args {
    /// Directory containing CSV absence files
    dir: PathBuf,

    #[arg(long, default_value_t = 20.0)]
    deductible: f64,

    #[arg(long = "cc-days", default_value_t = 60.0)]
    cc_days: f64,

    #[arg(long = "cost-per-cc-day", default_value_t = 150.0)]
    cost_per_cc_day: f64,

    #[arg(long, default_value_t = 0.15)]
    commission: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = RatingConfig {
        deductible_days: args.deductible,
        cc_day_threshold: args.cc_days,
        cost_per_cc_day: args.cost_per_cc_day,
        commission_rate: args.commission,
        cost_per_excess_day: None,
        replacement_cost_per_day: None,
    };

    let mut files: Vec<PathBuf> = std::fs::read_dir(&args.dir)
        .with_context(|| format!("reading {}", args.dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("no CSV files in {}", args.dir.display());
    }

    println!("Rating {} file(s)...", files.len());
    let start = Instant::now();

    let results: Vec<(PathBuf, Result<_, _>)> = files
        .par_iter()
        .map(|path| {
            let pipeline = Pipeline::deterministic(
                CleaningRule::district_defaults(),
                config.clone(),
            );
            (path.clone(), pipeline.run_from_path(path))
        })
        .collect();

    println!("Done in {:?}\n", start.elapsed());
    println!(
        "{:<40} {:>14} {:>12} {:>16}",
        "File", "CC Days", "Excess Days", "Premium"
    );
    println!("{}", "-".repeat(86));

    let mut failures = 0usize;
    for (path, outcome) in &results {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match outcome {
            Ok(run) => println!(
                "{:<40} {:>14.2} {:>12.2} {:>16}",
                name,
                run.result.total_cc_days,
                run.result.total_excess_days,
                format!("${:.2}", run.result.total_premium),
            ),
            Err(err) => {
                failures += 1;
                println!("{name:<40} FAILED: {err}");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} file(s) failed to rate");
    }
    Ok(())
}
