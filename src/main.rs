//! Rating Engine CLI
//!
//! Runs the full pipeline over one uploaded absence file and prints the
//! school-year metrics and premium summary. All figures are rounded at
//! display only.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use rating_engine::suggest::JsonSuggestionProvider;
use rating_engine::{CleaningRule, FilterSpec, Pipeline, RatingConfig};

#[derive(Debug, Parser)]
#[command(name = "rating_engine", version, about = "Absence premium rating pipeline")]
struct Args {
    /// Input absence file (CSV)
    input: PathBuf,

    /// Absence days per employee-year not charged to the premium
    #[arg(long, default_value_t = 20.0)]
    deductible: f64,

    /// Maximum CC days per employee-year
    #[arg(long = "cc-days", default_value_t = 60.0)]
    cc_days: f64,

    /// Rate per CC day in dollars
    #[arg(long = "cost-per-cc-day", default_value_t = 150.0)]
    cost_per_cc_day: f64,

    /// Commission rate (0.15 = 15%)
    #[arg(long, default_value_t = 0.15)]
    commission: f64,

    /// Rate per excess day beyond the CC threshold; omit to report excess
    /// days without billing them
    #[arg(long = "cost-per-excess-day")]
    cost_per_excess_day: Option<f64>,

    /// District replacement cost per day, for the metrics cross-check
    #[arg(long = "replacement-cost")]
    replacement_cost: Option<f64>,

    /// Restrict to these employee types (repeatable); default applies the
    /// standard teacher roster rule instead
    #[arg(long = "employee-type")]
    employee_types: Vec<String>,

    /// Skip the default district cleaning rules
    #[arg(long = "no-default-rules")]
    no_default_rules: bool,

    /// Pre-recorded agent suggestion (JSON) to merge into the run
    #[arg(long)]
    suggestion: Option<PathBuf>,

    /// School name passed along to the suggestion provider
    #[arg(long = "school-name")]
    school_name: Option<String>,

    /// Write the employee-year breakdown to this CSV file
    #[arg(long, default_value = "premium_breakdown.csv")]
    output: PathBuf,

    /// Print the full result as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = RatingConfig {
        deductible_days: args.deductible,
        cc_day_threshold: args.cc_days,
        cost_per_cc_day: args.cost_per_cc_day,
        commission_rate: args.commission,
        cost_per_excess_day: args.cost_per_excess_day,
        replacement_cost_per_day: args.replacement_cost,
    };

    let mut rules = if args.no_default_rules {
        Vec::new()
    } else {
        CleaningRule::district_defaults()
    };
    // An explicit employee-type selection replaces the default roster rule
    if !args.employee_types.is_empty() {
        rules.retain(|r| !matches!(r, CleaningRule::KeepEmployeeTypes { .. }));
    }

    let filter = if args.employee_types.is_empty() {
        FilterSpec::none()
    } else {
        FilterSpec::none().with_employee_types(args.employee_types.iter().cloned())
    };

    let provider = match &args.suggestion {
        Some(path) => Some(
            JsonSuggestionProvider::from_path(path)
                .with_context(|| format!("reading suggestion file {}", path.display()))?,
        ),
        None => None,
    };

    let mut pipeline = Pipeline::deterministic(rules, config).with_filter(filter);
    pipeline.school_name = args.school_name.clone();
    if let Some(p) = provider.as_ref() {
        pipeline = pipeline.with_provider(p);
    }

    let run = pipeline
        .run_from_path(&args.input)
        .with_context(|| format!("rating {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run.result)?);
        return Ok(());
    }

    println!("Rating Engine v{}", env!("CARGO_PKG_VERSION"));
    println!("======================\n");

    println!("Pipeline:");
    for entry in &run.history.entries {
        println!("  {:?}: {} row(s) - {}", entry.stage, entry.rows, entry.note);
    }
    println!();

    println!("School Year Metrics:");
    println!(
        "{:>12} {:>8} {:>14} {:>18}",
        "Year", "Staff", "Absence Days", "Replacement Cost"
    );
    println!("{}", "-".repeat(56));
    for metrics in &run.result.school_years {
        println!(
            "{:>12} {:>8} {:>14.2} {:>18}",
            metrics.school_year.to_string(),
            metrics.total_staff,
            metrics.total_absence_days,
            metrics
                .total_replacement_cost
                .map(|c| format!("${c:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    println!();

    println!("Premium Summary:");
    println!("  Employee-years rated: {}", run.result.employee_years.len());
    println!("  Chargeable employee-years: {}", run.result.chargeable_employee_years());
    println!("  High claimant employee-years: {}", run.result.high_claimant_years());
    println!("  Total CC Days: {:.2}", run.result.total_cc_days);
    println!("  Total Excess Days: {:.2}", run.result.total_excess_days);
    println!("  TOTAL PREMIUM: ${:.2}", run.result.total_premium);

    // Full breakdown to CSV for verification against the source file
    let mut file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    writeln!(
        file,
        "EmployeeID,SchoolYear,TotalDays,ChargeableDays,CCDays,ExcessDays,Premium"
    )?;
    for row in &run.result.employee_years {
        writeln!(
            file,
            "{},{},{:.4},{:.4},{:.4},{:.4},{:.8}",
            row.employee_id,
            row.school_year,
            row.total_days,
            row.chargeable_days,
            row.cc_days,
            row.excess_days,
            row.premium,
        )?;
    }
    println!("\nEmployee-year breakdown written to: {}", args.output.display());

    Ok(())
}
