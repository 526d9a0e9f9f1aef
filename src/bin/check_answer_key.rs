//! Check the premium math against a hand-computed answer key
//!
//! Loads a tiny fixture with a known-correct answer and runs the
//! formula-only pipeline. If this binary reports a mismatch, the formula is
//! broken; if it passes but a real file disagrees with expectations, the
//! difference comes from the data (mapping, cleaning, filters), not the
//! arithmetic.
//!
//! Answer key (deductible 20, CC threshold 60, $150/day, 15% commission):
//!   TeacherA:  15 days -> below deductible, no CC days
//!   TeacherB:  50 days -> 30 CC days
//!   TeacherC:  75 days -> 55 CC days
//!   TeacherD: 100 days -> 60 CC days + 20 excess days
//! Total CC days 145, premium 145 x 150 x 1.15 = 25,012.50, excess unbilled.

use std::process::ExitCode;

use rating_engine::{CleaningRule, Pipeline, RatingConfig};

const ANSWER_KEY_PATH: &str = "data/answer_key_small.csv";
const TOLERANCE: f64 = 0.02;

struct Expectation {
    name: &'static str,
    expected: f64,
    actual: f64,
}

fn main() -> ExitCode {
    env_logger::init();

    let pipeline = Pipeline::deterministic(
        CleaningRule::district_defaults(),
        RatingConfig::default(),
    );

    let run = match pipeline.run_from_path(ANSWER_KEY_PATH) {
        Ok(run) => run,
        Err(err) => {
            eprintln!("failed to rate {ANSWER_KEY_PATH}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = &run.result;
    let checks = [
        Expectation {
            name: "total_cc_days",
            expected: 145.0,
            actual: result.total_cc_days,
        },
        Expectation {
            name: "total_excess_days",
            expected: 20.0,
            actual: result.total_excess_days,
        },
        Expectation {
            name: "total_premium",
            expected: 25_012.50,
            actual: result.total_premium,
        },
        Expectation {
            name: "chargeable_employee_years",
            expected: 3.0,
            actual: result.chargeable_employee_years() as f64,
        },
        Expectation {
            name: "high_claimant_years",
            expected: 1.0,
            actual: result.high_claimant_years() as f64,
        },
    ];

    let mut all_ok = true;
    for check in &checks {
        if (check.actual - check.expected).abs() > TOLERANCE {
            println!(
                "  WRONG {}: got {}, expected {}",
                check.name, check.actual, check.expected
            );
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!(">>> CORRECT <<<");
        println!("The premium formula matches the hand-computed answer key.");
        ExitCode::SUCCESS
    } else {
        println!(">>> WRONG <<<");
        println!("The calculation does not match the answer key; check the rating engine.");
        ExitCode::FAILURE
    }
}
