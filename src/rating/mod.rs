//! Rating configuration, premium engine, and output types

mod config;
mod engine;
mod output;

pub use config::RatingConfig;
pub use engine::RatingEngine;
pub use output::{EmployeeYearBreakdown, PremiumResult, SchoolYearMetrics};
