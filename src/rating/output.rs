//! Rating output structures

use serde::{Deserialize, Serialize};

use super::config::RatingConfig;
use crate::record::SchoolYear;

/// Day-count split and premium for one employee in one school year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeYearBreakdown {
    pub employee_id: String,
    pub school_year: SchoolYear,
    /// Sum of absence days for this employee-year
    pub total_days: f64,
    /// Days beyond the deductible: max(0, total - deductible)
    pub chargeable_days: f64,
    /// min(chargeable, cc_day_threshold)
    pub cc_days: f64,
    /// chargeable - cc_days; billed only when an excess rate is configured
    pub excess_days: f64,
    pub premium: f64,
}

/// Aggregate figures for one school year, from the cleaned record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolYearMetrics {
    pub school_year: SchoolYear,
    /// Distinct employees with at least one absence
    pub total_staff: usize,
    /// Sum of absence days (not a row count)
    pub total_absence_days: f64,
    /// total_absence_days x replacement cost per day, when configured
    pub total_replacement_cost: Option<f64>,
}

/// Final rating output
///
/// A pure function of (cleaned records, rule set, configuration): rows are
/// ordered by employee then school year, so identical inputs serialize to
/// identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumResult {
    pub total_premium: f64,
    pub total_cc_days: f64,
    pub total_excess_days: f64,
    pub employee_years: Vec<EmployeeYearBreakdown>,
    pub school_years: Vec<SchoolYearMetrics>,
    /// Configuration the figures were produced under
    pub config: RatingConfig,
}

impl PremiumResult {
    /// Employees with at least one chargeable day
    pub fn chargeable_employee_years(&self) -> usize {
        self.employee_years
            .iter()
            .filter(|e| e.chargeable_days > 0.0)
            .count()
    }

    /// Employee-years whose chargeable days exceed the CC threshold
    pub fn high_claimant_years(&self) -> usize {
        self.employee_years
            .iter()
            .filter(|e| e.excess_days > 0.0)
            .count()
    }
}
