//! Deterministic premium engine
//!
//! Runs with zero network dependency given a fixed configuration; this is
//! the baseline correctness oracle for the whole pipeline. All arithmetic is
//! f64 with no intermediate rounding - display formatting rounds, nothing
//! else does.

use std::collections::BTreeMap;

use super::config::RatingConfig;
use super::output::{EmployeeYearBreakdown, PremiumResult, SchoolYearMetrics};
use crate::pipeline::PipelineError;
use crate::record::{CanonicalRecord, SchoolYear};

/// Premium engine over a cleaned record set
pub struct RatingEngine {
    config: RatingConfig,
}

impl RatingEngine {
    /// Create an engine, validating the configuration up front
    pub fn new(config: RatingConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Rate a cleaned record set
    ///
    /// Records without a school year cannot be grouped and are rejected -
    /// they should have been resolved or cleaned away before rating.
    pub fn rate(&self, records: &[CanonicalRecord]) -> Result<PremiumResult, PipelineError> {
        // BTreeMap keys give a stable grouping order, which makes the result
        // (and its serialization) reproducible across runs
        let mut groups: BTreeMap<(String, SchoolYear), f64> = BTreeMap::new();

        for record in records {
            if record.absence_days < 0.0 || !record.absence_days.is_finite() {
                return Err(PipelineError::CalculationInvariant(format!(
                    "record at source row {} has absence_days {}",
                    record.source_row, record.absence_days
                )));
            }
            let school_year = record.school_year.ok_or_else(|| {
                PipelineError::CalculationInvariant(format!(
                    "record at source row {} has no school year",
                    record.source_row
                ))
            })?;
            *groups
                .entry((record.employee_id.clone(), school_year))
                .or_insert(0.0) += record.absence_days;
        }

        let commission = 1.0 + self.config.commission_rate;
        let mut employee_years = Vec::with_capacity(groups.len());
        let mut total_premium = 0.0;
        let mut total_cc_days = 0.0;
        let mut total_excess_days = 0.0;

        for ((employee_id, school_year), total_days) in groups {
            let chargeable_days = (total_days - self.config.deductible_days).max(0.0);
            let cc_days = chargeable_days.min(self.config.cc_day_threshold);
            let excess_days = chargeable_days - cc_days;

            let mut premium = cc_days * self.config.cost_per_cc_day * commission;
            if let Some(excess_rate) = self.config.cost_per_excess_day {
                premium += excess_days * excess_rate * commission;
            }

            if !premium.is_finite() {
                return Err(PipelineError::CalculationInvariant(format!(
                    "non-finite premium for employee {employee_id} in {school_year}"
                )));
            }

            total_premium += premium;
            total_cc_days += cc_days;
            total_excess_days += excess_days;
            employee_years.push(EmployeeYearBreakdown {
                employee_id,
                school_year,
                total_days,
                chargeable_days,
                cc_days,
                excess_days,
                premium,
            });
        }

        let school_years = self.school_year_metrics(records);

        Ok(PremiumResult {
            total_premium,
            total_cc_days,
            total_excess_days,
            employee_years,
            school_years,
            config: self.config.clone(),
        })
    }

    /// Per-school-year staff counts, day totals, and replacement cost
    fn school_year_metrics(&self, records: &[CanonicalRecord]) -> Vec<SchoolYearMetrics> {
        let mut days: BTreeMap<SchoolYear, f64> = BTreeMap::new();
        let mut staff: BTreeMap<SchoolYear, std::collections::BTreeSet<&str>> = BTreeMap::new();

        for record in records {
            if let Some(sy) = record.school_year {
                *days.entry(sy).or_insert(0.0) += record.absence_days;
                staff.entry(sy).or_default().insert(record.employee_id.as_str());
            }
        }

        days.into_iter()
            .map(|(school_year, total_absence_days)| SchoolYearMetrics {
                school_year,
                total_staff: staff.get(&school_year).map_or(0, |s| s.len()),
                total_absence_days,
                total_replacement_cost: self
                    .config
                    .replacement_cost_per_day
                    .map(|rate| total_absence_days * rate),
            })
            .collect()
    }
}
