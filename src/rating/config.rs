//! Rating configuration

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;

/// Inputs to the premium formula
///
/// Per employee and school year: days beyond the deductible are chargeable;
/// the first `cc_day_threshold` of them are CC days billed at
/// `cost_per_cc_day`, the remainder are excess days billed at
/// `cost_per_excess_day` when that rate is set and otherwise reported
/// without charge. Commission applies to every billed day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Absence days per employee-year not charged to the premium
    pub deductible_days: f64,
    /// Maximum CC days per employee-year
    pub cc_day_threshold: f64,
    /// Rate per CC day
    pub cost_per_cc_day: f64,
    /// Commission rate, e.g. 0.15 for 15%
    pub commission_rate: f64,
    /// Rate per excess day beyond the CC threshold; None = excess days are
    /// reported but not billed
    #[serde(default)]
    pub cost_per_excess_day: Option<f64>,
    /// District replacement cost per day, used only for the school-year
    /// metrics cross-check table
    #[serde(default)]
    pub replacement_cost_per_day: Option<f64>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            deductible_days: 20.0,
            cc_day_threshold: 60.0,
            cost_per_cc_day: 150.0,
            commission_rate: 0.15,
            cost_per_excess_day: None,
            replacement_cost_per_day: None,
        }
    }
}

impl RatingConfig {
    /// Reject configurations that cannot produce a sane premium
    pub fn validate(&self) -> Result<(), PipelineError> {
        let check = |name: &str, value: f64| {
            if !value.is_finite() || value < 0.0 {
                Err(PipelineError::CalculationInvariant(format!(
                    "{name} out of bounds: {value}"
                )))
            } else {
                Ok(())
            }
        };
        check("deductible_days", self.deductible_days)?;
        check("cc_day_threshold", self.cc_day_threshold)?;
        check("cost_per_cc_day", self.cost_per_cc_day)?;
        check("commission_rate", self.commission_rate)?;
        if let Some(rate) = self.cost_per_excess_day {
            check("cost_per_excess_day", rate)?;
        }
        if let Some(rate) = self.replacement_cost_per_day {
            check("replacement_cost_per_day", rate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RatingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_commission_rejected() {
        let config = RatingConfig {
            commission_rate: -0.15,
            ..RatingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_rate_rejected() {
        let config = RatingConfig {
            cost_per_cc_day: f64::NAN,
            ..RatingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RatingConfig {
            cost_per_excess_day: Some(f64::INFINITY),
            ..RatingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
