//! The reasoning-agent capability boundary
//!
//! The pipeline calls out with a data sample and schema context and expects
//! back a structured suggestion. The rationale text is opaque and never
//! actionable; structured fields are validated against the canonical schema
//! before use, and a failed or malformed call degrades the run to rules-only
//! rather than failing it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cleaning::CleaningRule;
use crate::rating::RatingConfig;
use crate::record::RawTable;
use crate::schema::{is_valid_assignment, SuggestedMapping};

/// How many raw rows are shared with a provider
const SAMPLE_ROWS: usize = 5;

/// Which extension point is asking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionStage {
    /// Before mapping/cleaning: column mapping and cleaning rules wanted
    DataAnalysis,
    /// Before rating: configuration overrides wanted
    CalculationAdaptation,
}

/// What the provider gets to look at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionContext {
    pub headers: Vec<String>,
    pub sample_rows: Vec<Vec<String>>,
    pub school_name: Option<String>,
    pub stage: SuggestionStage,
    /// Cleaned row count, populated for the calculation-adaptation call
    pub cleaned_rows: Option<usize>,
}

impl SuggestionContext {
    pub fn from_table(
        table: &RawTable,
        school_name: Option<String>,
        stage: SuggestionStage,
    ) -> Self {
        Self {
            headers: table.headers.clone(),
            sample_rows: table.sample(SAMPLE_ROWS),
            school_name,
            stage,
            cleaned_rows: None,
        }
    }
}

/// Optional overrides for the rating configuration
///
/// Suggestions may adapt configuration, never computed results; overridden
/// values still pass [`RatingConfig::validate`] before rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingOverrides {
    pub deductible_days: Option<f64>,
    pub cc_day_threshold: Option<f64>,
    pub cost_per_cc_day: Option<f64>,
    pub commission_rate: Option<f64>,
    pub cost_per_excess_day: Option<f64>,
}

impl RatingOverrides {
    pub fn apply(&self, base: &RatingConfig) -> RatingConfig {
        RatingConfig {
            deductible_days: self.deductible_days.unwrap_or(base.deductible_days),
            cc_day_threshold: self.cc_day_threshold.unwrap_or(base.cc_day_threshold),
            cost_per_cc_day: self.cost_per_cc_day.unwrap_or(base.cost_per_cc_day),
            commission_rate: self.commission_rate.unwrap_or(base.commission_rate),
            cost_per_excess_day: self.cost_per_excess_day.or(base.cost_per_excess_day),
            replacement_cost_per_day: base.replacement_cost_per_day,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A structured suggestion from the reasoning component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub column_mapping: Vec<SuggestedMapping>,
    #[serde(default)]
    pub cleaning_rules: Vec<CleaningRule>,
    #[serde(default)]
    pub rating_overrides: Option<RatingOverrides>,
    /// Free-text reasoning; kept for display, never acted on
    #[serde(default)]
    pub rationale: String,
}

impl Suggestion {
    /// Drop structured fields that do not validate against the schema:
    /// mappings naming columns the file does not have, and assignments the
    /// mapper guards forbid (hire dates as Date, Duration as day counts)
    pub fn validated(mut self, headers: &[String]) -> Suggestion {
        self.column_mapping.retain(|m| {
            let known = headers.iter().any(|h| *h == m.column);
            let valid = is_valid_assignment(&m.column, m.field);
            if !(known && valid) {
                log::warn!(
                    "discarding suggested mapping {} -> {:?}",
                    m.column,
                    m.field
                );
            }
            known && valid
        });
        self
    }
}

/// Why a suggestion could not be obtained
#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("suggestion provider timed out after {0:?}")]
    Timeout(Duration),
    #[error("suggestion transport failed: {0}")]
    Transport(String),
    #[error("suggestion payload invalid: {0}")]
    Invalid(String),
}

/// Capability interface for the reasoning component
///
/// Implementations wrap whatever remote call is in play and are expected to
/// bound their own latency; any error here is advisory-only and sends the
/// pipeline down the deterministic rules-only path.
pub trait SuggestionProvider {
    fn suggest(&self, context: &SuggestionContext) -> Result<Suggestion, SuggestionError>;
}

/// Deterministic provider returning a fixed suggestion; test double
pub struct FixedSuggestionProvider {
    pub suggestion: Suggestion,
}

impl SuggestionProvider for FixedSuggestionProvider {
    fn suggest(&self, _context: &SuggestionContext) -> Result<Suggestion, SuggestionError> {
        Ok(self.suggestion.clone())
    }
}

/// Provider that always times out; simulates an unreachable agent
pub struct UnavailableProvider;

impl SuggestionProvider for UnavailableProvider {
    fn suggest(&self, _context: &SuggestionContext) -> Result<Suggestion, SuggestionError> {
        Err(SuggestionError::Timeout(Duration::from_secs(30)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CanonicalField;

    #[test]
    fn test_validation_drops_unknown_columns_and_bad_assignments() {
        let headers: Vec<String> = vec!["Emp ID".into(), "Hire Date".into(), "Duration".into()];
        let suggestion = Suggestion {
            column_mapping: vec![
                SuggestedMapping {
                    column: "Emp ID".into(),
                    field: CanonicalField::EmployeeId,
                    confidence: Some(0.95),
                },
                SuggestedMapping {
                    column: "Hire Date".into(),
                    field: CanonicalField::Date,
                    confidence: Some(0.8),
                },
                SuggestedMapping {
                    column: "Duration".into(),
                    field: CanonicalField::AbsenceDays,
                    confidence: Some(0.7),
                },
                SuggestedMapping {
                    column: "Phantom".into(),
                    field: CanonicalField::Reason,
                    confidence: None,
                },
            ],
            ..Default::default()
        };

        let validated = suggestion.validated(&headers);
        assert_eq!(validated.column_mapping.len(), 1);
        assert_eq!(validated.column_mapping[0].column, "Emp ID");
    }

    #[test]
    fn test_overrides_apply_over_base() {
        let base = RatingConfig::default();
        let overrides = RatingOverrides {
            deductible_days: Some(25.0),
            cost_per_excess_day: Some(100.0),
            ..Default::default()
        };
        let merged = overrides.apply(&base);
        assert_eq!(merged.deductible_days, 25.0);
        assert_eq!(merged.cc_day_threshold, base.cc_day_threshold);
        assert_eq!(merged.cost_per_excess_day, Some(100.0));
    }
}
