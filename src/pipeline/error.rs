//! Pipeline error taxonomy
//!
//! Recoverable conditions (unresolved mapping, skipped rules, agent
//! unavailability) either halt before any money math or degrade to the
//! deterministic path; invariant violations are fatal to the run and no
//! result is returned. Nothing in between may silently change a premium.

use thiserror::Error;

use crate::schema::CanonicalField;
use crate::suggest::SuggestionError;

fn field_names(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required canonical fields could not be resolved; the caller must
    /// supply a mapping before cleaning can run
    #[error("required canonical field(s) unresolved: {}", field_names(.0))]
    Mapping(Vec<CanonicalField>),

    /// A cleaning rule references fields the mapping did not resolve; the
    /// engine skips such rules, this variant exists for validation APIs
    #[error("cleaning rule {rule} requires unresolved field(s): {}", field_names(.fields))]
    RuleApplication {
        rule: String,
        fields: Vec<CanonicalField>,
    },

    /// Reasoning component failed; the run continues rules-only
    #[error("reasoning agent unavailable: {0}")]
    AgentUnavailable(#[from] SuggestionError),

    /// Negative day counts, non-finite premiums, or unusable configuration
    #[error("calculation invariant violated: {0}")]
    CalculationInvariant(String),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse input: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_error_names_fields() {
        let err = PipelineError::Mapping(vec![
            CanonicalField::EmployeeId,
            CanonicalField::SchoolYear,
        ]);
        let msg = err.to_string();
        assert!(msg.contains("Employee Identifier"));
        assert!(msg.contains("School Year"));
    }
}
