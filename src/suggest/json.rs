//! Suggestion provider backed by a JSON payload
//!
//! Accepts the wire form agents actually produce: column mappings keyed by
//! source header with standard column names as values. Unknown standard
//! names are dropped; a payload that fails to parse at all is an
//! [`SuggestionError::Invalid`] and the pipeline proceeds rules-only.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::provider::{
    RatingOverrides, Suggestion, SuggestionContext, SuggestionError, SuggestionProvider,
};
use crate::cleaning::CleaningRule;
use crate::schema::{CanonicalField, SuggestedMapping};

/// Wire format of an agent suggestion
#[derive(Debug, Deserialize)]
struct WireSuggestion {
    /// {"Emp ID": "Employee Identifier", ...}
    #[serde(default)]
    column_mapping: BTreeMap<String, String>,
    #[serde(default)]
    cleaning_rules: Vec<CleaningRule>,
    #[serde(default)]
    rating_overrides: Option<RatingOverrides>,
    #[serde(default)]
    rationale: String,
}

/// Provider that parses a pre-recorded JSON suggestion
pub struct JsonSuggestionProvider {
    payload: String,
}

impl JsonSuggestionProvider {
    pub fn from_str(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SuggestionError> {
        let payload = fs::read_to_string(path.as_ref())
            .map_err(|e| SuggestionError::Transport(e.to_string()))?;
        Ok(Self { payload })
    }
}

impl SuggestionProvider for JsonSuggestionProvider {
    fn suggest(&self, context: &SuggestionContext) -> Result<Suggestion, SuggestionError> {
        let wire: WireSuggestion = serde_json::from_str(&self.payload)
            .map_err(|e| SuggestionError::Invalid(e.to_string()))?;

        let column_mapping = wire
            .column_mapping
            .into_iter()
            .filter_map(|(column, standard)| {
                match CanonicalField::from_standard_name(&standard) {
                    Some(field) => Some(SuggestedMapping {
                        column,
                        field,
                        confidence: None,
                    }),
                    None => {
                        log::warn!("suggestion names unknown standard column {standard:?}");
                        None
                    }
                }
            })
            .collect();

        let suggestion = Suggestion {
            column_mapping,
            cleaning_rules: wire.cleaning_rules,
            rating_overrides: wire.rating_overrides,
            rationale: wire.rationale,
        };
        Ok(suggestion.validated(&context.headers))
    }
}
