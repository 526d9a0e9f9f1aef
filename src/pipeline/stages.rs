//! Staged pipeline orchestration
//!
//! Upload -> Map -> Filter -> Clean -> Rate, each stage consuming the
//! previous context and returning a new one, so a later stage can only see
//! state an earlier stage actually produced. The run history records what
//! happened at each stage for audit.
//!
//! The reasoning agent is consulted at two extension points: data analysis
//! before mapping/cleaning, and calculation adaptation before rating. Its
//! suggestions merge into the same deterministic mapper, cleaning engine,
//! and config validation as manual input; a failed call logs, records the
//! fallback, and the run continues rules-only.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use crate::cleaning::{clean, CleaningReport, CleaningRule};
use crate::filter::FilterSpec;
use crate::rating::{PremiumResult, RatingConfig, RatingEngine};
use crate::record::{conform, load_table, load_table_from_reader};
use crate::record::{CanonicalRecord, ConformReport, RawTable};
use crate::schema::{resolve, ColumnMap, SuggestedMapping};
use crate::suggest::{Suggestion, SuggestionContext, SuggestionProvider, SuggestionStage};

/// Pipeline stage markers, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Uploaded,
    Mapped,
    Filtered,
    Cleaned,
    Rated,
}

/// One audit entry per completed stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub stage: Stage,
    pub rows: usize,
    pub note: String,
}

/// Append-only audit trail; stages only ever advance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunHistory {
    pub entries: Vec<HistoryEntry>,
}

impl RunHistory {
    fn record(&mut self, stage: Stage, rows: usize, note: impl Into<String>) {
        debug_assert!(
            self.entries.last().map_or(true, |last| last.stage <= stage),
            "pipeline stages must advance monotonically"
        );
        self.entries.push(HistoryEntry {
            stage,
            rows,
            note: note.into(),
        });
    }

    pub fn last_stage(&self) -> Option<Stage> {
        self.entries.last().map(|e| e.stage)
    }
}

/// Context after upload: the raw table, untouched
pub struct UploadedRun {
    pub table: RawTable,
    pub history: RunHistory,
}

impl UploadedRun {
    pub fn from_table(table: RawTable) -> Self {
        let mut history = RunHistory::default();
        history.record(Stage::Uploaded, table.len(), "file ingested");
        Self { table, history }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        Ok(Self::from_table(load_table(path)?))
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self, PipelineError> {
        Ok(Self::from_table(load_table_from_reader(source)?))
    }

    /// Resolve the schema and conform rows to canonical records
    ///
    /// Halts with [`PipelineError::Mapping`] when a required field stays
    /// unresolved - nothing downstream may run on a partial mapping.
    pub fn map(self, suggestions: &[SuggestedMapping]) -> Result<MappedRun, PipelineError> {
        let column_map = resolve(&self.table.headers, suggestions);
        let missing = column_map.missing_required();
        if !missing.is_empty() {
            return Err(PipelineError::Mapping(missing));
        }

        let (records, conform_report) = conform(&self.table, &column_map);
        let mut history = self.history;
        history.record(
            Stage::Mapped,
            records.len(),
            format!(
                "{} column(s) resolved, {} row(s) skipped",
                column_map.columns.len(),
                conform_report.blank_employee_id
            ),
        );

        Ok(MappedRun {
            table: self.table,
            column_map,
            conform_report,
            records,
            history,
        })
    }
}

/// Context after schema mapping
pub struct MappedRun {
    pub table: RawTable,
    pub column_map: ColumnMap,
    pub conform_report: ConformReport,
    pub records: Vec<CanonicalRecord>,
    pub history: RunHistory,
}

impl MappedRun {
    /// Apply row filters; the empty spec keeps every record
    pub fn filter(self, spec: &FilterSpec) -> FilteredRun {
        let records = spec.apply(&self.records);
        let mut history = self.history;
        history.record(
            Stage::Filtered,
            records.len(),
            if spec.is_empty() {
                "no filters".to_string()
            } else {
                format!("{} of {} row(s) kept", records.len(), self.records.len())
            },
        );

        FilteredRun {
            column_map: self.column_map,
            conform_report: self.conform_report,
            records,
            history,
        }
    }
}

/// Context after row filtering
pub struct FilteredRun {
    pub column_map: ColumnMap,
    pub conform_report: ConformReport,
    pub records: Vec<CanonicalRecord>,
    pub history: RunHistory,
}

impl FilteredRun {
    /// Run the cleaning engine with standing rules plus `rules` in order
    pub fn clean(self, rules: &[CleaningRule]) -> CleanedRun {
        let (records, cleaning_report) = clean(&self.records, rules, &self.column_map);
        let mut history = self.history;
        let skipped = cleaning_report.skipped_rules();
        let note = if skipped.is_empty() {
            format!("{} row(s) removed", cleaning_report.rows_removed())
        } else {
            format!(
                "{} row(s) removed, skipped rule(s): {}",
                cleaning_report.rows_removed(),
                skipped.join(", ")
            )
        };
        history.record(Stage::Cleaned, records.len(), note);

        CleanedRun {
            column_map: self.column_map,
            conform_report: self.conform_report,
            cleaning_report,
            records,
            history,
        }
    }
}

/// Context after cleaning
pub struct CleanedRun {
    pub column_map: ColumnMap,
    pub conform_report: ConformReport,
    pub cleaning_report: CleaningReport,
    pub records: Vec<CanonicalRecord>,
    pub history: RunHistory,
}

impl CleanedRun {
    /// Rate the cleaned set under `config`
    pub fn rate(self, config: &RatingConfig) -> Result<CompletedRun, PipelineError> {
        let engine = RatingEngine::new(config.clone())?;
        let result = engine.rate(&self.records)?;
        let mut history = self.history;
        history.record(
            Stage::Rated,
            result.employee_years.len(),
            format!("premium computed for {} employee-year(s)", result.employee_years.len()),
        );

        Ok(CompletedRun {
            column_map: self.column_map,
            conform_report: self.conform_report,
            cleaning_report: self.cleaning_report,
            result,
            history,
        })
    }
}

/// Context after rating: the deliverable plus its full audit trail
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub column_map: ColumnMap,
    pub conform_report: ConformReport,
    pub cleaning_report: CleaningReport,
    pub result: PremiumResult,
    pub history: RunHistory,
}

/// One pipeline run's inputs: filter spec, rule list, rating configuration,
/// and an optional suggestion provider
///
/// Each run owns its configuration and rules; concurrent runs never share
/// mutable state.
pub struct Pipeline<'a> {
    pub filter: FilterSpec,
    pub rules: Vec<CleaningRule>,
    pub config: RatingConfig,
    pub provider: Option<&'a dyn SuggestionProvider>,
    pub school_name: Option<String>,
}

impl<'a> Pipeline<'a> {
    /// Rules-only pipeline with no reasoning component
    pub fn deterministic(rules: Vec<CleaningRule>, config: RatingConfig) -> Self {
        Self {
            filter: FilterSpec::none(),
            rules,
            config,
            provider: None,
            school_name: None,
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_provider(mut self, provider: &'a dyn SuggestionProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Ask the provider for a suggestion at one extension point; any failure
    /// degrades to None (rules-only path)
    fn consult(&self, table: &RawTable, stage: SuggestionStage) -> Option<Suggestion> {
        let provider = self.provider?;
        let context =
            SuggestionContext::from_table(table, self.school_name.clone(), stage);
        match provider.suggest(&context) {
            Ok(suggestion) => Some(suggestion.validated(&table.headers)),
            Err(err) => {
                log::warn!("suggestion provider failed at {stage:?}: {err}; continuing rules-only");
                None
            }
        }
    }

    /// Execute the full pipeline over an uploaded table
    pub fn run(&self, table: RawTable) -> Result<CompletedRun, PipelineError> {
        let uploaded = UploadedRun::from_table(table);

        // Extension point 1: data analysis (column mapping + cleaning rules)
        let analysis = self.consult(&uploaded.table, SuggestionStage::DataAnalysis);
        let (suggested_mapping, suggested_rules) = match &analysis {
            Some(s) => (s.column_mapping.clone(), s.cleaning_rules.clone()),
            None => (Vec::new(), Vec::new()),
        };

        let mapped = uploaded.map(&suggested_mapping)?;
        let filtered = mapped.filter(&self.filter);

        let mut rules = self.rules.clone();
        rules.extend(suggested_rules);
        let cleaned = filtered.clean(&rules);

        // Extension point 2: calculation adaptation (config overrides only;
        // computed results are never touched)
        let mut config = self.config.clone();
        if let Some(adaptation) = self.consult_for_rating(&cleaned) {
            if let Some(overrides) = adaptation.rating_overrides {
                if !overrides.is_empty() {
                    log::info!("applying suggested rating overrides");
                    config = overrides.apply(&config);
                }
            }
        }

        cleaned.rate(&config)
    }

    fn consult_for_rating(&self, cleaned: &CleanedRun) -> Option<Suggestion> {
        let provider = self.provider?;
        let context = SuggestionContext {
            headers: Vec::new(),
            sample_rows: Vec::new(),
            school_name: self.school_name.clone(),
            stage: SuggestionStage::CalculationAdaptation,
            cleaned_rows: Some(cleaned.records.len()),
        };
        match provider.suggest(&context) {
            Ok(suggestion) => Some(suggestion),
            Err(err) => {
                log::warn!("suggestion provider failed before rating: {err}; keeping configuration");
                None
            }
        }
    }

    /// Convenience: load a CSV and run the pipeline
    pub fn run_from_path<P: AsRef<Path>>(&self, path: P) -> Result<CompletedRun, PipelineError> {
        self.run(load_table(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::load_table_from_reader;
    use crate::schema::CanonicalField;
    use crate::suggest::{FixedSuggestionProvider, RatingOverrides, UnavailableProvider};
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
Employee ID,Employee Type,Absence Type,Duration,Date,Filled,Needs Substitute
AEnglish,Teacher,Custom Duration,112.5,2023-10-02,Filled,YES
BMartin,Teacher,Full Day,,2023-10-03,Unfilled,NO
CJones,Teacher,Full Day,,2023-10-04,Filled,YES
";

    fn table() -> RawTable {
        load_table_from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_full_run_rules_only() {
        let pipeline = Pipeline::deterministic(
            CleaningRule::district_defaults(),
            RatingConfig::default(),
        );
        let run = pipeline.run(table()).unwrap();
        assert_eq!(run.history.last_stage(), Some(Stage::Rated));
        // BMartin (Unfilled + NO) cleaned away; A has 15 days, C has 1
        assert_eq!(run.result.employee_years.len(), 2);
        assert_relative_eq!(run.result.total_premium, 0.0);
    }

    #[test]
    fn test_mapping_halt_before_cleaning() {
        let table =
            load_table_from_reader("Reason,School Name\nillness,Springfield\n".as_bytes())
                .unwrap();
        let pipeline = Pipeline::deterministic(vec![], RatingConfig::default());
        let err = pipeline.run(table).unwrap_err();
        match err {
            PipelineError::Mapping(missing) => {
                assert!(missing.contains(&CanonicalField::EmployeeId));
            }
            other => panic!("expected mapping error, got {other}"),
        }
    }

    #[test]
    fn test_agent_fallback_matches_rules_only() {
        let rules = CleaningRule::district_defaults();
        let config = RatingConfig::default();

        let rules_only = Pipeline::deterministic(rules.clone(), config.clone())
            .run(table())
            .unwrap();

        let provider = UnavailableProvider;
        let degraded = Pipeline::deterministic(rules, config)
            .with_provider(&provider)
            .run(table())
            .unwrap();

        let a = serde_json::to_vec(&rules_only.result).unwrap();
        let b = serde_json::to_vec(&degraded.result).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_suggested_overrides_flow_through_validation() {
        let provider = FixedSuggestionProvider {
            suggestion: Suggestion {
                rating_overrides: Some(RatingOverrides {
                    deductible_days: Some(10.0),
                    ..Default::default()
                }),
                ..Default::default()
            },
        };
        let pipeline = Pipeline::deterministic(
            CleaningRule::district_defaults(),
            RatingConfig::default(),
        )
        .with_provider(&provider);
        let run = pipeline.run(table()).unwrap();
        assert_eq!(run.result.config.deductible_days, 10.0);
        // AEnglish: 15 days - 10 deductible = 5 CC days
        assert_relative_eq!(run.result.total_cc_days, 5.0);
        assert_relative_eq!(run.result.total_premium, 5.0 * 150.0 * 1.15, max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_suggested_overrides_fail_closed() {
        let provider = FixedSuggestionProvider {
            suggestion: Suggestion {
                rating_overrides: Some(RatingOverrides {
                    commission_rate: Some(-1.0),
                    ..Default::default()
                }),
                ..Default::default()
            },
        };
        let pipeline = Pipeline::deterministic(
            CleaningRule::district_defaults(),
            RatingConfig::default(),
        )
        .with_provider(&provider);
        // A negative commission must not slip through as a financial figure
        let err = pipeline.run(table()).unwrap_err();
        assert!(matches!(err, PipelineError::CalculationInvariant(_)));
    }

    #[test]
    fn test_answer_key_file() {
        // Hand-verified oracle: see src/bin/check_answer_key.rs
        let pipeline = Pipeline::deterministic(
            CleaningRule::district_defaults(),
            RatingConfig::default(),
        );
        let run = pipeline.run_from_path("data/answer_key_small.csv").unwrap();
        assert_relative_eq!(run.result.total_cc_days, 145.0);
        assert_relative_eq!(run.result.total_excess_days, 20.0);
        assert_relative_eq!(run.result.total_premium, 25_012.50, max_relative = 1e-12);

        // Every employee-year lands in the same derived school year
        assert!(run
            .result
            .employee_years
            .iter()
            .all(|e| e.school_year.to_string() == "2023-2024"));
    }

    #[test]
    fn test_history_is_monotonic() {
        let pipeline = Pipeline::deterministic(
            CleaningRule::district_defaults(),
            RatingConfig::default(),
        );
        let run = pipeline.run(table()).unwrap();
        let stages: Vec<Stage> = run.history.entries.iter().map(|e| e.stage).collect();
        let mut sorted = stages.clone();
        sorted.sort();
        assert_eq!(stages, sorted);
        assert_eq!(stages.first(), Some(&Stage::Uploaded));
        assert_eq!(stages.last(), Some(&Stage::Rated));
    }
}
