//! Rating Engine - absence premium pipeline for school-district substitute coverage
//!
//! This library provides:
//! - Schema mapping of arbitrary spreadsheet columns onto a canonical field set
//! - Row filtering and rule-based cleaning with a per-rule audit trail
//! - A deterministic premium engine (deductible / CC-day / excess-day split)
//! - Staged orchestration with reasoning-agent extension points and a
//!   rules-only fallback path

pub mod cleaning;
pub mod filter;
pub mod pipeline;
pub mod rating;
pub mod record;
pub mod schema;
pub mod suggest;

// Re-export commonly used types
pub use cleaning::{CleaningReport, CleaningRule};
pub use filter::FilterSpec;
pub use pipeline::{CompletedRun, Pipeline, PipelineError};
pub use rating::{PremiumResult, RatingConfig, RatingEngine, SchoolYearMetrics};
pub use record::{AbsenceType, CanonicalRecord, RawTable, SchoolYear};
pub use schema::{CanonicalField, ColumnMap};
pub use suggest::{Suggestion, SuggestionProvider};
