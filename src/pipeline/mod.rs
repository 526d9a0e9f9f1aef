//! Staged pipeline orchestration and error taxonomy

mod error;
mod stages;

pub use error::PipelineError;
pub use stages::{
    CleanedRun, CompletedRun, FilteredRun, HistoryEntry, MappedRun, Pipeline, RunHistory, Stage,
    UploadedRun,
};
