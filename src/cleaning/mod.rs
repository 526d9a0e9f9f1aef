//! Cleaning rules and the rule-application engine

mod engine;
mod rules;

pub use engine::{clean, CleaningReport, RuleOutcome};
pub use rules::{CleaningRule, RuleKind, DEFAULT_TEACHER_TYPES};
