//! Ordered application of cleaning rules with an audit trail

use serde::{Deserialize, Serialize};

use super::rules::{CleaningRule, RuleKind};
use crate::record::CanonicalRecord;
use crate::schema::ColumnMap;

/// Outcome of one rule in a cleaning pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub removed: usize,
    pub rewritten: usize,
    /// Rule required a canonical field the mapping did not resolve
    pub skipped: bool,
}

/// Per-rule audit of a cleaning pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub outcomes: Vec<RuleOutcome>,
}

impl CleaningReport {
    pub fn rows_removed(&self) -> usize {
        self.rows_in - self.rows_out
    }

    /// Names of rules that were skipped for missing fields
    pub fn skipped_rules(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.skipped)
            .map(|o| o.rule.as_str())
            .collect()
    }
}

/// Apply standing rules, then `rules` in order, producing a new record set
///
/// Standing rules recompute day counts from absence type + duration and drop
/// placeholder rows, regardless of what the caller supplies. A rule whose
/// required fields were not resolved by `map` is skipped and logged rather
/// than failing the run. Exclusion rules are idempotent, so cleaning an
/// already-clean set removes nothing.
pub fn clean(
    records: &[CanonicalRecord],
    rules: &[CleaningRule],
    map: &ColumnMap,
) -> (Vec<CanonicalRecord>, CleaningReport) {
    let mut report = CleaningReport {
        rows_in: records.len(),
        ..Default::default()
    };

    let mut current: Vec<CanonicalRecord> = records.to_vec();

    let standing = CleaningRule::standing();
    let all_rules = standing.iter().chain(rules.iter());

    for rule in all_rules {
        if let Err(err) = rule.validate_against(map) {
            log::warn!("cleaning rule skipped: {err}");
            report.outcomes.push(RuleOutcome {
                rule: rule.name().to_string(),
                removed: 0,
                rewritten: 0,
                skipped: true,
            });
            continue;
        }

        let before = current.len();
        let mut rewritten = 0usize;
        current = match rule.kind() {
            RuleKind::Exclusion => current.into_iter().filter(|r| rule.retains(r)).collect(),
            RuleKind::Rewrite => current
                .into_iter()
                .map(|r| match rule.rewrite(&r) {
                    Some(updated) => {
                        rewritten += 1;
                        updated
                    }
                    None => r,
                })
                .collect(),
        };

        report.outcomes.push(RuleOutcome {
            rule: rule.name().to_string(),
            removed: before - current.len(),
            rewritten,
            skipped: false,
        });
    }

    report.rows_out = current.len();
    (current, report)
}
