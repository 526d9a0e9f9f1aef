//! Row filters applied between mapping and cleaning
//!
//! Filters only narrow the record set; they never touch absence type or
//! duration, so the day-count arithmetic downstream is unaffected by
//! whatever subset the caller selects.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::CanonicalRecord;

/// Inclusion filters combined with logical AND
///
/// An empty spec is the identity transform: every record passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Inclusive date range; records without a date fail a date filter
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Allowed employee types; empty set means no restriction
    pub employee_types: BTreeSet<String>,
}

impl FilterSpec {
    /// No filtering at all
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    pub fn with_employee_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.employee_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.date_range.is_none() && self.employee_types.is_empty()
    }

    fn matches(&self, record: &CanonicalRecord) -> bool {
        if let Some((start, end)) = self.date_range {
            match record.date {
                Some(date) if date >= start && date <= end => {}
                _ => return false,
            }
        }
        if !self.employee_types.is_empty() {
            match &record.employee_type {
                Some(t) if self.employee_types.contains(t) => {}
                _ => return false,
            }
        }
        true
    }

    /// Records satisfying every filter in the spec
    pub fn apply(&self, records: &[CanonicalRecord]) -> Vec<CanonicalRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}
