//! Cleaning rules as serializable data
//!
//! A rule is either an exclusion predicate or a derived-field rewrite over a
//! closed kind set, so rule lists can be stored, replayed, and audited. An
//! agent may suggest rules, but they run through the same engine as manually
//! supplied ones.

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;
use crate::record::CanonicalRecord;
use crate::schema::{CanonicalField, ColumnMap};

/// Employee types retained by the default roster restriction
pub const DEFAULT_TEACHER_TYPES: &[&str] = &["Teacher", "Teacher Music", "Teacher SpecEd"];

/// A named, parameterized cleaning rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CleaningRule {
    /// Drop rows with Filled="Unfilled" and Needs Substitute="NO"; no
    /// substitute was required, so the absence carries no coverage cost
    ExcludeUnfilledNoSubstitute,
    /// Retain only the listed employee types
    KeepEmployeeTypes { types: Vec<String> },
    /// Drop rows whose date falls outside their school-year window
    RequireDateInSchoolYear,
    /// Drop placeholder rows with no parseable absence type
    ExcludeMissingAbsenceType,
    /// Recompute the day count from absence type + duration
    RecomputeAbsenceDays,
}

/// What a rule does to a record set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Exclusion,
    Rewrite,
}

impl CleaningRule {
    /// Default district rule set (roster restriction + unfilled/no-sub drop
    /// + school-year date validation)
    pub fn district_defaults() -> Vec<CleaningRule> {
        vec![
            CleaningRule::ExcludeUnfilledNoSubstitute,
            CleaningRule::KeepEmployeeTypes {
                types: DEFAULT_TEACHER_TYPES.iter().map(|s| s.to_string()).collect(),
            },
            CleaningRule::RequireDateInSchoolYear,
        ]
    }

    /// Standing rules the engine applies before any user rules
    pub fn standing() -> Vec<CleaningRule> {
        vec![
            CleaningRule::ExcludeMissingAbsenceType,
            CleaningRule::RecomputeAbsenceDays,
        ]
    }

    /// Stable name used in audit reports and logs
    pub fn name(&self) -> &'static str {
        match self {
            CleaningRule::ExcludeUnfilledNoSubstitute => "exclude_unfilled_no_substitute",
            CleaningRule::KeepEmployeeTypes { .. } => "keep_employee_types",
            CleaningRule::RequireDateInSchoolYear => "require_date_in_school_year",
            CleaningRule::ExcludeMissingAbsenceType => "exclude_missing_absence_type",
            CleaningRule::RecomputeAbsenceDays => "recompute_absence_days",
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            CleaningRule::RecomputeAbsenceDays => RuleKind::Rewrite,
            _ => RuleKind::Exclusion,
        }
    }

    /// Canonical fields that must be resolved by mapping for this rule to
    /// apply; the engine skips (and logs) the rule otherwise
    pub fn required_fields(&self) -> &'static [CanonicalField] {
        match self {
            CleaningRule::ExcludeUnfilledNoSubstitute => {
                &[CanonicalField::Filled, CanonicalField::NeedsSubstitute]
            }
            CleaningRule::KeepEmployeeTypes { .. } => &[CanonicalField::EmployeeType],
            CleaningRule::RequireDateInSchoolYear => &[CanonicalField::Date],
            CleaningRule::ExcludeMissingAbsenceType => &[CanonicalField::AbsenceType],
            CleaningRule::RecomputeAbsenceDays => &[CanonicalField::AbsenceType],
        }
    }

    /// Check that every field this rule references was resolved by mapping
    pub fn validate_against(&self, map: &ColumnMap) -> Result<(), PipelineError> {
        let missing: Vec<CanonicalField> = self
            .required_fields()
            .iter()
            .copied()
            .filter(|f| !map.is_resolved(*f))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::RuleApplication {
                rule: self.name().to_string(),
                fields: missing,
            })
        }
    }

    /// Exclusion predicate: true keeps the record
    ///
    /// Rewrite rules always return true here.
    pub fn retains(&self, record: &CanonicalRecord) -> bool {
        match self {
            CleaningRule::ExcludeUnfilledNoSubstitute => {
                let unfilled = record
                    .filled
                    .as_deref()
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("unfilled"));
                let no_sub = record
                    .needs_substitute
                    .as_deref()
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("no"));
                !(unfilled && no_sub)
            }
            CleaningRule::KeepEmployeeTypes { types } => record
                .employee_type
                .as_deref()
                .is_some_and(|t| types.iter().any(|allowed| allowed == t)),
            CleaningRule::RequireDateInSchoolYear => {
                match (record.date, record.school_year) {
                    (Some(date), Some(sy)) => sy.contains(date),
                    // Nothing to validate against; keep the row
                    _ => true,
                }
            }
            CleaningRule::ExcludeMissingAbsenceType => record.absence_type.is_some(),
            CleaningRule::RecomputeAbsenceDays => true,
        }
    }

    /// Rewrite pass: returns the new record when a derived field changed
    ///
    /// Exclusion rules never rewrite.
    pub fn rewrite(&self, record: &CanonicalRecord) -> Option<CanonicalRecord> {
        match self {
            CleaningRule::RecomputeAbsenceDays => {
                let absence_type = record.absence_type?;
                let days = absence_type.absence_days(record.duration_hours);
                if days == record.absence_days {
                    None
                } else {
                    let mut updated = record.clone();
                    updated.absence_days = days;
                    Some(updated)
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AbsenceType;

    fn record() -> CanonicalRecord {
        CanonicalRecord {
            employee_id: "AEnglish".into(),
            employee_type: Some("Teacher".into()),
            employee_title: None,
            absence_type: Some(AbsenceType::FullDay),
            duration_hours: None,
            date: None,
            school_year: None,
            school_name: None,
            reason: None,
            filled: Some("Filled".into()),
            needs_substitute: Some("YES".into()),
            absence_days: 0.0,
            source_row: 1,
        }
    }

    #[test]
    fn test_unfilled_no_substitute_predicate() {
        let rule = CleaningRule::ExcludeUnfilledNoSubstitute;
        assert!(rule.retains(&record()));

        let mut r = record();
        r.filled = Some("Unfilled".into());
        r.needs_substitute = Some("NO".into());
        assert!(!rule.retains(&r));

        // Unfilled but a substitute was needed: coverage-relevant, keep it
        r.needs_substitute = Some("YES".into());
        assert!(rule.retains(&r));
    }

    #[test]
    fn test_keep_employee_types() {
        let rule = CleaningRule::KeepEmployeeTypes {
            types: vec!["Teacher".into(), "Teacher SpecEd".into()],
        };
        assert!(rule.retains(&record()));

        let mut r = record();
        r.employee_type = Some("Custodian".into());
        assert!(!rule.retains(&r));
        r.employee_type = None;
        assert!(!rule.retains(&r));
    }

    #[test]
    fn test_recompute_rewrites_only_on_change() {
        let rule = CleaningRule::RecomputeAbsenceDays;
        let r = record();
        let rewritten = rule.rewrite(&r).expect("0.0 -> 1.0 for a full day");
        assert_eq!(rewritten.absence_days, 1.0);
        assert!(rule.rewrite(&rewritten).is_none());
    }

    #[test]
    fn test_validate_against_unresolved_fields() {
        let headers: Vec<String> = vec!["Employee ID".into(), "Date".into()];
        let map = crate::schema::resolve(&headers, &[]);

        let err = CleaningRule::ExcludeUnfilledNoSubstitute
            .validate_against(&map)
            .unwrap_err();
        assert!(err.to_string().contains("Filled"));

        assert!(CleaningRule::RequireDateInSchoolYear.validate_against(&map).is_ok());
    }

    #[test]
    fn test_rules_round_trip_as_json() {
        let rules = vec![
            CleaningRule::ExcludeUnfilledNoSubstitute,
            CleaningRule::KeepEmployeeTypes {
                types: vec!["Teacher".into()],
            },
        ];
        let json = serde_json::to_string(&rules).unwrap();
        assert!(json.contains("\"kind\":\"keep_employee_types\""));
        let back: Vec<CleaningRule> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);
    }
}
