//! Resolve raw column headers against the canonical schema
//!
//! Resolution is deliberately conservative: exact alias match first, then an
//! agent suggestion when it does not contradict an alias match, otherwise the
//! field stays unresolved for the caller to handle. No fuzzy matching - a
//! mis-mapped cost-bearing column is worse than an unresolved one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fields::{normalize_header, CanonicalField, FIELD_ALIASES};

/// An agent-suggested header-to-field assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedMapping {
    /// Source column header, exactly as it appears in the file
    pub column: String,
    pub field: CanonicalField,
    /// Provider confidence in [0, 1]; informational only
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Outcome of schema resolution for one uploaded file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMap {
    /// Resolved source column -> canonical field (one column per field)
    pub columns: BTreeMap<String, CanonicalField>,
    /// Canonical fields no source column resolved to
    pub unresolved: Vec<CanonicalField>,
}

impl ColumnMap {
    /// Source column mapped to `field`, if any
    pub fn column_for(&self, field: CanonicalField) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, f)| **f == field)
            .map(|(c, _)| c.as_str())
    }

    /// Whether `field` was resolved to a source column
    pub fn is_resolved(&self, field: CanonicalField) -> bool {
        self.columns.values().any(|f| *f == field)
    }

    /// Canonical fields the rating pipeline cannot run without:
    /// an employee id, a year or a date to derive it from, and either the
    /// absence type + duration pair or a pre-computed day count.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        let mut missing = Vec::new();
        if !self.is_resolved(CanonicalField::EmployeeId) {
            missing.push(CanonicalField::EmployeeId);
        }
        if !self.is_resolved(CanonicalField::SchoolYear) && !self.is_resolved(CanonicalField::Date) {
            missing.push(CanonicalField::SchoolYear);
        }
        let has_typed = self.is_resolved(CanonicalField::AbsenceType);
        let has_days = self.is_resolved(CanonicalField::AbsenceDays);
        if !has_typed && !has_days {
            missing.push(CanonicalField::AbsenceDays);
        }
        missing
    }
}

/// A header that looks like a hire date must never resolve to the absence
/// Date field; hire dates are when the employee was hired, not when the
/// absence occurred.
fn is_hire_date_header(header: &str) -> bool {
    normalize_header(header).contains("hire")
}

/// Reject assignments that would corrupt the day-count arithmetic
pub(crate) fn is_valid_assignment(header: &str, field: CanonicalField) -> bool {
    match field {
        CanonicalField::Date => !is_hire_date_header(header),
        // Duration is hours; mapping it onto AbsenceDays introduces a ~7.5x error
        CanonicalField::AbsenceDays => normalize_header(header) != "duration",
        _ => true,
    }
}

fn alias_lookup(header: &str) -> Option<CanonicalField> {
    let norm = normalize_header(header);
    FIELD_ALIASES
        .iter()
        .find(|(alias, _)| normalize_header(alias) == norm)
        .map(|(_, field)| *field)
}

/// Map raw headers to canonical fields
///
/// Pure function: same headers and suggestions always produce the same map.
/// At most one source column resolves to each canonical field; when two
/// columns alias to the same field the leftmost wins.
pub fn resolve(headers: &[String], suggestions: &[SuggestedMapping]) -> ColumnMap {
    let mut columns: BTreeMap<String, CanonicalField> = BTreeMap::new();
    let mut taken: Vec<CanonicalField> = Vec::new();

    // Pass 1: exact alias matches
    for header in headers {
        if let Some(field) = alias_lookup(header) {
            if is_valid_assignment(header, field) && !taken.contains(&field) {
                columns.insert(header.clone(), field);
                taken.push(field);
            }
        }
    }

    // Pass 2: agent suggestions, only where aliases did not already decide
    for suggestion in suggestions {
        let header = suggestion.column.as_str();
        if !headers.iter().any(|h| h == header) {
            continue; // suggestion names a column the file does not have
        }
        if columns.contains_key(header) || taken.contains(&suggestion.field) {
            continue; // contradicted by an exact match
        }
        if !is_valid_assignment(header, suggestion.field) {
            continue;
        }
        columns.insert(header.to_string(), suggestion.field);
        taken.push(suggestion.field);
    }

    let unresolved = CanonicalField::all()
        .iter()
        .copied()
        .filter(|f| !taken.contains(f))
        .collect();

    ColumnMap { columns, unresolved }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_alias_resolution() {
        let map = resolve(
            &headers(&["Emp ID", "Absence Type", "Duration", "Date", "Weather"]),
            &[],
        );
        assert_eq!(map.column_for(CanonicalField::EmployeeId), Some("Emp ID"));
        assert_eq!(map.column_for(CanonicalField::AbsenceType), Some("Absence Type"));
        assert_eq!(map.column_for(CanonicalField::Duration), Some("Duration"));
        assert_eq!(map.column_for(CanonicalField::Date), Some("Date"));
        assert!(map.unresolved.contains(&CanonicalField::Filled));
        assert!(map.missing_required().is_empty());
    }

    #[test]
    fn test_hire_date_never_maps_to_date() {
        let map = resolve(&headers(&["Hire Date", "Employee ID"]), &[]);
        assert!(!map.is_resolved(CanonicalField::Date));

        // Not even when an agent insists
        let map = resolve(
            &headers(&["Hire Date", "Employee ID"]),
            &[SuggestedMapping {
                column: "Hire Date".into(),
                field: CanonicalField::Date,
                confidence: Some(0.99),
            }],
        );
        assert!(!map.is_resolved(CanonicalField::Date));
    }

    #[test]
    fn test_duration_never_maps_to_absence_days() {
        let map = resolve(
            &headers(&["Duration", "Employee ID", "Date"]),
            &[SuggestedMapping {
                column: "Duration".into(),
                field: CanonicalField::AbsenceDays,
                confidence: None,
            }],
        );
        assert_eq!(map.column_for(CanonicalField::Duration), Some("Duration"));
        assert!(!map.is_resolved(CanonicalField::AbsenceDays));
    }

    #[test]
    fn test_suggestion_fills_gap_but_cannot_contradict_alias() {
        let map = resolve(
            &headers(&["Staff Member", "School Year", "Percent of Day"]),
            &[
                // Fills a gap: "Staff Member" matches no alias
                SuggestedMapping {
                    column: "Staff Member".into(),
                    field: CanonicalField::EmployeeId,
                    confidence: Some(0.9),
                },
                // Contradicts the alias match for Percent of Day -> AbsenceDays
                SuggestedMapping {
                    column: "School Year".into(),
                    field: CanonicalField::AbsenceDays,
                    confidence: Some(0.4),
                },
            ],
        );
        assert_eq!(map.column_for(CanonicalField::EmployeeId), Some("Staff Member"));
        assert_eq!(map.column_for(CanonicalField::AbsenceDays), Some("Percent of Day"));
        assert_eq!(map.column_for(CanonicalField::SchoolYear), Some("School Year"));
    }

    #[test]
    fn test_missing_required_reported() {
        let map = resolve(&headers(&["Reason", "School Name"]), &[]);
        let missing = map.missing_required();
        assert!(missing.contains(&CanonicalField::EmployeeId));
        assert!(missing.contains(&CanonicalField::SchoolYear));
        assert!(missing.contains(&CanonicalField::AbsenceDays));
    }

    #[test]
    fn test_unknown_suggestion_column_ignored() {
        let map = resolve(
            &headers(&["Employee ID"]),
            &[SuggestedMapping {
                column: "Ghost Column".into(),
                field: CanonicalField::Reason,
                confidence: None,
            }],
        );
        assert!(!map.is_resolved(CanonicalField::Reason));
    }
}
