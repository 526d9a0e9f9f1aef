//! Canonical field set for the rating schema

use serde::{Deserialize, Serialize};

/// A field of the canonical schema, independent of source column names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    /// School year, e.g. "2023-2024" (July 1 - June 30)
    SchoolYear,
    /// Unique staff identifier
    EmployeeId,
    /// Pre-computed absence days from the source file (rarely trusted; see cleaning)
    AbsenceDays,
    /// Date the absence occurred (NOT the hire date)
    Date,
    SchoolName,
    Reason,
    EmployeeTitle,
    EmployeeType,
    /// Categorical absence type (Full Day, AM/PM Half Day, Custom Duration)
    AbsenceType,
    StartTime,
    EndTime,
    /// Absence duration in HOURS
    Duration,
    /// Whether a substitute filled the absence ("Filled" / "Unfilled")
    Filled,
    /// Whether a substitute was needed ("YES" / "NO")
    NeedsSubstitute,
}

impl CanonicalField {
    /// Display name matching the company's standard column set
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::SchoolYear => "School Year",
            CanonicalField::EmployeeId => "Employee Identifier",
            CanonicalField::AbsenceDays => "Absence_Days",
            CanonicalField::Date => "Date",
            CanonicalField::SchoolName => "School Name",
            CanonicalField::Reason => "Reason",
            CanonicalField::EmployeeTitle => "Employee Title",
            CanonicalField::EmployeeType => "Employee Type",
            CanonicalField::AbsenceType => "Absence Type",
            CanonicalField::StartTime => "Start Time",
            CanonicalField::EndTime => "End Time",
            CanonicalField::Duration => "Duration",
            CanonicalField::Filled => "Filled",
            CanonicalField::NeedsSubstitute => "Needs Substitute",
        }
    }

    /// All canonical fields, in standard display order
    pub fn all() -> &'static [CanonicalField] {
        &[
            CanonicalField::SchoolYear,
            CanonicalField::EmployeeId,
            CanonicalField::AbsenceDays,
            CanonicalField::Date,
            CanonicalField::SchoolName,
            CanonicalField::Reason,
            CanonicalField::EmployeeTitle,
            CanonicalField::EmployeeType,
            CanonicalField::AbsenceType,
            CanonicalField::StartTime,
            CanonicalField::EndTime,
            CanonicalField::Duration,
            CanonicalField::Filled,
            CanonicalField::NeedsSubstitute,
        ]
    }

    /// Look up a canonical field by its standard display name
    pub fn from_standard_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.as_str() == name)
    }
}

/// Normalize a header for alias comparison: lowercase, strip spaces and underscores
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Known synonyms for canonical fields, compared after [`normalize_header`]
///
/// "Percent of Day" is already expressed in days (1.0, 0.5) so it may map to
/// AbsenceDays; "Duration" is hours and must never map there.
pub const FIELD_ALIASES: &[(&str, CanonicalField)] = &[
    ("school year", CanonicalField::SchoolYear),
    ("schoolyear", CanonicalField::SchoolYear),
    ("sy", CanonicalField::SchoolYear),
    ("fiscal year", CanonicalField::SchoolYear),
    ("employee identifier", CanonicalField::EmployeeId),
    ("employee id", CanonicalField::EmployeeId),
    ("emp id", CanonicalField::EmployeeId),
    ("employee_id", CanonicalField::EmployeeId),
    ("staff id", CanonicalField::EmployeeId),
    ("absence_days", CanonicalField::AbsenceDays),
    ("absence days", CanonicalField::AbsenceDays),
    ("percent of day", CanonicalField::AbsenceDays),
    ("date", CanonicalField::Date),
    ("absence date", CanonicalField::Date),
    ("school name", CanonicalField::SchoolName),
    ("reason", CanonicalField::Reason),
    ("employee title", CanonicalField::EmployeeTitle),
    ("employee type", CanonicalField::EmployeeType),
    ("absence type", CanonicalField::AbsenceType),
    ("start time", CanonicalField::StartTime),
    ("end time", CanonicalField::EndTime),
    ("duration", CanonicalField::Duration),
    ("hours", CanonicalField::Duration),
    ("filled", CanonicalField::Filled),
    ("needs substitute", CanonicalField::NeedsSubstitute),
    ("needs sub", CanonicalField::NeedsSubstitute),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Employee_ID "), "employeeid");
        assert_eq!(normalize_header("School Year"), "schoolyear");
        assert_eq!(normalize_header("NEEDS SUBSTITUTE"), "needssubstitute");
    }

    #[test]
    fn test_standard_name_round_trip() {
        for field in CanonicalField::all() {
            assert_eq!(CanonicalField::from_standard_name(field.as_str()), Some(*field));
        }
    }

    #[test]
    fn test_duration_alias_never_points_at_absence_days() {
        for (alias, field) in FIELD_ALIASES {
            if *field == CanonicalField::AbsenceDays {
                assert_ne!(normalize_header(alias), "duration");
            }
        }
    }
}
