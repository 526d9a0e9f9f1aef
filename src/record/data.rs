//! Canonical record types produced by schema conformance

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hours in a standard teaching day; converts Custom Duration hours to days
pub const HOURS_PER_DAY: f64 = 7.5;

/// Categorical absence type from the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbsenceType {
    FullDay,
    AmHalfDay,
    PmHalfDay,
    /// Duration given in hours; day count is hours / 7.5
    CustomDuration,
    /// Anything else, including "Not Applicable" placeholders
    Other,
}

impl AbsenceType {
    /// Parse a source cell, tolerating case and stray whitespace
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        if v.is_empty() {
            return None;
        }
        let lowered = v.to_lowercase();
        Some(match lowered.as_str() {
            "full day" => AbsenceType::FullDay,
            "am half day" => AbsenceType::AmHalfDay,
            "pm half day" => AbsenceType::PmHalfDay,
            "custom duration" => AbsenceType::CustomDuration,
            _ => AbsenceType::Other,
        })
    }

    /// Day count this absence type contributes
    ///
    /// Full Day = 1.0, half days = 0.5, Custom Duration = hours / 7.5,
    /// anything else = 0.0. Unknown durations on Custom Duration count as 0.
    pub fn absence_days(&self, duration_hours: Option<f64>) -> f64 {
        match self {
            AbsenceType::FullDay => 1.0,
            AbsenceType::AmHalfDay | AbsenceType::PmHalfDay => 0.5,
            AbsenceType::CustomDuration => match duration_hours {
                Some(hours) if hours.is_finite() && hours >= 0.0 => hours / HOURS_PER_DAY,
                _ => 0.0,
            },
            AbsenceType::Other => 0.0,
        }
    }
}

/// A school year running July 1 through June 30
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchoolYear {
    pub start_year: i32,
}

impl SchoolYear {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// Parse "2023-2024" (also tolerates "2023/2024" and a bare "2023")
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        if v.is_empty() {
            return None;
        }
        let start = v
            .split(['-', '/'])
            .next()
            .and_then(|part| part.trim().parse::<i32>().ok())?;
        if !(1900..=2200).contains(&start) {
            return None;
        }
        Some(Self { start_year: start })
    }

    /// School year containing `date`: July 1+ starts the year, earlier
    /// months belong to the previous start year
    pub fn from_date(date: NaiveDate) -> Self {
        let start_year = if date.month() >= 7 {
            date.year()
        } else {
            date.year() - 1
        };
        Self { start_year }
    }

    /// Inclusive window [July 1 start_year, June 30 start_year+1]
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(self.start_year, 7, 1).expect("valid school year start"),
            NaiveDate::from_ymd_opt(self.start_year + 1, 6, 30).expect("valid school year end"),
        )
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let (start, end) = self.window();
        date >= start && date <= end
    }
}

impl fmt::Display for SchoolYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.start_year + 1)
    }
}

/// One absence event conformed to the canonical schema
///
/// Produced once per surviving raw row; cleaning never mutates a record in
/// place, it builds a new set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub employee_id: String,
    pub employee_type: Option<String>,
    pub employee_title: Option<String>,
    pub absence_type: Option<AbsenceType>,
    /// Duration in hours, as given by the source
    pub duration_hours: Option<f64>,
    pub date: Option<NaiveDate>,
    pub school_year: Option<SchoolYear>,
    pub school_name: Option<String>,
    pub reason: Option<String>,
    pub filled: Option<String>,
    pub needs_substitute: Option<String>,
    /// Absence day count; recomputed from absence_type + duration_hours by
    /// the cleaning engine whenever absence_type is present
    pub absence_days: f64,
    /// 1-based row number in the source file, for audit trails
    pub source_row: usize,
}
