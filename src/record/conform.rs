//! Conform raw rows to canonical records through a resolved column map

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::data::{AbsenceType, CanonicalRecord, SchoolYear};
use super::loader::RawTable;
use crate::schema::{CanonicalField, ColumnMap};

/// Counters for what conformance had to skip or could not parse
///
/// Surfaced with the run so unresolved conditions are flagged, never merged
/// silently into the premium.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConformReport {
    pub rows_in: usize,
    pub rows_out: usize,
    /// Rows dropped because the employee id cell was blank
    pub blank_employee_id: usize,
    /// Date cells that did not parse (record kept, date left empty)
    pub unparsed_dates: usize,
    /// Verbatim day-count cells that did not parse (treated as 0)
    pub unparsed_days: usize,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%Y/%m/%d"];

fn parse_date(value: &str) -> Option<NaiveDate> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(v, fmt).ok())
}

fn parse_hours(value: &str) -> Option<f64> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    v.parse::<f64>().ok().filter(|h| h.is_finite())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn cell<'t>(
    table: &'t RawTable,
    map: &ColumnMap,
    row: usize,
    field: CanonicalField,
) -> Option<&'t str> {
    map.column_for(field).and_then(|col| table.cell(row, col))
}

/// Build canonical records from a raw table and its resolved column map
///
/// School year is taken from the mapped column when present, otherwise
/// derived from the absence date (July 1 - June 30 calendar). A verbatim
/// day count from a mapped Absence_Days-like column is carried ONLY when the
/// file has no absence-type column; otherwise the cleaning engine recomputes
/// it from type + duration.
pub fn conform(table: &RawTable, map: &ColumnMap) -> (Vec<CanonicalRecord>, ConformReport) {
    let mut report = ConformReport {
        rows_in: table.len(),
        ..Default::default()
    };

    let has_absence_type = map.is_resolved(CanonicalField::AbsenceType);
    let mut records = Vec::with_capacity(table.len());

    for row in 0..table.len() {
        let employee_id = match non_empty(cell(table, map, row, CanonicalField::EmployeeId)) {
            Some(id) => id,
            None => {
                report.blank_employee_id += 1;
                continue;
            }
        };

        let date = match cell(table, map, row, CanonicalField::Date) {
            Some(v) if !v.trim().is_empty() => {
                let parsed = parse_date(v);
                if parsed.is_none() {
                    report.unparsed_dates += 1;
                }
                parsed
            }
            _ => None,
        };

        let school_year = cell(table, map, row, CanonicalField::SchoolYear)
            .and_then(SchoolYear::parse)
            .or_else(|| date.map(SchoolYear::from_date));

        let absence_type =
            cell(table, map, row, CanonicalField::AbsenceType).and_then(AbsenceType::parse);
        let duration_hours = cell(table, map, row, CanonicalField::Duration).and_then(parse_hours);

        // Verbatim day counts are honored only for files with no absence
        // type at all (e.g. pre-aggregated "Percent of Day" exports)
        let absence_days = if has_absence_type {
            0.0
        } else {
            match cell(table, map, row, CanonicalField::AbsenceDays) {
                Some(v) if !v.trim().is_empty() => match v.trim().parse::<f64>() {
                    Ok(days) if days.is_finite() => days,
                    _ => {
                        report.unparsed_days += 1;
                        0.0
                    }
                },
                _ => 0.0,
            }
        };

        records.push(CanonicalRecord {
            employee_id,
            employee_type: non_empty(cell(table, map, row, CanonicalField::EmployeeType)),
            employee_title: non_empty(cell(table, map, row, CanonicalField::EmployeeTitle)),
            absence_type,
            duration_hours,
            date,
            school_year,
            school_name: non_empty(cell(table, map, row, CanonicalField::SchoolName)),
            reason: non_empty(cell(table, map, row, CanonicalField::Reason)),
            filled: non_empty(cell(table, map, row, CanonicalField::Filled)),
            needs_substitute: non_empty(cell(table, map, row, CanonicalField::NeedsSubstitute)),
            absence_days,
            source_row: row + 1,
        });
    }

    report.rows_out = records.len();
    (records, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::loader::load_table_from_reader;
    use crate::schema::resolve;
    use approx::assert_relative_eq;

    fn conform_csv(csv: &str) -> (Vec<CanonicalRecord>, ConformReport) {
        let table = load_table_from_reader(csv.as_bytes()).unwrap();
        let map = resolve(&table.headers, &[]);
        conform(&table, &map)
    }

    #[test]
    fn test_basic_conformance() {
        let (records, report) = conform_csv(
            "Emp ID,Absence Type,Duration,Date,Employee Type\n\
             AEnglish,Full Day,7.5,2023-10-02,Teacher\n\
             BMartin,AM Half Day,,10/03/2023,Teacher Music\n",
        );
        assert_eq!(report.rows_in, 2);
        assert_eq!(report.rows_out, 2);
        assert_eq!(records[0].employee_id, "AEnglish");
        assert_eq!(records[0].absence_type, Some(AbsenceType::FullDay));
        assert_eq!(records[0].school_year, Some(SchoolYear::new(2023)));
        assert_eq!(records[1].date, Some(NaiveDate::from_ymd_opt(2023, 10, 3).unwrap()));
        assert_eq!(records[1].source_row, 2);
        // Absence type present, so no verbatim day count is carried
        assert_relative_eq!(records[0].absence_days, 0.0);
    }

    #[test]
    fn test_blank_employee_rows_dropped_and_counted() {
        let (records, report) = conform_csv(
            "Employee ID,Absence Type,Date\n\
             ,Full Day,2023-10-02\n\
             BMartin,Full Day,2023-10-03\n",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(report.blank_employee_id, 1);
    }

    #[test]
    fn test_verbatim_days_only_without_absence_type() {
        // Pre-aggregated export: no Absence Type column, days in "Percent of Day"
        let (records, _) = conform_csv(
            "Employee ID,Percent of Day,School Year\n\
             AEnglish,0.5,2023-2024\n\
             BMartin,1.0,2023-2024\n",
        );
        assert_relative_eq!(records[0].absence_days, 0.5);
        assert_relative_eq!(records[1].absence_days, 1.0);
        assert_eq!(records[0].school_year, Some(SchoolYear::new(2023)));
    }

    #[test]
    fn test_school_year_derived_from_date() {
        let (records, _) = conform_csv(
            "Employee ID,Absence Type,Date\n\
             A,Full Day,2024-03-15\n\
             B,Full Day,2024-09-15\n",
        );
        assert_eq!(records[0].school_year, Some(SchoolYear::new(2023)));
        assert_eq!(records[1].school_year, Some(SchoolYear::new(2024)));
    }

    #[test]
    fn test_unparsed_dates_counted() {
        let (records, report) = conform_csv(
            "Employee ID,Absence Type,Date\n\
             A,Full Day,sometime in fall\n",
        );
        assert_eq!(report.unparsed_dates, 1);
        assert_eq!(records[0].date, None);
        assert_eq!(records[0].school_year, None);
    }
}
