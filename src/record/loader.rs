//! Load uploaded absence files into a raw table
//!
//! Headers and layouts vary per district, so rows are kept as positional
//! string cells until schema mapping decides what each column means.

use std::io::Read;
use std::path::Path;

use crate::pipeline::PipelineError;

/// An uploaded spreadsheet as parsed: header names plus string cells
///
/// Immutable once ingested; every later stage works on conformed copies.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Number of data rows (header excluded)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value by row index and header name; None when the column does
    /// not exist, Some("") for a blank cell
    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(|s| s.as_str())
    }

    /// A bounded sample of rows for the suggestion boundary
    pub fn sample(&self, limit: usize) -> Vec<Vec<String>> {
        self.rows.iter().take(limit).cloned().collect()
    }
}

/// Load a raw table from a CSV file
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<RawTable, PipelineError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path.as_ref())?;
    read_table(reader)
}

/// Load a raw table from any reader (string buffer, network stream)
pub fn load_table_from_reader<R: Read>(source: R) -> Result<RawTable, PipelineError> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    read_table(reader)
}

fn read_table<R: Read>(mut reader: csv::Reader<R>) -> Result<RawTable, PipelineError> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let width = headers.len();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        // Flexible files may come up short; pad so positional access is safe
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Emp ID,Absence Type,Duration,Date
AEnglish,Full Day,7.5,2023-10-02
BMartin,AM Half Day,,2023-10-03
CJones,Custom Duration,3.75
";

    #[test]
    fn test_load_from_reader() {
        let table = load_table_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Emp ID", "Absence Type", "Duration", "Date"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(0, "Emp ID"), Some("AEnglish"));
        assert_eq!(table.cell(1, "Duration"), Some(""));
        // Short row padded to header width
        assert_eq!(table.cell(2, "Date"), Some(""));
        assert_eq!(table.cell(0, "No Such Column"), None);
    }

    #[test]
    fn test_sample_is_bounded() {
        let table = load_table_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.sample(2).len(), 2);
        assert_eq!(table.sample(50).len(), 3);
    }
}
