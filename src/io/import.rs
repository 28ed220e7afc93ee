//! CSV import of aligned, gap-filled metered intervals.
//!
//! Expected columns: `timestamp` (RFC 3339), `production_kw`, `import_kwh`,
//! `export_kwh`. Extra columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use crate::error::SimError;
use crate::sim::types::IntervalRecord;

#[derive(Debug, Deserialize)]
struct Row {
    timestamp: String,
    production_kw: f64,
    import_kwh: f64,
    export_kwh: f64,
}

impl Row {
    fn into_record(self, line: u64) -> Result<IntervalRecord, SimError> {
        let malformed = |message: String| SimError::MalformedRecord { line, message };

        let timestamp = DateTime::parse_from_rfc3339(self.timestamp.trim())
            .map_err(|e| malformed(format!("timestamp \"{}\": {e}", self.timestamp)))?;

        for (name, value) in [
            ("production_kw", self.production_kw),
            ("import_kwh", self.import_kwh),
            ("export_kwh", self.export_kwh),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(malformed(format!("{name} must be a finite value >= 0, got {value}")));
            }
        }

        Ok(IntervalRecord::new(
            timestamp,
            self.production_kw,
            self.import_kwh,
            self.export_kwh,
        ))
    }
}

/// Reads interval records from a CSV file.
///
/// # Errors
///
/// Returns [`SimError::Io`] if the file cannot be opened, otherwise see
/// [`read_csv`].
pub fn import_csv(path: &Path) -> Result<Vec<IntervalRecord>, SimError> {
    let file = File::open(path)?;
    let records = read_csv(file)?;
    debug!(path = %path.display(), intervals = records.len(), "imported intervals");
    Ok(records)
}

/// Reads interval records from any CSV source with a header row.
///
/// Ordering is not checked here; the engine does that before simulating.
///
/// # Errors
///
/// Returns [`SimError::MalformedRecord`] with the 1-based line number for a
/// row with a bad timestamp, a missing or non-numeric value, or a negative
/// energy, and [`SimError::Csv`] for structural CSV failures.
pub fn read_csv(reader: impl Read) -> Result<Vec<IntervalRecord>, SimError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let raw = result?;
        let line = raw.position().map_or(0, csv::Position::line);
        let row: Row = raw
            .deserialize(Some(&headers))
            .map_err(|e| SimError::MalformedRecord {
                line,
                message: e.to_string(),
            })?;
        records.push(row.into_record(line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
timestamp,production_kw,import_kwh,export_kwh
2025-06-01T10:00:00+02:00,8.0,0.0,2.0
2025-06-01T10:15:00+02:00,0.0,0.4,0.0
";

    #[test]
    fn parses_well_formed_rows() {
        let records = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].production_kw, 8.0);
        assert_eq!(records[0].export_kwh, 2.0);
        assert_eq!(records[1].import_kwh, 0.4);
        assert_eq!(records[1].timestamp_ms - records[0].timestamp_ms, 15 * 60 * 1000);
        assert_eq!(records[0].timestamp.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn extra_columns_and_padding_are_tolerated() {
        let csv = "\
note, timestamp ,production_kw,import_kwh,export_kwh
a, 2025-06-01T10:00:00Z , 1.5 , 0.1 , 0
";
        let records = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(records[0].production_kw, 1.5);
    }

    #[test]
    fn bad_timestamp_reports_line() {
        let csv = "\
timestamp,production_kw,import_kwh,export_kwh
2025-06-01T10:00:00Z,1,0,0
yesterday,1,0,0
";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        match err {
            SimError::MalformedRecord { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("yesterday"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_energy_is_rejected() {
        let csv = "\
timestamp,production_kw,import_kwh,export_kwh
2025-06-01T10:00:00Z,1,-0.5,0
";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SimError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn non_numeric_value_is_malformed() {
        let csv = "\
timestamp,production_kw,import_kwh,export_kwh
2025-06-01T10:00:00Z,lots,0,0
";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SimError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn header_only_is_empty() {
        let header = "timestamp,production_kw,import_kwh,export_kwh\n";
        let records = read_csv(header.as_bytes()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
