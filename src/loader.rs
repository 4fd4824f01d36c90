use crate::error::{Error, Result};
use crate::types::Record;
use csv::ReaderBuilder;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
}

/// Load a record snapshot from a `.json` or `.csv` export.
pub fn load_records(path: &Path) -> Result<(Vec<Record>, LoadReport)> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let (records, report) = match ext.as_deref() {
        Some("json") => read_json(&fs::read_to_string(path)?)?,
        Some("csv") => read_csv(fs::File::open(path)?)?,
        _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
    };
    info!(
        path = %path.display(),
        loaded = report.loaded_rows,
        skipped = report.skipped_rows,
        "loaded records"
    );
    Ok((records, report))
}

/// Records from a JSON array of objects, or from a `{ "data": [...] }`
/// envelope. Array entries that are not objects are skipped.
pub fn read_json(text: &str) -> Result<(Vec<Record>, LoadReport)> {
    let rows = match serde_json::from_str::<Value>(text)? {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(rows)) => rows,
            Some(other) => vec![other],
            None => vec![Value::Object(obj)],
        },
        other => vec![other],
    };

    let mut report = LoadReport {
        total_rows: rows.len(),
        ..Default::default()
    };
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row {
            Value::Object(map) => records.push(map),
            _ => report.skipped_rows += 1,
        }
    }
    report.loaded_rows = records.len();
    Ok((records, report))
}

/// Records from CSV with a header row. Every cell is kept as a string;
/// empty cells are left out so they read as absent. Malformed rows are
/// skipped and counted; an unreadable header row is an error.
pub fn read_csv<R: Read>(reader: R) -> Result<(Vec<Record>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut report = LoadReport::default();
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                report.skipped_rows += 1;
                continue;
            }
        };
        let mut record = Record::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let cell = cell.trim();
            if !cell.is_empty() {
                record.insert(header.trim().to_string(), Value::String(cell.to_string()));
            }
        }
        records.push(record);
    }
    report.loaded_rows = records.len();
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_json_array_skips_non_objects() {
        let (records, report) =
            read_json(r#"[{"full_name": "Asha", "age": 19}, 42, {"full_name": "Ravi"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            report,
            LoadReport {
                total_rows: 3,
                loaded_rows: 2,
                skipped_rows: 1
            }
        );
        assert_eq!(records[0]["age"], Value::from(19));
    }

    #[test]
    fn test_read_json_data_envelope() {
        let (records, report) =
            read_json(r#"{"data": [{"a": 1}, {"a": 2}], "error": null}"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.loaded_rows, 2);
    }

    #[test]
    fn test_read_json_rejects_invalid_text() {
        assert!(matches!(read_json("{not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_read_csv_keeps_strings_and_drops_empty_cells() {
        let data = "full_name,age,family_income\nAsha,19,\"1,50,000\"\nRavi,,300000\n";
        let (records, report) = read_csv(data.as_bytes()).unwrap();
        assert_eq!(report.loaded_rows, 2);
        assert_eq!(records[0]["family_income"], Value::from("1,50,000"));
        assert!(records[1].get("age").is_none());
    }

    #[test]
    fn test_read_csv_unreadable_header_is_an_error() {
        let data: &[u8] = b"full_name,g\xE9nder\nAsha,F\nRavi,M\n";
        assert!(matches!(read_csv(data), Err(Error::Csv(_))));
    }

    #[test]
    fn test_read_csv_counts_unreadable_rows() {
        let data: &[u8] = b"full_name,gender\nAsha,F\nR\xE9vi,M\nMeena,F\n";
        let (records, report) = read_csv(data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            report,
            LoadReport {
                total_rows: 3,
                loaded_rows: 2,
                skipped_rows: 1
            }
        );
    }

    #[test]
    fn test_load_records_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("students.csv");
        let mut f = fs::File::create(&csv_path).unwrap();
        writeln!(f, "full_name,gender").unwrap();
        writeln!(f, "Asha,F").unwrap();
        drop(f);
        let (records, _) = load_records(&csv_path).unwrap();
        assert_eq!(records.len(), 1);

        let json_path = dir.path().join("enquiries.JSON");
        fs::write(&json_path, r#"[{"candidate_name": "Meena"}]"#).unwrap();
        let (records, _) = load_records(&json_path).unwrap();
        assert_eq!(records.len(), 1);

        let other = dir.path().join("students.xlsx");
        fs::write(&other, "").unwrap();
        assert!(matches!(
            load_records(&other),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
