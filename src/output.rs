//! Output formatting and persistence for survey views.
//!
//! Supports pretty-printing, JSON export (optionally gzip-compressed), and a
//! CSV history of classification runs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::classify::EvaluationReport;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Writes a value as pretty JSON to `path`, gzip-compressed when `gzip`.
pub fn write_json<T: Serialize>(path: &Path, value: &T, gzip: bool) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer_pretty(&mut encoder, value)?;
        encoder.finish()?.flush()?;
    } else {
        let mut file = file;
        serde_json::to_writer_pretty(&mut file, value)?;
        file.flush()?;
    }
    info!(path = %path.display(), gzip, "Report written");
    Ok(())
}

/// One model of one classification run, flattened for CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: f64,
    pub average_precision: f64,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
    pub best_by_f1: bool,
}

impl HistoryRow {
    pub fn from_report(report: &EvaluationReport, timestamp: DateTime<Utc>) -> Vec<Self> {
        report
            .models
            .iter()
            .map(|m| HistoryRow {
                timestamp,
                model: m.model.clone(),
                rows: report.summary.rows,
                train_rows: report.summary.train_rows,
                test_rows: report.summary.test_rows,
                accuracy: m.accuracy,
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                roc_auc: m.roc_auc,
                average_precision: m.average_precision,
                true_negative: m.confusion_matrix.true_negative,
                false_positive: m.confusion_matrix.false_positive,
                false_negative: m.confusion_matrix.false_negative,
                true_positive: m.confusion_matrix.true_positive,
                best_by_f1: report.best_by_f1.contains(&m.model),
            })
            .collect()
    }
}

/// Appends records as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::env;
    use std::fs;
    use std::io::Read;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[derive(Debug, Serialize)]
    struct Row {
        name: &'static str,
        value: f64,
    }

    fn row() -> Row {
        Row {
            name: "Ônibus",
            value: 0.5,
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&row());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&row()).unwrap();
    }

    #[test]
    fn test_append_records_writes_header_once() {
        let path = temp_path("odsurvey_test_header.csv");
        let _ = fs::remove_file(&path);

        append_records(&path, &[row()]).unwrap();
        append_records(&path, &[row(), row()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("name")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 4);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_plain() {
        let path = temp_path("odsurvey_test_report.json");
        write_json(&path, &row(), false).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["name"], "Ônibus");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_gzip() {
        let path = temp_path("odsurvey_test_report.json.gz");
        write_json(&path, &row(), true).unwrap();

        let mut text = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["value"], 0.5);

        fs::remove_file(&path).unwrap();
    }
}
