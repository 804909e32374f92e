//! CSV report writer for scan results.
//!
//! Rows are appended one at a time so a crash partway through a batch
//! leaves the completed students on disk.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::ocr::ConsensusResult;
use crate::scan::runner::StudentRecord;

/// CSV header row.
/// Accepted rows carry the value and its evidence counts; rejected rows
/// carry the reason as status with an empty score.
const CSV_HEADER: &str = "id,score,status,support,attempts";

/// Initializes the CSV file with a header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves
/// existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Appends one student row to the CSV file.
pub fn append_record(path: &Path, record: &StudentRecord) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    let line = match &record.result {
        ConsensusResult::Accepted {
            value,
            support_count,
            total_attempts,
        } => format!(
            "{},{},ok,{},{}",
            record.id, value, support_count, total_attempts
        ),
        ConsensusResult::Rejected { reason } => format!("{},,{},0,0", record.id, reason),
    };

    writeln!(file, "{}", line).context("Failed to write CSV row")?;
    Ok(())
}

/// Writes a timestamped report with one row per student.
/// Returns the report path.
pub fn write_report(records: &[StudentRecord], results_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(results_dir)
        .with_context(|| format!("Failed to create {}", results_dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = results_dir.join(format!("scan_results_{}.csv", timestamp));

    init_csv(&path)?;
    for record in records {
        append_record(&path, record)?;
    }

    crate::log(&format!("Results saved to: {}", path.display()));
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::RejectReason;
    use tempfile::tempdir;

    fn accepted(id: &str, value: u32) -> StudentRecord {
        StudentRecord {
            id: id.to_string(),
            result: ConsensusResult::Accepted {
                value,
                support_count: 4,
                total_attempts: 5,
            },
        }
    }

    fn rejected(id: &str, reason: RejectReason) -> StudentRecord {
        StudentRecord {
            id: id.to_string(),
            result: ConsensusResult::Rejected { reason },
        }
    }

    #[test]
    fn test_init_csv_creates_header() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("test.csv");

        init_csv(&csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with(CSV_HEADER));
    }

    #[test]
    fn test_init_csv_preserves_existing() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("test.csv");

        std::fs::write(&csv_path, "existing,data\n1,2,3\n").unwrap();

        init_csv(&csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with("existing,data"));
    }

    #[test]
    fn test_append_accepted_row() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("test.csv");
        init_csv(&csv_path).unwrap();

        append_record(&csv_path, &accepted("24075450", 85)).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "24075450,85,ok,4,5");
    }

    #[test]
    fn test_append_rejected_row_has_reason() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("test.csv");
        init_csv(&csv_path).unwrap();

        append_record(&csv_path, &rejected("24075451", RejectReason::InsufficientConsensus))
            .unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[1], "24075451,,insufficient consensus,0,0");
    }

    #[test]
    fn test_write_report_one_row_per_student() {
        let dir = tempdir().unwrap();

        let records = vec![
            accepted("24075450", 85),
            rejected("24075451", RejectReason::NoReadableText),
            accepted("24075452", 100),
        ];

        let path = write_report(&records, dir.path()).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("scan_results_"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4); // header + 3 rows
    }
}
