//! Per-student scanning and batch orchestration.
//!
//! Students are processed sequentially: load screenshot, run the
//! consensus extractor, record the outcome. One student's failure never
//! stops the batch.

use std::path::Path;

use crate::ocr::{ConsensusResult, MarkExtractor, RejectReason};
use crate::scan::roster::{find_image_for_id, student_ids};

/// One student's outcome, consumed by the report writer.
#[derive(Debug, Clone)]
pub struct StudentRecord {
    /// Student identifier (screenshot filename stem)
    pub id: String,
    /// Extraction outcome
    pub result: ConsensusResult,
}

/// Scans one student. Returns None when no screenshot exists for the ID.
///
/// An unreadable or corrupt screenshot file is a rejection, not an
/// error - the record still lands in the report.
pub fn scan_student(
    extractor: &MarkExtractor,
    images_dir: &Path,
    formats: &[String],
    id: &str,
) -> Option<StudentRecord> {
    let image_path = find_image_for_id(images_dir, id, formats)?;
    crate::log(&format!("Scanning {}: {}", id, image_path.display()));

    let result = match image::open(&image_path) {
        Ok(img) => extractor.extract(&img.to_rgba8()),
        Err(e) => {
            crate::log(&format!("Could not read {}: {}", image_path.display(), e));
            ConsensusResult::Rejected {
                reason: RejectReason::NoReadableText,
            }
        }
    };

    Some(StudentRecord {
        id: id.to_string(),
        result,
    })
}

/// Scans every student with a screenshot in the images directory.
pub fn scan_all(
    extractor: &MarkExtractor,
    images_dir: &Path,
    formats: &[String],
) -> Vec<StudentRecord> {
    let ids = student_ids(images_dir, formats);
    if ids.is_empty() {
        crate::log(&format!(
            "No student images found in {}",
            images_dir.display()
        ));
        return Vec::new();
    }

    crate::log(&format!("Scanning {} student(s)...", ids.len()));

    let mut records = Vec::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        crate::log(&format!("--- {}/{}: {} ---", i + 1, ids.len(), id));
        if let Some(record) = scan_student(extractor, images_dir, formats, id) {
            records.push(record);
        }
    }

    records
}

/// Prints the per-student results table and summary.
pub fn print_results_table(records: &[StudentRecord]) {
    if records.is_empty() {
        return;
    }

    println!();
    println!("{:<15} {:<8} {}", "ID Number", "Score", "Status");
    println!("{}", "-".repeat(50));

    for record in records {
        match &record.result {
            ConsensusResult::Accepted {
                value,
                support_count,
                total_attempts,
            } => {
                println!(
                    "{:<15} {:<8} agreed {} of {}",
                    record.id, value, support_count, total_attempts
                );
            }
            ConsensusResult::Rejected { reason } => {
                println!("{:<15} {:<8} {}", record.id, "-", reason);
            }
        }
    }

    println!("{}", "-".repeat(50));

    let accepted: Vec<u32> = records
        .iter()
        .filter_map(|r| match r.result {
            ConsensusResult::Accepted { value, .. } => Some(value),
            _ => None,
        })
        .collect();

    println!("Students processed: {}", records.len());
    println!("Valid scores: {}", accepted.len());
    if !accepted.is_empty() {
        let avg = accepted.iter().sum::<u32>() as f64 / accepted.len() as f64;
        println!("Average score: {:.1}%", avg);
    }
}
