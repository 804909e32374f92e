//! Environment validation.
//!
//! Checks that everything the scanner shells out to is actually
//! installed before a batch run burns an hour discovering it isn't.

use crate::config::ScannerConfig;
use crate::ocr::setup::{find_tessdata_dir, find_tesseract_executable};

/// Checks the environment and returns human-readable issues.
/// An empty list means the scanner is ready to run.
pub fn validate_environment(config: &ScannerConfig) -> Vec<String> {
    let mut issues = Vec::new();

    match find_tesseract_executable() {
        Ok(path) => crate::log(&format!("Tesseract: {}", path.display())),
        Err(_) => issues.push(
            "Tesseract OCR not found. Install it or place it on PATH.".to_string(),
        ),
    }

    match find_tessdata_dir() {
        Ok(dir) => crate::log(&format!("tessdata: {}", dir.display())),
        Err(_) => issues.push(
            "eng.traineddata not found. It is downloaded automatically at startup \
             when network access is available."
                .to_string(),
        ),
    }

    match crate::capture::find_packet_tracer(config) {
        Some(path) => crate::log(&format!("Packet Tracer: {}", path.display())),
        None => issues.push(
            "Cisco Packet Tracer not found. Install Packet Tracer 8.x or add its \
             location to packet_tracer_paths in config.json."
                .to_string(),
        ),
    }

    let pka_dir = crate::paths::get_pka_dir();
    if !pka_dir.exists() {
        issues.push(format!(
            "Activity directory {} not found. Place .pka files there.",
            pka_dir.display()
        ));
    }

    issues
}

/// Runs validation and prints the outcome.
pub fn run_validation(config: &ScannerConfig) {
    crate::log("Validating environment...");

    let issues = validate_environment(config);

    if issues.is_empty() {
        println!("All prerequisites satisfied.");
    } else {
        println!("Validation found {} issue(s):", issues.len());
        for issue in &issues {
            println!("  - {}", issue);
        }
    }
}
