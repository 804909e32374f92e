//! Student roster discovery.
//!
//! Student identity comes from the capture file naming scheme: each
//! screenshot is saved as `<student_id>.<ext>`, so the images directory
//! is the roster.

use std::path::{Path, PathBuf};

/// True when a filename stem plausibly names a student: purely numeric,
/// or alphanumeric with at least 4 characters.
pub fn is_plausible_id(stem: &str) -> bool {
    if stem.is_empty() {
        return false;
    }
    if stem.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    stem.chars().all(|c| c.is_ascii_alphanumeric()) && stem.chars().count() >= 4
}

/// Returns all student IDs found in the images directory, sorted and
/// de-duplicated (one student may have screenshots in several formats).
pub fn student_ids(images_dir: &Path, formats: &[String]) -> Vec<String> {
    let mut ids = Vec::new();

    let Ok(entries) = std::fs::read_dir(images_dir) else {
        return ids;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !has_supported_extension(&path, formats) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if is_plausible_id(stem) {
            ids.push(stem.to_string());
        }
    }

    ids.sort();
    ids.dedup();
    ids
}

/// Finds the screenshot for one student, trying each supported format in
/// the configured order.
pub fn find_image_for_id(images_dir: &Path, id: &str, formats: &[String]) -> Option<PathBuf> {
    for ext in formats {
        let path = images_dir.join(format!("{id}{ext}"));
        if path.exists() {
            return Some(path);
        }
    }
    None
}

fn has_supported_extension(path: &Path, formats: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let dotted = format!(".{}", ext.to_ascii_lowercase());
    formats.iter().any(|f| f.eq_ignore_ascii_case(&dotted))
}
