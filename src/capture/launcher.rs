//! Packet Tracer process control and per-activity capture flow.
//!
//! For each .pka file: launch the application with the activity as its
//! argument, wait out the launch time, then poll the capture zone until
//! the grab passes the colour-richness check or the wait budget expires.
//! The process is terminated after capture either way.

use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Rgba};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::{Duration, Instant};

use crate::capture::screen::{capture_zone, looks_rendered, save_jpeg};
use crate::config::ScannerConfig;

/// Finds the Packet Tracer executable from the configured candidates.
pub fn find_packet_tracer(config: &ScannerConfig) -> Option<PathBuf> {
    config
        .packet_tracer_paths
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Captures one activity screenshot. Returns the saved image path.
pub fn capture_activity(
    pt_exe: &Path,
    pka_file: &Path,
    output_dir: &Path,
    config: &ScannerConfig,
) -> Result<PathBuf> {
    let stem = pka_file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("invalid activity filename: {}", pka_file.display()))?;
    let screenshot_path = output_dir.join(format!("{stem}.jpg"));

    crate::log(&format!("Launching: {}", pka_file.display()));
    let mut child = Command::new(pt_exe)
        .arg(pka_file)
        .spawn()
        .with_context(|| format!("failed to launch {}", pt_exe.display()))?;

    std::thread::sleep(Duration::from_secs(config.launch_wait_secs));

    let grab = wait_and_capture(config);

    // Terminate before propagating any capture error so no activity
    // window outlives its scan
    cleanup(&mut child, config);

    let img = grab?;
    save_jpeg(&img, &screenshot_path)?;
    crate::log(&format!("Captured: {}", screenshot_path.display()));

    Ok(screenshot_path)
}

/// Polls the capture zone until a grab looks rendered or the window-wait
/// budget runs out. The final grab is returned even when the quality
/// check never passed - a poor screenshot is still worth a manual look.
fn wait_and_capture(config: &ScannerConfig) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let deadline = Instant::now() + Duration::from_secs(config.window_wait_secs);
    let interval = Duration::from_secs(config.window_wait_interval_secs.max(1));

    loop {
        let img = capture_zone(&config.capture_zone)?;

        if looks_rendered(&img) {
            return Ok(img);
        }
        if Instant::now() >= deadline {
            crate::log("Window wait budget expired, keeping last grab");
            return Ok(img);
        }

        crate::log("Capture zone not rendered yet, retrying...");
        std::thread::sleep(interval);
    }
}

/// Terminates the Packet Tracer process and lets the desktop settle.
fn cleanup(child: &mut Child, config: &ScannerConfig) {
    if let Err(e) = child.kill() {
        crate::log(&format!("Failed to terminate Packet Tracer: {}", e));
    }
    let _ = child.wait();
    std::thread::sleep(Duration::from_secs(config.cleanup_delay_secs));
}

/// Captures every activity in the pka/ directory.
/// Returns (successful, failed) counts.
pub fn capture_all(config: &ScannerConfig) -> Result<(usize, usize)> {
    let pka_dir = crate::paths::get_pka_dir();
    let output_dir = crate::paths::get_images_dir();

    let pt_exe = find_packet_tracer(config).ok_or_else(|| {
        anyhow!(
            "Packet Tracer not found. Checked {} candidate locations.",
            config.packet_tracer_paths.len()
        )
    })?;
    crate::log(&format!("Using: {}", pt_exe.display()));

    let mut pka_files = list_pka_files(&pka_dir)?;
    if pka_files.is_empty() {
        return Err(anyhow!("No .pka files found in {}", pka_dir.display()));
    }
    pka_files.sort();

    let mut successful = 0;
    let mut failed = 0;

    for (i, pka_file) in pka_files.iter().enumerate() {
        crate::log(&format!(
            "Processing {}/{}: {}",
            i + 1,
            pka_files.len(),
            pka_file.display()
        ));

        match capture_activity(&pt_exe, pka_file, &output_dir, config) {
            Ok(_) => successful += 1,
            Err(e) => {
                failed += 1;
                crate::log(&format!("Capture failed for {}: {}", pka_file.display(), e));
            }
        }
    }

    crate::log(&format!(
        "Capture finished: {} succeeded, {} failed",
        successful, failed
    ));

    Ok((successful, failed))
}

fn list_pka_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read activity directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_pka = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pka"));
        if is_pka {
            files.push(path);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_pka_files_filters_extension() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("24075450.pka"), b"x").unwrap();
        std::fs::write(dir.path().join("24075451.PKA"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = list_pka_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_list_pka_files_missing_dir_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(list_pka_files(&missing).is_err());
    }

    #[test]
    fn test_find_packet_tracer_none_when_absent() {
        let config = ScannerConfig {
            packet_tracer_paths: vec!["/definitely/not/here/PacketTracer".to_string()],
            ..ScannerConfig::default()
        };
        assert!(find_packet_tracer(&config).is_none());
    }

    #[test]
    fn test_find_packet_tracer_picks_first_existing() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("PacketTracer");
        std::fs::write(&exe, b"x").unwrap();

        let config = ScannerConfig {
            packet_tracer_paths: vec![
                "/definitely/not/here/PacketTracer".to_string(),
                exe.to_string_lossy().to_string(),
            ],
            ..ScannerConfig::default()
        };
        assert_eq!(find_packet_tracer(&config), Some(exe));
    }
}
