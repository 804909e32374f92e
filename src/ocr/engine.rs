//! Tesseract invocation for a single (image, page segmentation mode) pair.
//!
//! The engine shells out to the external tesseract binary: the enhanced
//! image is staged as a temporary PNG, recognized text is read from
//! stdout. Every invocation is bounded by the configured timeout so one
//! hung process cannot stall the remaining attempts.

use anyhow::{anyhow, Result};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};

/// Poll interval while waiting for a tesseract process to exit.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Tesseract page segmentation mode.
///
/// The enumerated set covers the layouts a completion line can land in,
/// from full-page analysis down to raw single-line mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PsmMode {
    /// PSM 3 - fully automatic page segmentation
    Automatic,
    /// PSM 6 - single uniform block of text
    UniformBlock,
    /// PSM 7 - single text line
    SingleLine,
    /// PSM 8 - single word
    SingleWord,
    /// PSM 11 - sparse text
    SparseText,
    /// PSM 12 - sparse text with orientation detection
    SparseTextOsd,
    /// PSM 13 - raw line, no layout analysis
    RawLine,
}

impl PsmMode {
    /// All modes, in the order they are attempted.
    pub const ALL: [PsmMode; 7] = [
        PsmMode::Automatic,
        PsmMode::UniformBlock,
        PsmMode::SingleLine,
        PsmMode::SingleWord,
        PsmMode::SparseText,
        PsmMode::SparseTextOsd,
        PsmMode::RawLine,
    ];

    /// Value passed to tesseract's `--psm` flag.
    pub fn arg(self) -> &'static str {
        match self {
            PsmMode::Automatic => "3",
            PsmMode::UniformBlock => "6",
            PsmMode::SingleLine => "7",
            PsmMode::SingleWord => "8",
            PsmMode::SparseText => "11",
            PsmMode::SparseTextOsd => "12",
            PsmMode::RawLine => "13",
        }
    }

    /// Short name used in logs and evidence summaries.
    pub fn label(self) -> &'static str {
        match self {
            PsmMode::Automatic => "psm3",
            PsmMode::UniformBlock => "psm6",
            PsmMode::SingleLine => "psm7",
            PsmMode::SingleWord => "psm8",
            PsmMode::SparseText => "psm11",
            PsmMode::SparseTextOsd => "psm12",
            PsmMode::RawLine => "psm13",
        }
    }
}

/// Handle to a located Tesseract installation.
pub struct OcrEngine {
    executable: PathBuf,
    tessdata: PathBuf,
    timeout: Duration,
}

impl OcrEngine {
    /// Locates tesseract and its language data.
    ///
    /// Fails if either is missing; callers treat that as "no OCR
    /// available" rather than an abort.
    pub fn locate(timeout_ms: u64) -> Result<Self> {
        let executable = find_tesseract_executable()?;
        let tessdata = find_tessdata_dir()?;
        Ok(Self {
            executable,
            tessdata,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Runs tesseract on a preprocessed grayscale image with the given
    /// segmentation mode. Returns the raw recognized text.
    pub fn recognize(&self, img: &GrayImage, mode: PsmMode) -> Result<String> {
        // Stage image to a temporary file; tesseract reads from disk
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        let mut child = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg(mode.arg())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Bounded wait: poll until exit or deadline, kill on timeout
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait()? {
                Some(_) => break,
                None => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(anyhow!(
                            "Tesseract timed out after {}ms ({})",
                            self.timeout.as_millis(),
                            mode.label()
                        ));
                    }
                    std::thread::sleep(WAIT_POLL);
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed ({}): {}", mode.label(), stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psm_args_match_tesseract_modes() {
        let args: Vec<&str> = PsmMode::ALL.iter().map(|m| m.arg()).collect();
        assert_eq!(args, ["3", "6", "7", "8", "11", "12", "13"]);
    }

    #[test]
    fn test_psm_labels_unique() {
        let mut labels: Vec<&str> = PsmMode::ALL.iter().map(|m| m.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 7);
    }
}
