//! Consensus OCR extraction of completion percentages.
//!
//! The extractor derives several enhanced variants of the captured
//! image, recognizes each with several page segmentation modes, and
//! accepts a reading only when enough attempts agree within tolerance.

pub mod candidates;
pub mod consensus;
pub mod engine;
pub mod preprocess;
pub mod setup;

pub use candidates::Candidate;
pub use consensus::{ConsensusResult, RejectReason};
pub use setup::ensure_tessdata;

use image::{ImageBuffer, Rgba};

use crate::config::ExtractorConfig;
use candidates::find_percentage;
use engine::OcrEngine;

/// Consensus-validated completion percentage extractor.
///
/// Configuration is fixed at construction. `extract` never fails: any
/// preprocessing or OCR problem degrades to a skipped attempt, and the
/// worst outcome is a `Rejected` result.
pub struct MarkExtractor {
    config: ExtractorConfig,
    engine: Option<OcrEngine>,
}

impl MarkExtractor {
    /// Creates an extractor with the given settings.
    ///
    /// Tesseract is located once here. When it cannot be found, the
    /// extractor still works - every attempt simply yields no candidate.
    pub fn new(config: ExtractorConfig) -> Self {
        let engine = match OcrEngine::locate(config.ocr_timeout_ms) {
            Ok(engine) => Some(engine),
            Err(e) => {
                crate::log(&format!(
                    "Tesseract unavailable: {}. OCR attempts will yield no candidates.",
                    e
                ));
                None
            }
        };

        Self { config, engine }
    }

    /// Extracts the completion percentage from one captured image.
    pub fn extract(&self, img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> ConsensusResult {
        let candidates = self.collect_candidates(img);
        let result = consensus::resolve(&candidates, &self.config);

        match &result {
            ConsensusResult::Accepted {
                value,
                support_count,
                total_attempts,
            } => {
                crate::log(&format!(
                    "Consensus: {}% ({} of {} readings agree)",
                    value, support_count, total_attempts
                ));
            }
            ConsensusResult::Rejected { reason } => {
                crate::log(&format!(
                    "No accepted reading: {} ({} candidates)",
                    reason,
                    candidates.len()
                ));
            }
        }

        result
    }

    /// Runs the full technique x mode cross-product, collecting one
    /// candidate per attempt that produced a parseable percentage.
    fn collect_candidates(&self, img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Vec<Candidate> {
        let Some(engine) = &self.engine else {
            return Vec::new();
        };

        let mut out = Vec::new();

        for (technique, enhanced) in preprocess::variants(&self.config.techniques, img) {
            for &mode in &self.config.psm_modes {
                let text = match engine.recognize(&enhanced, mode) {
                    Ok(text) => text,
                    Err(e) => {
                        crate::log(&format!(
                            "OCR attempt {}+{} failed: {}",
                            technique.label(),
                            mode.label(),
                            e
                        ));
                        continue;
                    }
                };

                if let Some(value) =
                    find_percentage(&text, self.config.value_min, self.config.value_max)
                {
                    crate::log(&format!(
                        "Reading {}+{}: {}%",
                        technique.label(),
                        mode.label(),
                        value
                    ));
                    out.push(Candidate {
                        value,
                        technique,
                        mode,
                    });
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image_rejected_without_panicking() {
        // A zero-byte capture defeats every preprocessing technique, so
        // no attempt runs and the result is a clean rejection
        let extractor = MarkExtractor::new(ExtractorConfig::default());
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(0, 0);

        assert_eq!(
            extractor.extract(&img),
            ConsensusResult::Rejected {
                reason: RejectReason::NoReadableText
            }
        );
    }

    #[test]
    fn test_blank_image_yields_rejection() {
        // Keep the attempt budget small - this test exercises the real
        // pipeline end to end (including tesseract when installed) and a
        // featureless image can never reach consensus either way
        let config = ExtractorConfig {
            techniques: vec![preprocess::Technique::Grayscale],
            psm_modes: vec![engine::PsmMode::SingleLine],
            ..ExtractorConfig::default()
        };
        let extractor = MarkExtractor::new(config);
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(60, 20, Rgba([255, 255, 255, 255]));

        assert!(!extractor.extract(&img).is_accepted());
    }
}
