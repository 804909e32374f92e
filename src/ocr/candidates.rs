//! Percentage token extraction from raw OCR text.
//!
//! One OCR attempt yields at most one candidate value. The patterns
//! cover the labeled forms the activity window renders ("Completion:
//! 85%", "85% complete") plus bare percentages, and tolerate the common
//! digit/letter confusions OCR introduces next to a percent sign.

use regex::Regex;
use std::sync::OnceLock;

use super::engine::PsmMode;
use super::preprocess::Technique;

/// A parsed percentage reading for one (technique, mode) attempt.
///
/// Absence of a candidate is distinct from a measured zero: a pair that
/// produced no parseable token contributes nothing to the multiset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Parsed percentage value, already range-checked
    pub value: u32,
    /// Preprocessing technique that produced the recognized image
    pub technique: Technique,
    /// Page segmentation mode used for recognition
    pub mode: PsmMode,
}

/// Token class: digits plus the letters OCR commonly substitutes for them.
const TOKEN: &str = r"([0-9OoIl|!ZzSsB]{1,3})";

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            format!(r"(?i)completion[:\s]*{TOKEN}\s*%"),
            format!(r"(?i)score[:\s]*{TOKEN}\s*%"),
            format!(r"(?i)progress[:\s]*{TOKEN}\s*%"),
            format!(r"(?i){TOKEN}\s*%\s*completed?"),
            format!(r"{TOKEN}\s*%"),
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid percentage pattern"))
        .collect()
    })
}

/// Maps commonly confused characters back to the digits they stand for.
fn normalize_confusables(token: &str) -> String {
    token
        .chars()
        .map(|c| match c {
            'O' | 'o' => '0',
            'I' | 'l' | '|' | '!' => '1',
            'Z' | 'z' => '2',
            'S' | 's' => '5',
            'B' => '8',
            other => other,
        })
        .collect()
}

/// Searches OCR text for a percentage value within [value_min, value_max].
///
/// Selection rule when several tokens match: the highest in-range value
/// wins. This is deterministic and matches how a partially-recognized
/// page behaves - stray small numbers (interface counters, step numbers)
/// appear below the completion figure far more often than above it.
///
/// A token must contain at least one real digit; all-letter matches like
/// "SS%" are noise, and noise repeats across segmentation modes on the
/// same image, so consensus voting cannot be trusted to filter it.
pub fn find_percentage(text: &str, value_min: u32, value_max: u32) -> Option<u32> {
    let mut best: Option<u32> = None;

    for pattern in patterns() {
        for caps in pattern.captures_iter(text) {
            let token = &caps[1];
            if !token.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            let Ok(value) = normalize_confusables(token).parse::<u32>() else {
                continue;
            };
            if value < value_min || value > value_max {
                continue;
            }
            best = Some(best.map_or(value, |b| b.max(value)));
        }
    }

    best
}
