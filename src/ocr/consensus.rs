//! Consensus resolution over the collected candidate multiset.
//!
//! A reading is accepted only when enough independent attempts agree
//! within the tolerance band. The resolver is a pure function: the same
//! multiset always yields the same result, regardless of collection
//! order.

use serde::Serialize;
use std::fmt;

use super::candidates::Candidate;
use crate::config::ExtractorConfig;

/// Why an extraction was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// No attempt produced a parseable percentage token
    NoReadableText,
    /// Candidates exist but no cluster reached the agreement threshold
    InsufficientConsensus,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoReadableText => write!(f, "no readable text"),
            RejectReason::InsufficientConsensus => write!(f, "insufficient consensus"),
        }
    }
}

/// Outcome of one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConsensusResult {
    /// Enough attempts agreed within tolerance
    Accepted {
        /// Accepted percentage, clamped to the configured range
        value: u32,
        /// Size of the winning cluster
        support_count: usize,
        /// Size of the full candidate multiset
        total_attempts: usize,
    },
    /// No acceptable reading
    Rejected {
        /// What went wrong
        reason: RejectReason,
    },
}

impl ConsensusResult {
    /// True when the extraction produced an accepted value.
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConsensusResult::Accepted { .. })
    }
}

/// Resolves the candidate multiset into an accepted value or a rejection.
///
/// Candidates are sorted and scanned as maximal tolerance-bounded runs
/// (every member within `tolerance` of every other). The winning cluster
/// is the one with the most members; ties go to the cluster whose mean is
/// closest to the overall median, then to the lower-valued cluster. The
/// accepted value is the cluster mean rounded half-up and clamped to the
/// configured range.
pub fn resolve(candidates: &[Candidate], config: &ExtractorConfig) -> ConsensusResult {
    let total_attempts = candidates.len();
    if total_attempts == 0 {
        return ConsensusResult::Rejected {
            reason: RejectReason::NoReadableText,
        };
    }

    let mut values: Vec<u32> = candidates.iter().map(|c| c.value).collect();
    values.sort_unstable();

    let median = median_of_sorted(&values);

    // Sliding window over the sorted values: for each start index the
    // window extends while max - min stays within tolerance. Only the
    // maximal run per start can win, so shorter prefixes are never
    // considered separately.
    let mut best_start = 0;
    let mut best_len = 0;
    let mut best_distance = f64::INFINITY;

    let mut end = 0;
    for start in 0..values.len() {
        if end < start {
            end = start;
        }
        while end < values.len() && values[end] - values[start] <= config.tolerance {
            end += 1;
        }

        let len = end - start;
        let mean = window_mean(&values[start..end]);
        let distance = (mean - median).abs();

        let wins = len > best_len || (len == best_len && distance < best_distance);
        if wins {
            best_start = start;
            best_len = len;
            best_distance = distance;
        }
    }

    if best_len < config.min_agreement {
        return ConsensusResult::Rejected {
            reason: RejectReason::InsufficientConsensus,
        };
    }

    let winning = &values[best_start..best_start + best_len];
    let value = (window_mean(winning).round() as u32).clamp(config.value_min, config.value_max);

    ConsensusResult::Accepted {
        value,
        support_count: best_len,
        total_attempts,
    }
}

fn window_mean(values: &[u32]) -> f64 {
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

fn median_of_sorted(values: &[u32]) -> f64 {
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2] as f64
    } else {
        (values[n / 2 - 1] as f64 + values[n / 2] as f64) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::engine::PsmMode;
    use crate::ocr::preprocess::Technique;

    fn make_candidates(values: &[u32]) -> Vec<Candidate> {
        values
            .iter()
            .map(|&value| Candidate {
                value,
                technique: Technique::Grayscale,
                mode: PsmMode::Automatic,
            })
            .collect()
    }

    fn config() -> ExtractorConfig {
        ExtractorConfig::default()
    }

    fn resolve_values(values: &[u32]) -> ConsensusResult {
        resolve(&make_candidates(values), &config())
    }

    #[test]
    fn test_empty_multiset_rejected_no_readable_text() {
        assert_eq!(
            resolve_values(&[]),
            ConsensusResult::Rejected {
                reason: RejectReason::NoReadableText
            }
        );
    }

    #[test]
    fn test_majority_cluster_accepted() {
        // candidates [85,85,84,85,12]: cluster {84,85,85,85} wins
        assert_eq!(
            resolve_values(&[85, 85, 84, 85, 12]),
            ConsensusResult::Accepted {
                value: 85,
                support_count: 4,
                total_attempts: 5
            }
        );
    }

    #[test]
    fn test_scattered_candidates_insufficient() {
        // [40,55,70]: no cluster of size >= 3 within tolerance 2
        assert_eq!(
            resolve_values(&[40, 55, 70]),
            ConsensusResult::Rejected {
                reason: RejectReason::InsufficientConsensus
            }
        );
    }

    #[test]
    fn test_outlier_does_not_block_full_marks() {
        // [100,100,100,100,0]: the zero outlier is outvoted
        assert_eq!(
            resolve_values(&[100, 100, 100, 100, 0]),
            ConsensusResult::Accepted {
                value: 100,
                support_count: 4,
                total_attempts: 5
            }
        );
    }

    #[test]
    fn test_below_min_agreement_rejected() {
        assert_eq!(
            resolve_values(&[50, 50]),
            ConsensusResult::Rejected {
                reason: RejectReason::InsufficientConsensus
            }
        );
    }

    #[test]
    fn test_exactly_min_agreement_accepted() {
        assert_eq!(
            resolve_values(&[50, 51, 52]),
            ConsensusResult::Accepted {
                value: 51,
                support_count: 3,
                total_attempts: 3
            }
        );
    }

    #[test]
    fn test_deterministic_regardless_of_order() {
        let forward = resolve_values(&[85, 85, 84, 85, 12]);
        let backward = resolve_values(&[12, 85, 84, 85, 85]);
        let shuffled = resolve_values(&[84, 12, 85, 85, 85]);
        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_repeated_resolution_identical() {
        let candidates = make_candidates(&[60, 61, 62, 61, 30, 31]);
        let first = resolve(&candidates, &config());
        let second = resolve(&candidates, &config());
        assert_eq!(first, second);
    }

    #[test]
    fn test_tie_goes_to_cluster_near_median() {
        // Three clusters of size 3; the overall median is 50, so the
        // middle cluster wins the size tie
        assert_eq!(
            resolve_values(&[10, 10, 10, 50, 50, 50, 90, 90, 90]),
            ConsensusResult::Accepted {
                value: 50,
                support_count: 3,
                total_attempts: 9
            }
        );

        // Exact size tie: {20,20,20} vs {90,90,90}, median 55; the upper
        // cluster mean (90) is 35 away, the lower (20) also 35 away - the
        // lower-valued cluster wins the final tie-break
        assert_eq!(
            resolve_values(&[20, 20, 20, 90, 90, 90]),
            ConsensusResult::Accepted {
                value: 20,
                support_count: 3,
                total_attempts: 6
            }
        );
    }

    #[test]
    fn test_rounding_half_up() {
        // {70,71}: mean 70.5 rounds to 71; needs min_agreement 2
        let mut cfg = config();
        cfg.min_agreement = 2;
        assert_eq!(
            resolve(&make_candidates(&[70, 71]), &cfg),
            ConsensusResult::Accepted {
                value: 71,
                support_count: 2,
                total_attempts: 2
            }
        );
    }

    #[test]
    fn test_value_clamped_to_range() {
        // All candidates at the ceiling: mean can never exceed it, but a
        // narrowed range must still clamp
        let mut cfg = config();
        cfg.value_max = 90;
        let result = resolve(&make_candidates(&[89, 90, 90]), &cfg);
        match result {
            ConsensusResult::Accepted { value, .. } => assert!(value <= 90),
            _ => panic!("expected acceptance"),
        }
    }

    #[test]
    fn test_zero_cluster_accepted() {
        // A consistent zero reading is a real measurement
        assert_eq!(
            resolve_values(&[0, 0, 0, 1]),
            ConsensusResult::Accepted {
                value: 0,
                support_count: 4,
                total_attempts: 4
            }
        );
    }

    #[test]
    fn test_reject_reason_messages() {
        assert_eq!(RejectReason::NoReadableText.to_string(), "no readable text");
        assert_eq!(
            RejectReason::InsufficientConsensus.to_string(),
            "insufficient consensus"
        );
    }
}
