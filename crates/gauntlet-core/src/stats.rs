//! Aggregated statistics for a batch of case outcomes.

use crate::types::{CaseOutcome, CaseStatus, TokenUsage};
use serde::{Deserialize, Serialize};

/// Summary of one engine run, persisted alongside per-case records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub total_cases: usize,
    pub success_count: usize,
    pub failed_count: usize,

    /// Total retries across all cases (attempts beyond each first attempt)
    pub retry_count: u32,

    /// Cases that hit at least one per-attempt timeout
    pub timeout_count: usize,

    /// Successful cases whose output was cut off at the token ceiling
    pub truncated_count: usize,

    pub total_tokens: TokenUsage,

    /// Wall-clock time for the whole batch in seconds
    pub total_time_seconds: f64,

    /// Sum of individual case durations (real cumulative work time)
    pub sum_case_time_seconds: f64,

    /// Average duration per successful case
    pub avg_time_per_case: f64,

    /// Average completion tokens per successful case
    pub avg_output_tokens_per_case: f64,

    /// Average output rate in tokens per second
    pub avg_tokens_per_second: f64,
}

impl RunStats {
    /// Aggregate outcomes into run statistics.
    ///
    /// Per-case averages are computed over successful cases only, from the
    /// summed case durations rather than wall time; wall time reflects
    /// concurrency, not per-case cost.
    pub fn from_outcomes(outcomes: &[CaseOutcome], wall_time_seconds: f64) -> Self {
        let mut stats = RunStats {
            total_cases: outcomes.len(),
            total_time_seconds: round2(wall_time_seconds),
            ..RunStats::default()
        };

        for outcome in outcomes {
            stats.retry_count += outcome.retry_count();
            if outcome.hit_timeout() {
                stats.timeout_count += 1;
            }
            match outcome.status {
                CaseStatus::Succeeded => {
                    stats.success_count += 1;
                    stats.sum_case_time_seconds += outcome.total_elapsed_ms as f64 / 1000.0;
                    if let Some(payload) = &outcome.payload {
                        stats.total_tokens.add(&payload.token_usage);
                        if payload.is_truncated() {
                            stats.truncated_count += 1;
                        }
                    }
                }
                CaseStatus::Failed => stats.failed_count += 1,
            }
        }

        if stats.success_count > 0 {
            stats.avg_time_per_case = round2(stats.sum_case_time_seconds / stats.success_count as f64);
            stats.avg_output_tokens_per_case = round2(
                stats.total_tokens.completion_tokens as f64 / stats.success_count as f64,
            );
            if stats.sum_case_time_seconds > 0.0 {
                stats.avg_tokens_per_second = round2(
                    stats.total_tokens.completion_tokens as f64 / stats.sum_case_time_seconds,
                );
            }
        }
        stats.sum_case_time_seconds = round2(stats.sum_case_time_seconds);
        stats
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttemptKind, AttemptResult, Generation};
    use chrono::Utc;

    fn success_outcome(id: &str, elapsed_ms: u64, completion_tokens: u32) -> CaseOutcome {
        CaseOutcome {
            case_id: id.to_string(),
            status: CaseStatus::Succeeded,
            attempts: vec![AttemptResult {
                attempt: 0,
                kind: AttemptKind::Success,
                error: None,
                timestamp: Utc::now(),
                elapsed_ms,
            }],
            payload: Some(Generation {
                content: "done".into(),
                reasoning: None,
                model: "m".into(),
                finish_reason: Some("stop".into()),
                token_usage: TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens,
                    total_tokens: 10 + completion_tokens,
                },
                latency_ms: elapsed_ms,
            }),
            started_at: Utc::now(),
            total_elapsed_ms: elapsed_ms,
        }
    }

    fn failed_outcome(id: &str, attempts: u32) -> CaseOutcome {
        CaseOutcome {
            case_id: id.to_string(),
            status: CaseStatus::Failed,
            attempts: (0..attempts)
                .map(|i| AttemptResult {
                    attempt: i,
                    kind: AttemptKind::RetryableError,
                    error: Some("http-error: HTTP 503".into()),
                    timestamp: Utc::now(),
                    elapsed_ms: 5,
                })
                .collect(),
            payload: None,
            started_at: Utc::now(),
            total_elapsed_ms: 20,
        }
    }

    #[test]
    fn test_stats_counts_and_tokens() {
        let outcomes = vec![
            success_outcome("A", 2000, 100),
            success_outcome("B", 4000, 200),
            failed_outcome("C", 4),
        ];
        let stats = RunStats::from_outcomes(&outcomes, 5.0);

        assert_eq!(stats.total_cases, 3);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failed_count, 1);
        assert_eq!(stats.retry_count, 3);
        assert_eq!(stats.total_tokens.completion_tokens, 300);
        assert_eq!(stats.avg_time_per_case, 3.0);
        assert_eq!(stats.avg_output_tokens_per_case, 150.0);
        assert_eq!(stats.avg_tokens_per_second, 50.0);
    }

    #[test]
    fn test_stats_empty_batch() {
        let stats = RunStats::from_outcomes(&[], 0.0);
        assert_eq!(stats.total_cases, 0);
        assert_eq!(stats.avg_time_per_case, 0.0);
    }
}
