//! Core data types for the benchmarking engine.
//!
//! These types record how one test case's processing concluded: every
//! attempt made, the terminal status, and the generated payload on success.

use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token consumption reported (or estimated) for one completion.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// The successful payload of one API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// Generated content (text/HTML, or a data-URL image for image cases)
    pub content: String,

    /// Chain-of-thought content, when the model reports it separately
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Model identifier the endpoint reports having used
    pub model: String,

    /// Why generation stopped ("stop", "length", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    /// Token counts, reported by the API or estimated from content length
    pub token_usage: TokenUsage,

    /// Round-trip latency of the successful call in milliseconds
    pub latency_ms: u64,
}

impl Generation {
    /// True when the model stopped because it hit the token ceiling.
    pub fn is_truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

/// How one attempt concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptKind {
    Success,
    RetryableError,
    FatalError,
}

/// The immutable record of a single attempt within a retry loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    /// 0-based attempt index
    pub attempt: u32,

    /// How this attempt concluded
    pub kind: AttemptKind,

    /// Error detail for failed attempts (status code or description)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the attempt started
    pub timestamp: DateTime<Utc>,

    /// How long the attempt took
    pub elapsed_ms: u64,
}

impl AttemptResult {
    pub fn success(attempt: u32, started: DateTime<Utc>, elapsed_ms: u64) -> Self {
        Self {
            attempt,
            kind: AttemptKind::Success,
            error: None,
            timestamp: started,
            elapsed_ms,
        }
    }

    pub fn failure(
        attempt: u32,
        retryable: bool,
        error: &ApiError,
        started: DateTime<Utc>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            attempt,
            kind: if retryable {
                AttemptKind::RetryableError
            } else {
                AttemptKind::FatalError
            },
            error: Some(format!("{}: {}", error.kind_label(), error)),
            timestamp: started,
            elapsed_ms,
        }
    }
}

/// Terminal status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Succeeded,
    Failed,
}

/// The finalized, immutable record of how one test case concluded.
///
/// Exactly one of these exists per case per run. The attempt sequence is
/// chronological and between 1 and `max_retries + 1` entries long; the
/// status is `Succeeded` iff the last attempt's kind is `Success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseOutcome {
    /// Identifier of the case this outcome belongs to
    pub case_id: String,

    /// Terminal status
    pub status: CaseStatus,

    /// Every attempt made, in order
    pub attempts: Vec<AttemptResult>,

    /// Generated payload, present iff the case succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Generation>,

    /// When processing of this case began
    pub started_at: DateTime<Utc>,

    /// Total time from first attempt start to terminal transition
    pub total_elapsed_ms: u64,
}

impl CaseOutcome {
    /// Error detail of the last failed attempt, for run summaries.
    pub fn last_error(&self) -> Option<&str> {
        self.attempts.iter().rev().find_map(|a| a.error.as_deref())
    }

    /// Number of retries performed (attempts beyond the first).
    pub fn retry_count(&self) -> u32 {
        (self.attempts.len() as u32).saturating_sub(1)
    }

    /// Whether any attempt failed with a timeout.
    pub fn hit_timeout(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.error.as_deref().is_some_and(|e| e.starts_with("timeout")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt_err(attempt: u32, retryable: bool, err: ApiError) -> AttemptResult {
        AttemptResult::failure(attempt, retryable, &err, Utc::now(), 5)
    }

    #[test]
    fn test_token_usage_add() {
        let mut a = TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        };
        a.add(&TokenUsage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        });
        assert_eq!(a.total_tokens, 33);
        assert_eq!(a.completion_tokens, 22);
    }

    #[test]
    fn test_last_error_picks_most_recent() {
        let outcome = CaseOutcome {
            case_id: "T001".into(),
            status: CaseStatus::Failed,
            attempts: vec![
                attempt_err(
                    0,
                    true,
                    ApiError::Http {
                        status: 503,
                        message: "unavailable".into(),
                    },
                ),
                attempt_err(
                    1,
                    false,
                    ApiError::Http {
                        status: 401,
                        message: "unauthorized".into(),
                    },
                ),
            ],
            payload: None,
            started_at: Utc::now(),
            total_elapsed_ms: 10,
        };
        assert!(outcome.last_error().unwrap().contains("401"));
        assert_eq!(outcome.retry_count(), 1);
    }

    #[test]
    fn test_hit_timeout() {
        let outcome = CaseOutcome {
            case_id: "T002".into(),
            status: CaseStatus::Failed,
            attempts: vec![attempt_err(0, true, ApiError::Timeout { timeout_secs: 30 })],
            payload: None,
            started_at: Utc::now(),
            total_elapsed_ms: 10,
        };
        assert!(outcome.hit_timeout());
    }

    #[test]
    fn test_generation_truncation() {
        let generation = Generation {
            content: "partial".into(),
            reasoning: None,
            model: "m".into(),
            finish_reason: Some("length".into()),
            token_usage: TokenUsage::default(),
            latency_ms: 1,
        };
        assert!(generation.is_truncated());
    }
}
