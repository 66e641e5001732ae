//! Failure classification and backoff scheduling.
//!
//! Classification is structural: the adapter has already sorted every
//! failure into an [`ApiError`] variant, so the retry decision never
//! depends on message text.

use crate::error::ApiError;
use rand::Rng;
use std::time::Duration;

/// HTTP statuses worth another attempt: rate limiting and server-side
/// transients. Everything else (auth, bad request, not found) is fatal.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Upper bound (exclusive) of the uniform jitter added to each delay.
const JITTER_MS: u64 = 1000;

/// Determine whether an API failure is worth retrying.
///
/// Timeouts and connection failures are always transient. HTTP errors are
/// retryable only for the well-known transient statuses. Application
/// errors (schema violations, unexpected failures) never are.
pub fn is_retryable(error: &ApiError) -> bool {
    match error {
        ApiError::Timeout { .. } | ApiError::Connection { .. } => true,
        ApiError::Http { status, .. } => RETRYABLE_STATUSES.contains(status),
        ApiError::Application { .. } => false,
    }
}

/// Delay before the attempt following failed attempt `attempt` (0-based).
///
/// `min(base * 2^attempt + jitter, max)` with jitter uniform in
/// `[0, 1000)` ms. The jitter decorrelates retry storms when many cases
/// fail at once against the same endpoint.
pub fn backoff_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> Duration {
    let exponential = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    let jitter = rand::thread_rng().gen_range(0..JITTER_MS);
    Duration::from_millis(exponential.saturating_add(jitter).min(max_delay_ms))
}
