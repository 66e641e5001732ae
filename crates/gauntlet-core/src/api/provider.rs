//! Provider trait: the seam between the engine and the remote API.

use crate::catalog::TestCase;
use crate::error::ApiError;
use crate::types::Generation;
use async_trait::async_trait;

/// One-shot generation against a remote endpoint.
///
/// Implementations perform exactly one network call per `generate`
/// invocation; retry is the engine's responsibility. Uses `async_trait`
/// because native async fn in trait is not object-safe (the engine holds an
/// `Arc<dyn Provider>` for dynamic dispatch and test mocking).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Perform one generation call for the given case.
    ///
    /// Every failure mode is converted into an [`ApiError`]; this method
    /// never panics and never retries.
    async fn generate(&self, case: &TestCase) -> Result<Generation, ApiError>;
}
