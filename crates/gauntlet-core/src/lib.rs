//! Gauntlet Core - Embeddable benchmark execution library.
//!
//! Gauntlet drives a catalog of generation test cases against an
//! OpenAI-compatible endpoint and persists per-case results: it retries
//! transient failures with exponential backoff, bounds concurrency with a
//! fixed worker pool, and writes one JSON record (plus extracted HTML or
//! image payloads) per case.
//!
//! # Architecture
//!
//! ```text
//! Catalog → Engine (workers + retry) → Provider (HTTP) → Extract → Persist
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use gauntlet_core::{ApiClient, Config, Engine, Modality};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> gauntlet_core::Result<()> {
//!     let config = Config::load()?;
//!     let provider = Arc::new(ApiClient::from_config(&config)?);
//!     let engine = Engine::new(provider, config.engine.clone());
//!
//!     let cases = gauntlet_core::catalog::load_catalog("./cases", Modality::Text)?;
//!     let report = engine.run(&cases, |_event| {}).await;
//!     println!("{} succeeded", report.stats.success_count);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod persist;
pub mod stats;
pub mod types;

// Re-exports for convenient access
pub use api::{ApiClient, Provider};
pub use catalog::{load_catalog, Difficulty, Modality, TestCase};
pub use config::Config;
pub use engine::{CaseEvent, Engine, RunReport};
pub use error::{ApiError, ConfigError, GauntletError, Result};
pub use persist::{CaseRecord, ResultStore, RunSummary, SummaryConfig};
pub use stats::RunStats;
pub use types::{AttemptKind, AttemptResult, CaseOutcome, CaseStatus, Generation, TokenUsage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
