//! API access: the provider seam and the OpenAI-compatible HTTP adapter.

mod client;
mod provider;

pub use client::ApiClient;
pub use provider::Provider;
