//! OpenAI-compatible Chat Completions adapter.
//!
//! Issues exactly one request per call with a fixed per-attempt timeout and
//! converts every failure mode into a structured [`ApiError`]. Responses are
//! parsed through a fixed serde schema; anything that violates it becomes an
//! `Application` error rather than a panic or a stringly-typed guess.

use super::provider::Provider;
use crate::catalog::{Modality, TestCase};
use crate::config::Config;
use crate::error::{ApiError, ConfigError};
use crate::types::{Generation, TokenUsage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    text_model: String,
    image_model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client from config, resolving the `${ENV_VAR}` credential.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config.resolved_api_key()?;
        Ok(Self::new(
            &config.api.endpoint,
            &api_key,
            &config.api.text_model,
            &config.api.image_model,
            config.api.max_tokens,
            Duration::from_secs(config.engine.request_timeout_secs),
        ))
    }

    pub fn new(
        endpoint: &str,
        api_key: &str,
        text_model: &str,
        image_model: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", endpoint.trim_end_matches('/')),
            api_key: api_key.to_string(),
            text_model: text_model.to_string(),
            image_model: image_model.to_string(),
            max_tokens,
            timeout,
        }
    }

    fn model_for(&self, modality: Modality) -> &str {
        match modality {
            Modality::Text => &self.text_model,
            Modality::Image => &self.image_model,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// Convert a transport error into the matching failure descriptor.
fn map_transport_error(e: reqwest::Error, timeout: Duration) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else if e.is_connect() {
        ApiError::Connection {
            message: format!("connect failed: {e}"),
        }
    } else {
        ApiError::Connection {
            message: e.to_string(),
        }
    }
}

/// Assemble a `Generation` from a parsed response, validating the schema.
///
/// Empty `content` falls back to `reasoning_content` (reasoning models
/// sometimes put everything there). Missing usage is estimated at roughly
/// four characters per token.
fn into_generation(
    resp: ChatResponse,
    requested_model: &str,
    latency_ms: u64,
) -> Result<Generation, ApiError> {
    let choice = resp.choices.into_iter().next().ok_or_else(|| {
        ApiError::Application {
            message: "response contained no choices".to_string(),
        }
    })?;

    let reasoning = choice
        .message
        .reasoning_content
        .filter(|r| !r.is_empty());
    let content = match choice.message.content.filter(|c| !c.is_empty()) {
        Some(content) => content,
        None => reasoning.clone().ok_or_else(|| ApiError::Application {
            message: "response contained neither content nor reasoning_content".to_string(),
        })?,
    };

    let token_usage = match resp.usage {
        Some(u) if u.total_tokens > 0 => TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        },
        _ => {
            let estimated =
                (content.len() + reasoning.as_deref().map_or(0, str::len)) as u32 / 4;
            TokenUsage {
                prompt_tokens: 0,
                completion_tokens: estimated,
                total_tokens: estimated,
            }
        }
    };

    Ok(Generation {
        content,
        reasoning,
        model: resp.model.unwrap_or_else(|| requested_model.to_string()),
        finish_reason: choice.finish_reason,
        token_usage,
        latency_ms,
    })
}

#[async_trait]
impl Provider for ApiClient {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn generate(&self, case: &TestCase) -> Result<Generation, ApiError> {
        let start = Instant::now();
        let model = self.model_for(case.modality);

        let body = ChatRequest {
            model: model.to_string(),
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: case.prompt.clone(),
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let mut text = resp.text().await.unwrap_or_default();
            text.truncate(500);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: text,
            });
        }

        // Reading the body is still transport: a reset or timeout here is
        // retryable. Only an intact body that fails serde is an
        // application error.
        let body = resp
            .bytes()
            .await
            .map_err(|e| map_transport_error(e, self.timeout))?;
        let chat_resp: ChatResponse =
            serde_json::from_slice(&body).map_err(|e| ApiError::Application {
                message: format!("failed to parse response body: {e}"),
            })?;

        into_generation(chat_resp, model, start.elapsed().as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> ChatResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_into_generation_basic() {
        let resp = response(
            r#"{"choices":[{"message":{"content":"hello"},"finish_reason":"stop"}],
                "model":"test-v1",
                "usage":{"prompt_tokens":5,"completion_tokens":7,"total_tokens":12}}"#,
        );
        let generation = into_generation(resp, "requested", 42).unwrap();
        assert_eq!(generation.content, "hello");
        assert_eq!(generation.model, "test-v1");
        assert_eq!(generation.token_usage.total_tokens, 12);
        assert_eq!(generation.finish_reason.as_deref(), Some("stop"));
        assert_eq!(generation.latency_ms, 42);
    }

    #[test]
    fn test_into_generation_empty_choices_is_application_error() {
        let resp = response(r#"{"choices":[]}"#);
        let err = into_generation(resp, "m", 0).unwrap_err();
        assert!(matches!(err, ApiError::Application { .. }));
    }

    #[test]
    fn test_into_generation_reasoning_fallback() {
        let resp = response(
            r#"{"choices":[{"message":{"content":"","reasoning_content":"thought hard"}}]}"#,
        );
        let generation = into_generation(resp, "m", 0).unwrap();
        assert_eq!(generation.content, "thought hard");
    }

    #[test]
    fn test_into_generation_no_content_at_all() {
        let resp = response(r#"{"choices":[{"message":{}}]}"#);
        let err = into_generation(resp, "m", 0).unwrap_err();
        assert!(matches!(err, ApiError::Application { .. }));
    }

    #[test]
    fn test_into_generation_estimates_missing_usage() {
        // 40 chars of content, no usage block -> ~10 tokens estimated
        let content = "x".repeat(40);
        let resp = response(&format!(
            r#"{{"choices":[{{"message":{{"content":"{content}"}}}}]}}"#
        ));
        let generation = into_generation(resp, "m", 0).unwrap();
        assert_eq!(generation.token_usage.completion_tokens, 10);
        assert_eq!(generation.token_usage.prompt_tokens, 0);
    }

    #[test]
    fn test_into_generation_falls_back_to_requested_model() {
        let resp = response(r#"{"choices":[{"message":{"content":"ok"}}]}"#);
        let generation = into_generation(resp, "my-model", 0).unwrap();
        assert_eq!(generation.model, "my-model");
    }

    #[tokio::test]
    async fn test_body_transport_failure_is_retryable() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8192];
            let _ = sock.read(&mut buf).await;
            // Advertise a large body, send a fragment, then drop the socket
            let _ = sock
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 65536\r\n\r\n{\"choices\":",
                )
                .await;
        });

        let client = ApiClient::new(
            &format!("http://{addr}"),
            "key",
            "text-model",
            "image-model",
            64,
            Duration::from_secs(5),
        );
        let err = client.generate(&sample_case()).await.unwrap_err();
        assert!(
            crate::engine::retry::is_retryable(&err),
            "mid-body transport failure must stay retryable, got {err:?}"
        );
    }

    fn sample_case() -> TestCase {
        TestCase {
            id: "T001".to_string(),
            name: "Case".to_string(),
            category: "test".to_string(),
            difficulty: crate::catalog::Difficulty::Easy,
            tags: vec![],
            icon: None,
            prompt: "hello".to_string(),
            modality: Modality::Text,
        }
    }

    #[test]
    fn test_endpoint_trailing_slash_normalized() {
        let client = ApiClient::new(
            "https://api.example.com/v1/",
            "key",
            "t",
            "i",
            1024,
            Duration::from_secs(30),
        );
        assert_eq!(
            client.endpoint,
            "https://api.example.com/v1/chat/completions"
        );
    }
}
