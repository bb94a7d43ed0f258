//! Boundary to the external text-generation service.
//!
//! Every backend implements `Generator`. Whatever goes wrong underneath
//! (transport, HTTP status, body shape, timeout) surfaces as
//! `AppError::GenerationFailed`; the cause is logged and never shown.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::errors::{AppError, AppResult};

/// Model preference passed along with every prompt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelHint {
  #[default]
  Smart,
}

impl ModelHint {
  pub fn as_str(self) -> &'static str {
    match self {
      ModelHint::Smart => "smart",
    }
  }
}

#[async_trait]
pub trait Generator: Send + Sync {
  /// Send one prompt and return the raw reply text.
  async fn complete(&self, prompt: &str, hint: ModelHint) -> AppResult<String>;

  /// Short label used in logs.
  fn name(&self) -> &'static str;
}

/// Run `generator` with an upper bound on latency. Expiry is a generation failure.
#[instrument(level = "info", skip(generator, prompt), fields(backend = generator.name(), prompt_len = prompt.len()))]
pub async fn complete_within(
  generator: &dyn Generator,
  prompt: &str,
  timeout: Duration,
) -> AppResult<String> {
  let start = Instant::now();
  let result = match tokio::time::timeout(timeout, generator.complete(prompt, ModelHint::Smart)).await {
    Ok(r) => r,
    Err(_) => Err(AppError::generation(format!("timed out after {}s", timeout.as_secs()))),
  };
  let elapsed = start.elapsed();

  match &result {
    Ok(text) => info!(target: "generation", ?elapsed, reply_len = text.len(), "Generation completed"),
    Err(AppError::GenerationFailed { cause }) => {
      error!(target: "generation", ?elapsed, %cause, "Generation failed")
    }
    Err(e) => error!(target: "generation", ?elapsed, error = %e, "Generation failed"),
  }
  result
}

/// Wire body of the chat endpoint: `{message, aiModel}` in, `{response}` out.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
  pub message: String,
  #[serde(default)]
  pub ai_model: ModelHint,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
  pub response: String,
}

/// Client for a service that speaks the chat endpoint contract.
#[derive(Clone)]
pub struct ChatEndpointClient {
  pub client: reqwest::Client,
  pub url: String,
}

impl ChatEndpointClient {
  pub fn new(url: impl Into<String>) -> AppResult<Self> {
    let client = reqwest::Client::builder().build()?;
    Ok(Self { client, url: url.into() })
  }
}

#[async_trait]
impl Generator for ChatEndpointClient {
  #[instrument(level = "info", skip(self, prompt), fields(url = %self.url, prompt_len = prompt.len(), hint = hint.as_str()))]
  async fn complete(&self, prompt: &str, hint: ModelHint) -> AppResult<String> {
    let body = ChatRequest { message: prompt.to_string(), ai_model: hint };
    let res = self
      .client
      .post(&self.url)
      .header(USER_AGENT, "differentie-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&body)
      .send()
      .await?;

    let status = res.status();
    if !status.is_success() {
      let text = res.text().await.unwrap_or_default();
      return Err(AppError::generation(format!(
        "chat endpoint HTTP {}: {}",
        status,
        crate::util::trunc_for_log(&text, 200)
      )));
    }

    let reply: ChatResponse = res
      .json()
      .await
      .map_err(|e| AppError::generation(format!("malformed chat response: {e}")))?;
    Ok(reply.response)
  }

  fn name(&self) -> &'static str { "chat_endpoint" }
}

/// Stand-in used when no backend is configured. Every call fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct Disabled;

#[async_trait]
impl Generator for Disabled {
  async fn complete(&self, _prompt: &str, _hint: ModelHint) -> AppResult<String> {
    Err(AppError::generation("no generation backend configured"))
  }

  fn name(&self) -> &'static str { "disabled" }
}
