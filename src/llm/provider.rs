//! HTTP adapter over hosted completion APIs. Thin by design: request
//! assembly, response unwrapping, and error classification only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{error, info};

use super::models::clamp_max_tokens;
use super::{with_retries, CompletionClient, CompletionError, CompletionOptions};

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a book recommendation assistant. Always \
respond with valid JSON only, no markdown formatting or code blocks.";

/// Supported hosted providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
    OpenRouter,
}

impl Provider {
    /// Parse a provider name from configuration.
    pub fn parse(name: &str) -> Result<Provider, String> {
        match name.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAi),
            "openrouter" => Ok(Provider::OpenRouter),
            other => Err(format!(
                "Unsupported completion provider: '{}'. Supported: anthropic, openai, openrouter",
                other
            )),
        }
    }
}

/// Production completion client: reqwest with a 60-second timeout, two
/// attempts with exponential backoff, token budget clamped to the model's
/// context limit.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    provider: Provider,
    api_key: String,
}

impl HttpCompletionClient {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                CompletionError::Unavailable(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            provider,
            api_key: api_key.into(),
        })
    }

    async fn complete_once(
        &self,
        prompt: &str,
        options: &CompletionOptions,
        max_tokens: u32,
    ) -> Result<String, CompletionError> {
        let request = match self.provider {
            Provider::Anthropic => {
                let body = serde_json::json!({
                    "model": options.model,
                    "max_tokens": max_tokens,
                    "temperature": options.temperature,
                    "system": SYSTEM_PROMPT,
                    "messages": [
                        {"role": "user", "content": prompt}
                    ]
                });
                self.client
                    .post(ANTHROPIC_URL)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .header("content-type", "application/json")
                    .json(&body)
            }
            Provider::OpenAi | Provider::OpenRouter => {
                let url = match self.provider {
                    Provider::OpenAi => OPENAI_URL,
                    _ => OPENROUTER_URL,
                };
                let body = serde_json::json!({
                    "model": options.model,
                    "max_tokens": max_tokens,
                    "temperature": options.temperature,
                    "messages": [
                        {"role": "system", "content": SYSTEM_PROMPT},
                        {"role": "user", "content": prompt}
                    ]
                });
                self.client
                    .post(url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .header("content-type", "application/json")
                    .json(&body)
            }
        };

        let response = request.send().await.map_err(classify_transport_error)?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            CompletionError::Unavailable(format!("failed to read API response body: {}", e))
        })?;

        if !status.is_success() {
            let err = classify_status(status, &body_text);
            error!("completion API returned {}: {}", status, err);
            return Err(err);
        }

        extract_text(self.provider, &body_text)
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let max_tokens = clamp_max_tokens(&options.model, options.max_tokens);
        if max_tokens < options.max_tokens {
            info!(
                "clamped token budget for '{}': {} -> {}",
                options.model, options.max_tokens, max_tokens
            );
        }
        with_retries(|| self.complete_once(prompt, options, max_tokens)).await
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Map transport-level reqwest failures to the typed taxonomy.
fn classify_transport_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else if e.is_connect() {
        CompletionError::Network(e.to_string())
    } else {
        CompletionError::Unavailable(e.to_string())
    }
}

/// Map a non-2xx response to the typed taxonomy, using the body to
/// disambiguate quota-vs-rate-limit 429s and context-length 400s.
fn classify_status(status: StatusCode, body: &str) -> CompletionError {
    let body_lower = body.to_lowercase();
    match status.as_u16() {
        401 | 403 => CompletionError::InvalidCredential,
        402 => CompletionError::QuotaExceeded,
        429 => {
            if body_lower.contains("quota")
                || body_lower.contains("billing")
                || body_lower.contains("insufficient")
            {
                CompletionError::QuotaExceeded
            } else {
                CompletionError::RateLimited
            }
        }
        400 | 413 => {
            if body_lower.contains("context")
                || body_lower.contains("too long")
                || body_lower.contains("maximum") && body_lower.contains("token")
            {
                CompletionError::ContextTooLong
            } else {
                CompletionError::Unavailable(truncate(body, 200))
            }
        }
        _ => CompletionError::Unavailable(format!("{}: {}", status, truncate(body, 200))),
    }
}

/// Pull the completion text out of the provider's response envelope.
fn extract_text(provider: Provider, body: &str) -> Result<String, CompletionError> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        CompletionError::Unavailable(format!("failed to parse API response wrapper: {}", e))
    })?;

    let text = match provider {
        // Anthropic: { "content": [{"type": "text", "text": "..."}] }
        Provider::Anthropic => json["content"][0]["text"].as_str(),
        // OpenAI-compatible: { "choices": [{"message": {"content": "..."}}] }
        Provider::OpenAi | Provider::OpenRouter => json["choices"][0]["message"]["content"].as_str(),
    };

    text.map(|s| s.to_string())
        .ok_or_else(|| CompletionError::Unavailable("no text content in API response".to_string()))
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.len() > max_len {
        format!("{}...", &text[..max_len])
    } else {
        text.to_string()
    }
}
