//! Completion-client seam: a small trait over the hosted completion API,
//! a typed failure taxonomy, and the retry policy that wraps every call.

pub mod models;
pub mod provider;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

pub use provider::HttpCompletionClient;

/// How many times a single logical completion is attempted.
const MAX_ATTEMPTS: u32 = 2;
/// Base delay before the second attempt; grows by 1.5x per further attempt.
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Per-call generation parameters. `max_tokens` is a request; the client
/// clamps it against the model's context limit before sending.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Failure kinds surfaced by the completion client. Each maps to a distinct
/// actionable message; the retry loop only repeats the transient ones.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("API quota exceeded - check your plan and billing details")]
    QuotaExceeded,
    #[error("invalid API credential - check the configured API key")]
    InvalidCredential,
    #[error("rate limited by the completion provider - try again shortly")]
    RateLimited,
    #[error("prompt exceeds the model's context window")]
    ContextTooLong,
    #[error("completion request timed out")]
    Timeout,
    #[error("network unreachable: {0}")]
    Network(String),
    #[error("completion provider unavailable: {0}")]
    Unavailable(String),
}

impl CompletionError {
    /// Transient failures are worth a second attempt; credential, quota and
    /// context-length failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::RateLimited
            | CompletionError::Timeout
            | CompletionError::Network(_)
            | CompletionError::Unavailable(_) => true,
            CompletionError::QuotaExceeded
            | CompletionError::InvalidCredential
            | CompletionError::ContextTooLong => false,
        }
    }
}

/// The single outbound seam of the pipeline. Production uses
/// [`HttpCompletionClient`]; tests substitute a scripted mock.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// One logical completion: prompt text in, response text out.
    /// Implementations handle their own retries.
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError>;

    /// Whether the client has a usable credential. Checked by the
    /// orchestrator before any agent runs.
    fn is_available(&self) -> bool {
        true
    }
}

/// Run `attempt` up to [`MAX_ATTEMPTS`] times with exponential backoff
/// between tries. Non-retryable errors and the final failure are returned
/// as-is.
pub(crate) async fn with_retries<F, Fut>(mut attempt: F) -> Result<String, CompletionError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<String, CompletionError>>,
{
    let mut last_error = None;
    for n in 1..=MAX_ATTEMPTS {
        match attempt().await {
            Ok(text) => return Ok(text),
            Err(e) => {
                if !e.is_retryable() || n == MAX_ATTEMPTS {
                    return Err(e);
                }
                let delay = BACKOFF_BASE.mul_f64(1.5_f64.powi(n as i32 - 1));
                warn!(
                    "completion attempt {}/{} failed ({}), retrying in {:?}",
                    n, MAX_ATTEMPTS, e, delay
                );
                last_error = Some(e);
                tokio::time::sleep(delay).await;
            }
        }
    }
    // Unreachable: the loop always returns on the last attempt.
    Err(last_error.unwrap_or(CompletionError::Unavailable("no attempts made".to_string())))
}
