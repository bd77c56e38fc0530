use thiserror::Error;

use crate::llm::CompletionError;

/// Service-level errors. Only `LlmUnavailable` and `Completion` originate
/// from the pipeline itself; everything the pipeline can recover from
/// locally (unparsable output, empty filter results, missing display
/// fields) never surfaces here.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("no completion credential configured - the recommendation service is unavailable")]
    LlmUnavailable,

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("the curation stage produced no candidates")]
    NoCandidates,

    #[error("session store error: {0}")]
    Store(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("invalid rating {0}: expected 0 (down), 1 (neutral) or 2 (up)")]
    InvalidRating(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_errors_convert_transparently() {
        let err: RecommendError = CompletionError::QuotaExceeded.into();
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn test_invalid_rating_names_the_value() {
        let err = RecommendError::InvalidRating(7);
        assert!(err.to_string().contains('7'));
    }
}
