//! Error types for extraction, scoring and collaborator calls.
//!
//! `ProviderError` is defined here rather than in `quizmark-providers` so the
//! grading engine can downcast and classify collaborator failures for retry
//! decisions without string matching.

use thiserror::Error;

/// The answer key or student-answer structure violates the data model.
///
/// Scoring never proceeds partially: any of these aborts the evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringInputError {
    /// Two answer-key entries share a question number.
    #[error("duplicate question_no {0} in answer key")]
    DuplicateQuestion(u32),

    /// A key entry carries marks that are negative, NaN or infinite.
    #[error("question {question_no}: marks must be a non-negative number, got {marks}")]
    InvalidMarks { question_no: u32, marks: f64 },

    /// The input could not be read into the expected shape
    /// (missing required field, wrong type).
    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },
}

/// The text-generation collaborator's output could not be turned into
/// student answers.
///
/// Every parse-related variant keeps the raw collaborator output so callers
/// can log or display it.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The submission text was empty or whitespace only.
    #[error("submission text is empty")]
    EmptyInput,

    /// The collaborator call itself failed.
    #[error("text generation failed: {0:#}")]
    Generation(anyhow::Error),

    /// No JSON array could be located in the response.
    #[error("no JSON array found in model response\nRaw output:\n{raw}")]
    NoArray { raw: String },

    /// An array was located but is not valid JSON.
    #[error("failed to parse JSON from model response: {reason}\nRaw output:\n{raw}")]
    Malformed { reason: String, raw: String },

    /// Valid JSON that does not match the answer schema.
    #[error("model response does not match the answer schema: {reason}\nRaw output:\n{raw}")]
    Schema { reason: String, raw: String },
}

impl ExtractionError {
    /// The raw collaborator output attached to this error, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExtractionError::NoArray { raw }
            | ExtractionError::Malformed { raw, .. }
            | ExtractionError::Schema { raw, .. } => Some(raw),
            ExtractionError::EmptyInput | ExtractionError::Generation(_) => None,
        }
    }

    /// Replace the raw output attached to a decode error.
    pub(crate) fn with_raw(mut self, output: String) -> Self {
        if let ExtractionError::NoArray { raw }
        | ExtractionError::Malformed { raw, .. }
        | ExtractionError::Schema { raw, .. } = &mut self
        {
            *raw = output;
        }
        self
    }

    /// The collaborator failure behind a `Generation` error, if it was a
    /// [`ProviderError`].
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            ExtractionError::Generation(e) => e.downcast_ref::<ProviderError>(),
            _ => None,
        }
    }
}

/// Errors that can occur when interacting with a text-generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
