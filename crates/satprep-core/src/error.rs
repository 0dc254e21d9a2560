//! Error types for scoring, persistence, and the grading pipeline.
//!
//! `StoreError` lives in `satprep-core` so the grading engine can classify
//! collaborator failures for retry decisions without string matching.

use thiserror::Error;

use crate::validation::ValidationResult;

/// Defensive failures raised by the scoring calculator.
///
/// These signal a caller contract violation: scoring was invoked on input
/// that validation should have rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The attempt is structurally inconsistent with the test.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An answer references a question the test does not contain.
    #[error("answer references unknown question '{question_id}' in test '{test_id}'")]
    MissingQuestionReference {
        test_id: String,
        question_id: String,
    },
}

/// Errors that can occur when talking to a persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Authentication with the store failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The store returned an error response.
    #[error("store error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be decoded.
    #[error("malformed document: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        match self {
            StoreError::AuthenticationFailed(_) | StoreError::Malformed(_) => true,
            StoreError::Api { status, .. } => (400..500).contains(status) && *status != 429,
            StoreError::Timeout(_) | StoreError::Network(_) | StoreError::Io(_) => false,
        }
    }
}

/// The closed set of ways grading an attempt can fail.
#[derive(Debug, Error)]
pub enum GradingError {
    /// The test or the attempt failed structural validation.
    #[error("validation failed with {} error(s)", .0.errors.len())]
    Validation(ValidationResult),

    /// The calculator rejected its input despite validation.
    #[error(transparent)]
    InvalidInput(#[from] ScoringError),

    /// The referenced test does not exist in the store.
    #[error("test not found: {0}")]
    TestNotFound(String),

    /// A persistence collaborator failed.
    #[error("upstream failure: {0}")]
    UpstreamFailure(#[from] StoreError),
}
