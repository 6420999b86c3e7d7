//! Error types for the scoring engine

use thiserror::Error;

/// Errors that can occur while scoring
///
/// Per-document variants never escape a `DocumentPipeline`; they are turned
/// into degraded results. Only `BatchInputMismatch` and `EmptyBatch` reach
/// the batch caller.
#[derive(Error, Debug)]
pub enum ScorerError {
    /// Document unreadable, corrupt or unsupported
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A single generation attempt failed at the transport or service level
    #[error("Model invocation error ({model_id}): {message}")]
    ModelInvocation {
        /// Model that was called
        model_id: String,
        /// Underlying error message
        message: String,
    },

    /// A single generation attempt exceeded the configured timeout
    #[error("Model timeout ({model_id}): no response within {secs}s")]
    Timeout {
        /// Model that was called
        model_id: String,
        /// Configured timeout in seconds
        secs: u64,
    },

    /// Model output did not match the score-tree shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Every model in the fallback chain failed
    #[error("All models exhausted after {attempts} attempt(s) (last error: {last_error})")]
    AllModelsExhausted {
        /// Number of attempts made
        attempts: usize,
        /// Message of the most recent failure
        last_error: String,
    },

    /// The index-aligned batch inputs differ in length
    #[error(
        "Batch input mismatch: {documents} documents, {company_names} company names, {reference_urls} reference URLs"
    )]
    BatchInputMismatch {
        /// Number of documents
        documents: usize,
        /// Number of company names
        company_names: usize,
        /// Number of reference URLs
        reference_urls: usize,
    },

    /// No valid PDF document remains after filtering
    #[error("No valid input: no PDF documents were provided")]
    EmptyBatch,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker task failed to complete
    #[error("Worker error: {0}")]
    Worker(String),
}

impl ScorerError {
    /// Whether this error rejects a whole batch call
    pub fn is_batch_rejection(&self) -> bool {
        matches!(
            self,
            ScorerError::BatchInputMismatch { .. } | ScorerError::EmptyBatch
        )
    }
}
