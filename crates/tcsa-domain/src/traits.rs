//! Trait definitions for external capabilities
//!
//! These traits define the boundaries between the scoring engine and the
//! services it consumes. Implementations live in other crates.

use std::future::Future;

/// Output mode requested from the generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// A single JSON document and nothing else
    StructuredJson,
    /// Free text
    PlainText,
}

/// Text generation capability
///
/// Implemented by the infrastructure layer (tcsa-llm). Calls suspend on
/// network I/O; dropping the returned future cancels the call.
pub trait GenerationProvider {
    /// Error type for generation calls
    type Error;

    /// Generate a completion for `prompt` using the model `model_id`
    fn generate(
        &self,
        prompt: &str,
        model_id: &str,
        format: ResponseFormat,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Document text extraction capability
///
/// Implemented by the application layer (tcsa-scorer). Implementations may
/// block and may fault on malformed input.
pub trait DocumentTextSource {
    /// Error type for extraction
    type Error;

    /// Extract best-effort plain text from raw document bytes
    fn extract_text(&self, bytes: &[u8]) -> Result<String, Self::Error>;
}
