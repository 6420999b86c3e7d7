//! Document text extraction
//!
//! Wraps a [`DocumentTextSource`] so that every fault, including a panic
//! inside the underlying parser, becomes an [`ExtractionOutcome::Failure`].

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tcsa_domain::traits::DocumentTextSource;
use tracing::{debug, warn};

/// Result of extracting text from one document
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// Whitespace-normalized text
    Text(String),
    /// Reason the document could not be read
    Failure(String),
}

/// Turns raw document bytes into prompt-ready text
pub struct TextExtractor<X> {
    source: Arc<X>,
}

impl<X> Clone for TextExtractor<X> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<X> TextExtractor<X>
where
    X: DocumentTextSource + Send + Sync + 'static,
    X::Error: Display,
{
    /// Create a new extractor over a text source
    pub fn new(source: X) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Extract and normalize text, converting every fault into a failure
    pub fn extract(&self, bytes: &[u8]) -> ExtractionOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.source.extract_text(bytes)));

        match result {
            Ok(Ok(text)) => {
                let normalized = normalize_whitespace(&text);
                if normalized.is_empty() {
                    ExtractionOutcome::Failure("document contains no extractable text".to_string())
                } else {
                    debug!(chars = normalized.chars().count(), "Extracted document text");
                    ExtractionOutcome::Text(normalized)
                }
            }
            Ok(Err(e)) => ExtractionOutcome::Failure(e.to_string()),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!("Document parser panicked: {}", reason);
                ExtractionOutcome::Failure(format!("parser fault: {}", reason))
            }
        }
    }

    /// Extract on the blocking pool so async workers are never stalled
    pub async fn extract_blocking(&self, bytes: Vec<u8>) -> ExtractionOutcome {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .unwrap_or_else(|e| ExtractionOutcome::Failure(format!("extraction task failed: {}", e)))
    }
}

/// Collapse every run of whitespace into a single space
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
