//! TCSA LLM Provider Layer
//!
//! Implementations of the `GenerationProvider` trait from `tcsa-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted per-model responses for testing
//! - `GeminiProvider`: Google Generative Language API integration
//!
//! # Examples
//!
//! ```
//! use tcsa_llm::MockProvider;
//! use tcsa_domain::traits::{GenerationProvider, ResponseFormat};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new("{}");
//! let result = provider
//!     .generate("score this", "model-a", ResponseFormat::StructuredJson)
//!     .await
//!     .unwrap();
//! assert_eq!(result, "{}");
//! # }
//! ```

#![warn(missing_docs)]

pub mod gemini;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tcsa_domain::traits::{GenerationProvider, ResponseFormat};
use thiserror::Error;

pub use gemini::GeminiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// The service refused to answer the prompt
    #[error("Prompt blocked: {0}")]
    Blocked(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Scripted outcome for one model
#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(String),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses per model identifier without making any
/// network calls, and records the order in which models were invoked.
///
/// # Examples
///
/// ```
/// use tcsa_llm::MockProvider;
///
/// let mut provider = MockProvider::new("fallback text");
/// provider.add_error("model-a", "service unavailable");
/// provider.add_response("model-b", "{\"ok\": true}");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    replies: Arc<Mutex<HashMap<String, MockReply>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    prompt_delays: Arc<Mutex<Vec<(String, Duration)>>>,
    calls: Arc<Mutex<Vec<String>>>,
    completed: Arc<Mutex<Vec<String>>>,
    jitter: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all models
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            replies: Arc::new(Mutex::new(HashMap::new())),
            delays: Arc::new(Mutex::new(HashMap::new())),
            prompt_delays: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            completed: Arc::new(Mutex::new(Vec::new())),
            jitter: None,
        }
    }

    /// Add a specific response for a given model
    pub fn add_response(&mut self, model_id: impl Into<String>, response: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .insert(model_id.into(), MockReply::Text(response.into()));
    }

    /// Configure a given model to fail
    pub fn add_error(&mut self, model_id: impl Into<String>, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .insert(model_id.into(), MockReply::Error(message.into()));
    }

    /// Delay every call to a given model
    pub fn add_delay(&mut self, model_id: impl Into<String>, delay: Duration) {
        self.delays.lock().unwrap().insert(model_id.into(), delay);
    }

    /// Delay every call whose prompt contains `fragment`
    pub fn add_prompt_delay(&mut self, fragment: impl Into<String>, delay: Duration) {
        self.prompt_delays.lock().unwrap().push((fragment.into(), delay));
    }

    /// Add a pseudo-random latency below `max`, derived from the prompt
    ///
    /// Different prompts finish in a scrambled but reproducible order.
    pub fn with_jitter(mut self, max: Duration) -> Self {
        self.jitter = Some(max);
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Model identifiers in the order they were invoked
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Prompts in the order their calls finished, after any delay
    pub fn completed_prompts(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    /// Reset the call log
    pub fn reset_call_count(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn latency(&self, prompt: &str, model_id: &str) -> Duration {
        let fixed = self
            .delays
            .lock()
            .unwrap()
            .get(model_id)
            .copied()
            .unwrap_or_default();
        let by_prompt: Duration = self
            .prompt_delays
            .lock()
            .unwrap()
            .iter()
            .filter(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, delay)| *delay)
            .sum();
        let jitter = match self.jitter {
            Some(max) if !max.is_zero() => {
                let mut hasher = DefaultHasher::new();
                prompt.hash(&mut hasher);
                let millis = hasher.finish() % (max.as_millis() as u64).max(1);
                Duration::from_millis(millis)
            }
            _ => Duration::ZERO,
        };
        fixed + by_prompt + jitter
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl GenerationProvider for MockProvider {
    type Error = LlmError;

    async fn generate(
        &self,
        prompt: &str,
        model_id: &str,
        _format: ResponseFormat,
    ) -> Result<String, Self::Error> {
        self.calls.lock().unwrap().push(model_id.to_string());

        let latency = self.latency(prompt, model_id);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.completed.lock().unwrap().push(prompt.to_string());

        let reply = self.replies.lock().unwrap().get(model_id).cloned();
        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(message)) => Err(LlmError::Other(message)),
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: ResponseFormat = ResponseFormat::StructuredJson;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt", "model-a", JSON).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_per_model_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("flash", "fast");
        provider.add_response("pro", "slow");

        assert_eq!(provider.generate("p", "flash", JSON).await.unwrap(), "fast");
        assert_eq!(provider.generate("p", "pro", JSON).await.unwrap(), "slow");
        assert_eq!(
            provider.generate("p", "other", JSON).await.unwrap(),
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_mock_provider_records_call_order() {
        let provider = MockProvider::new("x");
        provider.generate("p", "first", JSON).await.unwrap();
        provider.generate("p", "second", JSON).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls(), vec!["first", "second"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("flash", "quota exhausted");

        let result = provider.generate("p", "flash", JSON).await;
        assert!(matches!(result, Err(LlmError::Other(ref m)) if m == "quota exhausted"));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_log() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("p", "m", JSON).await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[tokio::test]
    async fn test_prompt_delay_reorders_completion() {
        let mut provider = MockProvider::new("x");
        provider.add_prompt_delay("slow", Duration::from_millis(100));

        let (slow, fast) = tokio::join!(
            provider.generate("slow prompt", "m", JSON),
            provider.generate("fast prompt", "m", JSON),
        );
        slow.unwrap();
        fast.unwrap();

        assert_eq!(provider.completed_prompts(), vec!["fast prompt", "slow prompt"]);
    }

    #[test]
    fn test_jitter_is_bounded_and_reproducible() {
        let provider = MockProvider::new("x").with_jitter(Duration::from_millis(50));
        let first = provider.latency("prompt one", "m");
        assert!(first < Duration::from_millis(50));
        assert_eq!(first, provider.latency("prompt one", "m"));
    }
}
