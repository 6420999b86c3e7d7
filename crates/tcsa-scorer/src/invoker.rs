//! Ordered model fallback
//!
//! Each model in the chain gets one attempt, bounded by the configured
//! timeout. The first attempt whose output normalizes into a valid score
//! tree wins and later models are never called.

use crate::config::ScoringConfig;
use crate::error::ScorerError;
use crate::parser::normalize;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tcsa_domain::traits::{GenerationProvider, ResponseFormat};
use tcsa_domain::ScoreDocument;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Successful outcome of a fallback run
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Model that produced the accepted answer
    pub model_id: String,
    /// Number of attempts made, including the successful one
    pub attempts: usize,
    /// Validated score tree
    pub document: ScoreDocument,
}

/// Progress through the fallback chain
#[derive(Debug)]
pub enum FallbackState {
    /// About to try the model at this index
    Trying(usize),
    /// A model produced a valid answer
    Succeeded(Invocation),
    /// Every model failed
    Exhausted {
        /// Number of attempts made
        attempts: usize,
        /// Most recent failure, if any attempt was made
        last_error: Option<ScorerError>,
    },
}

impl FallbackState {
    /// Advance after the attempt at `index` finished with `outcome`
    ///
    /// `chain_len` is the length of the model chain.
    pub fn next(
        index: usize,
        chain_len: usize,
        outcome: Result<Invocation, ScorerError>,
    ) -> FallbackState {
        match outcome {
            Ok(invocation) => FallbackState::Succeeded(invocation),
            Err(e) if index + 1 < chain_len => {
                debug!("Attempt {} failed, advancing: {}", index + 1, e);
                FallbackState::Trying(index + 1)
            }
            Err(e) => FallbackState::Exhausted {
                attempts: index + 1,
                last_error: Some(e),
            },
        }
    }

    /// Initial state for a chain of `chain_len` models
    pub fn start(chain_len: usize) -> FallbackState {
        if chain_len == 0 {
            FallbackState::Exhausted {
                attempts: 0,
                last_error: None,
            }
        } else {
            FallbackState::Trying(0)
        }
    }
}

/// Tries an ordered chain of models until one yields a valid score tree
pub struct FallbackInvoker<G> {
    provider: Arc<G>,
    model_ids: Vec<String>,
    attempt_timeout: Duration,
}

impl<G> Clone for FallbackInvoker<G> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            model_ids: self.model_ids.clone(),
            attempt_timeout: self.attempt_timeout,
        }
    }
}

impl<G> FallbackInvoker<G>
where
    G: GenerationProvider + Send + Sync,
    G::Error: Display,
{
    /// Create a new invoker over a model chain
    pub fn new(provider: Arc<G>, model_ids: Vec<String>, attempt_timeout: Duration) -> Self {
        Self {
            provider,
            model_ids,
            attempt_timeout,
        }
    }

    /// Create an invoker using the chain and timeout from a configuration
    pub fn from_config(provider: Arc<G>, config: &ScoringConfig) -> Self {
        Self::new(provider, config.model_ids.clone(), config.attempt_timeout())
    }

    /// Models in the order they will be tried
    pub fn model_ids(&self) -> &[String] {
        &self.model_ids
    }

    /// Run the chain for one prompt
    ///
    /// Returns `AllModelsExhausted` when no model produced a valid answer,
    /// including when the chain is empty.
    pub async fn invoke(&self, prompt: &str) -> Result<Invocation, ScorerError> {
        let mut state = FallbackState::start(self.model_ids.len());

        loop {
            state = match state {
                FallbackState::Trying(index) => {
                    let model_id = &self.model_ids[index];
                    let outcome = self
                        .attempt(prompt, model_id)
                        .await
                        .map(|document| Invocation {
                            model_id: model_id.clone(),
                            attempts: index + 1,
                            document,
                        });
                    if let Err(e) = &outcome {
                        warn!("Model {} failed: {}", model_id, e);
                    }
                    FallbackState::next(index, self.model_ids.len(), outcome)
                }
                FallbackState::Succeeded(invocation) => {
                    info!(
                        "Model {} succeeded after {} attempt(s)",
                        invocation.model_id, invocation.attempts
                    );
                    return Ok(invocation);
                }
                FallbackState::Exhausted {
                    attempts,
                    last_error,
                } => {
                    let last_error = last_error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "no models configured".to_string());
                    return Err(ScorerError::AllModelsExhausted {
                        attempts,
                        last_error,
                    });
                }
            };
        }
    }

    /// One bounded attempt against a single model
    async fn attempt(&self, prompt: &str, model_id: &str) -> Result<ScoreDocument, ScorerError> {
        debug!("Calling model {} ({} prompt chars)", model_id, prompt.len());

        let response = timeout(
            self.attempt_timeout,
            self.provider
                .generate(prompt, model_id, ResponseFormat::StructuredJson),
        )
        .await
        .map_err(|_| ScorerError::Timeout {
            model_id: model_id.to_string(),
            secs: self.attempt_timeout.as_secs(),
        })?
        .map_err(|e| ScorerError::ModelInvocation {
            model_id: model_id.to_string(),
            message: e.to_string(),
        })?;

        debug!("Model {} returned {} chars", model_id, response.len());
        normalize(&response).inspect_err(|_| {
            debug!("Unparseable output from {}: {}", model_id, response);
        })
    }
}
