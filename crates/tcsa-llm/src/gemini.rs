//! Gemini Provider Implementation
//!
//! Integration with Google's Generative Language API (`generateContent`).
//!
//! # Features
//!
//! - Async HTTP communication
//! - Model chosen per call, so one provider serves a whole fallback chain
//! - JSON-only output mode via `responseMimeType`
//! - Request timeout handling
//!
//! No retries happen here: a failed call is reported immediately so the
//! caller can move on to the next model.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use tcsa_llm::GeminiProvider;
//!
//! let provider = GeminiProvider::new(
//!     "https://generativelanguage.googleapis.com",
//!     "api-key",
//!     Duration::from_secs(90),
//! )
//! .unwrap();
//! ```

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tcsa_domain::traits::{GenerationProvider, ResponseFormat};
use tracing::debug;

/// Default Generative Language API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Gemini API provider
pub struct GeminiProvider {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

/// Request body for the generateContent API
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

/// Response from the generateContent API
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API base URL, without a trailing path
    /// - `api_key`: Generative Language API key
    /// - `timeout`: upper bound for a single request
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be initialized.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn url(&self, model_id: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model_id)
    }

    fn request_body<'a>(prompt: &'a str, format: ResponseFormat) -> GenerateContentRequest<'a> {
        let generation_config = match format {
            ResponseFormat::StructuredJson => Some(GenerationConfig {
                response_mime_type: "application/json",
            }),
            ResponseFormat::PlainText => None,
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config,
        }
    }

    /// Generate text with the given model
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The service is unreachable or the request times out
    /// - The model does not exist
    /// - The prompt was blocked or no candidate text was returned
    pub async fn generate_content(
        &self,
        prompt: &str,
        model_id: &str,
        format: ResponseFormat,
    ) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.url(model_id))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt, format))
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(model_id.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text = extract_text(body)?;
        debug!(model = model_id, chars = text.len(), "Gemini response received");
        Ok(text)
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(body: GenerateContentResponse) -> Result<String, LlmError> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::Blocked(reason));
    }

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(LlmError::InvalidResponse(format!(
            "Empty candidate (finish reason: {})",
            reason
        )));
    }

    Ok(text)
}

impl GenerationProvider for GeminiProvider {
    type Error = LlmError;

    async fn generate(
        &self,
        prompt: &str,
        model_id: &str,
        format: ResponseFormat,
    ) -> Result<String, Self::Error> {
        self.generate_content(prompt, model_id, format).await
    }
}
