//! TCSA Scoring Server
//!
//! HTTP front end for the scoring engine: accepts batches of sustainability
//! reports as multipart uploads and returns one scoring result per report.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use std::sync::Arc;
use tcsa_llm::{GeminiProvider, LlmError};
use tcsa_scorer::{BatchCoordinator, PdfTextSource, ScorerError};
use tokio::net::TcpListener;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Scoring engine could not be initialized
    #[error("Scoring engine error: {0}")]
    Scorer(#[from] ScorerError),

    /// Generation client could not be initialized
    #[error("Generation client error: {0}")]
    Provider(#[from] LlmError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the application state for a configuration
///
/// Validates the configuration, then wires the Gemini client and the PDF
/// extractor into a batch coordinator.
pub fn build_state(
    config: &ServerConfig,
    api_key: String,
) -> Result<AppState<GeminiProvider, PdfTextSource>, ServerError> {
    config.validate()?;

    let provider = GeminiProvider::new(
        &config.gemini.endpoint,
        api_key,
        config.scoring.attempt_timeout(),
    )?;
    let coordinator = BatchCoordinator::new(Arc::new(provider), PdfTextSource, &config.scoring)?;

    Ok(AppState::new(coordinator))
}

/// Start the scoring HTTP server
///
/// Resolves the API key, builds the scoring engine and serves until the
/// process is stopped. Every configuration fault is reported before binding.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting TCSA scoring server");
    info!("Bind address: {}", config.bind_addr());
    info!("Model chain: {}", config.scoring.model_ids.join(" -> "));
    info!(
        "Attempt timeout: {}s, max concurrent documents: {}",
        config.scoring.attempt_timeout_secs, config.scoring.max_concurrent_documents
    );

    let api_key = config.gemini.api_key()?;
    let state = build_state(&config, api_key)?;

    let app = create_router(state, config.max_upload_bytes);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Scoring server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
