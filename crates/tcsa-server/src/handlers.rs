//! HTTP request handlers for the scoring service.
//!
//! Implements batch scoring and health check endpoints using axum.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tcsa_domain::traits::{DocumentTextSource, GenerationProvider};
use tcsa_domain::ScoringResult;
use tcsa_scorer::{zip_batch_inputs, BatchCoordinator, ScorerError, UploadedDocument};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

/// Multipart field carrying the uploaded reports
pub const FILES_FIELD: &str = "files";
/// Multipart field carrying one company name per file
pub const COMPANY_NAMES_FIELD: &str = "company_names";
/// Multipart field carrying one website URL per file
pub const WEBSITE_URLS_FIELD: &str = "website_urls";

/// Shared application state
pub struct AppState<G, X> {
    /// Batch scoring engine
    pub coordinator: BatchCoordinator<G, X>,
}

impl<G, X> Clone for AppState<G, X> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<G, X> AppState<G, X> {
    /// Create a new application state
    pub fn new(coordinator: BatchCoordinator<G, X>) -> Self {
        Self { coordinator }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always "ok" while the process serves requests
    pub status: String,
    /// Human-readable description
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// The multipart body could not be decoded
    Multipart(MultipartError),
    /// The scoring engine rejected the batch
    Scoring(ScorerError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Multipart(e) => (StatusCode::BAD_REQUEST, format!("Invalid form data: {}", e)),
            AppError::Scoring(e) if e.is_batch_rejection() => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Scoring(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        warn!("Rejecting request ({}): {}", status, message);
        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Multipart(e)
    }
}

impl From<ScorerError> for AppError {
    fn from(e: ScorerError) -> Self {
        AppError::Scoring(e)
    }
}

/// POST /scoring/batch - Score uploaded reports
///
/// Expects repeated `files`, `company_names` and `website_urls` fields,
/// aligned by position. Returns one result per PDF, in upload order.
async fn score_batch<G, X>(
    State(state): State<AppState<G, X>>,
    mut multipart: Multipart,
) -> Result<Json<Vec<ScoringResult>>, AppError>
where
    G: GenerationProvider + Send + Sync + 'static,
    G::Error: Display,
    X: DocumentTextSource + Send + Sync + 'static,
    X::Error: Display,
{
    let mut documents = Vec::new();
    let mut company_names = Vec::new();
    let mut website_urls = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILES_FIELD => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                documents.push(UploadedDocument::new(file_name, content_type, bytes.to_vec()));
            }
            COMPANY_NAMES_FIELD => company_names.push(field.text().await?),
            WEBSITE_URLS_FIELD => website_urls.push(field.text().await?),
            other => debug!("Ignoring form field '{}'", other),
        }
    }

    info!("Received batch of {} file(s)", documents.len());

    let items = zip_batch_inputs(documents, company_names, website_urls)?;
    let results = state.coordinator.run_batch(items).await?;

    Ok(Json(results))
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
        message: "TCSA scoring service is running".to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router<G, X>(state: AppState<G, X>, max_upload_bytes: usize) -> AxumRouter
where
    G: GenerationProvider + Send + Sync + 'static,
    G::Error: Display,
    X: DocumentTextSource + Send + Sync + 'static,
    X::Error: Display,
{
    AxumRouter::new()
        .route("/scoring/batch", post(score_batch::<G, X>))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tcsa_llm::MockProvider;
    use tcsa_scorer::{PdfTextSource, ScoringConfig};
    use tower::ServiceExt; // for oneshot

    fn create_test_state() -> AppState<MockProvider, PdfTextSource> {
        let config = ScoringConfig::new(vec!["flash".to_string()], 30);
        let coordinator =
            BatchCoordinator::new(Arc::new(MockProvider::new("{}")), PdfTextSource, &config).unwrap();
        AppState::new(coordinator)
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state(), 1024);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_bad_request() {
        let app = create_router(create_test_state(), 1024);

        let request = Request::builder()
            .method("POST")
            .uri("/scoring/batch")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[test]
    fn test_error_status_codes() {
        let mismatch = AppError::Scoring(ScorerError::BatchInputMismatch {
            documents: 2,
            company_names: 1,
            reference_urls: 2,
        });
        assert_eq!(mismatch.into_response().status(), StatusCode::BAD_REQUEST);

        let empty = AppError::Scoring(ScorerError::EmptyBatch);
        assert_eq!(empty.into_response().status(), StatusCode::BAD_REQUEST);

        let internal = AppError::Scoring(ScorerError::Worker("lost".to_string()));
        assert_eq!(internal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
