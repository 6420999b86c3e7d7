//! Concurrent batch scoring
//!
//! Documents run concurrently, bounded by `max_concurrent_documents`.
//! Results come back in input order and one document's failure never
//! affects another. Document tasks live in a `JoinSet` owned by the batch,
//! so none outlives its caller.

use crate::config::ScoringConfig;
use crate::error::ScorerError;
use crate::extraction::TextExtractor;
use crate::invoker::FallbackInvoker;
use crate::pdf::PDF_MEDIA_TYPE;
use crate::pipeline::DocumentPipeline;
use crate::prompt::PromptBuilder;
use std::fmt::Display;
use std::sync::Arc;
use tcsa_domain::traits::{DocumentTextSource, GenerationProvider};
use tcsa_domain::{BatchId, ScoringRequest, ScoringResult};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};

/// An uploaded file as received from the caller
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Client-side file name
    pub name: String,
    /// Declared media type, if any
    pub content_type: Option<String>,
    /// Raw file content
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Create a new uploaded document
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes,
        }
    }

    /// Whether this upload is a PDF
    ///
    /// Decided by the declared media type (parameters ignored, case
    /// insensitive). Without a media type the `.pdf` extension decides.
    pub fn is_pdf(&self) -> bool {
        match &self.content_type {
            Some(content_type) => {
                let essence = content_type.split(';').next().unwrap_or_default().trim();
                essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE)
            }
            None => self
                .name
                .rsplit_once('.')
                .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf")),
        }
    }
}

/// One document with its index-aligned company name and reference URL
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// The uploaded file
    pub document: UploadedDocument,
    /// Company the document belongs to
    pub company_name: String,
    /// Company website
    pub reference_url: String,
}

impl BatchItem {
    fn into_request(self) -> ScoringRequest {
        ScoringRequest::new(self.company_name, self.reference_url, self.document.bytes)
            .with_document_name(self.document.name)
    }
}

/// Pair documents with their company names and URLs by position
///
/// Fails with `BatchInputMismatch` unless all three lists have the same
/// length.
pub fn zip_batch_inputs(
    documents: Vec<UploadedDocument>,
    company_names: Vec<String>,
    reference_urls: Vec<String>,
) -> Result<Vec<BatchItem>, ScorerError> {
    if documents.len() != company_names.len() || documents.len() != reference_urls.len() {
        return Err(ScorerError::BatchInputMismatch {
            documents: documents.len(),
            company_names: company_names.len(),
            reference_urls: reference_urls.len(),
        });
    }

    Ok(documents
        .into_iter()
        .zip(company_names)
        .zip(reference_urls)
        .map(|((document, company_name), reference_url)| BatchItem {
            document,
            company_name,
            reference_url,
        })
        .collect())
}

/// Runs many document pipelines concurrently
pub struct BatchCoordinator<G, X> {
    pipeline: DocumentPipeline<G, X>,
    permits: Arc<Semaphore>,
}

impl<G, X> Clone for BatchCoordinator<G, X> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            permits: Arc::clone(&self.permits),
        }
    }
}

impl<G, X> BatchCoordinator<G, X>
where
    G: GenerationProvider + Send + Sync + 'static,
    G::Error: Display,
    X: DocumentTextSource + Send + Sync + 'static,
    X::Error: Display,
{
    /// Create a coordinator from a validated configuration
    ///
    /// Fails if the configuration is invalid or the rubric template cannot
    /// be loaded.
    pub fn new(provider: Arc<G>, source: X, config: &ScoringConfig) -> Result<Self, ScorerError> {
        config.validate().map_err(ScorerError::Config)?;
        let template = config.load_rubric_template()?;
        let prompt = PromptBuilder::new(template, config.max_report_chars)?;

        let pipeline = DocumentPipeline::new(
            TextExtractor::new(source),
            FallbackInvoker::from_config(provider, config),
            prompt,
        );
        Ok(Self::from_parts(pipeline, config.max_concurrent_documents))
    }

    /// Create a coordinator around an existing pipeline
    pub fn from_parts(pipeline: DocumentPipeline<G, X>, max_concurrent_documents: usize) -> Self {
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent_documents.max(1))),
        }
    }

    /// Score a batch of uploads
    ///
    /// Non-PDF uploads are dropped with a warning. Fails with `EmptyBatch`
    /// when nothing is left to score.
    pub async fn run_batch(&self, items: Vec<BatchItem>) -> Result<Vec<ScoringResult>, ScorerError> {
        let total = items.len();
        let requests: Vec<ScoringRequest> = items
            .into_iter()
            .filter(|item| {
                let keep = item.document.is_pdf();
                if !keep {
                    warn!(
                        "Skipping '{}' for {}: not a PDF ({})",
                        item.document.name,
                        item.company_name,
                        item.document.content_type.as_deref().unwrap_or("no media type")
                    );
                }
                keep
            })
            .map(BatchItem::into_request)
            .collect();

        if requests.is_empty() {
            return Err(ScorerError::EmptyBatch);
        }
        if requests.len() < total {
            info!("Scoring {} of {} uploaded documents", requests.len(), total);
        }

        Ok(self.score_requests(requests).await)
    }

    /// Score requests concurrently, returning results in input order
    ///
    /// Dropping the returned future aborts every document still in flight.
    pub async fn score_requests(&self, requests: Vec<ScoringRequest>) -> Vec<ScoringResult> {
        let batch_id = BatchId::new();
        let span = info_span!("batch", id = %batch_id, documents = requests.len());

        async {
            info!("Batch started");

            let company_names: Vec<String> =
                requests.iter().map(|r| r.company_name.clone()).collect();
            let mut tasks = JoinSet::new();
            for (index, request) in requests.into_iter().enumerate() {
                let span = info_span!("document", index, company = %request.company_name);
                let pipeline = self.pipeline.clone();
                let permits = Arc::clone(&self.permits);
                tasks.spawn(
                    async move {
                        let _permit = permits.acquire_owned().await.ok();
                        (index, pipeline.run(request).await)
                    }
                    .instrument(span),
                );
            }

            let mut slots: Vec<Option<ScoringResult>> = vec![None; company_names.len()];
            let mut last_failure = None;
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, result)) => slots[index] = Some(result),
                    Err(e) => {
                        let error = ScorerError::Worker(e.to_string());
                        warn!("Document task failed: {}", error);
                        last_failure = Some(error);
                    }
                }
            }

            // A slot left empty belongs to a task that panicked or was cancelled
            let results: Vec<ScoringResult> = slots
                .into_iter()
                .zip(company_names)
                .map(|(slot, company_name)| {
                    slot.unwrap_or_else(|| {
                        let reason = last_failure
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "task did not complete".to_string());
                        ScoringResult::degraded(company_name, format!("Scoring failed: {}", reason))
                    })
                })
                .collect();

            let degraded = results.iter().filter(|r| r.is_degraded()).count();
            info!("Batch finished: {} scored, {} degraded", results.len() - degraded, degraded);
            results
        }
        .instrument(span)
        .await
    }
}
