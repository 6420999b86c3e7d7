//! Per-document scoring pipeline
//!
//! extract → prompt → fallback invocation → aggregation. `run` never fails:
//! every fault becomes a degraded result naming the failed stage.

use crate::extraction::{ExtractionOutcome, TextExtractor};
use crate::invoker::FallbackInvoker;
use crate::parser::consistency_warnings;
use crate::prompt::PromptBuilder;
use std::fmt::Display;
use tcsa_domain::traits::{DocumentTextSource, GenerationProvider};
use tcsa_domain::{
    try_aggregate, BreakdownId, RawTotals, ScoreDocument, ScoringRequest, ScoringResult,
};
use tracing::{debug, error, info, warn};

/// Scores a single document end to end
pub struct DocumentPipeline<G, X> {
    extractor: TextExtractor<X>,
    invoker: FallbackInvoker<G>,
    prompt: PromptBuilder,
}

impl<G, X> Clone for DocumentPipeline<G, X> {
    fn clone(&self) -> Self {
        Self {
            extractor: self.extractor.clone(),
            invoker: self.invoker.clone(),
            prompt: self.prompt.clone(),
        }
    }
}

impl<G, X> DocumentPipeline<G, X>
where
    G: GenerationProvider + Send + Sync,
    G::Error: Display,
    X: DocumentTextSource + Send + Sync + 'static,
    X::Error: Display,
{
    /// Create a new pipeline
    pub fn new(extractor: TextExtractor<X>, invoker: FallbackInvoker<G>, prompt: PromptBuilder) -> Self {
        Self {
            extractor,
            invoker,
            prompt,
        }
    }

    /// Score one document
    ///
    /// The result always carries the caller's company name, whatever the
    /// model wrote in its own `company` field.
    pub async fn run(&self, request: ScoringRequest) -> ScoringResult {
        let ScoringRequest {
            company_name,
            reference_url,
            document_bytes,
            document_name,
        } = request;

        info!("Scoring '{}' for {}", document_name, company_name);

        let text = match self.extractor.extract_blocking(document_bytes).await {
            ExtractionOutcome::Text(text) => text,
            ExtractionOutcome::Failure(reason) => {
                error!("Could not read '{}': {}", document_name, reason);
                return ScoringResult::degraded(
                    company_name,
                    format!("Could not read document '{}': {}", document_name, reason),
                );
            }
        };

        let prompt = self.prompt.build(&company_name, &reference_url, &text);
        debug!("Prompt length: {} chars", prompt.len());

        let invocation = match self.invoker.invoke(&prompt).await {
            Ok(invocation) => invocation,
            Err(e) => {
                error!("AI analysis failed for {}: {}", company_name, e);
                return ScoringResult::degraded(company_name, format!("AI analysis failed: {}", e));
            }
        };

        let document = invocation.document;
        for warning in consistency_warnings(&document) {
            warn!("Inconsistent score from {}: {}", invocation.model_id, warning);
        }
        log_declared_drift(&document);

        match try_aggregate(&document) {
            Ok(totals) => {
                info!(
                    "Scored {} with {}: final {:?}",
                    company_name, invocation.model_id, totals.final_score
                );
                ScoringResult::scored(company_name, document, totals)
            }
            Err(e) => {
                error!("Could not compute totals for {}: {}", company_name, e);
                ScoringResult::unscored(company_name, document, format!("Score aggregation failed: {}", e))
            }
        }
    }
}

/// Compare the model's declared raw sums against the recomputed ones
fn log_declared_drift(document: &ScoreDocument) {
    const EPSILON: f64 = 1e-6;
    let Ok(recomputed) = RawTotals::from_document(document) else {
        return;
    };

    for (id, raw, max) in [
        (BreakdownId::Report, recomputed.report_raw, recomputed.report_max),
        (BreakdownId::Media, recomputed.media_raw, recomputed.media_max),
    ] {
        let Some(item) = document.item(id) else {
            continue;
        };
        if let Some(declared) = item.raw_score {
            if (declared - raw).abs() > EPSILON {
                debug!("{} raw_score {} differs from recomputed {}", id, declared, raw);
            }
        }
        if let Some(declared) = item.raw_max_score {
            if (declared - max).abs() > EPSILON {
                debug!("{} raw_max_score {} differs from recomputed {}", id, declared, max);
            }
        }
    }
}
