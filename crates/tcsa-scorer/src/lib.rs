//! TCSA Scorer
//!
//! Scores sustainability reports against the TCSA rubric using a generation
//! service, with ordered model fallback and concurrent batch processing.
//!
//! # Architecture
//!
//! ```text
//! PDF bytes → TextExtractor → PromptBuilder → FallbackInvoker → normalize → aggregate
//!                         (one DocumentPipeline per document)
//! BatchCoordinator: N pipelines, bounded concurrency, input order preserved
//! ```
//!
//! # Failure model
//!
//! A `DocumentPipeline` never fails: unreadable documents, exhausted model
//! chains and aggregation faults all produce a degraded `ScoringResult`
//! with `totals = None`. Only malformed batch input is rejected outright.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tcsa_llm::MockProvider;
//! use tcsa_scorer::{zip_batch_inputs, BatchCoordinator, PdfTextSource, ScoringConfig, UploadedDocument};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScoringConfig::new(vec!["gemini-1.5-flash-latest".to_string()], 120);
//! let coordinator = BatchCoordinator::new(Arc::new(MockProvider::default()), PdfTextSource, &config)?;
//!
//! let pdf = std::fs::read("report.pdf")?;
//! let items = zip_batch_inputs(
//!     vec![UploadedDocument::new("report.pdf", Some("application/pdf".to_string()), pdf)],
//!     vec!["Acme Corp".to_string()],
//!     vec!["https://acme.example".to_string()],
//! )?;
//!
//! for result in coordinator.run_batch(items).await? {
//!     println!("{}: {:?}", result.company, result.totals);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod batch;
mod config;
mod error;
mod extraction;
mod invoker;
mod parser;
mod pdf;
mod pipeline;
mod prompt;


pub use batch::{zip_batch_inputs, BatchCoordinator, BatchItem, UploadedDocument};
pub use config::{ScoringConfig, DEFAULT_MAX_REPORT_CHARS};
pub use error::ScorerError;
pub use extraction::{normalize_whitespace, ExtractionOutcome, TextExtractor};
pub use invoker::{FallbackInvoker, FallbackState, Invocation};
pub use parser::{consistency_warnings, normalize};
pub use pdf::{PdfTextSource, PDF_MEDIA_TYPE};
pub use pipeline::DocumentPipeline;
pub use prompt::{truncate_chars, PromptBuilder, DEFAULT_RUBRIC_TEMPLATE};
