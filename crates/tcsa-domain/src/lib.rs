//! TCSA Domain Layer
//!
//! Core domain model for scoring sustainability reports against the TCSA
//! rubric. This crate performs no I/O: it defines the score tree produced by
//! the generation service, the externally visible scoring result, the
//! capability traits the engine consumes, and the weighted aggregation rules.
//!
//! ## Key Concepts
//!
//! - **Rubric**: breakdown → section → criterion → sub-criterion
//! - **Score tree**: a model's structured answer, validated for shape only
//! - **Totals**: the 60/40 weighted composite of the `report` and `media` items
//! - **Degraded result**: a well-formed result with `totals = null`
//!
//! ## Architecture
//!
//! - Pure business logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external capabilities

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregation;
pub mod batch;
pub mod request;
pub mod result;
pub mod score;
pub mod traits;

// Re-exports for convenience
pub use aggregation::{aggregate, try_aggregate, AggregationError, RawTotals};
pub use batch::BatchId;
pub use request::ScoringRequest;
pub use result::{ScoringResult, TotalsScore};
pub use score::{
    BreakdownId, BreakdownItem, CriterionScore, Facets, ScoreDocument, SectionScore,
    SubCriterionScore,
};
