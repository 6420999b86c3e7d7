//! Externally visible scoring output

use crate::score::{BreakdownItem, Facets, ScoreDocument};
use serde::{Deserialize, Serialize};

/// Weighted totals; each field is `None` when it could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalsScore {
    /// Report contribution, out of 60
    pub report: Option<f64>,

    /// Media contribution, out of 40
    pub media: Option<f64>,

    /// Composite score, out of 100
    #[serde(rename = "final")]
    pub final_score: Option<f64>,
}

impl TotalsScore {
    /// Totals with every field absent
    pub fn unavailable() -> Self {
        Self {
            report: None,
            media: None,
            final_score: None,
        }
    }

    /// Whether every field was computed
    pub fn is_complete(&self) -> bool {
        self.report.is_some() && self.media.is_some() && self.final_score.is_some()
    }
}

/// Per-document scoring result
///
/// Always produced, even when scoring failed: a degraded result has
/// `totals = None` and an `overview_comment` explaining the failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Company the document belongs to
    pub company: String,

    /// Overall verdict, or the failure description for degraded results
    pub overview_comment: Option<String>,

    /// Strengths per facet
    #[serde(default)]
    pub strengths: Facets,

    /// Improvement suggestions per facet
    #[serde(default)]
    pub improvements: Facets,

    /// Breakdown items as scored by the model
    #[serde(default)]
    pub breakdown: Vec<BreakdownItem>,

    /// Weighted totals
    pub totals: Option<TotalsScore>,
}

impl ScoringResult {
    /// Build a fully scored result from a validated document
    pub fn scored(company: impl Into<String>, document: ScoreDocument, totals: TotalsScore) -> Self {
        Self {
            company: company.into(),
            overview_comment: document.overview_comment,
            strengths: document.strengths,
            improvements: document.improvements,
            breakdown: document.breakdown,
            totals: Some(totals),
        }
    }

    /// Keep the model's assessment but report totals as unavailable
    ///
    /// `comment` replaces the model's overview and explains why no totals
    /// were computed.
    pub fn unscored(
        company: impl Into<String>,
        document: ScoreDocument,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            overview_comment: Some(comment.into()),
            strengths: document.strengths,
            improvements: document.improvements,
            breakdown: document.breakdown,
            totals: None,
        }
    }

    /// Build a degraded result carrying only an explanation
    pub fn degraded(company: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            overview_comment: Some(comment.into()),
            strengths: Facets::new(),
            improvements: Facets::new(),
            breakdown: Vec::new(),
            totals: None,
        }
    }

    /// Whether this result lacks totals
    pub fn is_degraded(&self) -> bool {
        self.totals.is_none()
    }
}
