//! Weighted aggregation of a score tree into totals
//!
//! The report item is summed over its sections, the media item over the
//! criteria one level below its sections. The report is scaled to 60 points
//! and the media item to 40. Both depths and weights are fixed by the rubric.

use crate::result::TotalsScore;
use crate::score::{BreakdownId, ScoreDocument};
use std::fmt;

/// Points awarded for a perfect report
pub const REPORT_WEIGHT: f64 = 60.0;

/// Points awarded for a perfect media presence
pub const MEDIA_WEIGHT: f64 = 40.0;

/// Reason totals could not be computed
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationError {
    /// A required breakdown item is missing
    MissingItem(BreakdownId),
    /// A sum or scaled value is not a finite number
    NonFinite(&'static str),
}

impl fmt::Display for AggregationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationError::MissingItem(id) => write!(f, "breakdown item '{}' is missing", id),
            AggregationError::NonFinite(what) => write!(f, "{} is not a finite number", what),
        }
    }
}

impl std::error::Error for AggregationError {}

/// Independently recomputed raw sums
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTotals {
    /// Sum of report section scores (absent counts as 0)
    pub report_raw: f64,
    /// Sum of report section maxima
    pub report_max: f64,
    /// Sum of media criterion scores (absent counts as 0)
    pub media_raw: f64,
    /// Sum of media criterion maxima
    pub media_max: f64,
}

impl RawTotals {
    /// Recompute the raw sums from a score tree
    pub fn from_document(doc: &ScoreDocument) -> Result<Self, AggregationError> {
        let report = doc
            .item(BreakdownId::Report)
            .ok_or(AggregationError::MissingItem(BreakdownId::Report))?;
        let media = doc
            .item(BreakdownId::Media)
            .ok_or(AggregationError::MissingItem(BreakdownId::Media))?;

        let report_raw: f64 = report.sections.iter().map(|s| s.score.unwrap_or(0.0)).sum();
        let report_max: f64 = report.sections.iter().map(|s| s.max_score).sum();

        let media_criteria = || media.sections.iter().flat_map(|s| s.criteria.iter());
        let media_raw: f64 = media_criteria().map(|c| c.score.unwrap_or(0.0)).sum();
        let media_max: f64 = media_criteria().map(|c| c.max_score).sum();

        Ok(Self {
            report_raw,
            report_max,
            media_raw,
            media_max,
        })
    }

    /// Scale the raw sums into weighted totals
    pub fn scale(&self) -> Result<TotalsScore, AggregationError> {
        let report = scaled(self.report_raw, self.report_max, REPORT_WEIGHT, "report score")?;
        let media = scaled(self.media_raw, self.media_max, MEDIA_WEIGHT, "media score")?;
        let final_score = finite(report + media, "final score")?;

        Ok(TotalsScore {
            report: Some(round2(report)),
            media: Some(round2(media)),
            final_score: Some(round2(final_score)),
        })
    }
}

fn scaled(raw: f64, max: f64, weight: f64, what: &'static str) -> Result<f64, AggregationError> {
    finite(raw, what)?;
    finite(max, what)?;
    if max > 0.0 {
        finite(raw / max * weight, what)
    } else {
        Ok(0.0)
    }
}

fn finite(value: f64, what: &'static str) -> Result<f64, AggregationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AggregationError::NonFinite(what))
    }
}

/// Round half away from zero to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute totals, reporting why they could not be computed
pub fn try_aggregate(doc: &ScoreDocument) -> Result<TotalsScore, AggregationError> {
    RawTotals::from_document(doc)?.scale()
}

/// Compute totals, yielding all-null totals on failure
pub fn aggregate(doc: &ScoreDocument) -> TotalsScore {
    try_aggregate(doc).unwrap_or_else(|_| TotalsScore::unavailable())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn has_two_decimals(value: f64) -> bool {
        let cents = value * 100.0;
        (cents - cents.round()).abs() <= 1e-6 * cents.abs().max(1.0)
    }

    proptest! {
        /// Property: every total has at most two decimal places
        #[test]
        fn test_totals_rounded(
            report_raw in 0.0f64..1000.0,
            report_max in 1.0f64..1000.0,
            media_raw in 0.0f64..1000.0,
            media_max in 1.0f64..1000.0,
        ) {
            let raw = RawTotals { report_raw, report_max, media_raw, media_max };
            let totals = raw.scale().unwrap();
            for value in [totals.report, totals.media, totals.final_score] {
                let value = value.unwrap();
                prop_assert!(has_two_decimals(value), "{} has more than two decimals", value);
            }
        }

        /// Property: a zero maximum always scales to zero
        #[test]
        fn test_zero_max_scales_to_zero(report_raw in -1000.0f64..1000.0) {
            let raw = RawTotals { report_raw, report_max: 0.0, media_raw: 0.0, media_max: 0.0 };
            let totals = raw.scale().unwrap();
            prop_assert_eq!(totals.report, Some(0.0));
            prop_assert_eq!(totals.final_score, Some(0.0));
        }

        /// Property: scores within their maxima stay within the weights
        #[test]
        fn test_bounded_by_weights(
            report_fraction in 0.0f64..=1.0,
            media_fraction in 0.0f64..=1.0,
            report_max in 0.5f64..200.0,
            media_max in 0.5f64..200.0,
        ) {
            let raw = RawTotals {
                report_raw: report_fraction * report_max,
                report_max,
                media_raw: media_fraction * media_max,
                media_max,
            };
            let totals = raw.scale().unwrap();
            prop_assert!(totals.report.unwrap() <= REPORT_WEIGHT);
            prop_assert!(totals.media.unwrap() <= MEDIA_WEIGHT);
            prop_assert!(totals.final_score.unwrap() <= REPORT_WEIGHT + MEDIA_WEIGHT);
        }
    }
}
