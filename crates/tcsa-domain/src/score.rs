//! Score tree returned by the generation service
//!
//! Scores are `Option<f64>` at every level: an absent score means "not
//! scored", which is distinct from a score of zero. Nothing in this module
//! defaults or rewrites a score.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Facet name (e.g. "Completeness") mapped to a list of remarks
pub type Facets = BTreeMap<String, Vec<String>>;

/// Identifier of a top-level breakdown item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownId {
    /// The written sustainability report
    Report,
    /// The company's multimedia / web presence
    Media,
}

impl BreakdownId {
    /// Wire identifier of this item
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakdownId::Report => "report",
            BreakdownId::Media => "media",
        }
    }

    /// Parse a wire identifier
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "report" => Some(BreakdownId::Report),
            "media" => Some(BreakdownId::Media),
            _ => None,
        }
    }
}

impl fmt::Display for BreakdownId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf of the rubric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCriterionScore {
    /// Rubric item text
    pub title: String,

    /// Maximum attainable score
    pub max_score: f64,

    /// Awarded score, absent when not scored
    #[serde(default)]
    pub score: Option<f64>,

    /// Model's justification for the score
    #[serde(default)]
    pub rationale: Option<String>,
}

/// Criterion, made of sub-criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    /// Criterion title
    pub title: String,

    /// Maximum attainable score
    pub max_score: f64,

    /// Awarded score, expected to equal the sum of the sub-criteria
    #[serde(default)]
    pub score: Option<f64>,

    /// Ordered sub-criteria
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_criteria: Vec<SubCriterionScore>,
}

/// Section (facet) of a breakdown item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    /// Section title
    pub title: String,

    /// Maximum attainable score
    pub max_score: f64,

    /// Awarded score, expected to equal the sum of the criteria
    #[serde(default)]
    pub score: Option<f64>,

    /// Model commentary for the section
    #[serde(default)]
    pub ai_comment: Option<String>,

    /// Ordered criteria
    #[serde(default, deserialize_with = "null_as_default")]
    pub criteria: Vec<CriterionScore>,
}

/// Top-level breakdown item (`report` or `media`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownItem {
    /// Item identifier
    pub id: BreakdownId,

    /// Raw score as declared by the model
    #[serde(default)]
    pub raw_score: Option<f64>,

    /// Raw maximum as declared by the model
    #[serde(default)]
    pub raw_max_score: Option<f64>,

    /// Model commentary for the whole item
    #[serde(default)]
    pub ai_comment: Option<String>,

    /// Ordered sections
    pub sections: Vec<SectionScore>,
}

impl CriterionScore {
    /// Sum of the sub-criteria scores, `None` if any is absent or there are none
    pub fn sub_criteria_sum(&self) -> Option<f64> {
        sum_present(self.sub_criteria.iter().map(|s| s.score))
    }
}

impl SectionScore {
    /// Sum of the criteria scores, `None` if any is absent or there are none
    pub fn criteria_sum(&self) -> Option<f64> {
        sum_present(self.criteria.iter().map(|c| c.score))
    }
}

fn sum_present(scores: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let mut total = 0.0;
    let mut seen = false;
    for score in scores {
        total += score?;
        seen = true;
    }
    seen.then_some(total)
}

/// Full structured answer from the generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDocument {
    /// Company name as echoed by the model
    #[serde(default)]
    pub company: Option<String>,

    /// One-line overall verdict
    #[serde(default)]
    pub overview_comment: Option<String>,

    /// Strengths per facet
    #[serde(default, deserialize_with = "null_as_default")]
    pub strengths: Facets,

    /// Improvement suggestions per facet
    #[serde(default, deserialize_with = "null_as_default")]
    pub improvements: Facets,

    /// Breakdown items
    pub breakdown: Vec<BreakdownItem>,
}

impl ScoreDocument {
    /// Find a breakdown item by identifier
    pub fn item(&self, id: BreakdownId) -> Option<&BreakdownItem> {
        self.breakdown.iter().find(|item| item.id == id)
    }
}

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
