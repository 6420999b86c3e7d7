//! Validate and normalize model output into a score tree
//!
//! Only the shape is checked. Scores are never altered or defaulted: an
//! absent score stays absent so aggregation can tell "not scored" from zero.

use crate::error::ScorerError;
use serde_json::Value;
use std::collections::HashSet;
use tcsa_domain::{BreakdownId, ScoreDocument};

/// Parse a model response into a validated score tree
pub fn normalize(response: &str) -> Result<ScoreDocument, ScorerError> {
    let json_str = extract_json(response);
    if json_str.is_empty() {
        return Err(ScorerError::Parse("empty response".to_string()));
    }

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| ScorerError::Parse(format!("JSON parse error: {}", e)))?;

    check_shape(&json)?;

    serde_json::from_value(json)
        .map_err(|e| ScorerError::Parse(format!("score tree does not match the rubric shape: {}", e)))
}

/// Strip markdown code fences the model may have wrapped the JSON in
///
/// A response that already starts with `{` is taken as-is, so backticks
/// quoted inside string values are never mistaken for a fence.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }

    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    // Skip the fence and an optional language tag such as `json`
    let body = &trimmed[open + 3..];
    let body = body.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let body = match body.rfind("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

/// Require exactly one `report` and one `media` item, each with sections
fn check_shape(json: &Value) -> Result<(), ScorerError> {
    let root = json
        .as_object()
        .ok_or_else(|| ScorerError::Parse("expected a JSON object".to_string()))?;

    let breakdown = root
        .get("breakdown")
        .and_then(Value::as_array)
        .ok_or_else(|| ScorerError::Parse("missing or invalid 'breakdown' array".to_string()))?;

    let mut seen = HashSet::new();
    for (idx, item) in breakdown.iter().enumerate() {
        let id_str = item
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ScorerError::Parse(format!("breakdown[{}] has no string 'id'", idx)))?;

        let id = BreakdownId::parse(id_str).ok_or_else(|| {
            ScorerError::Parse(format!("unexpected breakdown id '{}'", id_str))
        })?;

        if !seen.insert(id) {
            return Err(ScorerError::Parse(format!("duplicate breakdown id '{}'", id)));
        }

        if !item.get("sections").is_some_and(Value::is_array) {
            return Err(ScorerError::Parse(format!(
                "breakdown item '{}' has no 'sections' array",
                id
            )));
        }
    }

    for id in [BreakdownId::Report, BreakdownId::Media] {
        if !seen.contains(&id) {
            return Err(ScorerError::Parse(format!("missing breakdown item '{}'", id)));
        }
    }

    Ok(())
}

/// Describe places where the model's sums or ranges disagree with the rubric
///
/// These are reported, not corrected.
pub fn consistency_warnings(doc: &ScoreDocument) -> Vec<String> {
    const EPSILON: f64 = 1e-6;
    let mut warnings = Vec::new();

    for item in &doc.breakdown {
        for section in &item.sections {
            if let (Some(score), Some(sum)) = (section.score, section.criteria_sum()) {
                if (score - sum).abs() > EPSILON {
                    warnings.push(format!(
                        "{}/{}: section score {} != criteria sum {}",
                        item.id, section.title, score, sum
                    ));
                }
            }
            for criterion in &section.criteria {
                if let (Some(score), Some(sum)) = (criterion.score, criterion.sub_criteria_sum()) {
                    if (score - sum).abs() > EPSILON {
                        warnings.push(format!(
                            "{}/{}/{}: criterion score {} != sub-criteria sum {}",
                            item.id, section.title, criterion.title, score, sum
                        ));
                    }
                }
                for sub in &criterion.sub_criteria {
                    if let Some(score) = sub.score {
                        if score < 0.0 || score > sub.max_score + EPSILON {
                            warnings.push(format!(
                                "{}/{}/{}: score {} outside [0, {}]",
                                item.id, criterion.title, sub.title, score, sub.max_score
                            ));
                        }
                    }
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "company": "Acme",
        "overview_comment": "Solid report.",
        "strengths": {"Completeness": ["Clear materiality matrix"]},
        "improvements": {},
        "breakdown": [
            {
                "id": "report",
                "raw_score": 30.5,
                "raw_max_score": 100,
                "sections": [
                    {
                        "title": "Completeness", "max_score": 40, "score": 3.5,
                        "criteria": [
                            {
                                "title": "Material topics", "max_score": 8, "score": 3.5,
                                "sub_criteria": [
                                    {"title": "Matrix", "max_score": 2, "score": 2},
                                    {"title": "Process", "max_score": 2, "score": 1.5, "rationale": "Partly described"}
                                ]
                            }
                        ]
                    }
                ]
            },
            {
                "id": "media",
                "sections": [
                    {
                        "title": "Multimedia", "max_score": 19,
                        "criteria": [{"title": "Web section", "max_score": 3}]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_normalize_valid_document() {
        let doc = normalize(VALID).unwrap();
        assert_eq!(doc.breakdown.len(), 2);
        assert_eq!(doc.strengths["Completeness"], vec!["Clear materiality matrix"]);

        let report = doc.item(BreakdownId::Report).unwrap();
        assert_eq!(report.raw_score, Some(30.5));
        let criterion = &report.sections[0].criteria[0];
        assert_eq!(criterion.score, Some(3.5));
        assert_eq!(criterion.sub_criteria[1].rationale.as_deref(), Some("Partly described"));
    }

    #[test]
    fn test_scores_preserved_and_absent_kept_absent() {
        let doc = normalize(VALID).unwrap();
        let report = doc.item(BreakdownId::Report).unwrap();
        let criterion = &report.sections[0].criteria[0];
        assert_eq!(criterion.sub_criteria_sum(), criterion.score);
        assert_eq!(report.sections[0].criteria_sum(), report.sections[0].score);

        let media = doc.item(BreakdownId::Media).unwrap();
        assert_eq!(media.raw_score, None);
        assert_eq!(media.sections[0].score, None);
        assert_eq!(media.sections[0].criteria[0].score, None);
    }

    #[test]
    fn test_normalize_fenced_json() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert!(normalize(&fenced).is_ok());

        let bare_fence = format!("```\n{}\n```", VALID);
        assert!(normalize(&bare_fence).is_ok());
    }

    #[test]
    fn test_normalize_fence_after_prose() {
        let wrapped = format!("Here is the assessment:\n```json\n{}\n```\nThanks.", VALID);
        assert!(normalize(&wrapped).is_ok());
    }

    #[test]
    fn test_reject_non_json() {
        assert!(matches!(normalize("This is not JSON"), Err(ScorerError::Parse(_))));
        assert!(matches!(normalize("   "), Err(ScorerError::Parse(_))));
    }

    #[test]
    fn test_reject_non_object() {
        assert!(matches!(normalize("[1, 2]"), Err(ScorerError::Parse(_))));
    }

    #[test]
    fn test_reject_missing_breakdown() {
        let err = normalize(r#"{"company": "Acme"}"#).unwrap_err();
        assert!(err.to_string().contains("breakdown"));
    }

    #[test]
    fn test_reject_missing_media_item() {
        let json = r#"{"breakdown": [{"id": "report", "sections": []}]}"#;
        let err = normalize(json).unwrap_err();
        assert!(err.to_string().contains("media"));
    }

    #[test]
    fn test_reject_unknown_item() {
        let json = r#"{"breakdown": [
            {"id": "report", "sections": []},
            {"id": "media", "sections": []},
            {"id": "video", "sections": []}
        ]}"#;
        let err = normalize(json).unwrap_err();
        assert!(err.to_string().contains("video"));
    }

    #[test]
    fn test_reject_duplicate_item() {
        let json = r#"{"breakdown": [
            {"id": "report", "sections": []},
            {"id": "report", "sections": []},
            {"id": "media", "sections": []}
        ]}"#;
        let err = normalize(json).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_reject_missing_sections() {
        let json = r#"{"breakdown": [{"id": "report"}, {"id": "media", "sections": []}]}"#;
        let err = normalize(json).unwrap_err();
        assert!(err.to_string().contains("sections"));
    }

    #[test]
    fn test_reject_wrong_score_type() {
        let json = r#"{"breakdown": [
            {"id": "report", "sections": [{"title": "Completeness", "max_score": 40, "score": "high"}]},
            {"id": "media", "sections": []}
        ]}"#;
        assert!(matches!(normalize(json), Err(ScorerError::Parse(_))));
    }

    #[test]
    fn test_item_order_is_free() {
        let json = r#"{"breakdown": [{"id": "media", "sections": []}, {"id": "report", "sections": []}]}"#;
        let doc = normalize(json).unwrap();
        assert_eq!(doc.breakdown[0].id, BreakdownId::Media);
    }

    #[test]
    fn test_consistency_warnings() {
        let json = r#"{"breakdown": [
            {"id": "report", "sections": [
                {"title": "Completeness", "max_score": 40, "score": 10,
                 "criteria": [
                    {"title": "Material topics", "max_score": 8, "score": 5,
                     "sub_criteria": [
                        {"title": "Matrix", "max_score": 2, "score": 3},
                        {"title": "Process", "max_score": 2, "score": 1}
                     ]}
                 ]}
            ]},
            {"id": "media", "sections": []}
        ]}"#;
        let doc = normalize(json).unwrap();
        let warnings = consistency_warnings(&doc);
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("section score")));
        assert!(warnings.iter().any(|w| w.contains("sub-criteria sum")));
        assert!(warnings.iter().any(|w| w.contains("outside")));
    }

    #[test]
    fn test_consistent_document_has_no_warnings() {
        let doc = normalize(VALID).unwrap();
        assert!(consistency_warnings(&doc).is_empty());
    }

    #[test]
    fn test_backticks_inside_string_values() {
        let json = r#"{"overview_comment": "uses ```code``` blocks", "breakdown": [
            {"id": "report", "sections": []},
            {"id": "media", "sections": []}
        ]}"#;
        let doc = normalize(json).unwrap();
        assert_eq!(doc.overview_comment.as_deref(), Some("uses ```code``` blocks"));

        let fenced = format!("```json\n{}\n```", json);
        let doc = normalize(&fenced).unwrap();
        assert_eq!(doc.overview_comment.as_deref(), Some("uses ```code``` blocks"));
    }

    #[test]
    fn test_extract_json_plain() {
        let json = r#"{"key": "value"}"#;
        assert_eq!(extract_json(json), json);
    }
}
