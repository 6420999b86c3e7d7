//! Configuration for the scoring engine

use crate::error::ScorerError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Default extracted-text budget inserted into the prompt (characters)
pub const DEFAULT_MAX_REPORT_CHARS: usize = 15_000;

/// Configuration for the scoring engine
///
/// `attempt_timeout_secs` has no default: the right bound depends on the
/// deployment and the models in the chain, so it must be set explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Fallback chain, preferred model first
    pub model_ids: Vec<String>,

    /// Maximum time for a single generation attempt (seconds)
    pub attempt_timeout_secs: u64,

    /// Maximum characters of extracted text inserted into the prompt
    #[serde(default = "default_max_report_chars")]
    pub max_report_chars: usize,

    /// Maximum documents scored at the same time
    #[serde(default = "default_max_concurrent_documents")]
    pub max_concurrent_documents: usize,

    /// Rubric template replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric_template_path: Option<PathBuf>,
}

fn default_max_report_chars() -> usize {
    DEFAULT_MAX_REPORT_CHARS
}

/// Two workers per available core: pipelines mostly wait on the network
fn default_max_concurrent_documents() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(4)
        .max(2)
}

impl ScoringConfig {
    /// Create a configuration with default limits
    pub fn new(model_ids: Vec<String>, attempt_timeout_secs: u64) -> Self {
        Self {
            model_ids,
            attempt_timeout_secs,
            max_report_chars: default_max_report_chars(),
            max_concurrent_documents: default_max_concurrent_documents(),
            rubric_template_path: None,
        }
    }

    /// Get the attempt timeout as a Duration
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model_ids.is_empty() {
            return Err("model_ids must list at least one model".to_string());
        }
        if self.model_ids.iter().any(|id| id.trim().is_empty()) {
            return Err("model_ids must not contain blank entries".to_string());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.model_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(format!("model_ids lists '{}' more than once", dup));
        }
        if self.attempt_timeout_secs == 0 {
            return Err("attempt_timeout_secs must be greater than 0".to_string());
        }
        if self.max_report_chars == 0 {
            return Err("max_report_chars must be greater than 0".to_string());
        }
        if self.max_concurrent_documents == 0 {
            return Err("max_concurrent_documents must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Read the rubric template, falling back to the built-in one
    pub fn load_rubric_template(&self) -> Result<String, ScorerError> {
        match &self.rubric_template_path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                ScorerError::Config(format!(
                    "Failed to read rubric template {}: {}",
                    path.display(),
                    e
                ))
            }),
            None => Ok(crate::prompt::DEFAULT_RUBRIC_TEMPLATE.to_string()),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> ScoringConfig {
        ScoringConfig::new(
            vec!["gemini-1.5-flash-latest".to_string(), "gemini-1.5-pro-latest".to_string()],
            90,
        )
    }

    #[test]
    fn test_new_config_is_valid() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_report_chars, DEFAULT_MAX_REPORT_CHARS);
        assert!(config.max_concurrent_documents >= 2);
        assert_eq!(config.attempt_timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_empty_model_chain() {
        let mut config = config();
        config.model_ids.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_model_id() {
        let mut config = config();
        config.model_ids.push("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_model_id() {
        let mut config = config();
        config.model_ids.push("gemini-1.5-flash-latest".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.contains("gemini-1.5-flash-latest"));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = config();
        config.attempt_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_is_required() {
        let toml = r#"model_ids = ["gemini-1.5-flash-latest"]"#;
        let err = ScoringConfig::from_toml(toml).unwrap_err();
        assert!(err.contains("attempt_timeout_secs"));
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let toml = r#"
            model_ids = ["flash", "pro"]
            attempt_timeout_secs = 45
        "#;
        let config = ScoringConfig::from_toml(toml).unwrap();
        assert_eq!(config.model_ids, vec!["flash", "pro"]);
        assert_eq!(config.attempt_timeout_secs, 45);
        assert_eq!(config.max_report_chars, DEFAULT_MAX_REPORT_CHARS);
        assert!(config.rubric_template_path.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = config();
        let toml_str = config.to_toml().unwrap();
        let parsed = ScoringConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.model_ids, parsed.model_ids);
        assert_eq!(config.attempt_timeout_secs, parsed.attempt_timeout_secs);
        assert_eq!(config.max_concurrent_documents, parsed.max_concurrent_documents);
    }

    #[test]
    fn test_default_rubric_template() {
        let template = config().load_rubric_template().unwrap();
        assert!(template.contains("{report_text}"));
    }

    #[test]
    fn test_rubric_template_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Score {{company_name}}: {{report_text}}").unwrap();

        let mut config = config();
        config.rubric_template_path = Some(file.path().to_path_buf());
        let template = config.load_rubric_template().unwrap();
        assert_eq!(template, "Score {company_name}: {report_text}");
    }

    #[test]
    fn test_missing_rubric_template_file() {
        let mut config = config();
        config.rubric_template_path = Some(PathBuf::from("/nonexistent/rubric.txt"));
        assert!(matches!(
            config.load_rubric_template(),
            Err(ScorerError::Config(_))
        ));
    }
}
