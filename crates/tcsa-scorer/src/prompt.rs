//! Rubric prompt construction

use crate::error::ScorerError;

/// Built-in TCSA rubric template
pub const DEFAULT_RUBRIC_TEMPLATE: &str = include_str!("../rubric/tcsa_default.txt");

const COMPANY_NAME: &str = "{company_name}";
const WEBSITE_URL: &str = "{website_url}";
const REPORT_TEXT: &str = "{report_text}";

/// Fills the rubric template for one document
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
    max_report_chars: usize,
}

impl PromptBuilder {
    /// Create a prompt builder from a template
    ///
    /// The template must contain the `{report_text}` placeholder.
    pub fn new(template: impl Into<String>, max_report_chars: usize) -> Result<Self, ScorerError> {
        let template = template.into();
        if !template.contains(REPORT_TEXT) {
            return Err(ScorerError::Config(format!(
                "rubric template has no {} placeholder",
                REPORT_TEXT
            )));
        }
        Ok(Self {
            template,
            max_report_chars,
        })
    }

    /// Prompt builder using the built-in rubric
    pub fn default_rubric(max_report_chars: usize) -> Self {
        Self {
            template: DEFAULT_RUBRIC_TEMPLATE.to_string(),
            max_report_chars,
        }
    }

    /// Build the complete scoring prompt
    pub fn build(&self, company_name: &str, website_url: &str, report_text: &str) -> String {
        let (excerpt, truncated) = truncate_chars(report_text, self.max_report_chars);
        let report = if truncated {
            format!(
                "{}... (truncated to the first {} characters)",
                excerpt, self.max_report_chars
            )
        } else {
            excerpt.to_string()
        };

        // Single pass so values containing placeholder text are left alone
        let mut prompt = String::with_capacity(self.template.len() + report.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('{') {
            prompt.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            let (value, len) = if tail.starts_with(COMPANY_NAME) {
                (company_name, COMPANY_NAME.len())
            } else if tail.starts_with(WEBSITE_URL) {
                (website_url, WEBSITE_URL.len())
            } else if tail.starts_with(REPORT_TEXT) {
                (report.as_str(), REPORT_TEXT.len())
            } else {
                ("{", 1)
            };
            prompt.push_str(value);
            rest = &tail[len..];
        }
        prompt.push_str(rest);
        prompt
    }
}

/// Keep at most `max_chars` characters, never splitting a character
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}
