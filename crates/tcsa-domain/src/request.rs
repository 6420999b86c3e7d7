//! Per-document scoring request

/// One document to score, owned by the pipeline that runs it
#[derive(Debug, Clone)]
pub struct ScoringRequest {
    /// Company the report belongs to
    pub company_name: String,

    /// Company website, handed to the model for the media assessment
    pub reference_url: String,

    /// Raw document content
    pub document_bytes: Vec<u8>,

    /// Original file name, used in diagnostics only
    pub document_name: String,
}

impl ScoringRequest {
    /// Create a new request
    pub fn new(
        company_name: impl Into<String>,
        reference_url: impl Into<String>,
        document_bytes: Vec<u8>,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            reference_url: reference_url.into(),
            document_bytes,
            document_name: String::from("document.pdf"),
        }
    }

    /// Set the file name used in diagnostics
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }
}
