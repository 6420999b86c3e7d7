//! PDF text source backed by `pdf-extract`

use crate::error::ScorerError;
use tcsa_domain::traits::DocumentTextSource;

/// PDF media type accepted by the batch endpoint
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Extracts the embedded text layer of digital PDFs
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl DocumentTextSource for PdfTextSource {
    type Error = ScorerError;

    fn extract_text(&self, bytes: &[u8]) -> Result<String, Self::Error> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ScorerError::Extraction(format!("unreadable PDF: {}", e)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    /// Build a one-page PDF whose text layer contains `text`
    pub fn make_test_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::make_test_pdf;
    use super::*;
    use crate::extraction::{ExtractionOutcome, TextExtractor};

    #[test]
    fn test_extract_text_from_digital_pdf() {
        let text = PdfTextSource.extract_text(&make_test_pdf("Hello World from Acme")).unwrap();
        assert!(
            text.contains("Hello") || text.contains("World"),
            "Expected text to contain 'Hello' or 'World', got: {text}"
        );
    }

    #[test]
    fn test_invalid_pdf_returns_error() {
        let result = PdfTextSource.extract_text(b"not a pdf");
        assert!(matches!(result, Err(ScorerError::Extraction(_))));
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_failure() {
        let extractor = TextExtractor::new(PdfTextSource);
        assert!(matches!(
            extractor.extract(b"%PDF-1.4 truncated"),
            ExtractionOutcome::Failure(_)
        ));
    }
}
