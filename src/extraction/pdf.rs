use lopdf::Document;

use super::{DocumentFormat, TextExtractor};
use crate::errors::PipelineError;

/// Extracts text from PDF documents page by page
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract_segments(&self, bytes: &[u8]) -> Result<Vec<String>, PipelineError> {
        let document = Document::load_mem(bytes)
            .map_err(|e| PipelineError::Parse(format!("failed to load PDF document: {}", e)))?;

        if document.is_encrypted() {
            return Err(PipelineError::Parse("PDF document is encrypted".to_string()));
        }

        // get_pages is keyed by 1-based page number, so iteration is page order.
        let pages = document.get_pages();
        let mut segments = Vec::with_capacity(pages.len());

        for page_number in pages.keys() {
            let text = document.extract_text(&[*page_number]).map_err(|e| {
                PipelineError::Parse(format!(
                    "failed to extract text for page {}: {}",
                    page_number, e
                ))
            })?;

            // The decoder terminates every text object with a line break.
            segments.push(text.trim_end_matches(['\n', '\r']).to_string());
        }

        Ok(segments)
    }
}
