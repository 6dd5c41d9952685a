use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use super::{DocumentFormat, TextExtractor};
use crate::errors::PipelineError;

/// Main document part inside a WordprocessingML package
const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts text from DOCX documents paragraph by paragraph
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn extract_segments(&self, bytes: &[u8]) -> Result<Vec<String>, PipelineError> {
        let xml = read_document_part(bytes)?;
        paragraphs_from_xml(&xml)
    }
}

fn read_document_part(bytes: &[u8]) -> Result<String, PipelineError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::Parse(format!("failed to open DOCX container: {}", e)))?;

    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| PipelineError::Parse(format!("missing {}: {}", DOCUMENT_PART, e)))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| PipelineError::Parse(format!("failed to read {}: {}", DOCUMENT_PART, e)))?;

    Ok(xml)
}

/// Walk the document XML collecting the text runs of each `w:p`
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, PipelineError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    // Paragraphs nest inside text boxes; the innermost one receives the text.
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            PipelineError::Parse(format!(
                "malformed document XML at position {}: {}",
                reader.error_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match (e.name().as_ref(), open.last_mut()) {
                (b"w:tab", Some(current)) => current.push('\t'),
                (b"w:br" | b"w:cr", Some(current)) => current.push('\n'),
                // A self-closing paragraph is an empty line.
                (b"w:p", _) => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(e) if in_text => {
                let text = e.unescape().map_err(|e| {
                    PipelineError::Parse(format!("invalid text in document XML: {}", e))
                })?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
