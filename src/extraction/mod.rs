/*!
 * Document text extraction.
 *
 * This module turns a binary `SourceDocument` into plain text. Two formats
 * are supported:
 * - `pdf`: paginated documents, extracted page by page in page order
 * - `docx`: flow documents, extracted paragraph by paragraph
 *
 * Anything else is rejected with `PipelineError::UnsupportedFormat` before
 * any bytes are looked at.
 */

use std::fmt;

use bytes::Bytes;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::PipelineError;

pub mod docx;
pub mod pdf;

pub use self::docx::DocxExtractor;
pub use self::pdf::PdfExtractor;

/// Separator inserted between consecutive pages
pub const PAGE_SEPARATOR: &str = "\n";

/// MIME type of the paginated format
pub const PDF_MIME: &str = "application/pdf";

/// MIME type of the flow format
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Identifier minted for every selected document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolve a declared MIME type, ignoring case and parameters
    pub fn from_mime(mime: &str) -> Result<Self, PipelineError> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            PDF_MIME => Ok(Self::Pdf),
            DOCX_MIME => Ok(Self::Docx),
            _ => Err(PipelineError::UnsupportedFormat(mime.to_string())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_MIME,
            Self::Docx => DOCX_MIME,
        }
    }

    /// Whether the format has a native notion of pages
    pub fn is_paginated(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// An uploaded document, immutable once created
#[derive(Debug, Clone)]
pub struct SourceDocument {
    id: DocumentId,
    bytes: Bytes,
    declared_format: String,
    name: Option<String>,
}

impl SourceDocument {
    /// Create a document from raw bytes and the MIME type declared by the picker
    pub fn new(bytes: impl Into<Bytes>, declared_format: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            bytes: bytes.into(),
            declared_format: declared_format.into(),
            name: None,
        }
    }

    /// Attach the original file name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn declared_format(&self) -> &str {
        &self.declared_format
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Plain text extracted from one `SourceDocument`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Concatenated text of the whole document
    pub plain_text: String,
    /// Document the text was extracted from
    pub source_document_id: DocumentId,
    /// Number of pages (paginated formats) or paragraphs (flow formats)
    pub segment_count: usize,
    /// Hex SHA-256 of `plain_text`
    pub digest: String,
}

impl ExtractedText {
    fn new(plain_text: String, source_document_id: DocumentId, segment_count: usize) -> Self {
        let digest = Sha256::digest(plain_text.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self {
            plain_text,
            source_document_id,
            segment_count,
            digest,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.plain_text.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.plain_text.chars().count()
    }
}

/// Decoder for one document format
pub trait TextExtractor {
    /// Format handled by this extractor
    fn format(&self) -> DocumentFormat;

    /// Decode the document into ordered text segments (pages or paragraphs)
    fn extract_segments(&self, bytes: &[u8]) -> Result<Vec<String>, PipelineError>;
}

/// Dispatches a document to the extractor for its declared format
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatExtractor;

impl FormatExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the text of a document
    ///
    /// Fails with `UnsupportedFormat` for undeclared formats and with `Parse`
    /// when the bytes cannot be decoded. Segments are joined in order with
    /// `PAGE_SEPARATOR`; nothing is reordered or deduplicated.
    pub fn extract(&self, document: &SourceDocument) -> Result<ExtractedText, PipelineError> {
        let format = DocumentFormat::from_mime(document.declared_format())?;

        let segments = match format {
            DocumentFormat::Pdf => PdfExtractor.extract_segments(document.bytes())?,
            DocumentFormat::Docx => DocxExtractor.extract_segments(document.bytes())?,
        };

        debug!(
            "Extracted {} {} from document {} ({} bytes)",
            segments.len(),
            if format.is_paginated() { "pages" } else { "paragraphs" },
            document.id(),
            document.len()
        );

        let segment_count = segments.len();
        Ok(ExtractedText::new(
            segments.join(PAGE_SEPARATOR),
            document.id(),
            segment_count,
        ))
    }
}
