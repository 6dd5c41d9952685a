/*!
 * Structured content produced from raw analysis output.
 *
 * - `formatter`: turns semi-structured markup into a block sequence
 * - `render`: plain text, canonical markup and escaped HTML renderers
 * - `references`: statutory references found in the content
 *
 * Raw service markup never reaches the presentation layer as a string;
 * only the block tree below does.
 */

use serde::{Deserialize, Serialize};

pub mod formatter;
pub mod references;
pub mod render;

pub use self::formatter::ContentFormatter;

/// Inline run of text inside a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "lowercase")]
pub enum Span {
    Text(String),
    Strong(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(t) | Self::Strong(t) => t,
        }
    }
}

/// One list item, itself a run of spans
pub type ListItem = Vec<Span>;

/// Structural block of formatted content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph { spans: Vec<Span> },
    List { items: Vec<ListItem> },
}

/// Normalized form of one analysis result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedContent {
    pub blocks: Vec<Block>,
    /// Statutory references mentioned in the content, at most five
    pub references: Vec<String>,
}

impl FormattedContent {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Plain text rendering, the input of translation and speech
    pub fn plain_text(&self) -> String {
        render::to_plain_text(&self.blocks)
    }

    /// Canonical markup rendering, accepted back by the formatter
    pub fn markup(&self) -> String {
        render::to_markup(&self.blocks)
    }

    /// HTML rendering with every text node escaped
    pub fn html(&self) -> String {
        render::to_html(&self.blocks)
    }

    pub fn headings(&self) -> impl Iterator<Item = &[Span]> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Heading { spans, .. } => Some(spans.as_slice()),
            _ => None,
        })
    }
}
