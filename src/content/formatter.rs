/*!
 * Conversion of raw analysis markup into structured blocks.
 *
 * Rules, applied per line in this order:
 * 1. `#`, `##` or `###` followed by whitespace starts a heading
 * 2. `-`, `*`, `+` or `•` followed by whitespace is a list item; consecutive
 *    items form one list
 * 3. everything else is paragraph text, split into paragraphs by blank lines
 * 4. `**text**` inside any block becomes a strong span
 *
 * Lines made only of `-`, `*` or `_` (horizontal rules) end the current block
 * and produce nothing.
 */

use std::mem;

use super::references;
use super::{Block, FormattedContent, ListItem, Span};

/// Inline emphasis marker
const STRONG_MARKER: &str = "**";

/// Deepest heading level recognised
const MAX_HEADING_LEVEL: usize = 3;

const BULLET_MARKERS: [char; 4] = ['-', '*', '+', '•'];

/// Stateless formatter for analysis output
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentFormatter;

impl ContentFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Format raw content into blocks and collect its statutory references
    pub fn format(&self, raw_content: &str) -> FormattedContent {
        let blocks = parse_blocks(raw_content);
        let references = references::extract_references(&super::render::to_plain_text(&blocks));
        FormattedContent { blocks, references }
    }
}

/// Accumulates the block currently being built
#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    paragraph: Vec<String>,
    list: Vec<ListItem>,
}

impl BlockBuilder {
    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = mem::take(&mut self.paragraph).join("\n");
        self.blocks.push(Block::Paragraph {
            spans: parse_inline(&text),
        });
    }

    fn flush_list(&mut self) {
        if self.list.is_empty() {
            return;
        }
        self.blocks.push(Block::List {
            items: mem::take(&mut self.list),
        });
    }

    fn flush(&mut self) {
        self.flush_paragraph();
        self.flush_list();
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn parse_blocks(raw_content: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();

    for line in raw_content.lines() {
        let line = line.trim();

        if line.is_empty() || is_rule(line) {
            builder.flush();
            continue;
        }

        if let Some((level, text)) = heading(line) {
            builder.flush();
            builder.blocks.push(Block::Heading {
                level,
                spans: parse_inline(text),
            });
            continue;
        }

        if let Some(text) = bullet(line) {
            builder.flush_paragraph();
            builder.list.push(parse_inline(text));
            continue;
        }

        builder.flush_list();
        builder.paragraph.push(line.to_string());
    }

    builder.finish()
}

/// Heading level and text of a line, if it is a heading
pub(crate) fn heading(line: &str) -> Option<(u8, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > MAX_HEADING_LEVEL {
        return None;
    }

    let rest = &line[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let text = rest.trim();
    (!text.is_empty()).then_some((level as u8, text))
}

/// Item text of a line, if it is a bullet
pub(crate) fn bullet(line: &str) -> Option<&str> {
    let marker = line.chars().next().filter(|c| BULLET_MARKERS.contains(c))?;
    let rest = &line[marker.len_utf8()..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

/// Horizontal rule such as `---` or `***`
pub(crate) fn is_rule(line: &str) -> bool {
    let mut chars = line.chars();
    match chars.next() {
        Some(first @ ('-' | '*' | '_')) => line.len() >= 3 && chars.all(|c| c == first),
        _ => false,
    }
}

/// Split text into plain and strong spans
///
/// Only a marker pair enclosing at least one character produces a strong
/// span; every other marker stays in the text, so concatenating the spans'
/// markup gives back the input exactly.
pub(crate) fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(open) = rest.find(STRONG_MARKER) {
        let after = &rest[open + STRONG_MARKER.len()..];
        match after.find(STRONG_MARKER) {
            Some(close) if close > 0 => {
                literal.push_str(&rest[..open]);
                if !literal.is_empty() {
                    spans.push(Span::Text(mem::take(&mut literal)));
                }
                spans.push(Span::Strong(after[..close].to_string()));
                rest = &after[close + STRONG_MARKER.len()..];
            }
            _ => {
                literal.push_str(&rest[..open + STRONG_MARKER.len()]);
                rest = after;
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        spans.push(Span::Text(literal));
    }

    spans
}
