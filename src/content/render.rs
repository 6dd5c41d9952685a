//! Renderers for formatted content.

use super::formatter::{bullet, heading, is_rule, parse_inline};
use super::{Block, Span};

/// Separator between rendered blocks
const BLOCK_SEPARATOR: &str = "\n\n";

fn spans_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

fn spans_markup(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(t) => t.clone(),
            Span::Strong(t) => format!("**{}**", t),
        })
        .collect()
}

fn spans_html(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(t) => escape_html(t).replace('\n', "<br>"),
            Span::Strong(t) => format!("<strong>{}</strong>", escape_html(t).replace('\n', "<br>")),
        })
        .collect()
}

/// Text without any markers; lists become one item per line
///
/// Leading heading or bullet markers and leftover strong pairs are stripped
/// until the text formats back to itself, so the output never reads as
/// structure when formatted again.
pub fn to_plain_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            Block::Heading { spans, .. } | Block::Paragraph { spans } => spans_text(spans),
            Block::List { items } => items
                .iter()
                .map(|item| spans_text(item))
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .map(|text| neutralize(&text))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Strip markers from `text` until it is a fixed point of the formatter
fn neutralize(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let lines: Vec<&str> = current
            .lines()
            .map(strip_line_markers)
            .filter(|line| !line.is_empty())
            .collect();
        let next = spans_text(&parse_inline(&lines.join("\n")));
        if next == current {
            return next;
        }
        current = next;
    }
}

fn strip_line_markers(line: &str) -> &str {
    let mut line = line.trim();
    loop {
        if is_rule(line) {
            return "";
        }
        if let Some((_, text)) = heading(line) {
            line = text;
        } else if let Some(text) = bullet(line) {
            line = text;
        } else {
            return line;
        }
    }
}

/// Canonical markup that the formatter parses back into the same blocks
pub fn to_markup(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            Block::Heading { level, spans } => {
                format!("{} {}", "#".repeat(usize::from(*level)), spans_markup(spans))
            }
            Block::Paragraph { spans } => spans_markup(spans),
            Block::List { items } => items
                .iter()
                .map(|item| format!("- {}", spans_markup(item)))
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// HTML fragment; all text is escaped, only the tags emitted here are markup
pub fn to_html(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            Block::Heading { level, spans } => {
                format!("<h{level}>{}</h{level}>", spans_html(spans), level = level)
            }
            Block::Paragraph { spans } => format!("<p>{}</p>", spans_html(spans)),
            Block::List { items } => {
                let items: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>", spans_html(item)))
                    .collect();
                format!("<ul>{}</ul>", items)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
