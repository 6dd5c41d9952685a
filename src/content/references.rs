//! Statutory references mentioned in analysis output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Most references kept per document
pub const MAX_REFERENCES: usize = 5;

/// Reference patterns, applied in this order
static REFERENCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Section \d+[A-Za-z]* of [^\n.]+",
        r"Article \d+[A-Za-z]* of [^\n.]+",
        r"[A-Za-z][A-Za-z ]* Act,? \d{4}",
        r"IPC Section \d+[A-Za-z]*",
        r"CrPC Section \d+[A-Za-z]*",
        r"CPC Section \d+[A-Za-z]*",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Collect up to `MAX_REFERENCES` distinct references in first-seen order
pub fn extract_references(text: &str) -> Vec<String> {
    let mut references: Vec<String> = Vec::new();

    for pattern in REFERENCE_PATTERNS.iter() {
        for found in pattern.find_iter(text) {
            let reference = found.as_str().trim();
            if reference.is_empty() || references.iter().any(|r| r == reference) {
                continue;
            }
            references.push(reference.to_string());
            if references.len() == MAX_REFERENCES {
                return references;
            }
        }
    }

    references
}
