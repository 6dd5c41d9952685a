/*!
 * Tests for the content formatter, renderers and reference extraction
 */

use legaldoc::content::references::{MAX_REFERENCES, extract_references};
use legaldoc::content::{Block, ContentFormatter, Span};
use legaldoc::providers::AnalysisMode;
use legaldoc::providers::mock::MockAnalysis;

const SAMPLE: &str = "## **SUMMARY**\n\
    This agreement is governed by the Indian Contract Act, 1872.\n\
    \n\
    ### Obligations\n\
    * The tenant pays **rent** monthly\n\
    + The owner keeps the roof in repair\n\
    \n\
    ---\n\
    Notice under IPC Section 420 may apply.";

#[test]
fn test_format_withCannedResponses_shouldBeIdempotentThroughMarkup() {
    let formatter = ContentFormatter::new();
    for mode in [AnalysisMode::Summarize, AnalysisMode::Analyze] {
        let first = formatter.format(&MockAnalysis::default_response(mode));
        let second = formatter.format(&first.markup());
        assert_eq!(first, second, "markup of {} mode did not round-trip", mode);
    }

    let first = formatter.format(SAMPLE);
    assert_eq!(formatter.format(&first.markup()), first);
}

#[test]
fn test_format_ofPlainText_shouldKeepPlainText() {
    let formatter = ContentFormatter::new();
    let inputs = [
        SAMPLE,
        "- # foo",
        "- - x",
        "**- y**",
        "**## Heading**\nbody",
        "**a\n- b**",
        "- ---\n- kept",
        "a ****b** c**",
        "** b**",
    ];

    for input in inputs {
        let formatted = formatter.format(input);
        let reformatted = formatter.format(&formatted.plain_text());
        assert_eq!(reformatted.plain_text(), formatted.plain_text(), "input {:?}", input);
    }
}

#[test]
fn test_plain_text_withMarkerLikeItems_shouldStripMarkers() {
    let formatter = ContentFormatter::new();
    assert_eq!(formatter.format("- # foo").plain_text(), "foo");
    assert_eq!(formatter.format("- - x\n- y").plain_text(), "x\ny");
    assert_eq!(formatter.format("**- y**").plain_text(), "y");
}

#[test]
fn test_format_withSample_shouldBuildExpectedBlocks() {
    let formatted = ContentFormatter::new().format(SAMPLE);

    assert_eq!(formatted.len(), 5);
    assert_eq!(
        formatted.blocks[0],
        Block::Heading {
            level: 2,
            spans: vec![Span::Strong("SUMMARY".to_string())],
        }
    );
    match &formatted.blocks[3] {
        Block::List { items } => {
            assert_eq!(items.len(), 2);
            assert_eq!(items[0][1], Span::Strong("rent".to_string()));
        }
        other => panic!("expected a list, got {:?}", other),
    }
    assert_eq!(formatted.headings().count(), 2);
}

#[test]
fn test_format_withEmptyInput_shouldProduceNothing() {
    let formatted = ContentFormatter::new().format("  \n\n---\n");
    assert!(formatted.is_empty());
    assert!(formatted.references.is_empty());
    assert_eq!(formatted.plain_text(), "");
}

#[test]
fn test_html_withMarkupInServiceText_shouldEscapeIt() {
    let formatted = ContentFormatter::new().format("The clause <script>alert('x')</script> & **\"bold\"**");
    let html = formatted.html();

    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("&#39;x&#39;"));
    assert!(html.contains("&amp;"));
    assert!(html.contains("<strong>&quot;bold&quot;</strong>"));
}

#[test]
fn test_format_withSample_shouldCollectReferences() {
    let formatted = ContentFormatter::new().format(SAMPLE);
    assert!(formatted.references.iter().any(|r| r.ends_with("Indian Contract Act, 1872")));
    assert!(formatted.references.contains(&"IPC Section 420".to_string()));
}

#[test]
fn test_extract_references_withManyMatches_shouldKeepFirstFive() {
    let text = "IPC Section 302, IPC Section 420, IPC Section 302, CrPC Section 125, \
                CPC Section 9, IPC Section 498A, CrPC Section 438";
    let references = extract_references(text);

    assert_eq!(references.len(), MAX_REFERENCES);
    assert_eq!(
        references,
        vec![
            "IPC Section 302",
            "IPC Section 420",
            "IPC Section 498A",
            "CrPC Section 125",
            "CrPC Section 438",
        ]
    );
}
