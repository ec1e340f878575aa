//! End-to-end checks of the OCR field extraction heuristics against
//! realistic card line sets.

use pretty_assertions::assert_eq;

use rolo::extraction::{extract_fields, raw_text};
use rolo::ocr::OcrLine;

fn lines(texts: &[(&str, f32)]) -> Vec<OcrLine> {
    texts
        .iter()
        .map(|(text, confidence)| OcrLine {
            text: text.to_string(),
            confidence: *confidence,
        })
        .collect()
}

#[test]
fn canonical_card_assigns_every_field() {
    let input = lines(&[
        ("John Smith", 0.96),
        ("Senior Developer", 0.94),
        ("Tech Corp Inc", 0.91),
        ("john@techcorp.com", 0.97),
        ("+1-555-0123", 0.92),
    ]);

    let fields = extract_fields(&input, 0.7);

    assert_eq!(fields.name.as_deref(), Some("John Smith"));
    assert_eq!(fields.title.as_deref(), Some("Senior Developer"));
    assert_eq!(fields.company.as_deref(), Some("Tech Corp Inc"));
    assert_eq!(fields.email.as_deref(), Some("john@techcorp.com"));
    assert_eq!(fields.phone.as_deref(), Some("+1-555-0123"));
    assert!(fields.website.is_none());
    assert!(fields.address.is_none());
}

#[test]
fn full_card_with_website_and_address() {
    let input = lines(&[
        ("GLOBEX", 0.88),
        ("Jane O'Brien", 0.95),
        ("Chief Technology Officer", 0.93),
        ("jane.obrien@globex.io", 0.96),
        ("www.globex.io", 0.90),
        ("(555) 867-5309", 0.91),
        ("742 Evergreen Terrace, Suite 300", 0.85),
        ("Springfield, IL 62704", 0.84),
    ]);

    let fields = extract_fields(&input, 0.7);

    assert_eq!(fields.name.as_deref(), Some("Jane O'Brien"));
    assert_eq!(fields.title.as_deref(), Some("Chief Technology Officer"));
    assert_eq!(fields.company.as_deref(), Some("GLOBEX"));
    assert_eq!(fields.email.as_deref(), Some("jane.obrien@globex.io"));
    assert_eq!(fields.website.as_deref(), Some("www.globex.io"));
    assert_eq!(fields.phone.as_deref(), Some("(555) 867-5309"));
    assert_eq!(
        fields.address.as_deref(),
        Some("742 Evergreen Terrace, Suite 300, Springfield, IL 62704")
    );
}

#[test]
fn threshold_filtering_excludes_lines_from_raw_text_and_candidates() {
    let input = lines(&[
        ("John Smith", 0.95),
        ("Tech Corp Inc", 0.92),
        ("~~ smudged footer ~~", 0.25),
        ("Weird Artifact Ltd", 0.40),
    ]);

    let fields = extract_fields(&input, 0.7);
    // The low-confidence "Ltd" line must not win the company slot.
    assert_eq!(fields.company.as_deref(), Some("Tech Corp Inc"));

    let text = raw_text(&input, 0.7);
    assert_eq!(text, "John Smith\nTech Corp Inc");
    assert!(!text.contains("smudged"));
    assert!(!text.contains("Artifact"));
}

#[test]
fn default_threshold_is_seventy_percent_normalized() {
    let input = lines(&[("Border Line", 0.70), ("Below Line", 0.699)]);

    let text = raw_text(&input, 0.7);
    assert_eq!(text, "Border Line", "0.70 is retained, 0.699 is dropped");
}

#[test]
fn confidence_is_mean_of_retained_lines_only() {
    let input = lines(&[("John Smith", 0.90), ("Tech Corp Inc", 0.70), ("noise", 0.10)]);

    let fields = extract_fields(&input, 0.5);
    assert!((fields.confidence - 0.80).abs() < 1e-6);
}

#[test]
fn sparse_card_with_only_contact_points() {
    let input = lines(&[("support@initech.example", 0.93), ("+49 30 901820", 0.90)]);

    let fields = extract_fields(&input, 0.7);
    assert_eq!(fields.email.as_deref(), Some("support@initech.example"));
    assert_eq!(fields.phone.as_deref(), Some("+49 30 901820"));
    assert!(fields.name.is_none());
    assert!(fields.company.is_none());
}

#[test]
fn all_lines_below_threshold_yield_empty_result() {
    let input = lines(&[("John Smith", 0.3), ("Tech Corp Inc", 0.2)]);

    let fields = extract_fields(&input, 0.7);
    assert!(fields.is_empty());
    assert_eq!(fields.confidence, 0.0);
    assert_eq!(raw_text(&input, 0.7), "");
}

#[test]
fn title_adjacency_breaks_ties_between_candidates() {
    let input = lines(&[
        ("Account Manager Directory", 0.9),
        ("Initech Solutions", 0.9),
        ("Peter Gibbons", 0.9),
        ("Software Engineer", 0.9),
    ]);

    let fields = extract_fields(&input, 0.7);
    assert_eq!(fields.name.as_deref(), Some("Peter Gibbons"));
    assert_eq!(fields.title.as_deref(), Some("Software Engineer"));
}
