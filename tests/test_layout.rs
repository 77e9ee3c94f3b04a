//! Property tests for unit conversion, color resolution, and word wrap.

use pdf_scribe::{color, Document, DocumentConfig};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_unit_conversion_round_trips(
        v in -10_000.0f64..10_000.0,
        unit in prop::sample::select(vec!["pt", "mm", "cm", "in"]),
    ) {
        let doc = Document::with_config(DocumentConfig::new().unit(unit));
        let roundtrip = doc.to_units(doc.to_points(v));
        prop_assert!((roundtrip - v).abs() < 1e-9);
    }

    #[test]
    fn prop_hex_colors_round_trip(r: u8, g: u8, b: u8) {
        let spec = format!("#{:02X}{:02X}{:02X}", r, g, b);
        let c = color::resolve(&spec, "test").unwrap();
        prop_assert_eq!((c.r, c.g, c.b), (r, g, b));
    }

    #[test]
    fn prop_wrap_preserves_characters(text in "[a-z \\n]{0,300}") {
        let mut doc = Document::new();
        doc.set_font("Helvetica", 12.0);
        let lines = doc.wrap_text(80.0, &text);
        let rejoined: String = lines.concat();
        prop_assert_eq!(rejoined, text.replace('\n', ""));
    }

    #[test]
    fn prop_wrapped_lines_fit_when_words_fit(
        words in prop::collection::vec("[a-m]{1,8}", 1..40),
    ) {
        let text = words.join(" ");
        let mut doc = Document::new();
        doc.set_font("Courier", 12.0);
        // Courier at 12pt: 7.2pt per char, so an 8-char word spans 57.6pt,
        // comfortably inside a 100pt box.
        let lines = doc.wrap_text(100.0, &text);
        for line in &lines {
            let w = doc.text_width(line.trim_end());
            prop_assert!(w <= 100.0 + 1e-9, "line {:?} is {} wide", line, w);
        }
    }
}

#[test]
fn test_wrap_is_greedy_for_ascii() {
    let mut doc = Document::new();
    doc.set_font("Courier", 12.0);
    // 7.2pt per character; a 50pt box holds 6 characters.
    let lines = doc.wrap_text(50.0, "aa bb cc dd");
    assert_eq!(lines, vec!["aa bb ", "cc dd"]);
}

#[test]
fn test_wrap_hard_breaks_unbreakable_words() {
    let mut doc = Document::new();
    doc.set_font("Courier", 12.0);
    let lines = doc.wrap_text(50.0, "abcdefghijklmnop");
    assert_eq!(lines, vec!["abcdef", "ghijkl", "mnop"]);
}

#[test]
fn test_multibyte_text_wraps_without_splitting_chars() {
    let mut doc = Document::new();
    doc.set_font("Helvetica", 12.0);
    let text = "caf\u{E9} d\u{E9}j\u{E0} vu caf\u{E9} d\u{E9}j\u{E0} vu caf\u{E9}";
    let lines = doc.wrap_text(40.0, text);
    assert!(lines.len() > 1);
    assert_eq!(lines.concat(), text);
}

#[test]
fn test_text_box_emits_all_lines() {
    let mut doc = Document::new();
    doc.set_font("Helvetica", 10.0);
    doc.text_box(50.0, 500.0, 120.0, 200.0, "one two three four five six seven", "LT");
    let bytes = doc.export();
    let text = String::from_utf8_lossy(&bytes);
    let shown = text.matches(" Tj ET").count();
    assert!(shown >= 2, "expected wrapped output, got {} shows", shown);
    assert!(text.contains("(one "));
}
