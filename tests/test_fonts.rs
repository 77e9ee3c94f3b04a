//! Font fallback behavior and the pluggable font-handler strategy.

use std::collections::HashMap;

use pdf_scribe::writer::object_serializer::Object;
use pdf_scribe::{DataSource, Diagnostic, DiagnosticCode, Document, FontHandler, Resolved};

/// A minimal handler: fixed half-em advance per character, one font
/// dictionary plus one descriptor object per font.
#[derive(Default)]
struct StubHandler {
    loaded: HashMap<String, Vec<u8>>,
}

impl FontHandler for StubHandler {
    fn load(&mut self, name: &str, source: DataSource) -> Resolved<()> {
        let bytes = source.read_all("load_font")?;
        if bytes.is_empty() {
            return Err(Diagnostic::new(
                DiagnosticCode::FontLoadFailed,
                "load_font",
                "empty font data",
                name,
            ));
        }
        self.loaded.insert(name.to_string(), bytes);
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    fn text_width(&self, _name: &str, text: &str, size_pt: f64) -> f64 {
        text.chars().count() as f64 * 0.5 * size_pt
    }

    fn font_objects(&self, name: &str, _font_id: u32) -> Vec<Object> {
        vec![
            Object::dict(vec![
                ("Type", Object::name("Font")),
                ("Subtype", Object::name("TrueType")),
                ("BaseFont", Object::name(name)),
            ]),
            Object::dict(vec![
                ("Type", Object::name("FontDescriptor")),
                ("FontName", Object::name(name)),
                ("Flags", Object::Integer(32)),
            ]),
        ]
    }
}

#[test]
fn test_unknown_font_without_handler_falls_back() {
    let mut doc = Document::new();
    doc.set_font("Futura", 12.0);
    let diag = doc.pop_diagnostic().unwrap();
    assert_eq!(diag.code, DiagnosticCode::UnknownFont);
    let text = String::from_utf8_lossy(&doc.export()).to_string();
    assert!(text.contains("/BaseFont /Helvetica"));
}

#[test]
fn test_load_without_handler_reports_diagnostic() {
    let mut doc = Document::new();
    let err = doc.load_font("Stub", DataSource::Bytes(vec![1, 2, 3])).unwrap_err();
    assert_eq!(err.code, DiagnosticCode::FontLoadFailed);
}

#[test]
fn test_handler_owned_font_is_used_and_embedded() {
    let mut doc = Document::new();
    doc.set_font_handler(Box::<StubHandler>::default());
    doc.load_font("StubSans", DataSource::Bytes(vec![0x00, 0x01])).unwrap();
    doc.set_font("StubSans", 10.0);
    assert!(!doc.has_diagnostics());

    // Width comes from the handler: 4 chars * 0.5em * 10pt.
    let w = doc.text_width("abcd");
    assert!((w - 20.0).abs() < 1e-9);

    doc.text(10.0, 700.0, "external text");
    let text = String::from_utf8_lossy(&doc.export()).to_string();
    assert!(text.contains("/BaseFont /StubSans"));
    assert!(text.contains("/Type /FontDescriptor"));
}

#[test]
fn test_handler_objects_keep_xref_consistent() {
    // A handler that expands to two objects must not shift image or info
    // offsets out of sync.
    let mut doc = Document::new();
    doc.set_font_handler(Box::<StubHandler>::default());
    doc.load_font("StubSans", DataSource::Bytes(vec![0xFF])).unwrap();
    doc.set_font("StubSans", 10.0);
    doc.text(10.0, 700.0, "x");
    doc.set_title("Handler");
    let text = String::from_utf8_lossy(&doc.export()).to_string();

    let start: usize = text
        .rsplit_once("startxref\n")
        .unwrap()
        .1
        .trim_end_matches("%%EOF")
        .trim()
        .parse()
        .unwrap();
    let mut object_id = 0u32;
    for line in text[start..].lines().skip(3) {
        if !line.ends_with("n ") {
            break;
        }
        object_id += 1;
        let offset: usize = line[..10].parse().unwrap();
        assert!(text[offset..].starts_with(&format!("{} 0 obj", object_id)));
    }
    // catalog, pages, page, content, two font objects, info.
    assert_eq!(object_id, 7);
}

#[test]
fn test_rejected_font_load_queues_diagnostic() {
    let mut doc = Document::new();
    doc.set_font_handler(Box::<StubHandler>::default());
    let err = doc.load_font("Empty", DataSource::Bytes(Vec::new())).unwrap_err();
    assert_eq!(err.code, DiagnosticCode::FontLoadFailed);
    assert!(doc.diagnostics().any(|d| d.code == DiagnosticCode::FontLoadFailed));
}
