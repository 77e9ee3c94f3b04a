//! Font registry and the pluggable font-handler strategy.
//!
//! Built-in fonts are the twelve Latin text faces of the standard set,
//! matched by family plus bold/italic tokens in the requested name. A
//! document may additionally carry a [`FontHandler`] strategy for fonts it
//! wants loaded and embedded externally; without one, unmatched names fall
//! back to the default built-in face and a diagnostic.

use std::collections::HashMap;

use crate::error::{Diagnostic, DiagnosticCode, Resolved};
use crate::source::DataSource;
use crate::writer::metrics;
use crate::writer::object_serializer::Object;

/// One of the built-in faces with statically known metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltInFont {
    /// Courier
    Courier,
    /// Courier-Bold
    CourierBold,
    /// Courier-Oblique
    CourierOblique,
    /// Courier-BoldOblique
    CourierBoldOblique,
    /// Helvetica
    Helvetica,
    /// Helvetica-Bold
    HelveticaBold,
    /// Helvetica-Oblique
    HelveticaOblique,
    /// Helvetica-BoldOblique
    HelveticaBoldOblique,
    /// Times-Roman
    TimesRoman,
    /// Times-Bold
    TimesBold,
    /// Times-Italic
    TimesItalic,
    /// Times-BoldItalic
    TimesBoldItalic,
}

impl BuiltInFont {
    /// The canonical PostScript name, used as registry identity and as the
    /// /BaseFont value.
    pub fn postscript_name(self) -> &'static str {
        match self {
            BuiltInFont::Courier => "Courier",
            BuiltInFont::CourierBold => "Courier-Bold",
            BuiltInFont::CourierOblique => "Courier-Oblique",
            BuiltInFont::CourierBoldOblique => "Courier-BoldOblique",
            BuiltInFont::Helvetica => "Helvetica",
            BuiltInFont::HelveticaBold => "Helvetica-Bold",
            BuiltInFont::HelveticaOblique => "Helvetica-Oblique",
            BuiltInFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            BuiltInFont::TimesRoman => "Times-Roman",
            BuiltInFont::TimesBold => "Times-Bold",
            BuiltInFont::TimesItalic => "Times-Italic",
            BuiltInFont::TimesBoldItalic => "Times-BoldItalic",
        }
    }

    /// The 256-entry width table for this face. Oblique variants share the
    /// upright tables.
    pub(crate) fn widths(self) -> &'static [u16; 256] {
        match self {
            BuiltInFont::Courier
            | BuiltInFont::CourierBold
            | BuiltInFont::CourierOblique
            | BuiltInFont::CourierBoldOblique => &metrics::COURIER,
            BuiltInFont::Helvetica | BuiltInFont::HelveticaOblique => &metrics::HELVETICA,
            BuiltInFont::HelveticaBold | BuiltInFont::HelveticaBoldOblique => {
                &metrics::HELVETICA_BOLD
            },
            BuiltInFont::TimesRoman => &metrics::TIMES_ROMAN,
            BuiltInFont::TimesBold => &metrics::TIMES_BOLD,
            BuiltInFont::TimesItalic => &metrics::TIMES_ITALIC,
            BuiltInFont::TimesBoldItalic => &metrics::TIMES_BOLD_ITALIC,
        }
    }

    /// Resolve a requested name to a built-in face.
    ///
    /// Matching is case- and separator-insensitive. Family aliases: Arial
    /// maps to Helvetica, Times New Roman to Times, Courier New to Courier.
    /// "bold", "italic" and "oblique" tokens anywhere in the name select
    /// the styled variant.
    pub fn resolve(requested: &str) -> Option<BuiltInFont> {
        let norm: String = requested
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        let bold = norm.contains("bold");
        let italic = norm.contains("italic") || norm.contains("oblique");

        if norm.starts_with("courier") {
            Some(match (bold, italic) {
                (false, false) => BuiltInFont::Courier,
                (true, false) => BuiltInFont::CourierBold,
                (false, true) => BuiltInFont::CourierOblique,
                (true, true) => BuiltInFont::CourierBoldOblique,
            })
        } else if norm.starts_with("helvetica") || norm.starts_with("arial") {
            Some(match (bold, italic) {
                (false, false) => BuiltInFont::Helvetica,
                (true, false) => BuiltInFont::HelveticaBold,
                (false, true) => BuiltInFont::HelveticaOblique,
                (true, true) => BuiltInFont::HelveticaBoldOblique,
            })
        } else if norm.starts_with("times") {
            Some(match (bold, italic) {
                (false, false) => BuiltInFont::TimesRoman,
                (true, false) => BuiltInFont::TimesBold,
                (false, true) => BuiltInFont::TimesItalic,
                (true, true) => BuiltInFont::TimesBoldItalic,
            })
        } else {
            None
        }
    }

    fn is_bold(self) -> bool {
        matches!(
            self,
            BuiltInFont::CourierBold
                | BuiltInFont::CourierBoldOblique
                | BuiltInFont::HelveticaBold
                | BuiltInFont::HelveticaBoldOblique
                | BuiltInFont::TimesBold
                | BuiltInFont::TimesBoldItalic
        )
    }

    fn is_italic(self) -> bool {
        matches!(
            self,
            BuiltInFont::CourierOblique
                | BuiltInFont::CourierBoldOblique
                | BuiltInFont::HelveticaOblique
                | BuiltInFont::HelveticaBoldOblique
                | BuiltInFont::TimesItalic
                | BuiltInFont::TimesBoldItalic
        )
    }
}

/// The default face substituted when a name matches nothing.
pub const DEFAULT_FONT: BuiltInFont = BuiltInFont::Helvetica;

/// How a registered font is realized at export time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// One of the built-in faces; a single /Type1 dictionary is emitted.
    BuiltIn(BuiltInFont),
    /// Owned by the document's [`FontHandler`]; the handler emits the
    /// indirect objects.
    External,
}

/// One distinct typeface used anywhere in the document.
#[derive(Debug, Clone)]
pub struct FontEntry {
    /// Stable 1-based ID, assigned on first use and reused thereafter
    pub id: u32,
    /// Canonical name (PostScript name for built-ins)
    pub name: String,
    /// Built-in or handler-owned
    pub kind: FontKind,
    /// Bold flag derived from the name
    pub bold: bool,
    /// Italic flag derived from the name
    pub italic: bool,
}

/// The document's deduplicated font table. Identity is keyed by canonical
/// name: requesting the same name twice yields the same ID.
#[derive(Debug, Default)]
pub struct FontRegistry {
    entries: Vec<FontEntry>,
    by_name: HashMap<String, usize>,
}

impl FontRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a requested font name and register it, returning its stable
    /// ID. Names unknown to both the built-in table and the handler fall
    /// back to the default face; the accompanying diagnostic is returned
    /// for the caller to queue.
    pub fn register(
        &mut self,
        requested: &str,
        handler: Option<&dyn FontHandler>,
        operation: &'static str,
    ) -> (u32, Option<Diagnostic>) {
        if let Some(face) = BuiltInFont::resolve(requested) {
            return (self.intern_builtin(face), None);
        }
        if handler.is_some_and(|h| h.contains(requested)) {
            let id = self.intern(requested.to_string(), FontKind::External, false, false);
            return (id, None);
        }
        let diag = Diagnostic::new(
            DiagnosticCode::UnknownFont,
            operation,
            format!("unknown font, substituting {}", DEFAULT_FONT.postscript_name()),
            requested,
        );
        log::warn!("font '{}' not found; substituting {}", requested, DEFAULT_FONT.postscript_name());
        (self.intern_builtin(DEFAULT_FONT), Some(diag))
    }

    fn intern_builtin(&mut self, face: BuiltInFont) -> u32 {
        self.intern(
            face.postscript_name().to_string(),
            FontKind::BuiltIn(face),
            face.is_bold(),
            face.is_italic(),
        )
    }

    fn intern(&mut self, name: String, kind: FontKind, bold: bool, italic: bool) -> u32 {
        if let Some(&idx) = self.by_name.get(&name) {
            return self.entries[idx].id;
        }
        let id = self.entries.len() as u32 + 1;
        self.by_name.insert(name.clone(), self.entries.len());
        self.entries.push(FontEntry {
            id,
            name,
            kind,
            bold,
            italic,
        });
        id
    }

    /// Look up an entry by its ID.
    pub fn get(&self, id: u32) -> Option<&FontEntry> {
        self.entries.get(id.checked_sub(1)? as usize)
    }

    /// All entries in ID order.
    pub fn entries(&self) -> &[FontEntry] {
        &self.entries
    }

    /// Number of distinct fonts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no font has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_name.clear();
    }
}

/// Pluggable strategy for fonts outside the built-in set.
///
/// Configured on the document at construction time; there is no
/// process-wide hook. The handler owns loading, measuring, and emitting
/// whatever indirect objects embedding requires.
pub trait FontHandler {
    /// Attempt to load a font under `name` from the given source.
    fn load(&mut self, name: &str, source: DataSource) -> Resolved<()>;

    /// Whether a font with this name has been loaded.
    fn contains(&self, name: &str) -> bool;

    /// Rendered width in points of `text` at `size_pt` (before horizontal
    /// scaling, which the caller applies).
    fn text_width(&self, name: &str, text: &str, size_pt: f64) -> f64;

    /// Emit the indirect objects required to embed or reference the font.
    /// The first object returned is the font dictionary that page resource
    /// dictionaries reference under `/F{font_id}`.
    fn font_objects(&self, name: &str, font_id: u32) -> Vec<Object>;
}
