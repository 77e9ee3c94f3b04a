//! The document model and public drawing API.
//!
//! A [`Document`] owns the page list, font table, image table, metadata,
//! and the diagnostics queue, and composes the color resolver, geometry,
//! layout, and image pipeline into content-stream bytes. Export walks the
//! completed model once and serializes it; nothing here performs I/O
//! except the thin [`Document::save`] convenience.

use std::collections::VecDeque;

use crate::color::{self, Color};
use crate::error::{Diagnostic, DiagnosticCode, Resolved};
use crate::geometry::{ellipse_segments, Device, PaperSize, Unit};
use crate::layout::{align_lines, builtin_text_width, wrap_text, BoxAlign};
use crate::source::DataSource;
use crate::writer::content_stream::{Page, PaintStyle};
use crate::writer::font_manager::{FontHandler, FontKind, FontRegistry};
use crate::writer::image_handler::ImageStore;
use crate::writer::pdf_writer::{write_document, ExportInput, Metadata};

/// Default font selected when text is drawn before any `set_font` call.
const DEFAULT_FONT_NAME: &str = "Helvetica";
const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Construction-time configuration, builder style.
#[derive(Debug, Clone, Default)]
pub struct DocumentConfig {
    paper: Option<String>,
    unit: Option<String>,
    compress: bool,
    metadata: Metadata,
}

impl DocumentConfig {
    /// Start from the defaults: A4, points, compression off, no metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the paper size by name ("A3", "A4", "A5", "Letter", "Legal").
    pub fn paper(mut self, name: impl Into<String>) -> Self {
        self.paper = Some(name.into());
        self
    }

    /// Set the measurement unit by name ("pt", "mm", "cm", "in").
    pub fn unit(mut self, name: impl Into<String>) -> Self {
        self.unit = Some(name.into());
        self
    }

    /// Enable or disable stream compression.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the document title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    /// Set the document author.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.metadata.author = Some(author.into());
        self
    }

    /// Set the document subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.metadata.subject = Some(subject.into());
        self
    }

    /// Set the document keywords.
    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.metadata.keywords = Some(keywords.into());
        self
    }

    /// Set the creator application.
    pub fn creator(mut self, creator: impl Into<String>) -> Self {
        self.metadata.creator = Some(creator.into());
        self
    }
}

/// A document being assembled. One instance produces one output document.
///
/// Not internally synchronized: concurrent use from multiple threads must
/// be serialized by the caller.
pub struct Document {
    paper: PaperSize,
    unit: Unit,
    compress: bool,
    metadata: Metadata,
    current_color: Color,
    line_width_pt: f64,
    font_id: Option<u32>,
    font_size: f64,
    hscale_pct: f64,
    pages: Vec<Page>,
    current_page: usize,
    fonts: FontRegistry,
    images: ImageStore,
    diagnostics: VecDeque<Diagnostic>,
    font_handler: Option<Box<dyn FontHandler>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with the default configuration (A4, points).
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::new())
    }

    /// Create a document from a configuration. Unknown paper or unit names
    /// fall back to A4 and points, each with a queued diagnostic.
    pub fn with_config(config: DocumentConfig) -> Self {
        let mut diagnostics = VecDeque::new();
        let paper = match config.paper.as_deref() {
            None => PaperSize::a4(),
            Some(name) => PaperSize::from_name(name, "new").unwrap_or_else(|d| {
                diagnostics.push_back(d);
                PaperSize::a4()
            }),
        };
        let unit = match config.unit.as_deref() {
            None => Unit::Pt,
            Some(name) => Unit::from_name(name, "new").unwrap_or_else(|d| {
                diagnostics.push_back(d);
                Unit::Pt
            }),
        };
        Self {
            paper,
            unit,
            compress: config.compress,
            metadata: config.metadata,
            current_color: Color::BLACK,
            line_width_pt: 1.0,
            font_id: None,
            font_size: DEFAULT_FONT_SIZE,
            hscale_pct: 100.0,
            pages: Vec::new(),
            current_page: 0,
            fonts: FontRegistry::new(),
            images: ImageStore::new(),
            diagnostics,
            font_handler: None,
        }
    }

    // --- configuration -------------------------------------------------

    /// Install the strategy for fonts outside the built-in set.
    pub fn set_font_handler(&mut self, handler: Box<dyn FontHandler>) {
        self.font_handler = Some(handler);
    }

    /// Switch the active measurement unit. Unknown names keep the current
    /// unit and queue a diagnostic.
    pub fn set_unit(&mut self, name: &str) {
        match Unit::from_name(name, "set_unit") {
            Ok(unit) => self.unit = unit,
            Err(diag) => self.report(diag),
        }
    }

    /// Enable or disable stream compression for the eventual export.
    pub fn set_compression(&mut self, compress: bool) {
        self.compress = compress;
    }

    /// Set the document title.
    pub fn set_title(&mut self, title: &str) {
        self.metadata.title = Some(title.to_string());
    }

    /// Set the document author.
    pub fn set_author(&mut self, author: &str) {
        self.metadata.author = Some(author.to_string());
    }

    /// Set the document subject.
    pub fn set_subject(&mut self, subject: &str) {
        self.metadata.subject = Some(subject.to_string());
    }

    /// Set the document keywords.
    pub fn set_keywords(&mut self, keywords: &str) {
        self.metadata.keywords = Some(keywords.to_string());
    }

    /// Set the creator application.
    pub fn set_creator(&mut self, creator: &str) {
        self.metadata.creator = Some(creator.to_string());
    }

    /// The resolved paper size.
    pub fn paper(&self) -> &PaperSize {
        &self.paper
    }

    /// Number of pages added so far (zero until first use).
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    // --- diagnostics ---------------------------------------------------

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push_back(diagnostic);
    }

    /// Pop the oldest queued diagnostic, if any.
    pub fn pop_diagnostic(&mut self) -> Option<Diagnostic> {
        self.diagnostics.pop_front()
    }

    /// Iterate the queued diagnostics in order without draining them.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Whether any diagnostic is queued.
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Number of queued diagnostics.
    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Drop all queued diagnostics.
    pub fn clear_diagnostics(&mut self) {
        self.diagnostics.clear();
    }

    // --- geometry helpers ----------------------------------------------

    fn device(&self) -> Device {
        Device {
            k: self.unit.points_per_unit(),
            page_height_pt: self.paper.height_pt,
        }
    }

    /// Convert a length in the active unit to points.
    pub fn to_points(&self, v: f64) -> f64 {
        self.device().to_points(v)
    }

    /// Convert a length in points to the active unit.
    pub fn to_units(&self, pt: f64) -> f64 {
        self.device().to_units(pt)
    }

    // --- pages and cursor ----------------------------------------------

    /// Append a new page and make it current.
    pub fn add_page(&mut self) {
        self.pages.push(Page::new());
        self.current_page = self.pages.len() - 1;
    }

    /// The current page, created lazily on first use.
    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.add_page();
        }
        &mut self.pages[self.current_page]
    }

    /// Current cursor X in the active unit.
    pub fn x(&self) -> f64 {
        let k = self.unit.points_per_unit();
        self.pages.get(self.current_page).map_or(0.0, |p| p.cursor.0 / k)
    }

    /// Current cursor Y in the active unit.
    pub fn y(&self) -> f64 {
        let dev = self.device();
        self.pages
            .get(self.current_page)
            .map_or(0.0, |p| (dev.page_height_pt - p.cursor.1) / dev.k)
    }

    // --- state setters -------------------------------------------------

    /// Select the current font by name, in points. Unknown names fall back
    /// to the default built-in face with a queued diagnostic.
    pub fn set_font(&mut self, name: &str, size_pt: f64) {
        let (id, diag) = self.fonts.register(name, self.font_handler.as_deref(), "set_font");
        if let Some(diag) = diag {
            self.report(diag);
        }
        self.font_id = Some(id);
        self.font_size = size_pt;
    }

    /// Change only the current font size, in points.
    pub fn set_font_size(&mut self, size_pt: f64) {
        self.font_size = size_pt;
    }

    /// Set the horizontal scaling percentage (100 = normal).
    pub fn set_horizontal_scaling(&mut self, percent: f64) {
        self.hscale_pct = percent;
    }

    /// Set the current line width in the active unit.
    pub fn set_line_width(&mut self, width: f64) {
        self.line_width_pt = self.to_points(width);
    }

    /// Set the current color from a name or `#RRGGBB` code. Failures keep
    /// black and queue a diagnostic.
    pub fn set_color(&mut self, spec: &str) {
        match color::resolve(spec, "set_color") {
            Ok(c) => self.current_color = c,
            Err(diag) => {
                self.report(diag);
                self.current_color = Color::BLACK;
            },
        }
    }

    /// Set the current color from RGB components.
    pub fn set_color_rgb(&mut self, r: u8, g: u8, b: u8) {
        self.current_color = Color::rgb(r, g, b);
    }

    /// Load a font through the installed handler.
    pub fn load_font(&mut self, name: &str, source: DataSource) -> Resolved<()> {
        let result = match self.font_handler.as_mut() {
            Some(handler) => handler.load(name, source),
            None => Err(Diagnostic::new(
                DiagnosticCode::FontLoadFailed,
                "load_font",
                "no font handler installed",
                name,
            )),
        };
        if let Err(diag) = &result {
            self.report(diag.clone());
        }
        result
    }

    // --- font metrics ----------------------------------------------------

    fn ensure_font(&mut self) -> u32 {
        match self.font_id {
            Some(id) => id,
            None => {
                let (id, _) = self.fonts.register(DEFAULT_FONT_NAME, None, "set_font");
                self.font_id = Some(id);
                id
            },
        }
    }

    /// Width of `text` in points under the current font, size, and
    /// horizontal scaling, without queuing diagnostics.
    fn measure_pt(&self, font_id: u32, text: &str) -> f64 {
        let entry = match self.fonts.get(font_id) {
            Some(entry) => entry,
            None => return 0.0,
        };
        match entry.kind {
            FontKind::BuiltIn(face) => {
                builtin_text_width(face, text, self.font_size, self.hscale_pct, "text_width").0
            },
            FontKind::External => self
                .font_handler
                .as_deref()
                .map(|h| h.text_width(&entry.name, text, self.font_size) * self.hscale_pct / 100.0)
                .unwrap_or(0.0),
        }
    }

    /// Width of `text` in the active unit under the current font state.
    /// Characters above the supported range are excluded and reported.
    pub fn text_width(&mut self, text: &str) -> f64 {
        let font_id = self.ensure_font();
        let kind = self.fonts.get(font_id).map(|entry| entry.kind);
        let width_pt = match kind {
            Some(FontKind::BuiltIn(face)) => {
                let (w, diags) =
                    builtin_text_width(face, text, self.font_size, self.hscale_pct, "text_width");
                for diag in diags {
                    self.report(diag);
                }
                w
            },
            Some(FontKind::External) => self.measure_pt(font_id, text),
            None => 0.0,
        };
        self.to_units(width_pt)
    }

    /// Wrap `text` to fit `width` (active unit) under the current font
    /// state, returning the produced lines.
    pub fn wrap_text(&mut self, width: f64, text: &str) -> Vec<String> {
        let font_id = self.ensure_font();
        let max_pt = self.to_points(width);
        wrap_text(text, max_pt, |s| self.measure_pt(font_id, s))
    }

    // --- drawing --------------------------------------------------------

    fn report_wide_chars(&mut self, text: &str, operation: &'static str) {
        for ch in text.chars() {
            if u32::from(ch) > 0xFF {
                self.report(Diagnostic::new(
                    DiagnosticCode::CharOutOfRange,
                    operation,
                    "character outside the 0-255 range dropped from output",
                    ch.to_string(),
                ));
            }
        }
    }

    /// Show `text` with its baseline at `(x, y)` in the active unit.
    pub fn text(&mut self, x: f64, y: f64, text: &str) {
        let font_id = self.ensure_font();
        self.report_wide_chars(text, "text");
        let (dx, dy) = self.device().to_device(x, y);
        let (color, size, hscale) = (self.current_color, self.font_size, self.hscale_pct);
        let page = self.page();
        page.set_fill_color(color);
        page.set_font(font_id, size);
        page.set_horizontal_scaling(hscale);
        page.show_text(dx, dy, text);
        page.cursor = (dx, dy);
    }

    /// Wrap `text` into the box with corner `(x, y)` and extents `(w, h)`
    /// in the active unit, then align it. The alignment spec uses up to
    /// one of `L`/`R` and one of `T`/`B`; a missing letter centers that
    /// axis.
    pub fn text_box(&mut self, x: f64, y: f64, w: f64, h: f64, text: &str, align: &str) {
        let font_id = self.ensure_font();
        self.report_wide_chars(text, "text_box");
        let align = BoxAlign::parse(align);
        let dev = self.device();
        let (box_x, box_w, box_h) = (dev.to_points(x), dev.to_points(w), dev.to_points(h));
        let box_top = dev.to_points(y);

        let max_pt = box_w - self.font_size / 3.0; // side insets on both edges
        let lines = wrap_text(text, max_pt.max(1.0), |s| self.measure_pt(font_id, s));
        let widths: Vec<f64> = lines
            .iter()
            .map(|line| self.measure_pt(font_id, line.trim_end()))
            .collect();
        let placed = align_lines(align, box_x, box_top, box_w, box_h, self.font_size, &widths);

        let (color, size, hscale) = (self.current_color, self.font_size, self.hscale_pct);
        let page_height = dev.page_height_pt;
        let page = self.page();
        page.set_fill_color(color);
        page.set_font(font_id, size);
        page.set_horizontal_scaling(hscale);
        for (line, (lx, baseline)) in lines.iter().zip(placed) {
            page.show_text(lx, page_height - baseline, line.trim_end());
        }
    }

    /// Draw a straight line between two points in the active unit.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let dev = self.device();
        let (ax, ay) = dev.to_device(x1, y1);
        let (bx, by) = dev.to_device(x2, y2);
        let (color, width) = (self.current_color, self.line_width_pt);
        let page = self.page();
        page.set_stroke_color(color);
        page.set_line_width(width);
        page.move_to(ax, ay);
        page.line_to(bx, by);
        page.paint(PaintStyle::Stroke);
    }

    /// Begin a path at `(x, y)`, moving the cursor.
    pub fn move_to(&mut self, x: f64, y: f64) {
        let (dx, dy) = self.device().to_device(x, y);
        let (color, width) = (self.current_color, self.line_width_pt);
        let page = self.page();
        page.set_stroke_color(color);
        page.set_line_width(width);
        page.move_to(dx, dy);
    }

    /// Continue the current path with a line segment to `(x, y)`.
    pub fn line_to(&mut self, x: f64, y: f64) {
        let (dx, dy) = self.device().to_device(x, y);
        self.page().line_to(dx, dy);
    }

    /// Stroke the path built by `move_to`/`line_to`.
    pub fn stroke_path(&mut self) {
        self.page().paint(PaintStyle::Stroke);
    }

    fn prepare_paint(&mut self, style: PaintStyle) {
        let (color, width) = (self.current_color, self.line_width_pt);
        let page = self.page();
        match style {
            PaintStyle::Stroke => {
                page.set_stroke_color(color);
                page.set_line_width(width);
            },
            PaintStyle::Fill => page.set_fill_color(color),
            PaintStyle::FillStroke => {
                page.set_stroke_color(color);
                page.set_fill_color(color);
                page.set_line_width(width);
            },
        }
    }

    /// Draw a rectangle with corner `(x, y)` and extents `(w, h)` in the
    /// active unit.
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: PaintStyle) {
        self.prepare_paint(style);
        let dev = self.device();
        let (w_pt, h_pt) = (dev.to_points(w), dev.to_points(h));
        let (dx, dy) = dev.to_device(x, y);
        let page = self.page();
        page.rect(dx, dy - h_pt, w_pt, h_pt);
        page.paint(style);
    }

    /// Draw a circle centered at `(x, y)` with radius `r` in the active
    /// unit: one move plus exactly four Bézier segments.
    pub fn circle(&mut self, x: f64, y: f64, r: f64, style: PaintStyle) {
        self.ellipse(x, y, r, r, style);
    }

    /// Draw an ellipse centered at `(x, y)` with radii `(rx, ry)` in the
    /// active unit.
    pub fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, style: PaintStyle) {
        self.prepare_paint(style);
        let dev = self.device();
        let (cx, cy) = dev.to_device(x, y);
        let (start, segments) = ellipse_segments(cx, cy, dev.to_points(rx), dev.to_points(ry));
        let page = self.page();
        page.move_to(start.0, start.1);
        for segment in segments {
            page.curve_to(segment);
        }
        page.paint(style);
    }

    /// Draw an image into the box `(x, y, w, h)` in the active unit,
    /// compositing transparency against a white backdrop. Identical source
    /// bytes with an identical backdrop reuse one stored payload.
    pub fn draw_image(&mut self, source: DataSource, x: f64, y: f64, w: f64, h: f64) {
        self.draw_image_on(source, x, y, w, h, Color::WHITE);
    }

    /// Draw an image compositing transparency against an explicit backdrop
    /// color.
    pub fn draw_image_on(
        &mut self,
        source: DataSource,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        backdrop: Color,
    ) {
        let index = match self.images.ingest(source, backdrop, "draw_image") {
            Ok(index) => index,
            Err(diag) => {
                self.report(diag);
                return;
            },
        };
        let dev = self.device();
        let (w_pt, h_pt) = (dev.to_points(w), dev.to_points(h));
        let (dx, dy) = dev.to_device(x, y);
        self.page().draw_image(index, dx, dy - h_pt, w_pt, h_pt);
    }

    // --- lifecycle -------------------------------------------------------

    /// Discard all pages, fonts, images, metadata, and diagnostics while
    /// keeping the paper size and unit. Drawing state returns to defaults.
    pub fn reset(&mut self) {
        self.pages.clear();
        self.current_page = 0;
        self.fonts.clear();
        self.images.clear();
        self.metadata = Metadata::default();
        self.diagnostics.clear();
        self.current_color = Color::BLACK;
        self.line_width_pt = 1.0;
        self.font_id = None;
        self.font_size = DEFAULT_FONT_SIZE;
        self.hscale_pct = 100.0;
    }

    /// Serialize the document to its final byte buffer. The model is read,
    /// not consumed; further drawing and another export are allowed.
    pub fn export(&mut self) -> Vec<u8> {
        if self.pages.is_empty() {
            self.add_page();
        }
        let input = ExportInput {
            paper: &self.paper,
            compress: self.compress,
            metadata: &self.metadata,
            pages: &self.pages,
            fonts: &self.fonts,
            images: &self.images,
            font_handler: self.font_handler.as_deref(),
        };
        let (bytes, diagnostics) = write_document(&input);
        for diag in diagnostics {
            self.report(diag);
        }
        bytes
    }

    /// Export and write the buffer to disk. Write failures queue a
    /// diagnostic and are returned; the in-memory export is unaffected.
    pub fn save(&mut self, path: impl AsRef<std::path::Path>) -> Resolved<()> {
        let bytes = self.export();
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            let diag = Diagnostic::new(
                DiagnosticCode::FileWriteFailed,
                "save",
                format!("failed to write file: {}", e),
                path.as_ref().display().to_string(),
            );
            self.report(diag.clone());
            diag
        })
    }
}
