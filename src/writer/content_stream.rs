//! Per-page content streams and graphics-state diffing.
//!
//! Each page owns its content buffer plus a shadow copy of the last state
//! values actually emitted into it. State-setting calls compare against the
//! shadow first and append an operator only when something changed, which
//! keeps streams small and the emitted bytes stable.

use std::collections::BTreeSet;

use crate::color::Color;
use crate::geometry::BezierSegment;
use crate::writer::object_serializer::fmt_number;

/// How a finished path is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintStyle {
    /// Stroke the outline (`S`)
    Stroke,
    /// Fill the interior (`f`)
    Fill,
    /// Fill, then stroke (`B`)
    FillStroke,
}

impl PaintStyle {
    fn operator(self) -> &'static str {
        match self {
            PaintStyle::Stroke => "S",
            PaintStyle::Fill => "f",
            PaintStyle::FillStroke => "B",
        }
    }
}

/// One output page: content buffer, referenced resources, shadow graphics
/// state, and the drawing cursor in device points.
#[derive(Debug, Default)]
pub struct Page {
    buf: Vec<u8>,
    /// Font IDs referenced by this page's stream
    pub(crate) font_ids: BTreeSet<u32>,
    /// Image entry indices referenced by this page's stream
    pub(crate) image_indices: BTreeSet<usize>,
    /// Cursor position in device points
    pub(crate) cursor: (f64, f64),
    last_stroke: Option<Color>,
    last_fill: Option<Color>,
    last_line_width: Option<f64>,
    last_font: Option<(u32, f64)>,
    last_hscale: Option<f64>,
}

/// Truncate to two decimals; line widths are compared at this precision so
/// float noise does not re-emit `w` commands.
fn trunc2(v: f64) -> f64 {
    (v * 100.0).trunc() / 100.0
}

fn color_component(v: u8) -> String {
    fmt_number(f64::from(v) / 255.0)
}

/// Encode a text run as an escaped literal string body. Characters map to
/// their 0-255 code point byte (the built-in encoding is single-byte);
/// characters above that range were already reported upstream and are
/// skipped here.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => out.extend_from_slice(b"\\("),
            ')' => out.extend_from_slice(b"\\)"),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\n' => out.extend_from_slice(b"\\n"),
            _ => {
                if let Ok(byte) = u8::try_from(u32::from(ch)) {
                    out.push(byte);
                }
            },
        }
    }
    out
}

impl Page {
    /// Create an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated content-stream bytes.
    pub fn content(&self) -> &[u8] {
        &self.buf
    }

    fn emit(&mut self, line: &str) {
        self.buf.extend_from_slice(line.as_bytes());
        self.buf.push(b'\n');
    }

    /// Set the stroke color, emitting `RG` only on change. Compared as an
    /// exact RGBA tuple.
    pub fn set_stroke_color(&mut self, color: Color) {
        if self.last_stroke == Some(color) {
            return;
        }
        self.emit(&format!(
            "{} {} {} RG",
            color_component(color.r),
            color_component(color.g),
            color_component(color.b)
        ));
        self.last_stroke = Some(color);
    }

    /// Set the fill color, emitting `rg` only on change.
    pub fn set_fill_color(&mut self, color: Color) {
        if self.last_fill == Some(color) {
            return;
        }
        self.emit(&format!(
            "{} {} {} rg",
            color_component(color.r),
            color_component(color.g),
            color_component(color.b)
        ));
        self.last_fill = Some(color);
    }

    /// Set the line width in points, emitting `w` only when the value
    /// differs after two-decimal truncation.
    pub fn set_line_width(&mut self, width_pt: f64) {
        let truncated = trunc2(width_pt);
        if self.last_line_width == Some(truncated) {
            return;
        }
        self.emit(&format!("{} w", fmt_number(truncated)));
        self.last_line_width = Some(truncated);
    }

    /// Select a font by registry ID and size, emitting `Tf` only on change
    /// and recording the reference for the resource dictionary.
    pub fn set_font(&mut self, font_id: u32, size_pt: f64) {
        self.font_ids.insert(font_id);
        if self.last_font == Some((font_id, size_pt)) {
            return;
        }
        self.emit(&format!("/F{} {} Tf", font_id, fmt_number(size_pt)));
        self.last_font = Some((font_id, size_pt));
    }

    /// Set horizontal scaling percent, emitting `Tz` only on change.
    pub fn set_horizontal_scaling(&mut self, percent: f64) {
        if self.last_hscale == Some(percent) {
            return;
        }
        self.emit(&format!("{} Tz", fmt_number(percent)));
        self.last_hscale = Some(percent);
    }

    /// Begin a subpath at a device point (`m`) and move the cursor.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.emit(&format!("{} {} m", fmt_number(x), fmt_number(y)));
        self.cursor = (x, y);
    }

    /// Append a line segment (`l`) and move the cursor.
    pub fn line_to(&mut self, x: f64, y: f64) {
        self.emit(&format!("{} {} l", fmt_number(x), fmt_number(y)));
        self.cursor = (x, y);
    }

    /// Append a cubic Bézier segment (`c`).
    pub fn curve_to(&mut self, seg: BezierSegment) {
        let [(x1, y1), (x2, y2), (x3, y3)] = seg;
        self.emit(&format!(
            "{} {} {} {} {} {} c",
            fmt_number(x1),
            fmt_number(y1),
            fmt_number(x2),
            fmt_number(y2),
            fmt_number(x3),
            fmt_number(y3)
        ));
        self.cursor = (x3, y3);
    }

    /// Append a rectangle subpath (`re`).
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.emit(&format!(
            "{} {} {} {} re",
            fmt_number(x),
            fmt_number(y),
            fmt_number(w),
            fmt_number(h)
        ));
    }

    /// Paint the current path.
    pub fn paint(&mut self, style: PaintStyle) {
        self.emit(style.operator());
    }

    /// Show a text run at a device baseline position.
    pub fn show_text(&mut self, x: f64, y: f64, text: &str) {
        self.buf
            .extend_from_slice(format!("BT {} {} Td (", fmt_number(x), fmt_number(y)).as_bytes());
        self.buf.extend_from_slice(&encode_text(text));
        self.buf.extend_from_slice(b") Tj ET\n");
    }

    /// Paint an image XObject scaled into a device-space rectangle whose
    /// `y` is the bottom edge. Records the image reference.
    pub fn draw_image(&mut self, image_index: usize, x: f64, y: f64, w: f64, h: f64) {
        self.image_indices.insert(image_index);
        self.emit(&format!(
            "q {} 0 0 {} {} {} cm /I{} Do Q",
            fmt_number(w),
            fmt_number(h),
            fmt_number(x),
            fmt_number(y),
            image_index
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(page: &Page) -> String {
        String::from_utf8(page.content().to_vec()).unwrap()
    }

    #[test]
    fn test_stroke_color_emitted_once_per_change() {
        let mut page = Page::new();
        page.set_stroke_color(Color::rgb(255, 0, 0));
        page.set_stroke_color(Color::rgb(255, 0, 0));
        page.set_stroke_color(Color::rgb(0, 0, 255));
        let c = content(&page);
        assert_eq!(c.matches(" RG").count(), 2);
        assert!(c.contains("1 0 0 RG"));
        assert!(c.contains("0 0 1 RG"));
    }

    #[test]
    fn test_fill_and_stroke_tracked_independently() {
        let mut page = Page::new();
        page.set_fill_color(Color::rgb(0, 0, 0));
        page.set_stroke_color(Color::rgb(0, 0, 0));
        let c = content(&page);
        assert!(c.contains("0 0 0 rg"));
        assert!(c.contains("0 0 0 RG"));
    }

    #[test]
    fn test_line_width_truncation_suppresses_noise() {
        let mut page = Page::new();
        page.set_line_width(1.005);
        page.set_line_width(1.0049); // same after 2-decimal truncation
        page.set_line_width(1.02);
        let c = content(&page);
        assert_eq!(c.matches(" w\n").count(), 2);
        assert!(c.contains("1 w"));
        assert!(c.contains("1.02 w"));
    }

    #[test]
    fn test_font_diffing_and_resource_tracking() {
        let mut page = Page::new();
        page.set_font(1, 12.0);
        page.set_font(1, 12.0);
        page.set_font(1, 14.0);
        page.set_font(2, 14.0);
        let c = content(&page);
        assert_eq!(c.matches(" Tf").count(), 3);
        assert!(page.font_ids.contains(&1) && page.font_ids.contains(&2));
    }

    #[test]
    fn test_alpha_participates_in_color_identity() {
        let mut page = Page::new();
        let mut translucent = Color::rgb(10, 20, 30);
        translucent.a = 128;
        page.set_fill_color(Color::rgb(10, 20, 30));
        page.set_fill_color(translucent); // same RGB, different alpha: re-emitted
        assert_eq!(content(&page).matches(" rg").count(), 2);
    }

    #[test]
    fn test_text_escaping() {
        let mut page = Page::new();
        page.show_text(0.0, 0.0, "a(b)\\c");
        assert!(content(&page).contains("(a\\(b\\)\\\\c) Tj"));
    }

    #[test]
    fn test_text_encodes_latin1_and_skips_wide_chars() {
        let mut page = Page::new();
        page.show_text(0.0, 0.0, "caf\u{E9}\u{4E2D}!");
        let bytes = page.content();
        let open = bytes.iter().position(|&b| b == b'(').unwrap();
        let close = bytes.iter().position(|&b| b == b')').unwrap();
        assert_eq!(&bytes[open + 1..close], &[b'c', b'a', b'f', 0xE9, b'!']);
    }

    #[test]
    fn test_image_draw_records_reference() {
        let mut page = Page::new();
        page.draw_image(3, 10.0, 20.0, 100.0, 50.0);
        assert!(page.image_indices.contains(&3));
        assert!(content(&page).contains("q 100 0 0 50 10 20 cm /I3 Do Q"));
    }
}
