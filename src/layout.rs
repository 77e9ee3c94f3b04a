//! Metric-based text layout: width computation, word wrap, box alignment.

use crate::error::{Diagnostic, DiagnosticCode};
use crate::writer::font_manager::BuiltInFont;

/// Compute the rendered width in points of `text` for a built-in face.
///
/// Sums per-character widths (thousandths of an em) from the face's static
/// table, scales by font size and by the horizontal-scaling percentage.
/// Characters above U+00FF are excluded from the sum and reported, one
/// diagnostic per occurrence.
pub fn builtin_text_width(
    face: BuiltInFont,
    text: &str,
    size_pt: f64,
    hscale_pct: f64,
    operation: &'static str,
) -> (f64, Vec<Diagnostic>) {
    let table = face.widths();
    let mut milliunits: u64 = 0;
    let mut diagnostics = Vec::new();
    for ch in text.chars() {
        match u8::try_from(u32::from(ch)) {
            Ok(code) => milliunits += u64::from(table[code as usize]),
            Err(_) => diagnostics.push(Diagnostic::new(
                DiagnosticCode::CharOutOfRange,
                operation,
                "character outside the 0-255 range excluded from width",
                ch.to_string(),
            )),
        }
    }
    let width = milliunits as f64 / 1000.0 * size_pt * (hscale_pct / 100.0);
    (width, diagnostics)
}

/// Wrap `text` into lines no wider than `max_width_pt` under `measure`.
///
/// Input is first split on `\n`; each segment is consumed front to back.
/// The fit search runs in three passes — halve the candidate length until
/// it fits, grow it again in 20%-relative steps while it still fits, then
/// shrink by one until it fits exactly. Width is not monotonic in naive
/// character count once multi-byte characters are involved, so a plain
/// binary search can both overshoot and undershoot; the grow pass recovers
/// the overshoot. The cut then walks back to the nearest preceding
/// whitespace so words are never split, falling back to the raw best-fit
/// length when the segment has no whitespace. Every character of the input
/// except the `\n` separators appears in exactly one output line, and at
/// least one character is consumed per line, so a single over-wide word
/// cannot loop.
pub fn wrap_text<F: Fn(&str) -> f64>(text: &str, max_width_pt: f64, measure: F) -> Vec<String> {
    let mut lines = Vec::new();
    for segment in text.split('\n') {
        let chars: Vec<char> = segment.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut start = 0;
        while start < chars.len() {
            let rest = &chars[start..];
            let rest_str: String = rest.iter().collect();
            if measure(&rest_str) <= max_width_pt {
                lines.push(rest_str);
                break;
            }

            let fits = |len: usize| {
                let candidate: String = rest[..len].iter().collect();
                measure(&candidate) <= max_width_pt
            };

            // Pass one: halve until the candidate fits.
            let mut len = rest.len();
            while len > 1 && !fits(len) {
                len /= 2;
            }
            // Then single steps down, in case halving was not enough.
            while len > 1 && !fits(len) {
                len -= 1;
            }
            // Pass two: grow back in 20%-relative steps while it still fits.
            loop {
                let grown = (len + (len / 5).max(1)).min(rest.len());
                if grown > len && fits(grown) {
                    len = grown;
                } else {
                    break;
                }
            }
            // Pass three: shrink by one until it fits exactly.
            while len > 1 && !fits(len) {
                len -= 1;
            }

            // Prefer a whitespace boundary; keep the break character on the
            // emitted line so no input character is lost. A space directly
            // after the candidate also counts as a boundary (the candidate
            // ends exactly on a word).
            let cut = if rest.get(len).is_some_and(|c| c.is_whitespace()) {
                len + 1
            } else {
                rest[..len]
                    .iter()
                    .rposition(|c| c.is_whitespace())
                    .map(|p| p + 1)
                    .unwrap_or(len)
            };
            let cut = cut.max(1);
            lines.push(rest[..cut].iter().collect());
            start += cut;
        }
    }
    lines
}

/// Horizontal box alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    /// Flush left with a 1/6-em inset
    Left,
    /// Flush right with a 1/6-em inset
    Right,
}

/// Vertical box alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    /// First line near the top edge
    Top,
    /// Last line 4 points above the bottom edge
    Bottom,
}

/// A box alignment: up to one horizontal and one vertical component.
/// A missing component centers that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxAlign {
    /// Horizontal component, `None` = centered
    pub horizontal: Option<HAlign>,
    /// Vertical component, `None` = centered
    pub vertical: Option<VAlign>,
}

impl BoxAlign {
    /// Parse an alignment spec from letters `L`, `R`, `T`, `B`
    /// (case-insensitive, other characters ignored). Later letters win on
    /// the same axis.
    pub fn parse(spec: &str) -> BoxAlign {
        let mut align = BoxAlign::default();
        for ch in spec.chars() {
            match ch.to_ascii_uppercase() {
                'L' => align.horizontal = Some(HAlign::Left),
                'R' => align.horizontal = Some(HAlign::Right),
                'T' => align.vertical = Some(VAlign::Top),
                'B' => align.vertical = Some(VAlign::Bottom),
                _ => {},
            }
        }
        align
    }
}

/// Fixed inset under the top edge for top-aligned text.
const TOP_INSET_PT: f64 = 2.0;
/// Fixed margin above the bottom edge for bottom-aligned text.
const BOTTOM_MARGIN_PT: f64 = 4.0;

/// Position wrapped lines inside a device-space box.
///
/// `box_y` is the top edge in device coordinates (Y grows downward);
/// `line_widths` holds each line's rendered width in points. Lines advance
/// downward by one font size per line. Returns `(x, baseline_y)` per line.
pub fn align_lines(
    align: BoxAlign,
    box_x: f64,
    box_y: f64,
    box_w: f64,
    box_h: f64,
    size_pt: f64,
    line_widths: &[f64],
) -> Vec<(f64, f64)> {
    let n = line_widths.len() as f64;
    let block_top = match align.vertical {
        Some(VAlign::Top) => box_y + TOP_INSET_PT,
        Some(VAlign::Bottom) => box_y + box_h - BOTTOM_MARGIN_PT - n * size_pt,
        None => box_y + (box_h - n * size_pt) / 2.0,
    };
    let side_inset = size_pt / 6.0;
    line_widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            let x = match align.horizontal {
                Some(HAlign::Left) => box_x + side_inset,
                Some(HAlign::Right) => box_x + box_w - w - side_inset,
                None => box_x + (box_w - w) / 2.0,
            };
            let baseline = block_top + (i as f64 + 1.0) * size_pt;
            (x, baseline)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helv(text: &str) -> f64 {
        builtin_text_width(BuiltInFont::Helvetica, text, 12.0, 100.0, "test").0
    }

    #[test]
    fn test_width_scales_with_size_and_hscale() {
        let (w100, _) = builtin_text_width(BuiltInFont::Helvetica, "Wide", 10.0, 100.0, "test");
        let (w50, _) = builtin_text_width(BuiltInFont::Helvetica, "Wide", 10.0, 50.0, "test");
        assert!((w100 - 2.0 * w50).abs() < 1e-9);
        let (w20, _) = builtin_text_width(BuiltInFont::Helvetica, "Wide", 20.0, 100.0, "test");
        assert!((w20 - 2.0 * w100).abs() < 1e-9);
    }

    #[test]
    fn test_width_excludes_out_of_range_chars() {
        let (with, diags) = builtin_text_width(BuiltInFont::Helvetica, "a\u{4E2D}b", 12.0, 100.0, "test");
        let (without, _) = builtin_text_width(BuiltInFont::Helvetica, "ab", 12.0, 100.0, "test");
        assert!((with - without).abs() < 1e-9);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::CharOutOfRange);
    }

    #[test]
    fn test_wrap_matches_greedy_for_ascii() {
        let text = "the quick brown fox jumps over the lazy dog";
        let max = helv("the quick brown ");
        let lines = wrap_text(text, max, helv);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(helv(line.trim_end()) <= max + 1e-9, "line too wide: {:?}", line);
        }
    }

    #[test]
    fn test_wrap_preserves_every_character() {
        let text = "alpha beta gamma\ndelta epsilon zeta eta theta";
        let lines = wrap_text(text, helv("alpha beta"), helv);
        let rejoined: String = lines.concat();
        assert_eq!(rejoined, text.replace('\n', ""));
    }

    #[test]
    fn test_wrap_never_loops_on_overwide_word() {
        let text = "Pneumonoultramicroscopicsilicovolcanoconiosis";
        let lines = wrap_text(text, helv("abc"), helv);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn test_wrap_keeps_blank_lines() {
        let lines = wrap_text("a\n\nb", 1000.0, helv);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_box_align_parse() {
        assert_eq!(
            BoxAlign::parse("LT"),
            BoxAlign {
                horizontal: Some(HAlign::Left),
                vertical: Some(VAlign::Top)
            }
        );
        assert_eq!(BoxAlign::parse(""), BoxAlign::default());
        assert_eq!(BoxAlign::parse("rb").horizontal, Some(HAlign::Right));
    }

    #[test]
    fn test_align_lines_vertical_modes() {
        let widths = [50.0, 30.0];
        let size = 10.0;
        let top = align_lines(BoxAlign::parse("T"), 0.0, 100.0, 200.0, 100.0, size, &widths);
        assert!((top[0].1 - 112.0).abs() < 1e-9); // 100 + 2 + 10
        let bottom = align_lines(BoxAlign::parse("B"), 0.0, 100.0, 200.0, 100.0, size, &widths);
        assert!((bottom[1].1 - 196.0).abs() < 1e-9); // 100 + 100 - 4
        let center = align_lines(BoxAlign::default(), 0.0, 100.0, 200.0, 100.0, size, &widths);
        assert!((center[0].1 - 150.0).abs() < 1e-9); // 100 + (100-20)/2 + 10
    }

    #[test]
    fn test_align_lines_horizontal_modes() {
        let widths = [60.0];
        let size = 12.0;
        let left = align_lines(BoxAlign::parse("L"), 10.0, 0.0, 100.0, 50.0, size, &widths);
        assert!((left[0].0 - 12.0).abs() < 1e-9); // 10 + 12/6
        let right = align_lines(BoxAlign::parse("R"), 10.0, 0.0, 100.0, 50.0, size, &widths);
        assert!((right[0].0 - 48.0).abs() < 1e-9); // 10 + 100 - 60 - 2
        let center = align_lines(BoxAlign::default(), 10.0, 0.0, 100.0, 50.0, size, &widths);
        assert!((center[0].0 - 30.0).abs() < 1e-9); // 10 + (100-60)/2
    }
}
