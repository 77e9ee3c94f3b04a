//! Coordinate conversion and curve math.
//!
//! Public coordinates are expressed in the active measurement unit with the
//! Y axis growing upward from the page bottom. Content streams use points
//! with Y growing downward from the page top, so every drawing call passes
//! through [`Device`] before touching a page buffer.

use crate::error::{Diagnostic, DiagnosticCode, Resolved};

/// Bézier control-point offset ratio for a quarter-circle arc,
/// `4/3 * tan(pi/8)`. Every ellipse is exactly four cubic segments with
/// this ratio; emitted bytes are stable across versions, so neither the
/// constant nor the segment count may change.
pub const CIRCLE_KAPPA: f64 = 0.552284749830794;

/// A measurement unit and its points-per-unit factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Typographic points (1.0)
    Pt,
    /// Millimeters (72 / 25.4)
    Mm,
    /// Centimeters (72 / 2.54)
    Cm,
    /// Inches (72.0)
    In,
}

impl Unit {
    /// Resolve a unit name. Unknown names report a diagnostic; the caller
    /// falls back to points.
    pub fn from_name(name: &str, operation: &'static str) -> Resolved<Unit> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pt" | "point" | "points" => Ok(Unit::Pt),
            "mm" | "millimeter" | "millimeters" => Ok(Unit::Mm),
            "cm" | "centimeter" | "centimeters" => Ok(Unit::Cm),
            "in" | "inch" | "inches" => Ok(Unit::In),
            _ => Err(Diagnostic::new(
                DiagnosticCode::UnknownUnit,
                operation,
                "unknown measurement unit",
                name,
            )),
        }
    }

    /// Points per one unit.
    pub fn points_per_unit(self) -> f64 {
        match self {
            Unit::Pt => 1.0,
            Unit::Mm => 72.0 / 25.4,
            Unit::Cm => 72.0 / 2.54,
            Unit::In => 72.0,
        }
    }
}

/// A named paper size with dimensions in points.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperSize {
    /// Canonical size name ("A4", "Letter", ...)
    pub name: &'static str,
    /// Width in points
    pub width_pt: f64,
    /// Height in points
    pub height_pt: f64,
}

impl PaperSize {
    /// Resolve a paper size by name, case-insensitively. Unknown names
    /// report a diagnostic; the caller falls back to A4.
    pub fn from_name(name: &str, operation: &'static str) -> Resolved<PaperSize> {
        let (canonical, w, h) = match name.trim().to_ascii_lowercase().as_str() {
            "a3" => ("A3", 841.89, 1190.55),
            "a4" => ("A4", 595.28, 841.89),
            "a5" => ("A5", 420.94, 595.28),
            "letter" => ("Letter", 612.0, 792.0),
            "legal" => ("Legal", 612.0, 1008.0),
            _ => {
                return Err(Diagnostic::new(
                    DiagnosticCode::UnknownPaperSize,
                    operation,
                    "unknown paper size",
                    name,
                ))
            },
        };
        Ok(PaperSize {
            name: canonical,
            width_pt: w,
            height_pt: h,
        })
    }

    /// The default fallback paper size.
    pub fn a4() -> PaperSize {
        PaperSize {
            name: "A4",
            width_pt: 595.28,
            height_pt: 841.89,
        }
    }
}

/// Converts user-space coordinates to device points for one page size and
/// unit factor.
#[derive(Debug, Clone, Copy)]
pub struct Device {
    /// Points per user unit
    pub k: f64,
    /// Page height in points, for the Y-axis flip
    pub page_height_pt: f64,
}

impl Device {
    /// Convert a length in user units to points.
    pub fn to_points(&self, v: f64) -> f64 {
        v * self.k
    }

    /// Convert a length in points back to user units.
    pub fn to_units(&self, pt: f64) -> f64 {
        pt / self.k
    }

    /// Convert a user-space point (Y up from the bottom) to device space
    /// (Y down from the top).
    pub fn to_device(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.k, self.page_height_pt - y * self.k)
    }
}

/// One cubic Bézier segment: two control points and an end point, all in
/// device space.
pub type BezierSegment = [(f64, f64); 3];

/// Approximate a full ellipse centered at `(cx, cy)` with radii
/// `(rx, ry)` — all in device points — as a start point plus exactly four
/// cubic segments, one per quadrant.
pub fn ellipse_segments(cx: f64, cy: f64, rx: f64, ry: f64) -> ((f64, f64), [BezierSegment; 4]) {
    let lx = CIRCLE_KAPPA * rx;
    let ly = CIRCLE_KAPPA * ry;
    let start = (cx + rx, cy);
    let segments = [
        [(cx + rx, cy - ly), (cx + lx, cy - ry), (cx, cy - ry)],
        [(cx - lx, cy - ry), (cx - rx, cy - ly), (cx - rx, cy)],
        [(cx - rx, cy + ly), (cx - lx, cy + ry), (cx, cy + ry)],
        [(cx + lx, cy + ry), (cx + rx, cy + ly), (cx + rx, cy)],
    ];
    (start, segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_roundtrip() {
        for unit in [Unit::Pt, Unit::Mm, Unit::Cm, Unit::In] {
            let dev = Device {
                k: unit.points_per_unit(),
                page_height_pt: 842.0,
            };
            for v in [0.0, 1.0, 13.37, 250.25] {
                let roundtrip = dev.to_units(dev.to_points(v));
                assert!((roundtrip - v).abs() < 1e-9, "{:?} {}", unit, v);
            }
        }
    }

    #[test]
    fn test_y_axis_flip() {
        let dev = Device {
            k: 1.0,
            page_height_pt: 792.0,
        };
        assert_eq!(dev.to_device(0.0, 0.0), (0.0, 792.0));
        assert_eq!(dev.to_device(100.0, 792.0), (100.0, 0.0));
    }

    #[test]
    fn test_unknown_unit_falls_through() {
        let err = Unit::from_name("furlong", "new").unwrap_err();
        assert_eq!(err.code, DiagnosticCode::UnknownUnit);
    }

    #[test]
    fn test_paper_sizes() {
        let a4 = PaperSize::from_name("a4", "new").unwrap();
        assert_eq!(a4.name, "A4");
        assert!((a4.width_pt - 595.28).abs() < 1e-9);
        let letter = PaperSize::from_name("LETTER", "new").unwrap();
        assert_eq!((letter.width_pt, letter.height_pt), (612.0, 792.0));
        assert!(PaperSize::from_name("tabloid-ish", "new").is_err());
    }

    #[test]
    fn test_ellipse_has_four_segments_with_kappa_offsets() {
        let r = 10.0;
        let (start, segments) = ellipse_segments(0.0, 0.0, r, r);
        assert_eq!(start, (r, 0.0));
        assert_eq!(segments.len(), 4);
        // First control point of the first quadrant sits kappa*r below the
        // start point.
        let (c1x, c1y) = segments[0][0];
        assert!((c1x - r).abs() < 1e-12);
        assert!((c1y + CIRCLE_KAPPA * r).abs() < 1e-12);
        // Each quadrant ends on the circle.
        for seg in &segments {
            let (ex, ey) = seg[2];
            assert!(((ex * ex + ey * ey).sqrt() - r).abs() < 1e-9);
        }
    }
}
