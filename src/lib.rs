#![warn(missing_docs)]

//! # pdf_scribe
//!
//! Programmatic PDF generation in pure Rust. An ordered sequence of drawing
//! and text commands becomes a valid page-description byte stream: all
//! geometry, text layout, color resolution, image encoding, and
//! container-format serialization happen in-process.
//!
//! ## Core features
//!
//! - **Drawing primitives**: lines, rectangles, circles and ellipses (exact
//!   four-segment Bézier approximation), positioned text, wrapped and
//!   aligned text boxes, raster images
//! - **Text layout**: metric-based widths from the built-in font tables,
//!   greedy word wrap, box alignment
//! - **Colors**: web/X11 names and `#RRGGBB` codes, case- and
//!   separator-insensitive
//! - **Images**: PNG/JPEG/GIF decoding, content-hash deduplication, alpha
//!   compositing against a backdrop color
//! - **Output**: deterministic object/xref/trailer serialization with
//!   optional per-stream Flate compression
//! - **Diagnostics**: no panics — every failure substitutes a safe default
//!   and queues an ordered [`Diagnostic`] record
//!
//! ## Quick start
//!
//! ```
//! use pdf_scribe::{Document, DocumentConfig, PaintStyle};
//!
//! let mut doc = Document::with_config(
//!     DocumentConfig::new().paper("A4").unit("mm").title("Invoice"),
//! );
//! doc.set_font("Helvetica-Bold", 16.0);
//! doc.text(20.0, 20.0, "Hello, page one");
//! doc.set_color("steel blue");
//! doc.rect(20.0, 30.0, 60.0, 25.0, PaintStyle::FillStroke);
//! doc.circle(120.0, 60.0, 15.0, PaintStyle::Stroke);
//! let bytes = doc.export();
//! assert!(bytes.starts_with(b"%PDF-1.4"));
//! ```
//!
//! Concurrency: a [`Document`] is single-threaded by design; serialize
//! access externally if you must share one.

pub mod color;
pub mod document;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod source;
pub mod writer;

pub use color::Color;
pub use document::{Document, DocumentConfig};
pub use error::{Diagnostic, DiagnosticCode, Resolved};
pub use source::DataSource;
pub use writer::content_stream::PaintStyle;
pub use writer::font_manager::{BuiltInFont, FontHandler};
