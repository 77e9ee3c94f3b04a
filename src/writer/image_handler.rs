//! Image ingestion: decode, deduplicate, alpha-composite, pack.
//!
//! Raster sources are decoded with the `image` crate, keyed by the Sha256
//! of their raw bytes combined with the backdrop color, and flattened to
//! alpha-free 1-channel (gray) or 3-channel (RGB) pixel buffers. Identical
//! source bytes with an identical backdrop always resolve to the same
//! entry and the same object index, across pages.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::color::Color;
use crate::error::{Diagnostic, DiagnosticCode, Resolved};
use crate::source::DataSource;

/// One distinct image payload in the document.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    /// Sha256 of the raw source bytes
    pub hash: [u8; 32],
    /// Backdrop color the alpha channel was resolved against
    pub backdrop: Color,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Whether the packed buffer is single-channel
    pub grayscale: bool,
    /// Packed pixel bytes, 1 or 3 channels per pixel, no alpha
    pub pixels: Vec<u8>,
}

/// Linear blend of a source channel toward the backdrop by the alpha
/// fraction, in round-half-up fixed point.
fn blend_channel(src: u8, backdrop: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(src) * a + u32::from(backdrop) * (255 - a) + 127) / 255) as u8
}

/// The document's deduplicated image table.
#[derive(Debug, Default)]
pub struct ImageStore {
    entries: Vec<ImageEntry>,
    by_key: HashMap<([u8; 32], Color), usize>,
}

impl ImageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest an image source against a backdrop color, returning the
    /// index of its (possibly pre-existing) entry.
    pub fn ingest(
        &mut self,
        source: DataSource,
        backdrop: Color,
        operation: &'static str,
    ) -> Resolved<usize> {
        let bytes = source.read_all(operation)?;
        let hash: [u8; 32] = Sha256::digest(&bytes).into();
        if let Some(&index) = self.by_key.get(&(hash, backdrop)) {
            return Ok(index);
        }

        let decoded = image::load_from_memory(&bytes).map_err(|e| {
            Diagnostic::new(
                DiagnosticCode::ImageDecodeFailed,
                operation,
                format!("failed to decode image: {}", e),
                format!("{} bytes", bytes.len()),
            )
        })?;

        let grayscale = matches!(
            decoded.color(),
            image::ColorType::L8 | image::ColorType::L16 | image::ColorType::La8 | image::ColorType::La16
        );
        let (width, height) = (decoded.width(), decoded.height());

        let pixels = if grayscale {
            // Integer mean of the backdrop components keeps the buffer
            // single-channel.
            let backdrop_gray =
                ((u32::from(backdrop.r) + u32::from(backdrop.g) + u32::from(backdrop.b)) / 3) as u8;
            let la = decoded.to_luma_alpha8();
            let mut out = Vec::with_capacity((width * height) as usize);
            for pixel in la.pixels() {
                let [l, a] = pixel.0;
                out.push(match a {
                    255 => l,
                    0 => backdrop_gray,
                    _ => blend_channel(l, backdrop_gray, a),
                });
            }
            out
        } else {
            let rgba = decoded.to_rgba8();
            let mut out = Vec::with_capacity((width * height * 3) as usize);
            for pixel in rgba.pixels() {
                let [r, g, b, a] = pixel.0;
                match a {
                    255 => out.extend_from_slice(&[r, g, b]),
                    0 => out.extend_from_slice(&[backdrop.r, backdrop.g, backdrop.b]),
                    _ => out.extend_from_slice(&[
                        blend_channel(r, backdrop.r, a),
                        blend_channel(g, backdrop.g, a),
                        blend_channel(b, backdrop.b, a),
                    ]),
                }
            }
            out
        };

        log::debug!(
            "ingested image: {}x{}, {} ({} packed bytes)",
            width,
            height,
            if grayscale { "gray" } else { "rgb" },
            pixels.len()
        );

        let index = self.entries.len();
        self.entries.push(ImageEntry {
            hash,
            backdrop,
            width,
            height,
            grayscale,
            pixels,
        });
        self.by_key.insert((hash, backdrop), index);
        Ok(index)
    }

    /// Look up an entry by index.
    pub fn get(&self, index: usize) -> Option<&ImageEntry> {
        self.entries.get(index)
    }

    /// All entries in index order.
    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no images.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_key.clear();
    }
}
