//! Document serialization.
//!
//! Walks a completed document model exactly once and emits the container
//! format: header, indirect objects (catalog, pages tree, page and content
//! pairs, fonts, images, optional info dictionary), the cross-reference
//! table with recorded byte offsets, and the trailer. Object numbers are
//! assigned sequentially starting at 1.

use std::io::Write;

use bytes::Bytes;

use crate::error::{Diagnostic, DiagnosticCode};
use crate::geometry::PaperSize;
use crate::writer::content_stream::Page;
use crate::writer::font_manager::{FontHandler, FontKind, FontRegistry};
use crate::writer::image_handler::ImageStore;
use crate::writer::object_serializer::{Object, ObjectSerializer};

/// Document metadata strings. Only set values are emitted; a document with
/// no metadata carries no Info dictionary at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Creator application
    pub creator: Option<String>,
}

impl Metadata {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
            && self.creator.is_none()
    }
}

/// A read-only view of the document model handed to the export pass.
pub struct ExportInput<'a> {
    /// Resolved paper size
    pub paper: &'a PaperSize,
    /// Whether streams are deflated
    pub compress: bool,
    /// Metadata strings
    pub metadata: &'a Metadata,
    /// Pages in order (never empty at export time)
    pub pages: &'a [Page],
    /// The deduplicated font table
    pub fonts: &'a FontRegistry,
    /// The deduplicated image table
    pub images: &'a ImageStore,
    /// Optional strategy for externally-handled fonts
    pub font_handler: Option<&'a dyn FontHandler>,
}

fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Deflate a stream payload when compression is on. A failed attempt is a
/// recoverable diagnostic: the stream is emitted with zero-length data
/// rather than silently falling back to uncompressed bytes, so /Length
/// always matches what was written.
fn encode_stream(
    raw: Vec<u8>,
    compress: bool,
    operation: &'static str,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<(String, Object)>, Bytes) {
    if !compress {
        return (Vec::new(), Bytes::from(raw));
    }
    match compress_data(&raw) {
        Ok(deflated) => (
            vec![("Filter".to_string(), Object::name("FlateDecode"))],
            Bytes::from(deflated),
        ),
        Err(e) => {
            log::warn!("stream compression failed ({}); emitting empty stream", e);
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::CompressionFailed,
                operation,
                format!("compression failed, stream emitted empty: {}", e),
                format!("{} bytes", raw.len()),
            ));
            (Vec::new(), Bytes::new())
        },
    }
}

/// Serialize the whole model into the final byte buffer.
///
/// Returns the buffer and any diagnostics raised during the pass.
pub fn write_document(input: &ExportInput<'_>) -> (Vec<u8>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let serializer = ObjectSerializer;
    debug_assert!(!input.pages.is_empty(), "export requires at least one page");

    // --- object number assignment ------------------------------------
    // 1 = catalog, 2 = pages tree, then a (page, content) pair per page.
    let page_count = input.pages.len();
    let first_page_obj: u32 = 3;
    let page_obj = |i: usize| first_page_obj + 2 * i as u32;
    let content_obj = |i: usize| first_page_obj + 2 * i as u32 + 1;

    // Fonts follow the page pairs. External fonts may expand to several
    // objects, so their bodies are rendered up front to fix the numbering.
    let mut next_obj = first_page_obj + 2 * page_count as u32;
    let mut font_objects: Vec<(u32, Vec<Object>)> = Vec::with_capacity(input.fonts.len());
    for entry in input.fonts.entries() {
        let objects = match entry.kind {
            FontKind::BuiltIn(face) => vec![Object::dict(vec![
                ("Type", Object::name("Font")),
                ("Subtype", Object::name("Type1")),
                ("BaseFont", Object::name(face.postscript_name())),
                ("Encoding", Object::name("WinAnsiEncoding")),
            ])],
            FontKind::External => {
                let emitted = input
                    .font_handler
                    .map(|h| h.font_objects(&entry.name, entry.id))
                    .unwrap_or_default();
                if emitted.is_empty() {
                    // Handler gone or silent: reference the face by name.
                    vec![Object::dict(vec![
                        ("Type", Object::name("Font")),
                        ("Subtype", Object::name("Type1")),
                        ("BaseFont", Object::name(&entry.name)),
                    ])]
                } else {
                    emitted
                }
            },
        };
        let count = objects.len() as u32;
        font_objects.push((next_obj, objects));
        next_obj += count;
    }
    let font_obj_number = |font_id: u32| -> u32 {
        font_objects[font_id as usize - 1].0
    };

    let first_image_obj = next_obj;
    let image_obj = |index: usize| first_image_obj + index as u32;
    next_obj += input.images.len() as u32;

    let info_obj = if input.metadata.is_empty() {
        None
    } else {
        let id = next_obj;
        next_obj += 1;
        Some(id)
    };
    let object_count = next_obj - 1;

    // --- body ---------------------------------------------------------
    let mut output: Vec<u8> = Vec::new();
    output.extend_from_slice(b"%PDF-1.4\n");
    // offsets[n] is the byte offset of object n; slot 0 stays unused.
    let mut offsets: Vec<usize> = vec![0; object_count as usize + 1];
    let write_obj = |output: &mut Vec<u8>, offsets: &mut Vec<usize>, id: u32, obj: &Object| {
        offsets[id as usize] = output.len();
        output.extend_from_slice(&serializer.serialize_indirect(id, obj));
    };

    // Catalog.
    write_obj(
        &mut output,
        &mut offsets,
        1,
        &Object::dict(vec![("Type", Object::name("Catalog")), ("Pages", Object::Reference(2))]),
    );

    // Pages tree.
    let kids: Vec<Object> = (0..page_count).map(|i| Object::Reference(page_obj(i))).collect();
    write_obj(
        &mut output,
        &mut offsets,
        2,
        &Object::dict(vec![
            ("Type", Object::name("Pages")),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(page_count as i64)),
        ]),
    );

    // Page dictionaries and content streams.
    for (i, page) in input.pages.iter().enumerate() {
        let mut resources: Vec<(String, Object)> = Vec::new();
        if !page.font_ids.is_empty() {
            let fonts: Vec<(String, Object)> = page
                .font_ids
                .iter()
                .map(|&id| (format!("F{}", id), Object::Reference(font_obj_number(id))))
                .collect();
            resources.push(("Font".to_string(), Object::Dictionary(fonts)));
        }
        if !page.image_indices.is_empty() {
            let xobjects: Vec<(String, Object)> = page
                .image_indices
                .iter()
                .map(|&idx| (format!("I{}", idx), Object::Reference(image_obj(idx))))
                .collect();
            resources.push(("XObject".to_string(), Object::Dictionary(xobjects)));
        }

        write_obj(
            &mut output,
            &mut offsets,
            page_obj(i),
            &Object::dict(vec![
                ("Type", Object::name("Page")),
                ("Parent", Object::Reference(2)),
                (
                    "MediaBox",
                    Object::rect(0.0, 0.0, input.paper.width_pt, input.paper.height_pt),
                ),
                ("Resources", Object::Dictionary(resources)),
                ("Contents", Object::Reference(content_obj(i))),
            ]),
        );

        let (dict, data) =
            encode_stream(page.content().to_vec(), input.compress, "export", &mut diagnostics);
        write_obj(&mut output, &mut offsets, content_obj(i), &Object::Stream { dict, data });
    }

    // Fonts.
    for (first_id, objects) in &font_objects {
        for (offset, obj) in objects.iter().enumerate() {
            write_obj(&mut output, &mut offsets, first_id + offset as u32, obj);
        }
    }

    // Images.
    for (index, entry) in input.images.entries().iter().enumerate() {
        let (mut dict, data) =
            encode_stream(entry.pixels.clone(), input.compress, "export", &mut diagnostics);
        let mut stream_dict = vec![
            ("Type".to_string(), Object::name("XObject")),
            ("Subtype".to_string(), Object::name("Image")),
            ("Width".to_string(), Object::Integer(i64::from(entry.width))),
            ("Height".to_string(), Object::Integer(i64::from(entry.height))),
            (
                "ColorSpace".to_string(),
                Object::name(if entry.grayscale { "DeviceGray" } else { "DeviceRGB" }),
            ),
            ("BitsPerComponent".to_string(), Object::Integer(8)),
        ];
        stream_dict.append(&mut dict);
        write_obj(
            &mut output,
            &mut offsets,
            image_obj(index),
            &Object::Stream {
                dict: stream_dict,
                data,
            },
        );
    }

    // Info dictionary, only when any metadata string is set.
    if let Some(id) = info_obj {
        let mut entries: Vec<(String, Object)> = Vec::new();
        let meta = input.metadata;
        for (key, value) in [
            ("Title", &meta.title),
            ("Author", &meta.author),
            ("Subject", &meta.subject),
            ("Keywords", &meta.keywords),
            ("Creator", &meta.creator),
        ] {
            if let Some(v) = value {
                entries.push((key.to_string(), Object::string(v)));
            }
        }
        write_obj(&mut output, &mut offsets, id, &Object::Dictionary(entries));
    }

    // --- cross-reference table and trailer ----------------------------
    let xref_start = output.len();
    output.extend_from_slice(format!("xref\n0 {}\n", object_count + 1).as_bytes());
    output.extend_from_slice(b"0000000000 65535 f \n");
    for id in 1..=object_count {
        output.extend_from_slice(format!("{:010} 00000 n \n", offsets[id as usize]).as_bytes());
    }

    let mut trailer = vec![
        ("Size".to_string(), Object::Integer(i64::from(object_count) + 1)),
        ("Root".to_string(), Object::Reference(1)),
    ];
    if let Some(id) = info_obj {
        trailer.push(("Info".to_string(), Object::Reference(id)));
    }
    output.extend_from_slice(b"trailer\n");
    output.extend_from_slice(&serializer.serialize(&Object::Dictionary(trailer)));
    output.extend_from_slice(b"\nstartxref\n");
    output.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    output.extend_from_slice(b"%%EOF");

    (output, diagnostics)
}
