//! Tagged data sources for font and image loading.

use std::io::Read;
use std::path::PathBuf;

use crate::error::{Diagnostic, DiagnosticCode, Resolved};

/// A source of raw bytes: a file path, an in-memory buffer, or a reader.
///
/// Load sites match exhaustively on the variant instead of sniffing the
/// argument type, so every branch has an explicit failure path.
pub enum DataSource {
    /// Read from a file on disk
    Path(PathBuf),
    /// Use an in-memory byte buffer as-is
    Bytes(Vec<u8>),
    /// Drain an arbitrary reader to its end
    Reader(Box<dyn Read>),
}

impl DataSource {
    /// Consume the source and return its raw bytes.
    pub fn read_all(self, operation: &'static str) -> Resolved<Vec<u8>> {
        match self {
            DataSource::Path(path) => std::fs::read(&path).map_err(|e| {
                Diagnostic::new(
                    DiagnosticCode::SourceReadFailed,
                    operation,
                    format!("failed to read file: {}", e),
                    path.display().to_string(),
                )
            }),
            DataSource::Bytes(bytes) => Ok(bytes),
            DataSource::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes).map_err(|e| {
                    Diagnostic::new(
                        DiagnosticCode::SourceReadFailed,
                        operation,
                        format!("failed to drain reader: {}", e),
                        "<reader>",
                    )
                })?;
                Ok(bytes)
            },
        }
    }

    /// A short tag for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DataSource::Path(_) => "path",
            DataSource::Bytes(_) => "bytes",
            DataSource::Reader(_) => "reader",
        }
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Path(p) => f.debug_tuple("Path").field(p).finish(),
            DataSource::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            DataSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<&std::path::Path> for DataSource {
    fn from(path: &std::path::Path) -> Self {
        DataSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for DataSource {
    fn from(bytes: Vec<u8>) -> Self {
        DataSource::Bytes(bytes)
    }
}

impl From<&[u8]> for DataSource {
    fn from(bytes: &[u8]) -> Self {
        DataSource::Bytes(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_source_roundtrip() {
        let src = DataSource::from(&b"hello"[..]);
        assert_eq!(src.read_all("test").unwrap(), b"hello");
    }

    #[test]
    fn test_reader_source() {
        let src = DataSource::Reader(Box::new(std::io::Cursor::new(vec![1u8, 2, 3])));
        assert_eq!(src.read_all("test").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_path_reports_diagnostic() {
        let src = DataSource::Path(PathBuf::from("/no/such/file.png"));
        let err = src.read_all("draw_image").unwrap_err();
        assert_eq!(err.code, DiagnosticCode::SourceReadFailed);
        assert_eq!(err.operation, "draw_image");
    }
}
