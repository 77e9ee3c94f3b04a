//! Diagnostic types for the document engine.
//!
//! Nothing in this crate panics or aborts on bad input: every failure is a
//! [`Diagnostic`] value. Low-level resolvers return it synchronously via
//! `Result<T, Diagnostic>`, and the calling site additionally pushes a copy
//! onto the owning document's queue so export can proceed with a safe
//! default substituted.

/// Result alias for resolver-level operations.
pub type Resolved<T> = std::result::Result<T, Diagnostic>;

/// Stable numeric identifiers for diagnostic records.
///
/// Codes are part of the public contract; existing values never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DiagnosticCode {
    /// A `#RRGGBB` color code that does not parse as hex
    MalformedColorCode = 101,
    /// A color name not present in the named-color table
    UnknownColorName = 102,
    /// A paper size name not present in the paper-size table
    UnknownPaperSize = 103,
    /// A measurement unit name not present in the unit table
    UnknownUnit = 104,
    /// A character above U+00FF, excluded from width computation
    CharOutOfRange = 105,
    /// A font name matched neither the built-in table nor the font handler
    UnknownFont = 106,
    /// A data source that could not be read
    SourceReadFailed = 107,
    /// Image bytes that could not be decoded
    ImageDecodeFailed = 108,
    /// A stream that could not be deflated; it is emitted empty
    CompressionFailed = 109,
    /// The exported buffer could not be written to disk
    FileWriteFailed = 110,
    /// The font handler rejected a font source
    FontLoadFailed = 111,
}

impl DiagnosticCode {
    /// The stable numeric value of this code.
    pub fn value(self) -> u16 {
        self as u16
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// An immutable diagnostic record.
///
/// Carries the stable code, a human-readable message, the public operation
/// that raised it, and the offending value. Diagnostics never unwind
/// control flow; they accumulate in the document's ordered queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{code}] {operation}: {message} ({value:?})")]
pub struct Diagnostic {
    /// Stable numeric identifier
    pub code: DiagnosticCode,
    /// Human-readable description of the failure
    pub message: String,
    /// The public operation that raised the diagnostic
    pub operation: &'static str,
    /// The offending input value, verbatim
    pub value: String,
}

impl Diagnostic {
    /// Create a new diagnostic record.
    pub fn new(
        code: DiagnosticCode,
        operation: &'static str,
        message: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            operation,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(
            DiagnosticCode::UnknownColorName,
            "set_draw_color",
            "unknown color name",
            "Vermillion",
        );
        let msg = format!("{}", diag);
        assert!(msg.contains("[102]"));
        assert!(msg.contains("set_draw_color"));
        assert!(msg.contains("Vermillion"));
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DiagnosticCode::MalformedColorCode.value(), 101);
        assert_eq!(DiagnosticCode::UnknownColorName.value(), 102);
        assert_eq!(DiagnosticCode::CompressionFailed.value(), 109);
    }

    #[test]
    fn test_diagnostic_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Diagnostic>();
    }
}
