//! PDF object serialization.
//!
//! Serializes PDF objects to their byte representation according to the
//! PDF syntax rules. Dictionaries are backed by an ordered list of entries
//! so the emitted bytes follow declaration order and exports stay
//! byte-deterministic.

use std::io::Write;

use bytes::Bytes;

/// A PDF object value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// The null object
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer number
    Integer(i64),
    /// Real number
    Real(f64),
    /// Literal or hex string (raw bytes)
    String(Vec<u8>),
    /// Name object (`/Name`)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary with ordered entries
    Dictionary(Vec<(String, Object)>),
    /// Stream: dictionary plus payload; /Length is added automatically
    Stream {
        /// Stream dictionary entries (without /Length)
        dict: Vec<(String, Object)>,
        /// Stream payload
        data: Bytes,
    },
    /// Indirect reference (`n 0 R`)
    Reference(u32),
}

impl Object {
    /// Build a dictionary from `(key, value)` pairs, preserving order.
    pub fn dict(entries: Vec<(&str, Object)>) -> Object {
        Object::Dictionary(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// Build a name object.
    pub fn name(s: &str) -> Object {
        Object::Name(s.to_string())
    }

    /// Build a string object from text.
    pub fn string(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec())
    }

    /// Build a `[llx lly urx ury]` rectangle array.
    pub fn rect(llx: f64, lly: f64, urx: f64, ury: f64) -> Object {
        Object::Array(vec![
            Object::Real(llx),
            Object::Real(lly),
            Object::Real(urx),
            Object::Real(ury),
        ])
    }
}

/// Format a real number the way content streams and object bodies expect:
/// up to three decimals, trailing zeros and a trailing dot trimmed.
pub fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.3}", value);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Serializer for PDF objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectSerializer;

impl ObjectSerializer {
    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        self.write_object(&mut buf, obj).expect("write to Vec");
        buf
    }

    /// Serialize an indirect object definition:
    /// `{id} 0 obj\n{object}\nendobj\n`.
    pub fn serialize_indirect(&self, id: u32, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        writeln!(buf, "{} 0 obj", id).expect("write to Vec");
        self.write_object(&mut buf, obj).expect("write to Vec");
        write!(buf, "\nendobj\n").expect("write to Vec");
        buf
    }

    fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> std::io::Result<()> {
        match obj {
            Object::Null => write!(w, "null"),
            Object::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" }),
            Object::Integer(i) => write!(w, "{}", i),
            Object::Real(r) => write!(w, "{}", fmt_number(*r)),
            Object::String(s) => self.write_string(w, s),
            Object::Name(n) => self.write_name(w, n),
            Object::Array(arr) => {
                write!(w, "[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(w, " ")?;
                    }
                    self.write_object(w, item)?;
                }
                write!(w, "]")
            },
            Object::Dictionary(entries) => self.write_dictionary(w, entries),
            Object::Stream { dict, data } => {
                let mut entries = dict.clone();
                entries.push(("Length".to_string(), Object::Integer(data.len() as i64)));
                self.write_dictionary(w, &entries)?;
                write!(w, "\nstream\n")?;
                w.write_all(data)?;
                write!(w, "\nendstream")
            },
            Object::Reference(id) => write!(w, "{} 0 R", id),
        }
    }

    fn write_dictionary<W: Write>(
        &self,
        w: &mut W,
        entries: &[(String, Object)],
    ) -> std::io::Result<()> {
        write!(w, "<<")?;
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                write!(w, " ")?;
            }
            self.write_name(w, key)?;
            write!(w, " ")?;
            self.write_object(w, value)?;
        }
        write!(w, ">>")
    }

    /// Literal string syntax `(...)` with escaping, or hex `<...>` for
    /// binary data.
    fn write_string<W: Write>(&self, w: &mut W, data: &[u8]) -> std::io::Result<()> {
        let printable = data
            .iter()
            .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));
        if printable {
            write!(w, "(")?;
            for &byte in data {
                match byte {
                    b'(' => write!(w, "\\(")?,
                    b')' => write!(w, "\\)")?,
                    b'\\' => write!(w, "\\\\")?,
                    b'\n' => write!(w, "\\n")?,
                    b'\r' => write!(w, "\\r")?,
                    b'\t' => write!(w, "\\t")?,
                    _ => w.write_all(&[byte])?,
                }
            }
            write!(w, ")")
        } else {
            write!(w, "<")?;
            for byte in data {
                write!(w, "{:02X}", byte)?;
            }
            write!(w, ">")
        }
    }

    fn write_name<W: Write>(&self, w: &mut W, name: &str) -> std::io::Result<()> {
        write!(w, "/")?;
        for byte in name.bytes() {
            match byte {
                b'\x21'..=b'\x7E'
                    if !matches!(byte, b'/' | b'%' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'#') =>
                {
                    w.write_all(&[byte])?;
                },
                _ => write!(w, "#{:02X}", byte)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(obj: &Object) -> String {
        String::from_utf8(ObjectSerializer.serialize(obj)).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(to_string(&Object::Null), "null");
        assert_eq!(to_string(&Object::Boolean(true)), "true");
        assert_eq!(to_string(&Object::Integer(-42)), "-42");
        assert_eq!(to_string(&Object::Real(1.0)), "1");
        assert_eq!(to_string(&Object::Real(0.5)), "0.5");
        assert_eq!(to_string(&Object::Real(595.28)), "595.28");
    }

    #[test]
    fn test_fmt_number_trims() {
        assert_eq!(fmt_number(12.0), "12");
        assert_eq!(fmt_number(0.552), "0.552");
        assert_eq!(fmt_number(841.89), "841.89");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(to_string(&Object::string("a(b)c")), "(a\\(b\\)c)");
        assert_eq!(to_string(&Object::String(vec![0x00, 0xFF])), "<00FF>");
    }

    #[test]
    fn test_dictionary_preserves_order() {
        let dict = Object::dict(vec![
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(2)),
            ("Count", Object::Integer(1)),
        ]);
        assert_eq!(to_string(&dict), "<</Type /Page /Parent 2 0 R /Count 1>>");
    }

    #[test]
    fn test_stream_gets_length() {
        let stream = Object::Stream {
            dict: vec![],
            data: Bytes::from_static(b"0 0 m"),
        };
        let s = to_string(&stream);
        assert!(s.starts_with("<</Length 5>>\nstream\n"));
        assert!(s.ends_with("\nendstream"));
    }

    #[test]
    fn test_indirect_framing() {
        let bytes = ObjectSerializer.serialize_indirect(7, &Object::Integer(3));
        assert_eq!(String::from_utf8(bytes).unwrap(), "7 0 obj\n3\nendobj\n");
    }

    #[test]
    fn test_name_escaping() {
        assert_eq!(to_string(&Object::name("F1")), "/F1");
        assert_eq!(to_string(&Object::name("With Space")), "/With#20Space");
    }
}
