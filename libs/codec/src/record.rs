//! The underlying record format.
//!
//! A record is a concatenation of fields. Each field is:
//!
//! ```text
//! ┌─────────┬──────────────┬────────────────┐
//! │ tag: u8 │ len: u32 LE  │ value (len B)  │
//! └─────────┴──────────────┴────────────────┘
//! ```
//!
//! Strings are UTF-8, unsigned integers are fixed-width little-endian, and
//! nested records are a field sequence inside the value. Repeated fields
//! repeat the tag; optional fields are omitted. Decoders skip unknown tags
//! so old nodes tolerate newer metadata.

use crate::error::{CodecError, CodecResult};

/// Bytes of tag + length preceding every field value.
const FIELD_PREAMBLE: usize = 5;

/// Walks the fields of one record. Truncation is checked before any slice
/// is taken, so a malformed length can never index out of bounds.
pub struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
    record: &'static str,
}

impl<'a> RecordReader<'a> {
    pub fn new(buf: &'a [u8], record: &'static str) -> Self {
        Self {
            buf,
            pos: 0,
            record,
        }
    }

    /// The next `(tag, value)` pair, or `None` at a clean end of record.
    pub fn next_field(&mut self) -> CodecResult<Option<(u8, &'a [u8])>> {
        if self.pos == self.buf.len() {
            return Ok(None);
        }

        let remaining = self.buf.len() - self.pos;
        if remaining < FIELD_PREAMBLE {
            return Err(CodecError::Truncated {
                record: self.record,
                need: FIELD_PREAMBLE,
                got: remaining,
            });
        }

        let tag = self.buf[self.pos];
        let len = u32::from_le_bytes([
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
            self.buf[self.pos + 4],
        ]) as usize;

        let available = remaining - FIELD_PREAMBLE;
        if len > available {
            return Err(CodecError::TruncatedField {
                record: self.record,
                tag,
                declared: len,
                available,
            });
        }

        let start = self.pos + FIELD_PREAMBLE;
        self.pos = start + len;
        Ok(Some((tag, &self.buf[start..start + len])))
    }
}

/// Builds a record field by field.
#[derive(Debug, Default)]
pub struct RecordWriter {
    record: &'static str,
    buf: Vec<u8>,
}

impl RecordWriter {
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            buf: Vec::new(),
        }
    }

    pub fn field(&mut self, tag: u8, value: &[u8]) -> CodecResult<&mut Self> {
        let len = u32::try_from(value.len()).map_err(|_| CodecError::FieldTooLong {
            record: self.record,
            tag,
            len: value.len(),
        })?;
        self.buf.push(tag);
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(value);
        Ok(self)
    }

    pub fn str_field(&mut self, tag: u8, value: &str) -> CodecResult<&mut Self> {
        self.field(tag, value.as_bytes())
    }

    pub fn u32_field(&mut self, tag: u8, value: u32) -> CodecResult<&mut Self> {
        self.field(tag, &value.to_le_bytes())
    }

    pub fn u8_field(&mut self, tag: u8, value: u8) -> CodecResult<&mut Self> {
        self.field(tag, &[value])
    }

    /// Embed a nested record as this field's value.
    pub fn record_field(&mut self, tag: u8, nested: RecordWriter) -> CodecResult<&mut Self> {
        let bytes = nested.into_bytes();
        self.field(tag, &bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Decode a fixed-width little-endian `u32` field value.
pub fn decode_u32(record: &'static str, field: &'static str, value: &[u8]) -> CodecResult<u32> {
    let bytes: [u8; 4] = value.try_into().map_err(|_| CodecError::ScalarWidth {
        record,
        field,
        expected: 4,
        got: value.len(),
    })?;
    Ok(u32::from_le_bytes(bytes))
}

/// Decode a single-byte field value.
pub fn decode_u8(record: &'static str, field: &'static str, value: &[u8]) -> CodecResult<u8> {
    if value.len() != 1 {
        return Err(CodecError::ScalarWidth {
            record,
            field,
            expected: 1,
            got: value.len(),
        });
    }
    Ok(value[0])
}

/// Decode a UTF-8 string field value.
pub fn decode_str<'a>(
    record: &'static str,
    field: &'static str,
    value: &'a [u8],
) -> CodecResult<&'a str> {
    std::str::from_utf8(value).map_err(|_| CodecError::InvalidUtf8 { record, field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_mixed_fields() {
        let mut writer = RecordWriter::new("test");
        writer
            .str_field(1, "hello")
            .unwrap()
            .u32_field(2, 0xDEAD_BEEF)
            .unwrap()
            .u8_field(3, 7)
            .unwrap()
            .field(4, &[])
            .unwrap();
        let bytes = writer.into_bytes();

        let mut reader = RecordReader::new(&bytes, "test");
        let (tag, value) = reader.next_field().unwrap().unwrap();
        assert_eq!((tag, value), (1, "hello".as_bytes()));

        let (tag, value) = reader.next_field().unwrap().unwrap();
        assert_eq!(tag, 2);
        assert_eq!(decode_u32("test", "x", value).unwrap(), 0xDEAD_BEEF);

        let (tag, value) = reader.next_field().unwrap().unwrap();
        assert_eq!(tag, 3);
        assert_eq!(decode_u8("test", "y", value).unwrap(), 7);

        let (tag, value) = reader.next_field().unwrap().unwrap();
        assert_eq!((tag, value), (4, &[][..]));

        assert!(reader.next_field().unwrap().is_none());
    }

    #[test]
    fn empty_buffer_is_an_empty_record() {
        let mut reader = RecordReader::new(&[], "test");
        assert!(reader.next_field().unwrap().is_none());
    }

    #[test]
    fn truncated_preamble_is_an_error() {
        // One tag byte and two of the four length bytes.
        let mut reader = RecordReader::new(&[1, 0, 0], "test");
        assert!(matches!(
            reader.next_field(),
            Err(CodecError::Truncated { need: 5, got: 3, .. })
        ));
    }

    #[test]
    fn overdeclared_length_is_an_error() {
        // Field declares 10 value bytes, buffer has 2.
        let mut bytes = vec![9u8];
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.extend_from_slice(&[0xAA, 0xBB]);

        let mut reader = RecordReader::new(&bytes, "test");
        assert!(matches!(
            reader.next_field(),
            Err(CodecError::TruncatedField {
                tag: 9,
                declared: 10,
                available: 2,
                ..
            })
        ));
    }

    #[test]
    fn scalar_width_is_enforced() {
        assert!(matches!(
            decode_u32("test", "port", &[1, 2]),
            Err(CodecError::ScalarWidth { expected: 4, got: 2, .. })
        ));
        assert!(matches!(
            decode_u8("test", "type", &[]),
            Err(CodecError::ScalarWidth { expected: 1, got: 0, .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        assert!(matches!(
            decode_str("test", "name", &[0xFF, 0xFE]),
            Err(CodecError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn nested_records_embed_cleanly() {
        let mut inner = RecordWriter::new("inner");
        inner.str_field(1, "nested").unwrap();

        let mut outer = RecordWriter::new("outer");
        outer.record_field(5, inner).unwrap();
        let bytes = outer.into_bytes();

        let mut reader = RecordReader::new(&bytes, "outer");
        let (tag, value) = reader.next_field().unwrap().unwrap();
        assert_eq!(tag, 5);

        let mut nested = RecordReader::new(value, "inner");
        let (tag, value) = nested.next_field().unwrap().unwrap();
        assert_eq!((tag, value), (1, "nested".as_bytes()));
    }
}
