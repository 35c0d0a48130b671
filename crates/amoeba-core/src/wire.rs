//! Canonical tag-length-value encoding for deterministic serialization.
//!
//! Every entity serializes as a sequence of records until the stream is
//! exhausted:
//!
//! ```text
//! [u32 length (little-endian)] [u8 tag] [length payload bytes]
//! ```
//!
//! The length covers only the payload. Strings are UTF-8 without a BOM,
//! integers are fixed-width little-endian, and nested entities are opaque
//! sub-streams under their own tag. Two rules make the encoding canonical:
//!
//! - Fields are emitted in ascending tag order, and only when they differ
//!   from the type's default/empty value. Equal entities therefore produce
//!   byte-identical encodings, which hashing and signing rely on.
//! - Collection elements are always emitted, even when empty, because an
//!   element's position is meaningful (for a group's keys it is the
//!   erasure block index).
//!
//! Readers skip records with unknown tags so old decoders survive new
//! fields. A length prefix pointing past the end of the stream, or a
//! short read on the 5-byte record header, aborts decode with a
//! [`FormatError`].

use crate::error::FormatError;

/// Reserved tag for certificates, above every data field tag.
///
/// Certificates are serialized last so the signing preimage is the
/// encoding truncated before this record.
pub const CERTIFICATE_TAG: u8 = 0x7f;

/// Bytes in a record header (u32 length + u8 tag).
pub const RECORD_HEADER_LEN: usize = 5;

/// Append one record.
pub fn put_record(buf: &mut Vec<u8>, tag: u8, payload: &[u8]) {
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.push(tag);
    buf.extend_from_slice(payload);
}

/// Append a UTF-8 string record.
pub fn put_str(buf: &mut Vec<u8>, tag: u8, value: &str) {
    put_record(buf, tag, value.as_bytes());
}

/// Append a single-byte record (algorithm tags and other small enums).
pub fn put_u8(buf: &mut Vec<u8>, tag: u8, value: u8) {
    put_record(buf, tag, &[value]);
}

/// Append a fixed-width u32 record.
pub fn put_u32(buf: &mut Vec<u8>, tag: u8, value: u32) {
    put_record(buf, tag, &value.to_le_bytes());
}

/// Append a fixed-width u64 record.
pub fn put_u64(buf: &mut Vec<u8>, tag: u8, value: u64) {
    put_record(buf, tag, &value.to_le_bytes());
}

/// Append a fixed-width i64 record (timestamps).
pub fn put_i64(buf: &mut Vec<u8>, tag: u8, value: i64) {
    put_record(buf, tag, &value.to_le_bytes());
}

/// One decoded record, borrowing its payload from the input stream.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub tag: u8,
    pub payload: &'a [u8],
}

impl<'a> Record<'a> {
    /// Interpret the payload as UTF-8 text.
    pub fn as_str(&self) -> Result<&'a str, FormatError> {
        Ok(std::str::from_utf8(self.payload)?)
    }

    /// Interpret the payload as a single byte.
    pub fn as_u8(&self) -> Result<u8, FormatError> {
        match self.payload {
            [value] => Ok(*value),
            _ => Err(self.bad_width(1)),
        }
    }

    /// Interpret the payload as a little-endian u32.
    pub fn as_u32(&self) -> Result<u32, FormatError> {
        if self.payload.len() != 4 {
            return Err(self.bad_width(4));
        }
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.payload);
        Ok(u32::from_le_bytes(bytes))
    }

    /// Interpret the payload as a little-endian u64.
    pub fn as_u64(&self) -> Result<u64, FormatError> {
        if self.payload.len() != 8 {
            return Err(self.bad_width(8));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.payload);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Interpret the payload as a little-endian i64.
    pub fn as_i64(&self) -> Result<i64, FormatError> {
        if self.payload.len() != 8 {
            return Err(self.bad_width(8));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.payload);
        Ok(i64::from_le_bytes(bytes))
    }

    fn bad_width(&self, expected: usize) -> FormatError {
        FormatError::BadFieldWidth {
            tag: self.tag,
            len: self.payload.len(),
            expected,
        }
    }
}

/// Cursor over a record stream.
///
/// Yields records in order; callers match on the tag and skip anything
/// they do not recognize.
pub struct RecordReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Read the next record, or `None` at a clean end of stream.
    pub fn next_record(&mut self) -> Result<Option<Record<'a>>, FormatError> {
        let remaining = self.bytes.len() - self.pos;
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < RECORD_HEADER_LEN {
            return Err(FormatError::Truncated {
                needed: RECORD_HEADER_LEN,
                remaining,
            });
        }

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        let length = u32::from_le_bytes(len_bytes) as usize;
        let tag = self.bytes[self.pos + 4];

        let start = self.pos + RECORD_HEADER_LEN;
        let remaining = self.bytes.len() - start;
        if length > remaining {
            return Err(FormatError::LengthOutOfRange { length, remaining });
        }

        self.pos = start + length;
        Ok(Some(Record {
            tag,
            payload: &self.bytes[start..start + length],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout_exact_bytes() {
        let mut buf = Vec::new();
        put_record(&mut buf, 0x03, b"ab");
        assert_eq!(buf, vec![0x02, 0x00, 0x00, 0x00, 0x03, b'a', b'b']);
    }

    #[test]
    fn test_integer_widths() {
        let mut buf = Vec::new();
        put_u8(&mut buf, 0, 7);
        put_u32(&mut buf, 1, 0x0102_0304);
        put_u64(&mut buf, 2, 0x01);
        assert_eq!(
            buf,
            vec![
                1, 0, 0, 0, 0, 7, // u8 record
                4, 0, 0, 0, 1, 0x04, 0x03, 0x02, 0x01, // u32 little-endian
                8, 0, 0, 0, 2, 1, 0, 0, 0, 0, 0, 0, 0, // u64 little-endian
            ]
        );
    }

    #[test]
    fn test_reader_roundtrip() {
        let mut buf = Vec::new();
        put_str(&mut buf, 0, "hello");
        put_u32(&mut buf, 1, 42);
        put_record(&mut buf, 9, &[]);

        let mut reader = RecordReader::new(&buf);

        let r = reader.next_record().unwrap().unwrap();
        assert_eq!(r.tag, 0);
        assert_eq!(r.as_str().unwrap(), "hello");

        let r = reader.next_record().unwrap().unwrap();
        assert_eq!(r.tag, 1);
        assert_eq!(r.as_u32().unwrap(), 42);

        let r = reader.next_record().unwrap().unwrap();
        assert_eq!(r.tag, 9);
        assert!(r.payload.is_empty());

        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_truncated_header_fails() {
        let buf = vec![0x02, 0x00, 0x00];
        let mut reader = RecordReader::new(&buf);
        assert!(matches!(
            reader.next_record(),
            Err(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn test_length_past_end_fails() {
        // Claims a 200-byte payload but carries 2.
        let mut buf = vec![200, 0, 0, 0, 1];
        buf.extend_from_slice(&[0xaa, 0xbb]);
        let mut reader = RecordReader::new(&buf);
        assert!(matches!(
            reader.next_record(),
            Err(FormatError::LengthOutOfRange {
                length: 200,
                remaining: 2
            })
        ));
    }

    #[test]
    fn test_unknown_tags_are_still_yielded() {
        let mut buf = Vec::new();
        put_record(&mut buf, 0xee, b"future field");
        put_u8(&mut buf, 0x00, 1);

        // The reader yields everything; skipping is the caller's decision.
        let mut reader = RecordReader::new(&buf);
        assert_eq!(reader.next_record().unwrap().unwrap().tag, 0xee);
        assert_eq!(reader.next_record().unwrap().unwrap().tag, 0x00);
    }

    #[test]
    fn test_wrong_integer_width_fails() {
        let mut buf = Vec::new();
        put_record(&mut buf, 1, &[0x01, 0x02, 0x03]);
        let mut reader = RecordReader::new(&buf);
        let record = reader.next_record().unwrap().unwrap();
        assert!(matches!(
            record.as_u32(),
            Err(FormatError::BadFieldWidth {
                tag: 1,
                len: 3,
                expected: 4
            })
        ));
    }

    #[test]
    fn test_empty_stream_is_clean_end() {
        let mut reader = RecordReader::new(&[]);
        assert!(reader.next_record().unwrap().is_none());
    }
}
