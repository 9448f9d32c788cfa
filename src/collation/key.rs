//! Composite key buffer
//!
//! A key is a sequence of typed segments. Every segment starts with a tag
//! byte, so byte-lexicographic order over whole keys follows segment order
//! and within a segment follows the segment's own encoding:
//!
//! - null: tag only
//! - integer: 8 bytes big-endian with the sign bit flipped
//! - string: a collation sort key, escaped so that 0x00 only ever appears
//!   as its terminator
//!
//! Appending never rewrites earlier segments, so each column stays
//! independently encodable.

use super::errors::{CollationError, CollationResult};

const SEGMENT_NULL: u8 = 0x02;
const SEGMENT_INT: u8 = 0x10;
const SEGMENT_STRING: u8 = 0x20;

const TERMINATOR: u8 = 0x00;
const ESCAPE: u8 = 0x01;

/// Escapes raw bytes into sort key form and appends the terminator.
///
/// 0x00 becomes 0x01 0x01 and 0x01 becomes 0x01 0x02; all other bytes are
/// copied. Order is preserved, and a shorter value sorts before any of its
/// extensions because the terminator is the smallest byte.
pub(crate) fn escape_sort_bytes(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + 1);
    for &b in raw {
        match b {
            0x00 => out.extend_from_slice(&[ESCAPE, 0x01]),
            0x01 => out.extend_from_slice(&[ESCAPE, 0x02]),
            b => out.push(b),
        }
    }
    out.push(TERMINATOR);
    out
}

/// Inverse of [`escape_sort_bytes`]. A trailing terminator is optional.
pub(crate) fn unescape_sort_bytes(bytes: &[u8]) -> CollationResult<Vec<u8>> {
    let body = match bytes.split_last() {
        Some((&TERMINATOR, body)) => body,
        _ => bytes,
    };
    let mut out = Vec::with_capacity(body.len());
    let mut iter = body.iter();
    while let Some(&b) = iter.next() {
        match b {
            TERMINATOR => {
                return Err(CollationError::MalformedKey(
                    "terminator inside sort key".into(),
                ))
            }
            ESCAPE => match iter.next() {
                Some(0x01) => out.push(0x00),
                Some(0x02) => out.push(0x01),
                _ => {
                    return Err(CollationError::MalformedKey(
                        "invalid escape sequence".into(),
                    ))
                }
            },
            b => out.push(b),
        }
    }
    Ok(out)
}

/// Kind of the segment at the read cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Null,
    Int,
    String,
}

/// Composite key with a read cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Key {
    bytes: Vec<u8>,
    cursor: usize,
}

impl Key {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps encoded key bytes for decoding
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, cursor: 0 }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.cursor = 0;
    }

    /// Moves the read cursor back to the first segment
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Kind of the next segment, `None` at the end of the key
    pub fn peek_segment(&self) -> CollationResult<Option<SegmentKind>> {
        match self.bytes.get(self.cursor) {
            None => Ok(None),
            Some(&SEGMENT_NULL) => Ok(Some(SegmentKind::Null)),
            Some(&SEGMENT_INT) => Ok(Some(SegmentKind::Int)),
            Some(&SEGMENT_STRING) => Ok(Some(SegmentKind::String)),
            Some(tag) => Err(CollationError::MalformedKey(format!(
                "unknown segment tag 0x{:02x} at offset {}",
                tag, self.cursor
            ))),
        }
    }

    pub fn append_null(&mut self) {
        self.bytes.push(SEGMENT_NULL);
    }

    pub fn append_int(&mut self, value: i64) {
        self.bytes.push(SEGMENT_INT);
        let ordered = (value as u64) ^ (1 << 63);
        self.bytes.extend_from_slice(&ordered.to_be_bytes());
    }

    /// Appends an already-encoded, terminated sort key as a string segment
    pub(crate) fn append_sort_key(&mut self, sort_key: &[u8]) {
        debug_assert_eq!(sort_key.last(), Some(&TERMINATOR));
        self.bytes.push(SEGMENT_STRING);
        self.bytes.extend_from_slice(sort_key);
    }

    pub fn decode_null(&mut self) -> CollationResult<()> {
        self.expect_tag(SEGMENT_NULL, "null")
    }

    pub fn decode_int(&mut self) -> CollationResult<i64> {
        self.expect_tag(SEGMENT_INT, "integer")?;
        let end = self.cursor + 8;
        let raw = self
            .bytes
            .get(self.cursor..end)
            .ok_or_else(|| CollationError::MalformedKey("truncated integer segment".into()))?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        self.cursor = end;
        Ok((u64::from_be_bytes(buf) ^ (1 << 63)) as i64)
    }

    /// Reads the next string segment's sort key, terminator included
    pub(crate) fn next_sort_key(&mut self) -> CollationResult<&[u8]> {
        self.expect_tag(SEGMENT_STRING, "string")?;
        let start = self.cursor;
        let len = self.bytes[start..]
            .iter()
            .position(|&b| b == TERMINATOR)
            .ok_or_else(|| CollationError::MalformedKey("unterminated string segment".into()))?;
        self.cursor = start + len + 1;
        Ok(&self.bytes[start..self.cursor])
    }

    fn expect_tag(&mut self, tag: u8, what: &str) -> CollationResult<()> {
        match self.bytes.get(self.cursor) {
            Some(&t) if t == tag => {
                self.cursor += 1;
                Ok(())
            }
            Some(_) => Err(CollationError::MalformedKey(format!(
                "expected {} segment at offset {}",
                what, self.cursor
            ))),
            None => Err(CollationError::MalformedKey(format!(
                "expected {} segment, found end of key",
                what
            ))),
        }
    }
}
