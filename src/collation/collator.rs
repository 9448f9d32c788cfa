//! Collator capability trait

use std::cmp::Ordering;
use std::fmt;

use super::errors::{CollationError, CollationResult};
use super::key::Key;
use crate::catalog::Value;

/// Stable numeric collation id, persisted per string column
pub type CollationId = u32;

/// A string ordering strategy with a physical sort key encoding.
///
/// Implementations are immutable and shared process-wide. The two
/// comparison methods must induce the same total order, and the byte order
/// of [`Collator::encode_sort_key_bytes`] must agree with it.
pub trait Collator: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn scheme(&self) -> &'static str;

    fn collation_id(&self) -> CollationId;

    /// True if the original string can be recovered from a key segment
    fn is_recoverable(&self) -> bool;

    fn is_case_sensitive(&self) -> bool;

    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Standalone sort key. The last byte is zero and zero appears nowhere
    /// else.
    fn encode_sort_key_bytes(&self, value: &str) -> Vec<u8>;

    /// Recovers the value from `bytes[offset..offset + length]`.
    ///
    /// Fails with [`CollationError::UnsupportedOperation`] when the collation
    /// is not recoverable.
    fn decode_sort_key_bytes(
        &self,
        bytes: &[u8],
        offset: usize,
        length: usize,
    ) -> CollationResult<String>;

    /// Compares two string values; NULL sorts before every string
    fn compare_values(&self, a: &Value, b: &Value) -> CollationResult<Ordering> {
        let a = self.collatable(a)?;
        let b = self.collatable(b)?;
        Ok(match (a, b) {
            (Some(a), Some(b)) => self.compare(a, b),
            (a, b) => a.is_some().cmp(&b.is_some()),
        })
    }

    /// Appends `value` to a composite key
    fn append(&self, key: &mut Key, value: &str) {
        key.append_sort_key(&self.encode_sort_key_bytes(value));
    }

    /// Decodes the string segment at the key's read cursor
    fn decode(&self, key: &mut Key) -> CollationResult<String> {
        if !self.is_recoverable() {
            return Err(CollationError::UnsupportedOperation {
                collation: self.name().to_string(),
                operation: "decode",
            });
        }
        let sort_key = key.next_sort_key()?;
        self.decode_sort_key_bytes(sort_key, 0, sort_key.len())
    }

    #[doc(hidden)]
    fn collatable<'v>(&self, value: &'v Value) -> CollationResult<Option<&'v str>> {
        match value {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s)),
            other => Err(CollationError::NotAString {
                collation: self.name().to_string(),
                type_name: other.data_type().map_or("null", |t| t.type_name()),
            }),
        }
    }
}

impl fmt::Display for dyn Collator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.scheme())
    }
}

/// Bounds-checked view of `bytes[offset..offset + length]`
pub(crate) fn sort_key_slice(bytes: &[u8], offset: usize, length: usize) -> CollationResult<&[u8]> {
    offset
        .checked_add(length)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            CollationError::MalformedKey(format!(
                "range {}+{} outside {} key bytes",
                offset,
                length,
                bytes.len()
            ))
        })
}
