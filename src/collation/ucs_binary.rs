//! Code point order collation
//!
//! UTF-8 byte order equals code point order, so the sort key is the escaped
//! UTF-8 encoding and decodes back exactly.

use std::cmp::Ordering;

use super::collator::{sort_key_slice, CollationId, Collator};
use super::errors::{CollationError, CollationResult};
use super::key::{escape_sort_bytes, unescape_sort_bytes};

pub const UCS_BINARY_ID: CollationId = 0;

/// Case-sensitive, recoverable binary collation
#[derive(Debug)]
pub struct UcsBinaryCollator;

impl Collator for UcsBinaryCollator {
    fn name(&self) -> &'static str {
        "UCS_BINARY"
    }

    fn scheme(&self) -> &'static str {
        "UCS_BINARY"
    }

    fn collation_id(&self) -> CollationId {
        UCS_BINARY_ID
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn is_case_sensitive(&self) -> bool {
        true
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.as_bytes().cmp(b.as_bytes())
    }

    fn encode_sort_key_bytes(&self, value: &str) -> Vec<u8> {
        escape_sort_bytes(value.as_bytes())
    }

    fn decode_sort_key_bytes(
        &self,
        bytes: &[u8],
        offset: usize,
        length: usize,
    ) -> CollationResult<String> {
        let raw = unescape_sort_bytes(sort_key_slice(bytes, offset, length)?)?;
        String::from_utf8(raw).map_err(|e| CollationError::MalformedKey(e.to_string()))
    }
}
