//! Case-insensitive collation
//!
//! Strings are compared by their Unicode lowercase folding. The sort key is
//! the folded form, so the original casing cannot be recovered.

use std::cmp::Ordering;

use super::collator::{CollationId, Collator};
use super::errors::{CollationError, CollationResult};
use super::key::escape_sort_bytes;

pub const EN_US_CI_ID: CollationId = 1;

#[derive(Debug)]
pub struct CaseInsensitiveCollator;

impl CaseInsensitiveCollator {
    fn fold(value: &str) -> String {
        value.to_lowercase()
    }
}

impl Collator for CaseInsensitiveCollator {
    fn name(&self) -> &'static str {
        "en_us_ci"
    }

    fn scheme(&self) -> &'static str {
        "en_US_ci"
    }

    fn collation_id(&self) -> CollationId {
        EN_US_CI_ID
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn is_case_sensitive(&self) -> bool {
        false
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        Self::fold(a).as_bytes().cmp(Self::fold(b).as_bytes())
    }

    fn encode_sort_key_bytes(&self, value: &str) -> Vec<u8> {
        escape_sort_bytes(Self::fold(value).as_bytes())
    }

    fn decode_sort_key_bytes(
        &self,
        _bytes: &[u8],
        _offset: usize,
        _length: usize,
    ) -> CollationResult<String> {
        Err(CollationError::UnsupportedOperation {
            collation: self.name().to_string(),
            operation: "decode_sort_key_bytes",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::Key;

    #[test]
    fn test_case_folded_equality() {
        let c = CaseInsensitiveCollator;
        assert_eq!(c.compare("HELLO", "hello"), Ordering::Equal);
        assert_eq!(c.encode_sort_key_bytes("AbC"), c.encode_sort_key_bytes("abc"));
        assert_eq!(c.compare("apple", "Banana"), Ordering::Less);
    }

    #[test]
    fn test_decode_unsupported() {
        let c = CaseInsensitiveCollator;
        let bytes = c.encode_sort_key_bytes("Hello");
        assert!(matches!(
            c.decode_sort_key_bytes(&bytes, 0, bytes.len()),
            Err(CollationError::UnsupportedOperation { .. })
        ));

        let mut key = Key::new();
        c.append(&mut key, "Hello");
        key.reset();
        assert!(matches!(
            c.decode(&mut key),
            Err(CollationError::UnsupportedOperation { .. })
        ));
    }
}
