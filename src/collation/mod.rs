//! Collation registry
//!
//! A collation defines string ordering and the physical sort key encoding
//! used inside composite index keys. Each string column records the id of
//! its collation; key encoders elsewhere in the engine resolve it here.
//!
//! # Registered collations
//!
//! | id | name         | case sensitive | recoverable |
//! |----|--------------|----------------|-------------|
//! | 0  | `UCS_BINARY` | yes            | yes         |
//! | 1  | `en_us_ci`   | no             | no          |
//!
//! A recoverable collation can reconstruct the original string from its
//! sort key, which lets an index-only scan skip the row fetch.

mod case_insensitive;
mod collator;
mod errors;
mod key;
mod registry;
mod ucs_binary;

pub use case_insensitive::{CaseInsensitiveCollator, EN_US_CI_ID};
pub use collator::{CollationId, Collator};
pub use errors::{CollationError, CollationResult};
pub use key::{Key, SegmentKind};
pub use registry::{by_id, by_name, collator_for, default_collator, registry, CollationRegistry};
pub use ucs_binary::{UcsBinaryCollator, UCS_BINARY_ID};
