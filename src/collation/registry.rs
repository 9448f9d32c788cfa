//! Process-wide collation registry
//!
//! Built once on first use and never mutated afterwards. Lookups hand out
//! `&'static` references, so collators are shared by any number of readers
//! without coordination.

use std::sync::OnceLock;

use super::case_insensitive::CaseInsensitiveCollator;
use super::collator::{CollationId, Collator};
use super::errors::{CollationError, CollationResult};
use super::ucs_binary::UcsBinaryCollator;
use crate::observability::{log_event, Event, Severity};

static UCS_BINARY: UcsBinaryCollator = UcsBinaryCollator;
static EN_US_CI: CaseInsensitiveCollator = CaseInsensitiveCollator;

static REGISTRY: OnceLock<CollationRegistry> = OnceLock::new();

/// Immutable id/name lookup over the registered collations
#[derive(Debug)]
pub struct CollationRegistry {
    /// Sorted by collation id
    collators: Vec<&'static dyn Collator>,
}

impl CollationRegistry {
    fn builtin() -> Self {
        let mut collators: Vec<&'static dyn Collator> = vec![&UCS_BINARY, &EN_US_CI];
        collators.sort_by_key(|c| c.collation_id());
        Self { collators }
    }

    pub fn by_id(&self, id: CollationId) -> CollationResult<&'static dyn Collator> {
        self.collators
            .binary_search_by_key(&id, |c| c.collation_id())
            .map(|i| self.collators[i])
            .map_err(|_| CollationError::UnknownCollation(id.to_string()))
    }

    /// Case-insensitive lookup by collation name
    pub fn by_name(&self, name: &str) -> CollationResult<&'static dyn Collator> {
        self.collators
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CollationError::UnknownCollation(name.to_string()))
    }

    /// All collators in id order
    pub fn all(&self) -> &[&'static dyn Collator] {
        &self.collators
    }
}

/// The registry, initialised on first call
pub fn registry() -> &'static CollationRegistry {
    REGISTRY.get_or_init(|| {
        let registry = CollationRegistry::builtin();
        let count = registry.collators.len().to_string();
        log_event(
            Severity::Info,
            Event::CollationsRegistered,
            &[("count", &count)],
        );
        registry
    })
}

pub fn by_id(id: CollationId) -> CollationResult<&'static dyn Collator> {
    registry().by_id(id)
}

pub fn by_name(name: &str) -> CollationResult<&'static dyn Collator> {
    registry().by_name(name)
}

/// Collation used by string columns that declare none
pub fn default_collator() -> &'static dyn Collator {
    &UCS_BINARY
}

/// Resolves a column's optional collation id
pub fn collator_for(id: Option<CollationId>) -> CollationResult<&'static dyn Collator> {
    match id {
        Some(id) => by_id(id),
        None => Ok(default_collator()),
    }
}
