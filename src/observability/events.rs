//! Observable events
//!
//! Events are explicit and typed; each maps to a fixed upper-case name.

use std::fmt;

/// Observable events in the compiler core and its edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Startup
    /// Configuration loaded
    ConfigLoaded,
    /// Collation registry initialised
    CollationsRegistered,
    /// Catalog snapshot loaded from disk
    CatalogLoaded,

    // Compilation
    /// A statement compiled into a plan
    PlanCompiled,
    /// A statement was not a data-manipulation statement
    PlanNotApplicable,
    /// Compilation failed
    PlanRejected,
    /// A view reference was expanded
    ViewExpanded,

    // DDL
    /// A schema-modifying statement was applied
    DdlApplied,
    /// A schema-modifying statement failed
    DdlRejected,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CollationsRegistered => "COLLATIONS_REGISTERED",
            Event::CatalogLoaded => "CATALOG_LOADED",
            Event::PlanCompiled => "PLAN_COMPILED",
            Event::PlanNotApplicable => "PLAN_NOT_APPLICABLE",
            Event::PlanRejected => "PLAN_REJECTED",
            Event::ViewExpanded => "VIEW_EXPANDED",
            Event::DdlApplied => "DDL_APPLIED",
            Event::DdlRejected => "DDL_REJECTED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
