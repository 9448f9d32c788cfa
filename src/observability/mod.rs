//! Observability subsystem
//!
//! Structured JSON logging with typed events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on compilation
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use sqlplan::observability::{log_event, Event, Severity};
//!
//! log_event(Severity::Trace, Event::PlanCompiled, &[("kind", "query")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a typed event with fields
pub fn log_event(severity: Severity, event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // Verifies no panic
        log_event(Severity::Info, Event::CollationsRegistered, &[("count", "2")]);
        log_event(Severity::Trace, Event::PlanCompiled, &[]);
    }
}
