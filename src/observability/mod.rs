//! Observability subsystem for dirsearch
//!
//! Provides:
//! - Structured logging (JSON, one line per event)
//! - Typed lifecycle events for cursors and evaluators
//! - Per-search counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on traversal
//! 3. No background threads
//! 4. Deterministic output

mod events;
mod logger;
mod stats;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use stats::{SearchStats, StatsSnapshot};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
