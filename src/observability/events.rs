//! Observable search events
//!
//! Events are explicit and typed; each maps to one log line.

use std::fmt;

use super::logger::Severity;

/// Observable events in a search session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Session
    /// Configuration loaded
    ConfigLoaded,
    /// Schema definitions loaded
    SchemaLoaded,
    /// Root cursor built and about to be driven
    SearchStart,
    /// Root cursor exhausted or caller stopped
    SearchComplete,

    // Cursors
    /// A cursor was constructed
    CursorCreated,
    /// A cursor released its resources
    CursorClosed,
    /// A child cursor failed to release its resources
    CursorCloseFailed,

    // Evaluators
    /// A leaf evaluator resolved its attribute and matching rule
    EvaluatorCreated,
    /// Substring assertion on a non-human-readable attribute; it never matches
    SubstringUnsupported,
}

impl Event {
    /// Returns the event name as emitted in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SearchStart => "SEARCH_START",
            Event::SearchComplete => "SEARCH_COMPLETE",
            Event::CursorCreated => "CURSOR_CREATED",
            Event::CursorClosed => "CURSOR_CLOSED",
            Event::CursorCloseFailed => "CURSOR_CLOSE_FAILED",
            Event::EvaluatorCreated => "EVALUATOR_CREATED",
            Event::SubstringUnsupported => "SUBSTRING_UNSUPPORTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigLoaded | Event::SchemaLoaded => Severity::Info,
            Event::SearchStart | Event::SearchComplete => Severity::Info,
            Event::CursorCloseFailed | Event::SubstringUnsupported => Severity::Warn,
            Event::CursorCreated | Event::CursorClosed | Event::EvaluatorCreated => {
                Severity::Trace
            }
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
