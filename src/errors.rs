//! Search engine error types
//!
//! Error codes:
//! - DIRSEARCH_CURSOR_CLOSED (REJECT)
//! - DIRSEARCH_INVALID_POSITION (REJECT)
//! - DIRSEARCH_CONSTRUCTION_FAILED (REJECT)
//! - DIRSEARCH_EVALUATION_FAILED (ERROR)
//! - DIRSEARCH_STORE_FAILED (ERROR)
//!
//! Construction failures are never retried. Store and schema failures raised
//! while a cursor is moving reach the caller of `next()`/`previous()`
//! unchanged; this layer performs no retry.

use std::fmt;

use thiserror::Error;

use crate::schema::SchemaError;
use crate::store::StoreError;

/// Severity levels for search errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller misused a cursor or composed an invalid tree
    Reject,
    /// A collaborator failed while the search was running
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Stable error codes for every search failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchErrorCode {
    /// Operation attempted on a closed cursor
    CursorClosed,
    /// `get()` called with no current element
    InvalidPosition,
    /// Cursor or evaluator could not be built
    ConstructionFailed,
    /// Predicate testing failed on schema or record access
    EvaluationFailed,
    /// Store or index failure passed through verbatim
    StoreFailed,
}

impl SearchErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SearchErrorCode::CursorClosed => "DIRSEARCH_CURSOR_CLOSED",
            SearchErrorCode::InvalidPosition => "DIRSEARCH_INVALID_POSITION",
            SearchErrorCode::ConstructionFailed => "DIRSEARCH_CONSTRUCTION_FAILED",
            SearchErrorCode::EvaluationFailed => "DIRSEARCH_EVALUATION_FAILED",
            SearchErrorCode::StoreFailed => "DIRSEARCH_STORE_FAILED",
        }
    }

    /// Returns the severity level for this code
    pub fn severity(&self) -> Severity {
        match self {
            SearchErrorCode::CursorClosed
            | SearchErrorCode::InvalidPosition
            | SearchErrorCode::ConstructionFailed => Severity::Reject,
            SearchErrorCode::EvaluationFailed | SearchErrorCode::StoreFailed => Severity::Error,
        }
    }
}

impl fmt::Display for SearchErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Underlying failure behind an evaluation error
#[derive(Debug, Clone, Error)]
pub enum EvaluationCause {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Search engine error
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("[REJECT] DIRSEARCH_CURSOR_CLOSED: {operation} called on a closed cursor")]
    ClosedCursor { operation: &'static str },

    #[error("[REJECT] DIRSEARCH_INVALID_POSITION: {operation} called without a current element")]
    InvalidPosition { operation: &'static str },

    #[error("[REJECT] DIRSEARCH_CONSTRUCTION_FAILED: cannot build {component}: {reason}")]
    Construction {
        component: &'static str,
        reason: String,
    },

    #[error("[ERROR] DIRSEARCH_EVALUATION_FAILED: {attribute}: {message}")]
    Evaluation {
        attribute: String,
        message: String,
        #[source]
        cause: Option<EvaluationCause>,
    },

    #[error("[ERROR] DIRSEARCH_STORE_FAILED: {0}")]
    Store(#[from] StoreError),
}

impl SearchError {
    /// Operation attempted after close
    pub fn closed(operation: &'static str) -> Self {
        SearchError::ClosedCursor { operation }
    }

    /// Operation requires a current element
    pub fn invalid_position(operation: &'static str) -> Self {
        SearchError::InvalidPosition { operation }
    }

    /// Invalid composition detected at construction time
    pub fn construction(component: &'static str, reason: impl Into<String>) -> Self {
        SearchError::Construction {
            component,
            reason: reason.into(),
        }
    }

    /// Evaluation failure with no underlying collaborator error
    pub fn evaluation(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        SearchError::Evaluation {
            attribute: attribute.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Evaluation failure caused by the schema or the store
    pub fn evaluation_caused_by(
        attribute: impl Into<String>,
        message: impl Into<String>,
        cause: impl Into<EvaluationCause>,
    ) -> Self {
        SearchError::Evaluation {
            attribute: attribute.into(),
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SearchErrorCode {
        match self {
            SearchError::ClosedCursor { .. } => SearchErrorCode::CursorClosed,
            SearchError::InvalidPosition { .. } => SearchErrorCode::InvalidPosition,
            SearchError::Construction { .. } => SearchErrorCode::ConstructionFailed,
            SearchError::Evaluation { .. } => SearchErrorCode::EvaluationFailed,
            SearchError::Store(_) => SearchErrorCode::StoreFailed,
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    /// No search error is fatal to the process; the caller drops the cursor
    pub fn is_fatal(&self) -> bool {
        false
    }
}

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;
