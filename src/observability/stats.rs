//! Search counters
//!
//! - Counters only, monotonic
//! - Shared by reference across every cursor and evaluator of one search
//! - Never influence traversal decisions

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one search session
#[derive(Debug, Default)]
pub struct SearchStats {
    /// Candidates pulled from child cursors
    candidates_examined: AtomicU64,
    /// Candidates handed to the caller by composite cursors
    candidates_emitted: AtomicU64,
    /// Candidates an OrCursor skipped because another operand emitted them
    blacklist_skips: AtomicU64,
    /// Evaluator invocations
    evaluations: AtomicU64,
    /// Full-record lookups against the entry store
    record_lookups: AtomicU64,
    /// Reverse-index lookups
    reverse_lookups: AtomicU64,
}

impl SearchStats {
    /// Creates a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_examined(&self) {
        self.candidates_examined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_emitted(&self) {
        self.candidates_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_blacklist_skips(&self) {
        self.blacklist_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_evaluations(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_record_lookups(&self) {
        self.record_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reverse_lookups(&self) {
        self.reverse_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            candidates_examined: self.candidates_examined.load(Ordering::Relaxed),
            candidates_emitted: self.candidates_emitted.load(Ordering::Relaxed),
            blacklist_skips: self.blacklist_skips.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            record_lookups: self.record_lookups.load(Ordering::Relaxed),
            reverse_lookups: self.reverse_lookups.load(Ordering::Relaxed),
        }
    }
}

/// Immutable counter values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub candidates_examined: u64,
    pub candidates_emitted: u64,
    pub blacklist_skips: u64,
    pub evaluations: u64,
    pub record_lookups: u64,
    pub reverse_lookups: u64,
}
