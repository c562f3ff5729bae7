//! Collaborators shared by every evaluator and cursor of one search

use std::fmt;

use crate::config::SearchConfig;
use crate::observability::SearchStats;
use crate::schema::SchemaInfo;
use crate::store::EntryStore;

/// Read-only handles to the store, schema, and configuration.
///
/// Copied into each evaluator; every handle must outlive the search.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    pub store: &'a dyn EntryStore,
    pub schema: &'a dyn SchemaInfo,
    pub config: &'a SearchConfig,
    pub stats: Option<&'a SearchStats>,
}

impl<'a> SearchContext<'a> {
    pub fn new(store: &'a dyn EntryStore, schema: &'a dyn SchemaInfo, config: &'a SearchConfig) -> Self {
        Self {
            store,
            schema,
            config,
            stats: None,
        }
    }

    /// Counts examined candidates, evaluations, and lookups into `stats`
    pub fn with_stats(mut self, stats: &'a SearchStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

impl fmt::Debug for SearchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchContext")
            .field("config", self.config)
            .field("stats", &self.stats.map(SearchStats::snapshot))
            .finish_non_exhaustive()
    }
}
