//! Full-scan leaf cursor
//!
//! Walks every stored record and keeps those its evaluator accepts. Used
//! for leaves with no usable index.

use super::{close_children, log_closed, log_created, seek, settle, BoxCursor, Cursor, CursorState, Direction, Position};
use crate::errors::{SearchError, SearchResult};
use crate::evaluator::Evaluator;
use crate::observability::SearchStats;
use crate::store::IndexEntry;

pub struct ScanCursor<'a> {
    source: BoxCursor<'a>,
    evaluator: Evaluator<'a>,
    current: Option<IndexEntry>,
    state: CursorState,
    stats: Option<&'a SearchStats>,
}

impl<'a> ScanCursor<'a> {
    /// Filters `source` (normally the store's full scan) through `evaluator`
    pub fn new(source: BoxCursor<'a>, evaluator: Evaluator<'a>) -> Self {
        log_created("scan", 1);
        Self {
            source,
            evaluator,
            current: None,
            state: CursorState::new(),
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: Option<&'a SearchStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn evaluator(&self) -> &Evaluator<'a> {
        &self.evaluator
    }

    fn advance(&mut self, direction: Direction) -> SearchResult<bool> {
        self.state.check_not_closed(direction.operation())?;
        if self.state.is_unpositioned() {
            direction.rewind(self.source.as_mut())?;
        }
        let evaluator = &self.evaluator;
        let found = seek(self.source.as_mut(), direction, self.stats, |candidate| {
            evaluator.evaluate(candidate)
        })?;
        Ok(settle(&mut self.state, &mut self.current, found, direction, self.stats))
    }
}

impl Cursor for ScanCursor<'_> {
    fn before_first(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("before_first()")?;
        self.source.before_first()?;
        self.current = None;
        self.state.set_before_first();
        Ok(())
    }

    fn after_last(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("after_last()")?;
        self.source.after_last()?;
        self.current = None;
        self.state.set_after_last();
        Ok(())
    }

    fn next(&mut self) -> SearchResult<bool> {
        self.advance(Direction::Forward)
    }

    fn previous(&mut self) -> SearchResult<bool> {
        self.advance(Direction::Backward)
    }

    fn get(&self) -> SearchResult<&IndexEntry> {
        self.state.check_on_element("get()")?;
        self.current
            .as_ref()
            .ok_or_else(|| SearchError::invalid_position("get()"))
    }

    fn position(&self) -> Position {
        self.state.position()
    }

    fn release(&mut self, cause: Option<&SearchError>) -> SearchResult<()> {
        if !self.state.close(cause) {
            return Ok(());
        }
        self.current = None;
        log_closed("scan", cause);
        close_children(std::iter::once(&mut self.source), cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_evaluator;
    use crate::config::SearchConfig;
    use crate::context::SearchContext;
    use crate::filter::{ExpressionNode, SubstringAssertion};
    use crate::schema::SchemaRegistry;
    use crate::store::{Entry, EntryId, EntryStore, MemoryStore, Value};

    #[test]
    fn test_scan_keeps_matches_and_cached_values() {
        let schema = SchemaRegistry::core();
        let store = MemoryStore::from_entries(vec![
            Entry::new(1).with_attribute("cn", ["Alice"]),
            Entry::new(2).with_attribute("cn", ["Bob"]),
            Entry::new(3).with_attribute("cn", ["Alina"]),
        ]);
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let filter = ExpressionNode::substring(SubstringAssertion::new("cn").with_initial("ali"));
        let evaluator = build_evaluator(ctx, &filter).unwrap();
        let mut cursor = ScanCursor::new(store.all_entries().unwrap(), evaluator);

        assert!(cursor.next().unwrap());
        let first = cursor.get().unwrap();
        assert_eq!(first.id(), EntryId::new(1));
        assert_eq!(first.value(), Some(&Value::from("alice")));

        assert!(cursor.next().unwrap());
        assert_eq!(cursor.get().unwrap().id(), EntryId::new(3));
        assert!(!cursor.next().unwrap());
        assert_eq!(cursor.position(), Position::AfterLast);

        assert!(cursor.previous().unwrap());
        assert_eq!(cursor.get().unwrap().id(), EntryId::new(3));
    }
}
