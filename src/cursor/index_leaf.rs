//! Index-driven leaf cursor
//!
//! Walks an attribute index's forward half and emits the ids whose index
//! key satisfies a value assertion. An id recorded under several matching
//! keys is emitted once: only under the first matching key of its reverse
//! entry, so the choice is the same in both directions.

use super::{
    first_reverse_match, log_closed, log_created, seek, settle, BoxCursor, Cursor, CursorState, Direction, Position,
};
use crate::errors::{SearchError, SearchResult};
use crate::evaluator::ValueAssertion;
use crate::observability::SearchStats;
use crate::store::{EntryId, Index, IndexEntry, Value};

pub struct IndexLeafCursor<'a> {
    index: &'a dyn Index,
    source: BoxCursor<'a>,
    assertion: ValueAssertion,
    /// Whether one id can surface under several keys
    distinct: bool,
    current: Option<IndexEntry>,
    state: CursorState,
    stats: Option<&'a SearchStats>,
}

impl<'a> IndexLeafCursor<'a> {
    /// Scans the whole forward index; requires the reverse half
    pub fn new(index: &'a dyn Index, assertion: ValueAssertion) -> SearchResult<Self> {
        if !index.has_reverse() {
            return Err(SearchError::construction(
                "IndexLeafCursor",
                format!("index on {} has no reverse half", index.attribute()),
            ));
        }
        let source = index.forward_cursor()?;
        log_created("index", 1);
        Ok(Self {
            index,
            source,
            assertion,
            distinct: true,
            current: None,
            state: CursorState::new(),
            stats: None,
        })
    }

    /// Reads only the ids recorded under one normalized key
    pub fn on_key(index: &'a dyn Index, key: Value) -> SearchResult<Self> {
        let source = index.forward_cursor_on(&key)?;
        log_created("index_key", 1);
        Ok(Self {
            index,
            source,
            assertion: ValueAssertion::Present,
            distinct: false,
            current: None,
            state: CursorState::new(),
            stats: None,
        })
    }

    pub fn with_stats(mut self, stats: Option<&'a SearchStats>) -> Self {
        self.stats = stats;
        self
    }

    fn advance(&mut self, direction: Direction) -> SearchResult<bool> {
        self.state.check_not_closed(direction.operation())?;
        if self.state.is_unpositioned() {
            direction.rewind(self.source.as_mut())?;
        }
        let index = self.index;
        let assertion = &self.assertion;
        let distinct = self.distinct;
        let stats = self.stats;
        let found = seek(self.source.as_mut(), direction, stats, |candidate| {
            let key = match candidate.value() {
                Some(key) => key,
                None => return Ok(false),
            };
            if !assertion.matches(key) {
                return Ok(false);
            }
            if !distinct {
                return Ok(true);
            }
            is_canonical_key(index, assertion, candidate.id(), key, stats)
        })?;
        Ok(settle(&mut self.state, &mut self.current, found, direction, self.stats))
    }
}

/// Whether `key` is the first of the id's indexed values the assertion accepts
fn is_canonical_key(
    index: &dyn Index,
    assertion: &ValueAssertion,
    id: EntryId,
    key: &Value,
    stats: Option<&SearchStats>,
) -> SearchResult<bool> {
    if let Some(stats) = stats {
        stats.increment_reverse_lookups();
    }
    let first = first_reverse_match(index, id, |value| assertion.matches(value))?;
    Ok(first.map_or(true, |value| &value == key))
}

impl Cursor for IndexLeafCursor<'_> {
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
        log_closed("index", cause);
        self.source.release(cause)
    }
}
