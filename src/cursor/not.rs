//! Negation cursor
//!
//! Candidates come from a full scan; a candidate is emitted when the
//! negated child evaluator rejects it.

use super::{close_children, log_closed, log_created, seek, settle, BoxCursor, Cursor, CursorState, Direction, Position};
use crate::errors::{SearchError, SearchResult};
use crate::evaluator::Evaluator;
use crate::observability::SearchStats;
use crate::store::IndexEntry;

pub struct NotCursor<'a> {
    scan: BoxCursor<'a>,
    negated: Evaluator<'a>,
    current: Option<IndexEntry>,
    state: CursorState,
    stats: Option<&'a SearchStats>,
}

impl<'a> NotCursor<'a> {
    /// Emits the candidates of `scan` that `negated` rejects
    pub fn new(scan: BoxCursor<'a>, negated: Evaluator<'a>) -> Self {
        log_created("not", 1);
        Self {
            scan,
            negated,
            current: None,
            state: CursorState::new(),
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: Option<&'a SearchStats>) -> Self {
        self.stats = stats;
        self
    }

    fn advance(&mut self, direction: Direction) -> SearchResult<bool> {
        self.state.check_not_closed(direction.operation())?;
        if self.state.is_unpositioned() {
            direction.rewind(self.scan.as_mut())?;
        }
        let negated = &self.negated;
        let found = seek(self.scan.as_mut(), direction, self.stats, |candidate| {
            Ok(!negated.evaluate(candidate)?)
        })?;
        Ok(settle(&mut self.state, &mut self.current, found, direction, self.stats))
    }
}

impl Cursor for NotCursor<'_> {
    fn before_first(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("before_first()")?;
        self.scan.before_first()?;
        self.current = None;
        self.state.set_before_first();
        Ok(())
    }

    fn after_last(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("after_last()")?;
        self.scan.after_last()?;
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
        log_closed("not", cause);
        close_children(std::iter::once(&mut self.scan), cause)
    }
}
