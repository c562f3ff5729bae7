//! Cursor over an owned snapshot of candidates

use super::{log_closed, Cursor, CursorState, Direction, Position};
use crate::errors::{SearchError, SearchResult};
use crate::store::IndexEntry;

/// Bidirectional cursor over a fixed list.
///
/// `offset` is 0 before the first element, `len + 1` after the last, and
/// `i + 1` while on element `i`.
#[derive(Debug, Clone, Default)]
pub struct EntryListCursor {
    entries: Vec<IndexEntry>,
    offset: usize,
    state: CursorState,
}

impl EntryListCursor {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self {
            entries,
            offset: 0,
            state: CursorState::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cursor for EntryListCursor {
    fn before_first(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("before_first()")?;
        self.offset = 0;
        self.state.set_before_first();
        Ok(())
    }

    fn after_last(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("after_last()")?;
        self.offset = self.entries.len() + 1;
        self.state.set_after_last();
        Ok(())
    }

    fn next(&mut self) -> SearchResult<bool> {
        self.state.check_not_closed("next()")?;
        if self.offset <= self.entries.len() {
            self.offset += 1;
        }
        let available = self.offset <= self.entries.len();
        Ok(self.state.set_available(available, Direction::Forward))
    }

    fn previous(&mut self) -> SearchResult<bool> {
        self.state.check_not_closed("previous()")?;
        if self.state.is_unpositioned() {
            self.offset = self.entries.len() + 1;
        }
        if self.offset > 0 {
            self.offset -= 1;
        }
        let available = self.offset > 0;
        Ok(self.state.set_available(available, Direction::Backward))
    }

    fn get(&self) -> SearchResult<&IndexEntry> {
        self.state.check_on_element("get()")?;
        self.offset
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or_else(|| SearchError::invalid_position("get()"))
    }

    fn position(&self) -> Position {
        self.state.position()
    }

    fn release(&mut self, cause: Option<&SearchError>) -> SearchResult<()> {
        if self.state.close(cause) {
            self.entries.clear();
            log_closed("list", cause);
        }
        Ok(())
    }
}
