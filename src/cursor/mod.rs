//! Cursor subsystem for dirsearch
//!
//! A cursor is a bidirectional iterator over candidates (`IndexEntry`).
//! Leaf cursors read a store or an index; composite cursors combine child
//! cursors and evaluators into AND, OR, and NOT results.
//!
//! # Position state machine
//!
//! ```text
//!   Unpositioned --before_first--> BeforeFirst --next(true)--> OnElement
//!   Unpositioned --after_last----> AfterLast   --previous(true)--> OnElement
//!   OnElement --next(false)--> AfterLast
//!   OnElement --previous(false)--> BeforeFirst
//!   any --close--> Closed (absorbing)
//! ```
//!
//! # Invariants
//!
//! - Every operation other than close fails on a closed cursor
//! - `get()` succeeds only when positioned on an element
//! - Closing is idempotent; a composite closes all of its children even
//!   when some fail, and reports the first failure
//! - Traversal is deterministic for a fixed store state

mod and;
mod index_leaf;
mod list;
mod not;
mod or;
mod scan;

use crate::errors::{SearchError, SearchResult};
use crate::evaluator::Evaluator;
use crate::observability::{log_event_with_fields, Event, SearchStats};
use crate::store::{EntryId, Index, IndexEntry, Value};

pub use and::AndCursor;
pub use index_leaf::IndexLeafCursor;
pub use list::EntryListCursor;
pub use not::NotCursor;
pub use or::OrCursor;
pub use scan::ScanCursor;

/// Boxed cursor borrowing collaborators for `'a`
pub type BoxCursor<'a> = Box<dyn Cursor + 'a>;

/// Where a cursor currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// Created, never moved
    #[default]
    Unpositioned,
    BeforeFirst,
    AfterLast,
    OnElement,
    Closed,
}

/// Traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Steps `cursor` once in this direction
    pub fn advance<C: Cursor + ?Sized>(self, cursor: &mut C) -> SearchResult<bool> {
        match self {
            Direction::Forward => cursor.next(),
            Direction::Backward => cursor.previous(),
        }
    }

    /// Moves `cursor` to the edge traversal in this direction starts from
    pub fn rewind<C: Cursor + ?Sized>(self, cursor: &mut C) -> SearchResult<()> {
        match self {
            Direction::Forward => cursor.before_first(),
            Direction::Backward => cursor.after_last(),
        }
    }

    pub fn operation(self) -> &'static str {
        match self {
            Direction::Forward => "next()",
            Direction::Backward => "previous()",
        }
    }
}

/// Bidirectional candidate iterator
pub trait Cursor {
    /// Positions before the first element
    fn before_first(&mut self) -> SearchResult<()>;

    /// Positions after the last element
    fn after_last(&mut self) -> SearchResult<()>;

    /// `before_first` followed by `next`
    fn first(&mut self) -> SearchResult<bool> {
        self.before_first()?;
        self.next()
    }

    /// `after_last` followed by `previous`
    fn last(&mut self) -> SearchResult<bool> {
        self.after_last()?;
        self.previous()
    }

    /// Advances; `false` means exhausted and leaves the cursor after last
    fn next(&mut self) -> SearchResult<bool>;

    /// Retreats; `false` means exhausted and leaves the cursor before first
    fn previous(&mut self) -> SearchResult<bool>;

    /// Current element
    fn get(&self) -> SearchResult<&IndexEntry>;

    fn position(&self) -> Position;

    fn is_closed(&self) -> bool {
        self.position() == Position::Closed
    }

    /// Releases resources, with the failure that triggered the close if any.
    /// Closing an already closed cursor succeeds without effect.
    fn release(&mut self, cause: Option<&SearchError>) -> SearchResult<()>;

    fn close(&mut self) -> SearchResult<()> {
        self.release(None)
    }

    fn close_with_cause(&mut self, cause: &SearchError) -> SearchResult<()> {
        self.release(Some(cause))
    }
}

/// Position bookkeeping shared by every cursor implementation
#[derive(Debug, Clone, Default)]
pub struct CursorState {
    position: Position,
    close_cause: Option<String>,
}

impl CursorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_closed(&self) -> bool {
        self.position == Position::Closed
    }

    pub fn is_unpositioned(&self) -> bool {
        self.position == Position::Unpositioned
    }

    /// Fails with a closed-cursor error once closed
    pub fn check_not_closed(&self, operation: &'static str) -> SearchResult<()> {
        if self.is_closed() {
            return Err(SearchError::closed(operation));
        }
        Ok(())
    }

    /// Fails unless positioned on an element
    pub fn check_on_element(&self, operation: &'static str) -> SearchResult<()> {
        self.check_not_closed(operation)?;
        if self.position != Position::OnElement {
            return Err(SearchError::invalid_position(operation));
        }
        Ok(())
    }

    pub fn set_before_first(&mut self) {
        self.position = Position::BeforeFirst;
    }

    pub fn set_after_last(&mut self) {
        self.position = Position::AfterLast;
    }

    pub fn set_on_element(&mut self) {
        self.position = Position::OnElement;
    }

    /// Records the outcome of a move in `direction` and returns it
    pub fn set_available(&mut self, available: bool, direction: Direction) -> bool {
        self.position = match (available, direction) {
            (true, _) => Position::OnElement,
            (false, Direction::Forward) => Position::AfterLast,
            (false, Direction::Backward) => Position::BeforeFirst,
        };
        available
    }

    /// Marks the cursor closed; `false` when it already was
    pub fn close(&mut self, cause: Option<&SearchError>) -> bool {
        if self.is_closed() {
            return false;
        }
        self.position = Position::Closed;
        self.close_cause = cause.map(ToString::to_string);
        true
    }

    /// Failure recorded by `close_with_cause`
    pub fn close_cause(&self) -> Option<&str> {
        self.close_cause.as_deref()
    }
}

/// A child cursor paired with the evaluator that decides membership in it
pub struct Operand<'a> {
    pub cursor: BoxCursor<'a>,
    pub evaluator: Evaluator<'a>,
    /// Expected candidate count; `None` when unknown
    pub estimate: Option<u64>,
}

impl<'a> Operand<'a> {
    pub fn new(cursor: BoxCursor<'a>, evaluator: Evaluator<'a>) -> Self {
        Self {
            cursor,
            evaluator,
            estimate: None,
        }
    }

    pub fn with_estimate(mut self, estimate: u64) -> Self {
        self.estimate = Some(estimate);
        self
    }
}

/// Moves `source` in `direction` until `accept` takes a candidate.
///
/// The accepted candidate is a copy; evaluators may attach records and
/// values to it without touching the source.
pub(crate) fn seek<C, F>(
    source: &mut C,
    direction: Direction,
    stats: Option<&SearchStats>,
    mut accept: F,
) -> SearchResult<Option<IndexEntry>>
where
    C: Cursor + ?Sized,
    F: FnMut(&mut IndexEntry) -> SearchResult<bool>,
{
    while direction.advance(source)? {
        if let Some(stats) = stats {
            stats.increment_examined();
        }
        let mut candidate = source.get()?.clone();
        if accept(&mut candidate)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Stores the outcome of a seek into a composite cursor's state
pub(crate) fn settle(
    state: &mut CursorState,
    current: &mut Option<IndexEntry>,
    found: Option<IndexEntry>,
    direction: Direction,
    stats: Option<&SearchStats>,
) -> bool {
    let available = found.is_some();
    if available {
        if let Some(stats) = stats {
            stats.increment_emitted();
        }
    }
    *current = found;
    state.set_available(available, direction)
}

/// Closes every child, logging each failure; returns the first failure
pub(crate) fn close_children<'c, 'a: 'c, I>(children: I, cause: Option<&SearchError>) -> SearchResult<()>
where
    I: IntoIterator<Item = &'c mut BoxCursor<'a>>,
{
    let mut first_failure = None;
    for child in children {
        if let Err(e) = child.release(cause) {
            log_event_with_fields(Event::CursorCloseFailed, &[("error", &e.to_string())]);
            if first_failure.is_none() {
                first_failure = Some(e);
            }
        }
    }
    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// First value the index records for `id` that `matches` accepts.
///
/// The reverse cursor is closed on every path; a scan failure is reported
/// ahead of a close failure.
pub(crate) fn first_reverse_match(
    index: &dyn Index,
    id: EntryId,
    mut matches: impl FnMut(&Value) -> bool,
) -> SearchResult<Option<Value>> {
    let mut values = index.reverse_cursor(id)?;
    match scan_values(values.as_mut(), &mut matches) {
        Ok(found) => {
            values.close()?;
            Ok(found)
        }
        Err(e) => {
            if let Err(close_error) = values.close_with_cause(&e) {
                log_event_with_fields(Event::CursorCloseFailed, &[("error", &close_error.to_string())]);
            }
            Err(e)
        }
    }
}

fn scan_values<C: Cursor + ?Sized>(
    values: &mut C,
    matches: &mut impl FnMut(&Value) -> bool,
) -> SearchResult<Option<Value>> {
    while values.next()? {
        if let Some(value) = values.get()?.value() {
            if matches(value) {
                return Ok(Some(value.clone()));
            }
        }
    }
    Ok(None)
}

/// Logs a cursor's creation
pub(crate) fn log_created(kind: &str, operands: usize) {
    log_event_with_fields(
        Event::CursorCreated,
        &[("kind", kind), ("operands", &operands.to_string())],
    );
}

/// Logs a cursor's first close
pub(crate) fn log_closed(kind: &str, cause: Option<&SearchError>) {
    match cause {
        Some(cause) => log_event_with_fields(
            Event::CursorClosed,
            &[("kind", kind), ("cause", &cause.to_string())],
        ),
        None => log_event_with_fields(Event::CursorClosed, &[("kind", kind)]),
    }
}

/// Rewinds `cursor` and collects every id in `direction` order
pub fn collect_ids<C: Cursor + ?Sized>(cursor: &mut C, direction: Direction) -> SearchResult<Vec<EntryId>> {
    direction.rewind(cursor)?;
    let mut ids = Vec::new();
    while direction.advance(cursor)? {
        ids.push(cursor.get()?.id());
    }
    Ok(ids)
}
