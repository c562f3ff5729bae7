//! Disjunction cursor
//!
//! Traverses its operands one after another: forward from the first
//! operand to the last, backward from the last to the first. When an
//! operand yields a candidate, every other operand's evaluator is asked
//! whether it would also yield it; each one that would adds the id to its
//! blacklist and silently skips it later. Blacklists are never cleared, so
//! each id is emitted at most once per direction of travel.

use std::collections::HashSet;

use super::{close_children, log_closed, log_created, settle, BoxCursor, Cursor, CursorState, Direction, Operand, Position};
use crate::errors::{SearchError, SearchResult};
use crate::evaluator::Evaluator;
use crate::observability::SearchStats;
use crate::store::{EntryId, IndexEntry};

pub struct OrCursor<'a> {
    cursors: Vec<BoxCursor<'a>>,
    evaluators: Vec<Evaluator<'a>>,
    /// Ids each operand must skip, by operand position
    blacklists: Vec<HashSet<EntryId>>,
    /// Operand currently being traversed
    active: usize,
    current: Option<IndexEntry>,
    state: CursorState,
    stats: Option<&'a SearchStats>,
}

impl<'a> OrCursor<'a> {
    /// Fails unless at least two operands are given
    pub fn new(operands: Vec<Operand<'a>>) -> SearchResult<Self> {
        if operands.len() < 2 {
            return Err(SearchError::construction(
                "OrCursor",
                format!("requires at least two operands, got {}", operands.len()),
            ));
        }
        log_created("or", operands.len());

        let (cursors, evaluators): (Vec<_>, Vec<_>) = operands
            .into_iter()
            .map(|operand| (operand.cursor, operand.evaluator))
            .unzip();
        let blacklists = vec![HashSet::new(); cursors.len()];

        Ok(Self {
            cursors,
            evaluators,
            blacklists,
            active: 0,
            current: None,
            state: CursorState::new(),
            stats: None,
        })
    }

    pub fn with_stats(mut self, stats: Option<&'a SearchStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn operand_count(&self) -> usize {
        self.cursors.len()
    }

    /// Ids operand `operand` will skip
    pub fn blacklist(&self, operand: usize) -> Option<&HashSet<EntryId>> {
        self.blacklists.get(operand)
    }

    /// Index of the operand currently being traversed
    pub fn active_operand(&self) -> usize {
        self.active
    }

    /// Next candidate of the active operand that is not blacklisted for it
    fn seek_active(&mut self, direction: Direction) -> SearchResult<Option<IndexEntry>> {
        let active = self.active;
        while direction.advance(self.cursors[active].as_mut())? {
            if let Some(stats) = self.stats {
                stats.increment_examined();
            }
            let mut candidate = self.cursors[active].get()?.clone();
            if self.blacklists[active].contains(&candidate.id()) {
                if let Some(stats) = self.stats {
                    stats.increment_blacklist_skips();
                }
                continue;
            }
            self.blacklist_if_duplicate(&mut candidate)?;
            return Ok(Some(candidate));
        }
        Ok(None)
    }

    /// Blacklists the candidate for every other operand that accepts it
    fn blacklist_if_duplicate(&mut self, candidate: &mut IndexEntry) -> SearchResult<()> {
        for (operand, evaluator) in self.evaluators.iter().enumerate() {
            if operand == self.active {
                continue;
            }
            if evaluator.evaluate(candidate)? {
                self.blacklists[operand].insert(candidate.id());
            }
        }
        Ok(())
    }
}

impl Cursor for OrCursor<'_> {
    fn before_first(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("before_first()")?;
        self.active = 0;
        self.cursors[0].before_first()?;
        self.current = None;
        self.state.set_before_first();
        Ok(())
    }

    fn after_last(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("after_last()")?;
        self.active = self.cursors.len() - 1;
        self.cursors[self.active].after_last()?;
        self.current = None;
        self.state.set_after_last();
        Ok(())
    }

    fn next(&mut self) -> SearchResult<bool> {
        self.state.check_not_closed("next()")?;
        if self.state.is_unpositioned() {
            self.before_first()?;
        }
        loop {
            if let Some(candidate) = self.seek_active(Direction::Forward)? {
                return Ok(settle(&mut self.state, &mut self.current, Some(candidate), Direction::Forward, self.stats));
            }
            if self.active + 1 >= self.cursors.len() {
                break;
            }
            self.active += 1;
            self.cursors[self.active].before_first()?;
        }
        Ok(settle(&mut self.state, &mut self.current, None, Direction::Forward, self.stats))
    }

    fn previous(&mut self) -> SearchResult<bool> {
        self.state.check_not_closed("previous()")?;
        if self.state.is_unpositioned() {
            self.after_last()?;
        }
        loop {
            if let Some(candidate) = self.seek_active(Direction::Backward)? {
                return Ok(settle(&mut self.state, &mut self.current, Some(candidate), Direction::Backward, self.stats));
            }
            if self.active == 0 {
                break;
            }
            self.active -= 1;
            self.cursors[self.active].after_last()?;
        }
        Ok(settle(&mut self.state, &mut self.current, None, Direction::Backward, self.stats))
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
        log_closed("or", cause);
        close_children(self.cursors.iter_mut(), cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_evaluator;
    use crate::config::SearchConfig;
    use crate::context::SearchContext;
    use crate::cursor::{collect_ids, EntryListCursor};
    use crate::filter::ExpressionNode;
    use crate::schema::SchemaRegistry;
    use crate::store::{Entry, MemoryStore};

    fn ou_store() -> MemoryStore {
        MemoryStore::from_entries(vec![
            Entry::new(1).with_attribute("ou", ["a"]),
            Entry::new(2).with_attribute("ou", ["c"]),
            Entry::new(3).with_attribute("ou", ["a", "b"]),
            Entry::new(4).with_attribute("ou", ["b"]),
            Entry::new(5).with_attribute("ou", ["a"]),
        ])
    }

    fn operand<'a>(ctx: SearchContext<'a>, ids: &[u64], ou: &str) -> Operand<'a> {
        let cursor = EntryListCursor::new(ids.iter().map(|id| IndexEntry::new(*id)).collect());
        let evaluator = build_evaluator(ctx, &ExpressionNode::equality("ou", ou)).unwrap();
        Operand::new(Box::new(cursor), evaluator)
    }

    fn ids(raw: &[u64]) -> Vec<EntryId> {
        raw.iter().map(|id| EntryId::new(*id)).collect()
    }

    #[test]
    fn test_forward_skips_duplicates() {
        let schema = SchemaRegistry::core();
        let store = ou_store();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let mut cursor = OrCursor::new(vec![operand(ctx, &[1, 3, 5], "a"), operand(ctx, &[3, 4], "b")]).unwrap();
        assert_eq!(collect_ids(&mut cursor, Direction::Forward).unwrap(), ids(&[1, 3, 5, 4]));
        assert!(cursor.blacklist(1).unwrap().contains(&EntryId::new(3)));
        assert!(cursor.blacklist(0).unwrap().is_empty());
    }

    #[test]
    fn test_reverse_after_forward_is_mirror() {
        let schema = SchemaRegistry::core();
        let store = ou_store();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let mut cursor = OrCursor::new(vec![operand(ctx, &[1, 3, 5], "a"), operand(ctx, &[3, 4], "b")]).unwrap();
        let forward = collect_ids(&mut cursor, Direction::Forward).unwrap();
        let mut backward = collect_ids(&mut cursor, Direction::Backward).unwrap();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_previous_from_unpositioned_starts_with_last_operand() {
        let schema = SchemaRegistry::core();
        let store = ou_store();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let mut cursor = OrCursor::new(vec![operand(ctx, &[1, 3, 5], "a"), operand(ctx, &[3, 4], "b")]).unwrap();
        assert!(cursor.previous().unwrap());
        assert_eq!(cursor.get().unwrap().id(), EntryId::new(4));
        assert_eq!(cursor.active_operand(), 1);

        let mut rest = vec![cursor.get().unwrap().id()];
        while cursor.previous().unwrap() {
            rest.push(cursor.get().unwrap().id());
        }
        rest.sort();
        assert_eq!(rest, ids(&[1, 3, 4, 5]));
    }

    #[test]
    fn test_requires_two_operands() {
        let schema = SchemaRegistry::core();
        let store = ou_store();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        assert!(matches!(OrCursor::new(vec![]), Err(SearchError::Construction { .. })));
        assert!(matches!(
            OrCursor::new(vec![operand(ctx, &[1], "a")]),
            Err(SearchError::Construction { component: "OrCursor", .. })
        ));
    }

    #[test]
    fn test_position_errors_and_close() {
        let schema = SchemaRegistry::core();
        let store = ou_store();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let mut cursor = OrCursor::new(vec![operand(ctx, &[1], "a"), operand(ctx, &[4], "b")]).unwrap();
        assert!(matches!(cursor.get(), Err(SearchError::InvalidPosition { .. })));

        cursor.close().unwrap();
        cursor.close().unwrap();
        assert!(cursor.is_closed());
        assert!(matches!(cursor.next(), Err(SearchError::ClosedCursor { .. })));
        assert!(matches!(cursor.after_last(), Err(SearchError::ClosedCursor { .. })));
    }
}
