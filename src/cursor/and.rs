//! Conjunction cursor
//!
//! One operand drives: its cursor supplies candidates, and each candidate
//! must satisfy every other operand's evaluator. The driver is the operand
//! with the smallest estimate (unknown estimates rank last, ties go to the
//! earliest operand). Non-driving evaluators run in ascending estimate
//! order and stop at the first rejection.

use super::{close_children, log_closed, log_created, seek, settle, BoxCursor, Cursor, CursorState, Direction, Operand, Position};
use crate::errors::{SearchError, SearchResult};
use crate::evaluator::Evaluator;
use crate::observability::SearchStats;
use crate::store::IndexEntry;

pub struct AndCursor<'a> {
    driver: BoxCursor<'a>,
    /// Position of the driving operand in the original operand list
    driver_operand: usize,
    /// Cursors of non-driving operands; never moved, only closed
    idle: Vec<BoxCursor<'a>>,
    evaluators: Vec<Evaluator<'a>>,
    current: Option<IndexEntry>,
    state: CursorState,
    stats: Option<&'a SearchStats>,
}

impl<'a> AndCursor<'a> {
    /// Fails on an empty operand list
    pub fn new(operands: Vec<Operand<'a>>) -> SearchResult<Self> {
        let operand_count = operands.len();
        let mut ranked: Vec<(usize, Operand<'a>)> = operands.into_iter().enumerate().collect();
        ranked.sort_by_key(|(position, operand)| (operand.estimate.unwrap_or(u64::MAX), *position));

        let mut ranked = ranked.into_iter();
        let (driver_operand, driving) = ranked
            .next()
            .ok_or_else(|| SearchError::construction("AndCursor", "requires at least one operand"))?;

        let (idle, evaluators): (Vec<_>, Vec<_>) = ranked
            .map(|(_, operand)| (operand.cursor, operand.evaluator))
            .unzip();

        log_created("and", operand_count);
        Ok(Self {
            driver: driving.cursor,
            driver_operand,
            idle,
            evaluators,
            current: None,
            state: CursorState::new(),
            stats: None,
        })
    }

    pub fn with_stats(mut self, stats: Option<&'a SearchStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Position of the driving operand in the list given to `new`
    pub fn driver_operand(&self) -> usize {
        self.driver_operand
    }

    fn advance(&mut self, direction: Direction) -> SearchResult<bool> {
        self.state.check_not_closed(direction.operation())?;
        if self.state.is_unpositioned() {
            direction.rewind(self.driver.as_mut())?;
        }
        let evaluators = &self.evaluators;
        let found = seek(self.driver.as_mut(), direction, self.stats, |candidate| {
            for evaluator in evaluators {
                if !evaluator.evaluate(candidate)? {
                    return Ok(false);
                }
            }
            Ok(true)
        })?;
        Ok(settle(&mut self.state, &mut self.current, found, direction, self.stats))
    }
}

impl Cursor for AndCursor<'_> {
    fn before_first(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("before_first()")?;
        self.driver.before_first()?;
        self.current = None;
        self.state.set_before_first();
        Ok(())
    }

    fn after_last(&mut self) -> SearchResult<()> {
        self.state.check_not_closed("after_last()")?;
        self.driver.after_last()?;
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
        log_closed("and", cause);
        close_children(std::iter::once(&mut self.driver).chain(self.idle.iter_mut()), cause)
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
    use crate::store::{Entry, EntryId, MemoryStore};

    fn ou_store() -> MemoryStore {
        MemoryStore::from_entries(vec![
            Entry::new(1).with_attribute("ou", ["a"]),
            Entry::new(3).with_attribute("ou", ["a", "b"]),
            Entry::new(4).with_attribute("ou", ["b"]),
            Entry::new(5).with_attribute("ou", ["a", "b"]),
        ])
    }

    fn operand<'a>(ctx: SearchContext<'a>, ids: &[u64], ou: &str) -> Operand<'a> {
        let cursor = EntryListCursor::new(ids.iter().map(|id| IndexEntry::new(*id)).collect());
        let evaluator = build_evaluator(ctx, &ExpressionNode::equality("ou", ou)).unwrap();
        Operand::new(Box::new(cursor), evaluator)
    }

    #[test]
    fn test_smallest_estimate_drives() {
        let schema = SchemaRegistry::core();
        let store = ou_store();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let mut cursor = AndCursor::new(vec![
            operand(ctx, &[1, 3, 5], "a").with_estimate(3),
            operand(ctx, &[3, 4, 5], "b").with_estimate(2),
        ])
        .unwrap();
        assert_eq!(cursor.driver_operand(), 1);
        assert_eq!(
            collect_ids(&mut cursor, Direction::Forward).unwrap(),
            vec![EntryId::new(3), EntryId::new(5)]
        );
        assert_eq!(
            collect_ids(&mut cursor, Direction::Backward).unwrap(),
            vec![EntryId::new(5), EntryId::new(3)]
        );
    }

    #[test]
    fn test_unknown_estimates_keep_first_operand_driving() {
        let schema = SchemaRegistry::core();
        let store = ou_store();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let cursor = AndCursor::new(vec![
            operand(ctx, &[1, 3, 5], "a"),
            operand(ctx, &[3, 4, 5], "b"),
        ])
        .unwrap();
        assert_eq!(cursor.driver_operand(), 0);
    }

    #[test]
    fn test_single_operand_passes_through() {
        let schema = SchemaRegistry::core();
        let store = ou_store();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let mut cursor = AndCursor::new(vec![operand(ctx, &[3, 4], "b")]).unwrap();
        assert_eq!(
            collect_ids(&mut cursor, Direction::Forward).unwrap(),
            vec![EntryId::new(3), EntryId::new(4)]
        );
    }

    #[test]
    fn test_empty_operands_rejected() {
        assert!(matches!(
            AndCursor::new(vec![]),
            Err(SearchError::Construction { component: "AndCursor", .. })
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let schema = SchemaRegistry::core();
        let store = ou_store();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let mut cursor = AndCursor::new(vec![operand(ctx, &[1], "a"), operand(ctx, &[4], "b")]).unwrap();
        cursor.close_with_cause(&SearchError::evaluation("ou", "stop")).unwrap();
        cursor.close().unwrap();
        assert_eq!(cursor.position(), Position::Closed);
        assert!(matches!(cursor.previous(), Err(SearchError::ClosedCursor { .. })));
    }
}
