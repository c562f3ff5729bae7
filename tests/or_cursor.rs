//! OR cursor tests
//!
//! An OR over operands with overlapping results must:
//! 1. Emit every id accepted by some operand exactly once per pass
//! 2. Traverse operands in order forward and in reverse order backward
//! 3. Mirror the forward order when reversed after a forward pass
//! 4. Surface evaluator failures to the caller and close cleanly

use std::sync::Arc;

use dirsearch::cursor::collect_ids;
use dirsearch::errors::EvaluationCause;
use dirsearch::observability::SearchStats;
use dirsearch::schema::SchemaRegistry;
use dirsearch::store::{StoreError, StoreResult};
use dirsearch::{
    build_cursor, search_ids, BoxCursor, Direction, Entry, EntryId, EntryStore, ExpressionNode, Index,
    MemoryStore, SearchConfig, SearchContext, SearchError,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// ids 1, 3, 5 carry ou=a; ids 3, 4 carry ou=b; id 2 carries neither
fn overlapping() -> MemoryStore {
    MemoryStore::from_entries(vec![
        Entry::new(1).with_attribute("ou", ["a"]),
        Entry::new(2).with_attribute("ou", ["c"]),
        Entry::new(3).with_attribute("ou", ["a", "b"]),
        Entry::new(4).with_attribute("ou", ["b"]),
        Entry::new(5).with_attribute("ou", ["a"]),
    ])
}

fn indexed_overlapping(schema: &SchemaRegistry) -> MemoryStore {
    let mut store = overlapping();
    store.index_with_schema(schema, "ou").unwrap();
    store
}

fn a_or_b() -> ExpressionNode {
    ExpressionNode::or(vec![
        ExpressionNode::equality("ou", "a"),
        ExpressionNode::equality("ou", "b"),
    ])
}

fn ids(raw: &[u64]) -> Vec<EntryId> {
    raw.iter().map(|id| EntryId::new(*id)).collect()
}

fn sorted(mut ids: Vec<EntryId>) -> Vec<EntryId> {
    ids.sort();
    ids
}

/// Store whose record lookups fail for one id; indexes still answer
struct FailingLookupStore {
    inner: MemoryStore,
    broken: EntryId,
}

impl EntryStore for FailingLookupStore {
    fn lookup(&self, id: EntryId) -> StoreResult<Arc<Entry>> {
        if id == self.broken {
            return Err(StoreError::Backend(format!("record {} unreadable", id)));
        }
        self.inner.lookup(id)
    }

    fn index(&self, attribute: &dirsearch::schema::AttributeType) -> Option<&dyn Index> {
        self.inner.index(attribute)
    }

    fn all_entries(&self) -> StoreResult<BoxCursor<'_>> {
        self.inner.all_entries()
    }

    fn count(&self) -> u64 {
        self.inner.count()
    }
}

// =============================================================================
// Deduplication
// =============================================================================

/// Test: Forward traversal yields each operand in turn, skipping repeats.
#[test]
fn test_forward_order_over_index_cursors() {
    let schema = SchemaRegistry::core();
    let store = indexed_overlapping(&schema);
    let config = SearchConfig::default();
    let ctx = SearchContext::new(&store, &schema, &config);

    let found = search_ids(ctx, &a_or_b(), Direction::Forward).unwrap();
    assert_eq!(found, ids(&[1, 3, 5, 4]));
}

/// Test: Scan-backed operands produce the same order as index-backed ones.
#[test]
fn test_forward_order_over_scans() {
    let schema = SchemaRegistry::core();
    let store = overlapping();
    let config = SearchConfig::full_scan();
    let ctx = SearchContext::new(&store, &schema, &config);

    let found = search_ids(ctx, &a_or_b(), Direction::Forward).unwrap();
    assert_eq!(found, ids(&[1, 3, 5, 4]));
}

/// Test: A fresh backward traversal yields the same set without repeats.
#[test]
fn test_fresh_backward_yields_same_set() {
    let schema = SchemaRegistry::core();
    let store = indexed_overlapping(&schema);

    for config in [SearchConfig::default(), SearchConfig::full_scan()] {
        let ctx = SearchContext::new(&store, &schema, &config);
        let backward = search_ids(ctx, &a_or_b(), Direction::Backward).unwrap();
        assert_eq!(backward.first(), Some(&EntryId::new(4)));
        assert_eq!(sorted(backward), ids(&[1, 3, 4, 5]));
    }
}

/// Test: Reversing after a forward pass gives the exact mirror.
#[test]
fn test_reverse_after_forward_is_mirror() {
    let schema = SchemaRegistry::core();
    let store = indexed_overlapping(&schema);
    let config = SearchConfig::default();
    let ctx = SearchContext::new(&store, &schema, &config);

    let mut cursor = build_cursor(ctx, &a_or_b()).unwrap();
    let forward = collect_ids(cursor.as_mut(), Direction::Forward).unwrap();
    let backward = collect_ids(cursor.as_mut(), Direction::Backward).unwrap();
    assert_eq!(backward, ids(&[4, 5, 3, 1]));

    let mut mirrored = forward;
    mirrored.reverse();
    assert_eq!(backward, mirrored);
    cursor.close().unwrap();
}

/// Test: Identical operands collapse to one copy of each id.
#[test]
fn test_identical_operands_emit_once() {
    let schema = SchemaRegistry::core();
    let store = indexed_overlapping(&schema);
    let config = SearchConfig::default();
    let ctx = SearchContext::new(&store, &schema, &config);

    let filter = ExpressionNode::or(vec![
        ExpressionNode::equality("ou", "a"),
        ExpressionNode::equality("ou", "A"),
        ExpressionNode::equality("ou", " a "),
    ]);
    assert_eq!(search_ids(ctx, &filter, Direction::Forward).unwrap(), ids(&[1, 3, 5]));
}

/// Test: Skipped duplicates are counted in the search statistics.
#[test]
fn test_blacklist_skips_are_counted() {
    let schema = SchemaRegistry::core();
    let store = indexed_overlapping(&schema);
    let config = SearchConfig::default();
    let stats = SearchStats::new();
    let ctx = SearchContext::new(&store, &schema, &config).with_stats(&stats);

    search_ids(ctx, &a_or_b(), Direction::Forward).unwrap();
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.blacklist_skips, 1);
    assert_eq!(snapshot.record_lookups, 0);
    assert!(snapshot.reverse_lookups > 0);
}

// =============================================================================
// Failures
// =============================================================================

/// Test: A lookup failure during duplicate detection reaches the caller.
#[test]
fn test_lookup_failure_propagates_with_cause() {
    let schema = SchemaRegistry::core();
    let store = FailingLookupStore {
        inner: indexed_overlapping(&schema),
        broken: EntryId::new(1),
    };
    let config = SearchConfig {
        use_reverse_index: false,
        ..SearchConfig::default()
    };
    let ctx = SearchContext::new(&store, &schema, &config);

    let result = search_ids(ctx, &a_or_b(), Direction::Forward);
    match result {
        Err(SearchError::Evaluation { attribute, cause, .. }) => {
            assert_eq!(attribute, "ou");
            assert!(matches!(cause, Some(EvaluationCause::Store(StoreError::Backend(_)))));
        }
        other => panic!("expected evaluation failure, got {:?}", other),
    }
}

/// Test: The cursor stays usable for close after a failed move.
#[test]
fn test_close_after_failure() {
    let schema = SchemaRegistry::core();
    let store = FailingLookupStore {
        inner: indexed_overlapping(&schema),
        broken: EntryId::new(4),
    };
    let config = SearchConfig {
        use_reverse_index: false,
        ..SearchConfig::default()
    };
    let ctx = SearchContext::new(&store, &schema, &config);

    let mut cursor = build_cursor(ctx, &a_or_b()).unwrap();
    let mut seen = Vec::new();
    let failure = loop {
        match cursor.next() {
            Ok(true) => seen.push(cursor.get().unwrap().id()),
            Ok(false) => panic!("traversal should fail on id 4"),
            Err(e) => break e,
        }
    };
    assert_eq!(seen, ids(&[1, 3, 5]));
    assert!(matches!(failure, SearchError::Evaluation { .. }));

    cursor.close_with_cause(&failure).unwrap();
    assert!(cursor.is_closed());
}
