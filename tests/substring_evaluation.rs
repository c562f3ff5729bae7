//! Substring evaluation tests
//!
//! Substring assertions must:
//! 1. Match normalized values against initial, any, and final fragments
//! 2. Answer from the reverse index without reading records when one exists
//! 3. Fall back on full records, including descendant attribute types
//! 4. Never match attributes whose syntax is not human readable

use std::cell::Cell;
use std::sync::Arc;

use dirsearch::evaluator::SubstringEvaluator;
use dirsearch::schema::{AttributeType, SchemaRegistry};
use dirsearch::store::{StoreResult, Value};
use dirsearch::{
    search_ids, BoxCursor, Direction, Entry, EntryId, EntryStore, ExpressionNode, Index, IndexEntry, MemoryStore,
    SearchConfig, SearchContext, SearchError, SubstringAssertion,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// Store wrapper counting record lookups
struct CountingStore {
    inner: MemoryStore,
    lookups: Cell<u64>,
}

impl CountingStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            lookups: Cell::new(0),
        }
    }

    fn lookups(&self) -> u64 {
        self.lookups.get()
    }
}

impl EntryStore for CountingStore {
    fn lookup(&self, id: EntryId) -> StoreResult<Arc<Entry>> {
        self.lookups.set(self.lookups.get() + 1);
        self.inner.lookup(id)
    }

    fn index(&self, attribute: &AttributeType) -> Option<&dyn Index> {
        self.inner.index(attribute)
    }

    fn all_entries(&self) -> StoreResult<BoxCursor<'_>> {
        self.inner.all_entries()
    }

    fn count(&self) -> u64 {
        self.inner.count()
    }
}

fn people() -> MemoryStore {
    MemoryStore::from_entries(vec![
        Entry::new(1).with_attribute("cn", ["Alice"]).with_attribute("sn", ["Liddell"]),
        Entry::new(2).with_attribute("cn", ["Bob"]).with_attribute("sn", ["Smith"]),
        Entry::new(3).with_attribute("cn", ["Alina", "Ally"]).with_attribute("sn", ["Jones"]),
        Entry::new(4).with_attribute("jpegPhoto", [vec![0xFF_u8, 0xD8, 0xFF]]),
    ])
}

fn cn(initial: Option<&str>, any: &[&str], terminal: Option<&str>) -> SubstringAssertion {
    let mut assertion = SubstringAssertion::new("cn");
    if let Some(initial) = initial {
        assertion = assertion.with_initial(initial);
    }
    for fragment in any {
        assertion = assertion.with_any(*fragment);
    }
    if let Some(terminal) = terminal {
        assertion = assertion.with_final(terminal);
    }
    assertion
}

fn ids(raw: &[u64]) -> Vec<EntryId> {
    raw.iter().map(|id| EntryId::new(*id)).collect()
}

// =============================================================================
// Fragment matching
// =============================================================================

/// Test: Initial, any, and final fragments match case-insensitively.
#[test]
fn test_fragments_match_normalized_values() {
    let schema = SchemaRegistry::core();
    let store = people();
    let config = SearchConfig::full_scan();
    let ctx = SearchContext::new(&store, &schema, &config);

    let cases = [
        (cn(Some("ALI"), &[], None), ids(&[1, 3])),
        (cn(None, &[], Some("B")), ids(&[2])),
        (cn(Some("a"), &["i"], Some("e")), ids(&[1])),
        (cn(None, &["l", "y"], None), ids(&[3])),
        (cn(None, &[], None), ids(&[1, 2, 3])),
    ];
    for (assertion, expected) in cases {
        let filter = ExpressionNode::substring(assertion);
        assert_eq!(search_ids(ctx, &filter, Direction::Forward).unwrap(), expected, "{}", filter);
    }
}

/// Test: Regex metacharacters in fragments are matched literally.
#[test]
fn test_fragments_are_literal() {
    let schema = SchemaRegistry::core();
    let store = MemoryStore::from_entries(vec![
        Entry::new(1).with_attribute("cn", ["a.b"]),
        Entry::new(2).with_attribute("cn", ["axb"]),
    ]);
    let config = SearchConfig::full_scan();
    let ctx = SearchContext::new(&store, &schema, &config);

    let filter = ExpressionNode::substring(cn(Some("a."), &[], None));
    assert_eq!(search_ids(ctx, &filter, Direction::Forward).unwrap(), ids(&[1]));
}

// =============================================================================
// Index-assisted evaluation
// =============================================================================

/// Test: With a reverse index, evaluation never reads a record.
#[test]
fn test_reverse_index_avoids_record_lookups() {
    let schema = SchemaRegistry::core();
    let mut inner = people();
    inner.index_with_schema(&schema, "cn").unwrap();
    let store = CountingStore::new(inner);
    let config = SearchConfig::default();
    let ctx = SearchContext::new(&store, &schema, &config);

    let evaluator = SubstringEvaluator::new(ctx, &cn(Some("ali"), &[], None)).unwrap();
    assert!(evaluator.evaluate(&mut IndexEntry::new(1)).unwrap());
    assert!(!evaluator.evaluate(&mut IndexEntry::new(2)).unwrap());
    assert!(evaluator.evaluate(&mut IndexEntry::new(3)).unwrap());
    assert_eq!(store.lookups(), 0);

    let filter = ExpressionNode::substring(cn(Some("ali"), &[], None));
    assert_eq!(search_ids(ctx, &filter, Direction::Forward).unwrap(), ids(&[1, 3]));
    assert_eq!(search_ids(ctx, &filter, Direction::Backward).unwrap(), ids(&[3, 1]));
    assert_eq!(store.lookups(), 0);
}

/// Test: Several recorded values under one id; the first match answers.
#[test]
fn test_reverse_index_with_several_values() {
    let schema = SchemaRegistry::core();
    let mut inner = MemoryStore::from_entries(vec![Entry::new(7).with_attribute("cn", ["Alice", "ALICIA"])]);
    inner.index_with_schema(&schema, "cn").unwrap();
    let store = CountingStore::new(inner);
    let config = SearchConfig::default();
    let ctx = SearchContext::new(&store, &schema, &config);

    let evaluator = SubstringEvaluator::new(ctx, &cn(Some("ali"), &[], None)).unwrap();
    let mut candidate = IndexEntry::new(7);
    assert!(evaluator.evaluate(&mut candidate).unwrap());
    assert!(candidate.entry().is_none());
    assert_eq!(store.lookups(), 0);

    let filter = ExpressionNode::substring(cn(Some("ali"), &[], None));
    assert_eq!(search_ids(ctx, &filter, Direction::Forward).unwrap(), ids(&[7]));
}

/// Test: Without the reverse path, the record is read once and attached.
#[test]
fn test_record_path_attaches_entry_and_value() {
    let schema = SchemaRegistry::core();
    let mut inner = people();
    inner.index_with_schema(&schema, "cn").unwrap();
    let store = CountingStore::new(inner);
    let config = SearchConfig {
        use_reverse_index: false,
        ..SearchConfig::default()
    };
    let ctx = SearchContext::new(&store, &schema, &config);

    let evaluator = SubstringEvaluator::new(ctx, &cn(None, &[], Some("ly"))).unwrap();
    let mut candidate = IndexEntry::new(3);
    assert!(evaluator.evaluate(&mut candidate).unwrap());
    assert_eq!(store.lookups(), 1);
    assert_eq!(candidate.value(), Some(&Value::from("ally")));
    assert!(candidate.entry().is_some());

    // The attached record is reused
    assert!(evaluator.evaluate(&mut candidate).unwrap());
    assert_eq!(store.lookups(), 1);
}

// =============================================================================
// Descendants and syntax
// =============================================================================

/// Test: An assertion on a supertype matches values of its subtypes.
#[test]
fn test_supertype_matches_descendant_values() {
    let schema = SchemaRegistry::core();
    let store = people();
    let config = SearchConfig::default();
    let ctx = SearchContext::new(&store, &schema, &config);

    let assertion = SubstringAssertion::new("name").with_final("ITH");
    let evaluator = SubstringEvaluator::new(ctx, &assertion).unwrap();
    let mut candidate = IndexEntry::new(2);
    assert!(evaluator.evaluate(&mut candidate).unwrap());
    assert_eq!(candidate.value(), Some(&Value::from("smith")));

    let filter = ExpressionNode::substring(assertion);
    assert_eq!(search_ids(ctx, &filter, Direction::Forward).unwrap(), ids(&[2]));
}

/// Test: Values stored under a name and an alias are all candidates.
#[test]
fn test_values_under_every_alias_match() {
    let schema = SchemaRegistry::core();
    let entry = Entry::new(1)
        .with_attribute("cn", ["alice"])
        .with_attribute("commonName", ["bob"]);
    let mut store = MemoryStore::from_entries(vec![entry.clone()]);
    let config = SearchConfig::full_scan();
    let ctx = SearchContext::new(&store, &schema, &config);

    let evaluator = SubstringEvaluator::new(ctx, &cn(Some("bob"), &[], None)).unwrap();
    assert!(evaluator.evaluate_record(&entry).unwrap());
    let mut candidate = IndexEntry::new(1);
    assert!(evaluator.evaluate(&mut candidate).unwrap());
    assert_eq!(candidate.value(), Some(&Value::from("bob")));

    // The index records both spellings too
    store.index_with_schema(&schema, "cn").unwrap();
    let config = SearchConfig::default();
    let ctx = SearchContext::new(&store, &schema, &config);
    for prefix in ["ali", "bob"] {
        let filter = ExpressionNode::substring(cn(Some(prefix), &[], None));
        assert_eq!(search_ids(ctx, &filter, Direction::Forward).unwrap(), ids(&[1]), "{}", filter);
    }
}

/// Test: Binary attributes never match, even with an empty pattern.
#[test]
fn test_binary_syntax_never_matches() {
    let schema = SchemaRegistry::core();
    let store = people();
    let config = SearchConfig::default();
    let ctx = SearchContext::new(&store, &schema, &config);

    let assertion = SubstringAssertion::new("jpegPhoto");
    let evaluator = SubstringEvaluator::new(ctx, &assertion).unwrap();
    assert!(evaluator.pattern().is_none());
    assert!(!evaluator.evaluate(&mut IndexEntry::new(4)).unwrap());

    let filter = ExpressionNode::substring(assertion);
    assert!(search_ids(ctx, &filter, Direction::Forward).unwrap().is_empty());
}

/// Test: Unknown attribute types fail at construction.
#[test]
fn test_unknown_attribute_rejected() {
    let schema = SchemaRegistry::core();
    let store = people();
    let config = SearchConfig::default();
    let ctx = SearchContext::new(&store, &schema, &config);

    let result = SubstringEvaluator::new(ctx, &SubstringAssertion::new("favouriteColour").with_initial("r"));
    assert!(matches!(result, Err(SearchError::Evaluation { cause: Some(_), .. })));
}
