//! Entry store subsystem for dirsearch
//!
//! The search engine reads records and indexes through two traits:
//! - `EntryStore`: record lookup by id, index access, full scans
//! - `Index`: one attribute's forward (value -> ids) and optional
//!   reverse (id -> values) halves
//!
//! `MemoryStore` and `ValueIndex` are the in-process implementations used
//! by the CLI and by tests.
//!
//! # Invariants
//!
//! - Index keys are normalized with the attribute's equality rule
//! - Cursors returned by a store iterate in a stable order
//! - Store errors reach callers unchanged

mod btree;
mod entry;
mod errors;
mod memory;

use std::sync::Arc;

use crate::cursor::BoxCursor;
use crate::schema::AttributeType;

pub use btree::ValueIndex;
pub use entry::{Entry, EntryId, IndexEntry, Value};
pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// Read access to stored records
pub trait EntryStore {
    /// Full record for an id
    fn lookup(&self, id: EntryId) -> StoreResult<Arc<Entry>>;

    /// Whether an index is maintained on this attribute type
    fn has_index_on(&self, attribute: &AttributeType) -> bool {
        self.index(attribute).is_some()
    }

    fn index(&self, attribute: &AttributeType) -> Option<&dyn Index>;

    /// Every stored record, ascending by id, with the record attached
    fn all_entries(&self) -> StoreResult<BoxCursor<'_>>;

    /// Number of stored records
    fn count(&self) -> u64;
}

/// One attribute's index
pub trait Index {
    /// Attribute the index was declared on
    fn attribute(&self) -> &str;

    /// Whether `reverse_cursor` is available
    fn has_reverse(&self) -> bool;

    /// All (value, id) pairs ordered by value, then id
    fn forward_cursor(&self) -> StoreResult<BoxCursor<'_>>;

    /// Pairs recorded under exactly `key`
    fn forward_cursor_on(&self, key: &Value) -> StoreResult<BoxCursor<'_>>;

    /// Values recorded for one id, ascending
    fn reverse_cursor(&self, id: EntryId) -> StoreResult<BoxCursor<'_>>;

    /// Number of (value, id) pairs
    fn count(&self) -> u64;

    /// Number of ids recorded under `key`
    fn count_of(&self, key: &Value) -> u64;
}
