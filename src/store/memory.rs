//! In-memory entry store
//!
//! Records live in a `BTreeMap` keyed by id; each indexed attribute has a
//! `ValueIndex` fed with values normalized by the attribute's equality rule.
//! Indexes cover the attribute's own values only, never its subtypes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use super::btree::ValueIndex;
use super::entry::{Entry, EntryId, IndexEntry};
use super::errors::{StoreError, StoreResult};
use super::{EntryStore, Index};
use crate::cursor::{BoxCursor, EntryListCursor};
use crate::schema::{AttributeType, MatchingRuleKind, Normalizer, SchemaInfo, SchemaResult};

struct IndexedAttribute {
    attribute: AttributeType,
    normalizer: Normalizer,
    index: ValueIndex,
}

impl IndexedAttribute {
    fn insert(&mut self, entry: &Entry) {
        for value in entry.get(&self.attribute) {
            self.index.insert(self.normalizer.normalize(value), entry.id());
        }
    }

    fn remove(&mut self, entry: &Entry) {
        for value in entry.get(&self.attribute) {
            self.index.remove(&self.normalizer.normalize(value), entry.id());
        }
    }
}

/// Entry store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    entries: BTreeMap<EntryId, Arc<Entry>>,
    /// Keyed by attribute OID
    indexes: HashMap<String, IndexedAttribute>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a list of records
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            store.add(entry);
        }
        store
    }

    /// Loads records from a JSON array file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Backend(format!("cannot read {}: {}", path.display(), e))
        })?;
        let entries: Vec<Entry> = serde_json::from_str(&content).map_err(|e| {
            StoreError::Backend(format!("cannot parse {}: {}", path.display(), e))
        })?;
        Ok(Self::from_entries(entries))
    }

    /// Adds or replaces a record, keeping every index current
    pub fn add(&mut self, entry: Entry) {
        let entry = Arc::new(entry);
        if let Some(previous) = self.entries.insert(entry.id(), Arc::clone(&entry)) {
            for indexed in self.indexes.values_mut() {
                indexed.remove(&previous);
            }
        }
        for indexed in self.indexes.values_mut() {
            indexed.insert(&entry);
        }
    }

    pub fn remove(&mut self, id: EntryId) -> Option<Arc<Entry>> {
        let removed = self.entries.remove(&id)?;
        for indexed in self.indexes.values_mut() {
            indexed.remove(&removed);
        }
        Some(removed)
    }

    /// Maintains a forward and reverse index on `attribute`
    pub fn index_attribute(&mut self, attribute: AttributeType, normalizer: Normalizer) {
        let index = ValueIndex::new(attribute.name());
        self.install(attribute, normalizer, index);
    }

    /// Maintains a forward-only index on `attribute`
    pub fn index_attribute_forward_only(&mut self, attribute: AttributeType, normalizer: Normalizer) {
        let index = ValueIndex::forward_only(attribute.name());
        self.install(attribute, normalizer, index);
    }

    /// Indexes an attribute named in the schema, keyed by its equality rule
    pub fn index_with_schema(&mut self, schema: &dyn SchemaInfo, name: &str) -> SchemaResult<()> {
        let attribute = schema.resolve_attribute_type(name)?;
        let normalizer = schema
            .matching_rule_for(&attribute, MatchingRuleKind::Equality)?
            .map(|rule| rule.normalizer)
            .unwrap_or_default();
        self.index_attribute(attribute, normalizer);
        Ok(())
    }

    fn install(&mut self, attribute: AttributeType, normalizer: Normalizer, index: ValueIndex) {
        let mut indexed = IndexedAttribute {
            attribute,
            normalizer,
            index,
        };
        for entry in self.entries.values() {
            indexed.insert(entry);
        }
        self.indexes.insert(indexed.attribute.oid.clone(), indexed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntryStore for MemoryStore {
    fn lookup(&self, id: EntryId) -> StoreResult<Arc<Entry>> {
        self.entries
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn index(&self, attribute: &AttributeType) -> Option<&dyn Index> {
        self.indexes
            .get(&attribute.oid)
            .map(|indexed| &indexed.index as &dyn Index)
    }

    fn all_entries(&self) -> StoreResult<BoxCursor<'_>> {
        let entries = self
            .entries
            .values()
            .map(|entry| IndexEntry::resolved(Arc::clone(entry)))
            .collect();
        Ok(Box::new(EntryListCursor::new(entries)))
    }

    fn count(&self) -> u64 {
        self.entries.len() as u64
    }
}
