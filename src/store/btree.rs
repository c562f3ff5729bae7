//! BTreeMap-based attribute index
//!
//! Forward half: normalized value -> ids, ids ascending per value.
//! Reverse half: id -> normalized values, values ascending per id.
//! Both halves iterate deterministically.

use std::collections::{BTreeMap, BTreeSet};

use super::entry::{EntryId, IndexEntry, Value};
use super::errors::{StoreError, StoreResult};
use super::Index;
use crate::cursor::{BoxCursor, EntryListCursor};

/// A single-attribute index
#[derive(Debug, Clone, Default)]
pub struct ValueIndex {
    /// Attribute name the index was declared on
    attribute: String,
    /// Value -> ids
    forward: BTreeMap<Value, BTreeSet<EntryId>>,
    /// Id -> values; `None` for forward-only indexes
    reverse: Option<BTreeMap<EntryId, BTreeSet<Value>>>,
}

impl ValueIndex {
    /// Creates an index with both halves
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            forward: BTreeMap::new(),
            reverse: Some(BTreeMap::new()),
        }
    }

    /// Creates an index without reverse lookup
    pub fn forward_only(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            forward: BTreeMap::new(),
            reverse: None,
        }
    }

    /// Records `id` under a normalized value
    pub fn insert(&mut self, key: Value, id: EntryId) {
        if let Some(reverse) = self.reverse.as_mut() {
            reverse.entry(id).or_default().insert(key.clone());
        }
        self.forward.entry(key).or_default().insert(id);
    }

    /// Removes one (value, id) pair; drops keys left without ids
    pub fn remove(&mut self, key: &Value, id: EntryId) {
        if let Some(ids) = self.forward.get_mut(key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.forward.remove(key);
            }
        }
        if let Some(reverse) = self.reverse.as_mut() {
            if let Some(values) = reverse.get_mut(&id) {
                values.remove(key);
                if values.is_empty() {
                    reverse.remove(&id);
                }
            }
        }
    }

    /// Ids recorded under an exact normalized value, ascending
    pub fn lookup_eq(&self, key: &Value) -> Vec<EntryId> {
        self.forward
            .get(key)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        if let Some(reverse) = self.reverse.as_mut() {
            reverse.clear();
        }
    }

    /// Number of distinct values
    pub fn key_count(&self) -> usize {
        self.forward.len()
    }

    /// Number of (value, id) pairs
    pub fn pair_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }
}

impl Index for ValueIndex {
    fn attribute(&self) -> &str {
        &self.attribute
    }

    fn has_reverse(&self) -> bool {
        self.reverse.is_some()
    }

    fn forward_cursor(&self) -> StoreResult<BoxCursor<'_>> {
        let entries = self
            .forward
            .iter()
            .flat_map(|(value, ids)| ids.iter().map(move |id| IndexEntry::keyed(value.clone(), *id)))
            .collect();
        Ok(Box::new(EntryListCursor::new(entries)))
    }

    fn forward_cursor_on(&self, key: &Value) -> StoreResult<BoxCursor<'_>> {
        let entries = self
            .lookup_eq(key)
            .into_iter()
            .map(|id| IndexEntry::keyed(key.clone(), id))
            .collect();
        Ok(Box::new(EntryListCursor::new(entries)))
    }

    fn reverse_cursor(&self, id: EntryId) -> StoreResult<BoxCursor<'_>> {
        let reverse = self
            .reverse
            .as_ref()
            .ok_or_else(|| StoreError::index_unavailable(&self.attribute, "index has no reverse half"))?;
        let entries = reverse
            .get(&id)
            .map(|values| {
                values
                    .iter()
                    .map(|value| IndexEntry::keyed(value.clone(), id))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Box::new(EntryListCursor::new(entries)))
    }

    fn count(&self) -> u64 {
        self.pair_count() as u64
    }

    fn count_of(&self, key: &Value) -> u64 {
        self.forward.get(key).map_or(0, |ids| ids.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{collect_ids, Direction};

    fn id(raw: u64) -> EntryId {
        EntryId::new(raw)
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = ValueIndex::new("cn");
        index.insert(Value::from("alice"), id(200));
        index.insert(Value::from("alice"), id(100));
        index.insert(Value::from("bob"), id(300));

        assert_eq!(index.lookup_eq(&Value::from("alice")), vec![id(100), id(200)]);
        assert_eq!(index.count_of(&Value::from("bob")), 1);
        assert_eq!(index.key_count(), 2);
        assert_eq!(index.count(), 3);
    }

    #[test]
    fn test_remove_drops_empty_keys() {
        let mut index = ValueIndex::new("cn");
        index.insert(Value::from("x"), id(1));
        index.remove(&Value::from("x"), id(1));

        assert_eq!(index.key_count(), 0);
        let mut reverse = index.reverse_cursor(id(1)).unwrap();
        assert!(!reverse.next().unwrap());
    }

    #[test]
    fn test_forward_cursor_orders_by_value_then_id() {
        let mut index = ValueIndex::new("ou");
        index.insert(Value::from("sales"), id(5));
        index.insert(Value::from("eng"), id(9));
        index.insert(Value::from("sales"), id(1));

        let mut cursor = index.forward_cursor().unwrap();
        let ids = collect_ids(cursor.as_mut(), Direction::Forward).unwrap();
        assert_eq!(ids, vec![id(9), id(1), id(5)]);
    }

    #[test]
    fn test_reverse_cursor_lists_values_of_one_id() {
        let mut index = ValueIndex::new("cn");
        index.insert(Value::from("alicia"), id(7));
        index.insert(Value::from("alice"), id(7));
        index.insert(Value::from("bob"), id(8));

        let mut reverse = index.reverse_cursor(id(7)).unwrap();
        let mut values = Vec::new();
        while reverse.next().unwrap() {
            values.push(reverse.get().unwrap().value().cloned().unwrap());
        }
        assert_eq!(values, vec![Value::from("alice"), Value::from("alicia")]);
    }

    #[test]
    fn test_forward_only_index_refuses_reverse() {
        let index = ValueIndex::forward_only("cn");
        assert!(!index.has_reverse());
        assert!(matches!(
            index.reverse_cursor(id(1)),
            Err(StoreError::IndexUnavailable { .. })
        ));
    }
}
