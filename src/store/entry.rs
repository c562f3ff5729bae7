//! Entry identifiers, attribute values, records, and candidates

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::AttributeType;

/// Identifier of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub const fn new(raw: u64) -> Self {
        EntryId(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for EntryId {
    fn from(raw: u64) -> Self {
        EntryId(raw)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An attribute value, raw or normalized.
///
/// JSON strings deserialize as `Text`, arrays of bytes as `Binary`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Binary(Vec<u8>),
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Binary(bytes.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Value::Text(text) => text.as_bytes(),
            Value::Binary(bytes) => bytes,
        }
    }

    pub fn is_human_readable(&self) -> bool {
        matches!(self, Value::Text(_))
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Binary(bytes)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{}", text),
            Value::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// A full stored record.
///
/// Attribute keys are stored lower-cased; any name or OID of an attribute
/// type finds its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    id: EntryId,
    #[serde(default, deserialize_with = "lowercase_keys")]
    attributes: BTreeMap<String, Vec<Value>>,
}

impl Entry {
    pub fn new(id: impl Into<EntryId>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder form of [`Entry::add_value`] for several values
    pub fn with_attribute<V: Into<Value>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        for value in values {
            self.add_value(name, value);
        }
        self
    }

    pub fn add_value(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into());
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Values stored under every name and the OID of `attribute`, in
    /// declaration order of the keys.
    ///
    /// Subtypes are not consulted; callers walk descendants themselves.
    pub fn get(&self, attribute: &AttributeType) -> Vec<&Value> {
        let mut keys: Vec<String> = Vec::with_capacity(attribute.names.len() + 1);
        for key in attribute
            .names
            .iter()
            .chain(std::iter::once(&attribute.oid))
            .map(|key| key.to_lowercase())
        {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys.iter()
            .filter_map(|key| self.attributes.get(key))
            .flatten()
            .collect()
    }

    /// Values stored under exactly this attribute key
    pub fn get_by_name(&self, name: &str) -> Option<&[Value]> {
        self.attributes.get(&name.to_lowercase()).map(Vec::as_slice)
    }

}

fn lowercase_keys<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Vec<Value>>::deserialize(deserializer)?;
    let mut attributes: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for (name, values) in raw {
        attributes.entry(name.to_lowercase()).or_default().extend(values);
    }
    Ok(attributes)
}

/// A candidate produced by a cursor.
///
/// Carries the id, the index key it was found under (if any), and the full
/// record once something resolved it. Evaluators that resolve a matching
/// normalized value cache it here.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    id: EntryId,
    value: Option<Value>,
    entry: Option<Arc<Entry>>,
}

impl IndexEntry {
    pub fn new(id: impl Into<EntryId>) -> Self {
        Self {
            id: id.into(),
            value: None,
            entry: None,
        }
    }

    /// Candidate found under an index key
    pub fn keyed(value: Value, id: impl Into<EntryId>) -> Self {
        Self {
            id: id.into(),
            value: Some(value),
            entry: None,
        }
    }

    /// Candidate with its record already attached
    pub fn resolved(entry: Arc<Entry>) -> Self {
        Self {
            id: entry.id(),
            value: None,
            entry: Some(entry),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }

    pub fn entry(&self) -> Option<&Arc<Entry>> {
        self.entry.as_ref()
    }

    pub fn set_entry(&mut self, entry: Arc<Entry>) {
        self.entry = Some(entry);
    }
}
