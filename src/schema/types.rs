//! Schema type definitions
//!
//! Attribute types reference their syntax and matching rules by OID or name;
//! `SchemaInfo` implementations resolve those references, walking the
//! `superior` chain so a subtype inherits what it does not declare.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::store::Value;

/// Value syntax of an attribute type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syntax {
    /// Syntax OID
    pub oid: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Whether values are text; binary syntaxes cannot be matched by pattern
    pub human_readable: bool,
}

impl Syntax {
    pub fn new(oid: impl Into<String>, description: impl Into<String>, human_readable: bool) -> Self {
        Self {
            oid: oid.into(),
            description: description.into(),
            human_readable,
        }
    }
}

/// The four matching-rule slots an attribute type can fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchingRuleKind {
    Equality,
    Ordering,
    Substring,
    Approximate,
}

impl MatchingRuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchingRuleKind::Equality => "equality",
            MatchingRuleKind::Ordering => "ordering",
            MatchingRuleKind::Substring => "substring",
            MatchingRuleKind::Approximate => "approximate",
        }
    }
}

/// Canonical-form functions provided by matching rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    /// Value unchanged
    #[default]
    NoOp,
    /// Trim, collapse inner whitespace runs to one space
    DeepTrim,
    /// `DeepTrim`, then lower-case
    DeepTrimToLower,
    /// Remove all whitespace
    NumericString,
}

impl Normalizer {
    /// Normalizes text; binary values pass through unchanged
    pub fn normalize(&self, value: &Value) -> Value {
        match value {
            Value::Text(text) => Value::Text(self.normalize_str(text)),
            Value::Binary(_) => value.clone(),
        }
    }

    pub fn normalize_str(&self, text: &str) -> String {
        match self {
            Normalizer::NoOp => text.to_string(),
            Normalizer::DeepTrim => deep_trim(text),
            Normalizer::DeepTrimToLower => deep_trim(text).to_lowercase(),
            Normalizer::NumericString => text.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }
}

fn deep_trim(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ordering semantics of a matching rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Unicode code point order of text values
    #[default]
    Lexical,
    /// Signed integer order; non-numeric values are incomparable
    Integer,
    /// Raw byte order
    Bytes,
}

impl Comparator {
    /// Compares two normalized values; `None` when they are incomparable
    pub fn compare(&self, left: &Value, right: &Value) -> Option<Ordering> {
        match self {
            Comparator::Lexical => match (left, right) {
                (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
                _ => None,
            },
            Comparator::Integer => {
                let a: i128 = left.as_text()?.trim().parse().ok()?;
                let b: i128 = right.as_text()?.trim().parse().ok()?;
                Some(a.cmp(&b))
            }
            Comparator::Bytes => Some(left.as_bytes().cmp(right.as_bytes())),
        }
    }
}

/// A matching rule as consumed by evaluators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingRule {
    pub oid: String,
    pub name: String,
    #[serde(default)]
    pub normalizer: Normalizer,
    #[serde(default)]
    pub comparator: Comparator,
}

impl MatchingRule {
    pub fn new(
        oid: impl Into<String>,
        name: impl Into<String>,
        normalizer: Normalizer,
        comparator: Comparator,
    ) -> Self {
        Self {
            oid: oid.into(),
            name: name.into(),
            normalizer,
            comparator,
        }
    }
}

/// Attribute type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeType {
    pub oid: String,
    /// Names, preferred name first
    #[serde(default)]
    pub names: Vec<String>,
    /// Supertype name or OID
    #[serde(default)]
    pub superior: Option<String>,
    /// Syntax OID; inherited from the superior when absent
    #[serde(default)]
    pub syntax: Option<String>,
    #[serde(default)]
    pub equality: Option<String>,
    #[serde(default)]
    pub ordering: Option<String>,
    #[serde(default)]
    pub substring: Option<String>,
    #[serde(default)]
    pub approximate: Option<String>,
}

impl AttributeType {
    /// Creates a type with no syntax or rules of its own
    pub fn new(oid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            names: vec![name.into()],
            superior: None,
            syntax: None,
            equality: None,
            ordering: None,
            substring: None,
            approximate: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.names.push(alias.into());
        self
    }

    pub fn with_superior(mut self, superior: impl Into<String>) -> Self {
        self.superior = Some(superior.into());
        self
    }

    pub fn with_syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    pub fn with_rule(mut self, kind: MatchingRuleKind, rule: impl Into<String>) -> Self {
        let rule = Some(rule.into());
        match kind {
            MatchingRuleKind::Equality => self.equality = rule,
            MatchingRuleKind::Ordering => self.ordering = rule,
            MatchingRuleKind::Substring => self.substring = rule,
            MatchingRuleKind::Approximate => self.approximate = rule,
        }
        self
    }

    /// Preferred name, or the OID when the type is unnamed
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.oid)
    }

    /// Case-insensitive match against the OID and every name
    pub fn has_name(&self, name: &str) -> bool {
        self.oid.eq_ignore_ascii_case(name) || self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Rule declared directly on this type for the given slot
    pub fn declared_rule(&self, kind: MatchingRuleKind) -> Option<&String> {
        match kind {
            MatchingRuleKind::Equality => self.equality.as_ref(),
            MatchingRuleKind::Ordering => self.ordering.as_ref(),
            MatchingRuleKind::Substring => self.substring.as_ref(),
            MatchingRuleKind::Approximate => self.approximate.as_ref(),
        }
    }
}
