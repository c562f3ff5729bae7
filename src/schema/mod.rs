//! Schema subsystem for dirsearch
//!
//! Consumed by evaluators to resolve, for an attribute type named in a filter:
//! - its value syntax (human-readable or binary)
//! - its equality, ordering, substring, and approximate matching rules
//! - its subtype hierarchy (descendant attribute types)
//!
//! # Invariants
//!
//! - Schema metadata is read-only for the lifetime of a search
//! - Subtypes inherit syntax and rules they do not declare

mod errors;
mod registry;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use registry::{SchemaDefinition, SchemaInfo, SchemaRegistry};
pub use types::{AttributeType, Comparator, MatchingRule, MatchingRuleKind, Normalizer, Syntax};
