//! Evaluator subsystem for dirsearch
//!
//! An evaluator decides whether one candidate satisfies one filter node.
//! Leaf evaluators resolve their attribute type and matching rule from the
//! schema once, at construction, then test candidates either through the
//! reverse half of the attribute's index or against the full record.
//!
//! # Invariants
//!
//! - Evaluation never changes the result of a later evaluation
//! - The record path attaches the looked-up record to the candidate and
//!   caches the normalized value that matched
//! - Values of an attribute's descendant types count as its values
//! - Evaluation failures are `Evaluation` errors carrying the attribute

mod leaf;
mod logical;
mod substring;
mod target;

use std::cmp::Ordering;

use regex::Regex;

use crate::errors::SearchResult;
use crate::filter::ExpressionNode;
use crate::schema::{AttributeType, Comparator};
use crate::store::{Entry, IndexEntry, Value};

pub use leaf::{ApproximateEvaluator, EqualityEvaluator, OrderingEvaluator, PresenceEvaluator};
pub use logical::{AndEvaluator, NotEvaluator, OrEvaluator};
pub use substring::SubstringEvaluator;

/// A predicate on one normalized attribute value
#[derive(Debug, Clone)]
pub enum ValueAssertion {
    /// Any value
    Present,
    /// Equal under the comparator
    Equals { key: Value, comparator: Comparator },
    /// Whole-value regex match on text; `None` never matches
    Pattern(Option<Regex>),
    /// Greater than or equal to `bound`
    AtLeast { bound: Value, comparator: Comparator },
    /// Less than or equal to `bound`
    AtMost { bound: Value, comparator: Comparator },
}

impl ValueAssertion {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueAssertion::Present => true,
            ValueAssertion::Equals { key, comparator } => {
                comparator.compare(value, key) == Some(Ordering::Equal)
            }
            ValueAssertion::Pattern(Some(regex)) => {
                value.as_text().map_or(false, |text| regex.is_match(text))
            }
            ValueAssertion::Pattern(None) => false,
            ValueAssertion::AtLeast { bound, comparator } => matches!(
                comparator.compare(value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            ValueAssertion::AtMost { bound, comparator } => matches!(
                comparator.compare(value, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Evaluator for any filter node
#[derive(Debug, Clone)]
pub enum Evaluator<'a> {
    And(AndEvaluator<'a>),
    Or(OrEvaluator<'a>),
    Not(NotEvaluator<'a>),
    Equality(EqualityEvaluator<'a>),
    Presence(PresenceEvaluator<'a>),
    Substring(SubstringEvaluator<'a>),
    Ordering(OrderingEvaluator<'a>),
    Approximate(ApproximateEvaluator<'a>),
}

impl<'a> Evaluator<'a> {
    /// Tests a candidate, possibly attaching its record and matched value
    pub fn evaluate(&self, candidate: &mut IndexEntry) -> SearchResult<bool> {
        match self {
            Evaluator::And(e) => e.evaluate(candidate),
            Evaluator::Or(e) => e.evaluate(candidate),
            Evaluator::Not(e) => e.evaluate(candidate),
            Evaluator::Equality(e) => e.evaluate(candidate),
            Evaluator::Presence(e) => e.evaluate(candidate),
            Evaluator::Substring(e) => e.evaluate(candidate),
            Evaluator::Ordering(e) => e.evaluate(candidate),
            Evaluator::Approximate(e) => e.evaluate(candidate),
        }
    }

    /// Tests a full record without consulting any index
    pub fn evaluate_record(&self, entry: &Entry) -> SearchResult<bool> {
        match self {
            Evaluator::And(e) => e.evaluate_record(entry),
            Evaluator::Or(e) => e.evaluate_record(entry),
            Evaluator::Not(e) => e.evaluate_record(entry),
            Evaluator::Equality(e) => e.evaluate_record(entry),
            Evaluator::Presence(e) => e.evaluate_record(entry),
            Evaluator::Substring(e) => e.evaluate_record(entry),
            Evaluator::Ordering(e) => e.evaluate_record(entry),
            Evaluator::Approximate(e) => e.evaluate_record(entry),
        }
    }

    /// The filter node this evaluator tests
    pub fn expression(&self) -> &ExpressionNode {
        match self {
            Evaluator::And(e) => e.expression(),
            Evaluator::Or(e) => e.expression(),
            Evaluator::Not(e) => e.expression(),
            Evaluator::Equality(e) => e.expression(),
            Evaluator::Presence(e) => e.expression(),
            Evaluator::Substring(e) => e.expression(),
            Evaluator::Ordering(e) => e.expression(),
            Evaluator::Approximate(e) => e.expression(),
        }
    }

    /// Resolved attribute type of a leaf; `None` for logical evaluators
    pub fn attribute(&self) -> Option<&AttributeType> {
        match self {
            Evaluator::And(_) | Evaluator::Or(_) | Evaluator::Not(_) => None,
            Evaluator::Equality(e) => Some(e.attribute()),
            Evaluator::Presence(e) => Some(e.attribute()),
            Evaluator::Substring(e) => Some(e.attribute()),
            Evaluator::Ordering(e) => Some(e.attribute()),
            Evaluator::Approximate(e) => Some(e.attribute()),
        }
    }

    /// Predicate a leaf applies to normalized index keys
    pub fn assertion(&self) -> Option<&ValueAssertion> {
        match self {
            Evaluator::And(_) | Evaluator::Or(_) | Evaluator::Not(_) => None,
            Evaluator::Equality(e) => Some(e.assertion()),
            Evaluator::Presence(e) => Some(e.assertion()),
            Evaluator::Substring(e) => Some(e.assertion()),
            Evaluator::Ordering(e) => Some(e.assertion()),
            Evaluator::Approximate(e) => Some(e.assertion()),
        }
    }
}
