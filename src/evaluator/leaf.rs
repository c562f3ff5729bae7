//! Equality, presence, ordering, and approximate evaluators
//!
//! Each resolves its rule once and delegates value access to the shared
//! attribute target: reverse index when usable, full record otherwise.

use super::target::AttributeTarget;
use super::ValueAssertion;
use crate::context::SearchContext;
use crate::errors::SearchResult;
use crate::filter::ExpressionNode;
use crate::schema::{AttributeType, Comparator, MatchingRuleKind};
use crate::store::{Entry, IndexEntry, Value};

/// `(attr=value)`
#[derive(Debug, Clone)]
pub struct EqualityEvaluator<'a> {
    node: ExpressionNode,
    target: AttributeTarget<'a>,
    assertion: ValueAssertion,
}

impl<'a> EqualityEvaluator<'a> {
    pub fn new(ctx: SearchContext<'a>, attribute: &str, value: &Value) -> SearchResult<Self> {
        let target = AttributeTarget::resolve(ctx, attribute, &[MatchingRuleKind::Equality])?;
        let assertion = ValueAssertion::Equals {
            key: target.normalizer().normalize(value),
            comparator: target.comparator(),
        };
        Ok(Self {
            node: ExpressionNode::equality(attribute, value.clone()),
            target,
            assertion,
        })
    }

    /// Normalized assertion value, as stored in the attribute's index
    pub fn key(&self) -> Option<&Value> {
        match &self.assertion {
            ValueAssertion::Equals { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Key for an exact index lookup.
    ///
    /// `None` unless the comparator matches exactly the values equal to the
    /// key: text under `Lexical`. Integer comparison equates `0100` and
    /// `100`, and byte comparison equates text with binary.
    pub fn lookup_key(&self) -> Option<&Value> {
        match &self.assertion {
            ValueAssertion::Equals {
                key: key @ Value::Text(_),
                comparator: Comparator::Lexical,
            } => Some(key),
            _ => None,
        }
    }

    pub fn expression(&self) -> &ExpressionNode {
        &self.node
    }

    pub fn attribute(&self) -> &AttributeType {
        self.target.attribute()
    }

    pub(crate) fn assertion(&self) -> &ValueAssertion {
        &self.assertion
    }

    pub fn evaluate(&self, candidate: &mut IndexEntry) -> SearchResult<bool> {
        self.target
            .evaluate_candidate(candidate, |value| self.assertion.matches(value))
    }

    pub fn evaluate_record(&self, entry: &Entry) -> SearchResult<bool> {
        Ok(self
            .target
            .find_in_record(entry, |value| self.assertion.matches(value))
            .is_some())
    }
}

/// `(attr=*)`
#[derive(Debug, Clone)]
pub struct PresenceEvaluator<'a> {
    node: ExpressionNode,
    target: AttributeTarget<'a>,
    assertion: ValueAssertion,
}

impl<'a> PresenceEvaluator<'a> {
    pub fn new(ctx: SearchContext<'a>, attribute: &str) -> SearchResult<Self> {
        let target = AttributeTarget::resolve(ctx, attribute, &[])?;
        Ok(Self {
            node: ExpressionNode::presence(attribute),
            target,
            assertion: ValueAssertion::Present,
        })
    }

    pub fn expression(&self) -> &ExpressionNode {
        &self.node
    }

    pub fn attribute(&self) -> &AttributeType {
        self.target.attribute()
    }

    pub(crate) fn assertion(&self) -> &ValueAssertion {
        &self.assertion
    }

    /// True when the attribute or a descendant holds any value
    pub fn evaluate(&self, candidate: &mut IndexEntry) -> SearchResult<bool> {
        self.target.record_evaluation();
        if let Some(index) = self.target.reverse_index() {
            return self.target.any_reverse_value(index, candidate.id(), |_| true);
        }
        let entry = self.target.resolve_entry(candidate)?;
        self.evaluate_record(&entry)
    }

    pub fn evaluate_record(&self, entry: &Entry) -> SearchResult<bool> {
        Ok(self
            .target
            .types()
            .any(|attribute| !entry.get(attribute).is_empty()))
    }
}

/// `(attr>=value)` and `(attr<=value)`
#[derive(Debug, Clone)]
pub struct OrderingEvaluator<'a> {
    node: ExpressionNode,
    target: AttributeTarget<'a>,
    assertion: ValueAssertion,
}

impl<'a> OrderingEvaluator<'a> {
    pub fn greater_or_equal(ctx: SearchContext<'a>, attribute: &str, value: &Value) -> SearchResult<Self> {
        let target = Self::resolve(ctx, attribute)?;
        let assertion = ValueAssertion::AtLeast {
            bound: target.normalizer().normalize(value),
            comparator: target.comparator(),
        };
        Ok(Self {
            node: ExpressionNode::greater_or_equal(attribute, value.clone()),
            target,
            assertion,
        })
    }

    pub fn less_or_equal(ctx: SearchContext<'a>, attribute: &str, value: &Value) -> SearchResult<Self> {
        let target = Self::resolve(ctx, attribute)?;
        let assertion = ValueAssertion::AtMost {
            bound: target.normalizer().normalize(value),
            comparator: target.comparator(),
        };
        Ok(Self {
            node: ExpressionNode::less_or_equal(attribute, value.clone()),
            target,
            assertion,
        })
    }

    fn resolve(ctx: SearchContext<'a>, attribute: &str) -> SearchResult<AttributeTarget<'a>> {
        AttributeTarget::resolve(
            ctx,
            attribute,
            &[MatchingRuleKind::Ordering, MatchingRuleKind::Equality],
        )
    }

    pub fn expression(&self) -> &ExpressionNode {
        &self.node
    }

    pub fn attribute(&self) -> &AttributeType {
        self.target.attribute()
    }

    pub(crate) fn assertion(&self) -> &ValueAssertion {
        &self.assertion
    }

    pub fn evaluate(&self, candidate: &mut IndexEntry) -> SearchResult<bool> {
        self.target
            .evaluate_candidate(candidate, |value| self.assertion.matches(value))
    }

    pub fn evaluate_record(&self, entry: &Entry) -> SearchResult<bool> {
        Ok(self
            .target
            .find_in_record(entry, |value| self.assertion.matches(value))
            .is_some())
    }
}

/// `(attr~=value)`: equality under the approximate rule, else the equality rule
#[derive(Debug, Clone)]
pub struct ApproximateEvaluator<'a> {
    node: ExpressionNode,
    target: AttributeTarget<'a>,
    assertion: ValueAssertion,
}

impl<'a> ApproximateEvaluator<'a> {
    pub fn new(ctx: SearchContext<'a>, attribute: &str, value: &Value) -> SearchResult<Self> {
        let target = AttributeTarget::resolve(
            ctx,
            attribute,
            &[MatchingRuleKind::Approximate, MatchingRuleKind::Equality],
        )?;
        let assertion = ValueAssertion::Equals {
            key: target.normalizer().normalize(value),
            comparator: target.comparator(),
        };
        Ok(Self {
            node: ExpressionNode::approximate(attribute, value.clone()),
            target,
            assertion,
        })
    }

    pub fn expression(&self) -> &ExpressionNode {
        &self.node
    }

    pub fn attribute(&self) -> &AttributeType {
        self.target.attribute()
    }

    pub(crate) fn assertion(&self) -> &ValueAssertion {
        &self.assertion
    }

    pub fn evaluate(&self, candidate: &mut IndexEntry) -> SearchResult<bool> {
        self.target
            .evaluate_candidate(candidate, |value| self.assertion.matches(value))
    }

    pub fn evaluate_record(&self, entry: &Entry) -> SearchResult<bool> {
        Ok(self
            .target
            .find_in_record(entry, |value| self.assertion.matches(value))
            .is_some())
    }
}
