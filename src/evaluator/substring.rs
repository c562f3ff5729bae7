//! Substring assertion evaluator
//!
//! Resolves the attribute's substring matching rule (falling back on its
//! equality rule, then on no normalization), normalizes the assertion's
//! fragments with it, and compiles `initial*any*...*final` into one
//! anchored regex.
//!
//! Two evaluation paths:
//! - Index-assisted: when the attribute's index has a reverse half, the
//!   values recorded for the candidate id are matched; the store is never
//!   read.
//! - Full record: the record is looked up (or reused from the candidate),
//!   attached to the candidate, and its normalized values are matched,
//!   first on the attribute itself and then on each descendant type. The
//!   first matching value is cached on the candidate.
//!
//! Attributes with a binary syntax get no pattern; they never match.

use regex::Regex;

use super::target::AttributeTarget;
use super::ValueAssertion;
use crate::context::SearchContext;
use crate::errors::SearchResult;
use crate::filter::{ExpressionNode, SubstringAssertion};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{AttributeType, MatchingRuleKind, Normalizer};
use crate::store::{Entry, IndexEntry, Value};

#[derive(Debug, Clone)]
pub struct SubstringEvaluator<'a> {
    node: ExpressionNode,
    target: AttributeTarget<'a>,
    assertion: ValueAssertion,
}

impl<'a> SubstringEvaluator<'a> {
    pub fn new(ctx: SearchContext<'a>, substring: &SubstringAssertion) -> SearchResult<Self> {
        let target = AttributeTarget::resolve(
            ctx,
            &substring.attribute,
            &[MatchingRuleKind::Substring, MatchingRuleKind::Equality],
        )?;

        let pattern = if target.is_human_readable() {
            Regex::new(&substring_pattern(substring, target.normalizer())).ok()
        } else {
            log_event_with_fields(
                Event::SubstringUnsupported,
                &[("attribute", target.attribute().name())],
            );
            None
        };

        Ok(Self {
            node: ExpressionNode::Substring(substring.clone()),
            target,
            assertion: ValueAssertion::Pattern(pattern),
        })
    }

    /// Compiled pattern; `None` for binary attributes
    pub fn pattern(&self) -> Option<&Regex> {
        match &self.assertion {
            ValueAssertion::Pattern(pattern) => pattern.as_ref(),
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
        self.target.record_evaluation();
        match self.target.reverse_index() {
            Some(index) => self.target.any_reverse_value(index, candidate.id(), |value| {
                self.matches_text(value)
            }),
            None => self.evaluate_without_index(candidate),
        }
    }

    pub fn evaluate_record(&self, entry: &Entry) -> SearchResult<bool> {
        Ok(self.first_match(entry).is_some())
    }

    fn evaluate_without_index(&self, candidate: &mut IndexEntry) -> SearchResult<bool> {
        let entry = self.target.resolve_entry(candidate)?;
        match self.first_match(&entry) {
            Some(value) => {
                candidate.set_value(value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// First normalized value, on the attribute and then its descendants, the pattern accepts
    fn first_match(&self, entry: &Entry) -> Option<Value> {
        let pattern = self.pattern()?;
        let normalizer = self.target.normalizer();
        for attribute in self.target.types() {
            for value in entry.get(attribute) {
                // Binary values are skipped, never compared
                if let Value::Text(text) = value {
                    let normalized = normalizer.normalize_str(text);
                    if pattern.is_match(&normalized) {
                        return Some(Value::Text(normalized));
                    }
                }
            }
        }
        None
    }

    fn matches_text(&self, value: &Value) -> bool {
        self.assertion.matches(value)
    }
}

/// Anchored regex for `initial*any*...*final` over normalized fragments
fn substring_pattern(substring: &SubstringAssertion, normalizer: Normalizer) -> String {
    let mut pattern = String::from("(?s)^");
    if let Some(initial) = &substring.initial {
        pattern.push_str(&regex::escape(&normalizer.normalize_str(initial)));
    }
    pattern.push_str(".*");
    for fragment in &substring.any {
        pattern.push_str(&regex::escape(&normalizer.normalize_str(fragment)));
        pattern.push_str(".*");
    }
    if let Some(terminal) = &substring.terminal {
        pattern.push_str(&regex::escape(&normalizer.normalize_str(terminal)));
    }
    pattern.push('$');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::schema::SchemaRegistry;
    use crate::store::{EntryId, EntryStore, MemoryStore};

    fn cn_prefix(initial: &str) -> SubstringAssertion {
        SubstringAssertion::new("cn").with_initial(initial)
    }

    #[test]
    fn test_pattern_shape() {
        let assertion = SubstringAssertion::new("cn")
            .with_initial("A.")
            .with_any(" B ")
            .with_final("c");
        assert_eq!(
            substring_pattern(&assertion, Normalizer::DeepTrimToLower),
            r"(?s)^a\..*b.*c$"
        );
        assert_eq!(
            substring_pattern(&SubstringAssertion::new("cn"), Normalizer::NoOp),
            "(?s)^.*$"
        );
    }

    #[test]
    fn test_record_path_caches_record_and_value() {
        let schema = SchemaRegistry::core();
        let store = MemoryStore::from_entries(vec![
            Entry::new(1).with_attribute("cn", ["  Alice  Liddell "]),
        ]);
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let evaluator = SubstringEvaluator::new(ctx, &cn_prefix("ALI")).unwrap();
        let mut candidate = IndexEntry::new(1);
        assert!(evaluator.evaluate(&mut candidate).unwrap());
        assert!(candidate.entry().is_some());
        assert_eq!(candidate.value(), Some(&Value::from("alice liddell")));
    }

    #[test]
    fn test_descendant_values_match_supertype_assertion() {
        let schema = SchemaRegistry::core();
        let store = MemoryStore::from_entries(vec![
            Entry::new(1).with_attribute("sn", ["Smith"]),
            Entry::new(2).with_attribute("mail", ["smith@example.com"]),
        ]);
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let by_name = SubstringEvaluator::new(ctx, &SubstringAssertion::new("name").with_initial("smi")).unwrap();
        assert!(by_name.evaluate_record(&store.lookup(EntryId::new(1)).unwrap()).unwrap());
        assert!(!by_name.evaluate_record(&store.lookup(EntryId::new(2)).unwrap()).unwrap());
    }

    #[test]
    fn test_binary_attribute_never_matches() {
        let schema = SchemaRegistry::core();
        let store = MemoryStore::from_entries(vec![
            Entry::new(1).with_attribute("jpegPhoto", [vec![0xFF_u8, 0xD8]]),
        ]);
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let evaluator = SubstringEvaluator::new(ctx, &SubstringAssertion::new("jpegPhoto")).unwrap();
        assert!(evaluator.pattern().is_none());
        assert!(!evaluator.evaluate(&mut IndexEntry::new(1)).unwrap());
    }

    #[test]
    fn test_unknown_attribute_fails_construction() {
        let schema = SchemaRegistry::core();
        let store = MemoryStore::new();
        let config = SearchConfig::default();
        let ctx = SearchContext::new(&store, &schema, &config);

        let result = SubstringEvaluator::new(ctx, &SubstringAssertion::new("shoeSize"));
        assert!(matches!(
            result,
            Err(crate::errors::SearchError::Evaluation { .. })
        ));
    }

    #[test]
    fn test_missing_record_is_evaluation_error() {
        let schema = SchemaRegistry::core();
        let store = MemoryStore::new();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let evaluator = SubstringEvaluator::new(ctx, &cn_prefix("a")).unwrap();
        let result = evaluator.evaluate(&mut IndexEntry::new(404));
        assert!(matches!(
            result,
            Err(crate::errors::SearchError::Evaluation { cause: Some(_), .. })
        ));
    }
}
