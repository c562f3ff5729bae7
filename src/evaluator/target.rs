//! Schema resolution and value access shared by leaf evaluators

use std::sync::Arc;

use crate::context::SearchContext;
use crate::cursor::first_reverse_match;
use crate::errors::{SearchError, SearchResult};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{AttributeType, Comparator, MatchingRule, MatchingRuleKind, Normalizer, SchemaError, Syntax};
use crate::store::{Entry, EntryId, Index, IndexEntry, Value};

/// The attribute a leaf asserts on, resolved against the schema.
///
/// Descendants are resolved once here; evaluation never consults the
/// schema again.
#[derive(Debug, Clone)]
pub(crate) struct AttributeTarget<'a> {
    ctx: SearchContext<'a>,
    attribute: AttributeType,
    descendants: Vec<AttributeType>,
    syntax: Syntax,
    rule: Option<MatchingRule>,
}

impl<'a> AttributeTarget<'a> {
    /// Resolves `name` and the first rule found among `kinds`, in order
    pub(crate) fn resolve(
        ctx: SearchContext<'a>,
        name: &str,
        kinds: &[MatchingRuleKind],
    ) -> SearchResult<Self> {
        let attribute = ctx
            .schema
            .resolve_attribute_type(name)
            .map_err(|e| schema_failure(name, "unknown attribute type", e))?;
        let syntax = ctx
            .schema
            .syntax_of(&attribute)
            .map_err(|e| schema_failure(name, "cannot resolve syntax", e))?;

        let mut rule = None;
        for kind in kinds {
            rule = ctx
                .schema
                .matching_rule_for(&attribute, *kind)
                .map_err(|e| schema_failure(name, "cannot resolve matching rule", e))?;
            if rule.is_some() {
                break;
            }
        }

        let descendants = ctx
            .schema
            .descendants_of(&attribute)
            .map_err(|e| schema_failure(name, "cannot resolve descendants", e))?;

        log_event_with_fields(
            Event::EvaluatorCreated,
            &[
                ("attribute", attribute.name()),
                ("rule", rule.as_ref().map_or("none", |r| r.name.as_str())),
            ],
        );

        Ok(Self {
            ctx,
            attribute,
            descendants,
            syntax,
            rule,
        })
    }

    pub(crate) fn attribute(&self) -> &AttributeType {
        &self.attribute
    }

    /// Normalizer of the resolved rule; identity when none was found
    pub(crate) fn normalizer(&self) -> Normalizer {
        self.rule.as_ref().map(|r| r.normalizer).unwrap_or_default()
    }

    /// Comparator of the resolved rule; falls back on the syntax
    pub(crate) fn comparator(&self) -> Comparator {
        match &self.rule {
            Some(rule) => rule.comparator,
            None if self.syntax.human_readable => Comparator::Lexical,
            None => Comparator::Bytes,
        }
    }

    pub(crate) fn is_human_readable(&self) -> bool {
        self.syntax.human_readable
    }

    pub(crate) fn record_evaluation(&self) {
        if let Some(stats) = self.ctx.stats {
            stats.increment_evaluations();
        }
    }

    /// The attribute's index when configured for use and it has a reverse half
    pub(crate) fn reverse_index(&self) -> Option<&'a dyn Index> {
        if !self.ctx.config.use_reverse_index {
            return None;
        }
        self.ctx
            .store
            .index(&self.attribute)
            .filter(|index| index.has_reverse())
    }

    /// Whether any value the index records for `id` satisfies `matches`
    pub(crate) fn any_reverse_value(
        &self,
        index: &dyn Index,
        id: EntryId,
        matches: impl FnMut(&Value) -> bool,
    ) -> SearchResult<bool> {
        if let Some(stats) = self.ctx.stats {
            stats.increment_reverse_lookups();
        }
        let found = first_reverse_match(index, id, matches)?;
        Ok(found.is_some())
    }

    /// The candidate's record, looked up and attached when missing
    pub(crate) fn resolve_entry(&self, candidate: &mut IndexEntry) -> SearchResult<Arc<Entry>> {
        if let Some(entry) = candidate.entry() {
            return Ok(Arc::clone(entry));
        }
        if let Some(stats) = self.ctx.stats {
            stats.increment_record_lookups();
        }
        let entry = self.ctx.store.lookup(candidate.id()).map_err(|e| {
            SearchError::evaluation_caused_by(
                self.attribute.name(),
                format!("cannot resolve entry {}", candidate.id()),
                e,
            )
        })?;
        candidate.set_entry(Arc::clone(&entry));
        Ok(entry)
    }

    /// The attribute type followed by each descendant
    pub(crate) fn types(&self) -> impl Iterator<Item = &AttributeType> {
        std::iter::once(&self.attribute).chain(self.descendants.iter())
    }

    /// First normalized value of the attribute or a descendant that satisfies `matches`
    pub(crate) fn find_in_record(
        &self,
        entry: &Entry,
        mut matches: impl FnMut(&Value) -> bool,
    ) -> Option<Value> {
        let normalizer = self.normalizer();
        self.types()
            .flat_map(|attribute| entry.get(attribute))
            .map(|value| normalizer.normalize(value))
            .find(|value| matches(value))
    }

    /// Index-assisted when possible, else full-record; caches the matched value on the record path
    pub(crate) fn evaluate_candidate(
        &self,
        candidate: &mut IndexEntry,
        mut matches: impl FnMut(&Value) -> bool,
    ) -> SearchResult<bool> {
        self.record_evaluation();
        if let Some(index) = self.reverse_index() {
            return self.any_reverse_value(index, candidate.id(), matches);
        }
        let entry = self.resolve_entry(candidate)?;
        match self.find_in_record(&entry, &mut matches) {
            Some(value) => {
                candidate.set_value(value);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn schema_failure(attribute: &str, message: &str, cause: SchemaError) -> SearchError {
    SearchError::evaluation_caused_by(attribute, message, cause)
}
