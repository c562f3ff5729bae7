//! Schema registry
//!
//! In-memory `SchemaInfo` implementation, built programmatically or loaded
//! from a JSON schema definition file.
//!
//! - Names and OIDs resolve case-insensitively
//! - Syntax and matching rules are inherited through `superior` links
//! - Descendants are returned breadth-first, ties ordered by OID

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::types::{AttributeType, Comparator, MatchingRule, MatchingRuleKind, Normalizer, Syntax};
use crate::observability::{log_event_with_fields, Event};

/// Longest superior chain followed before the schema is declared cyclic
const MAX_SUPERIOR_DEPTH: usize = 32;

/// Schema metadata consumed by evaluators
pub trait SchemaInfo {
    /// Resolves an attribute type by name or OID
    fn resolve_attribute_type(&self, name: &str) -> SchemaResult<AttributeType>;

    /// Effective syntax, inherited from superiors when not declared
    fn syntax_of(&self, attribute: &AttributeType) -> SchemaResult<Syntax>;

    /// Effective matching rule for one slot; `None` when no type in the chain declares one
    fn matching_rule_for(
        &self,
        attribute: &AttributeType,
        kind: MatchingRuleKind,
    ) -> SchemaResult<Option<MatchingRule>>;

    /// Every transitive subtype of the attribute type, excluding itself
    fn descendants_of(&self, attribute: &AttributeType) -> SchemaResult<Vec<AttributeType>>;
}

/// Serialized schema definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub syntaxes: Vec<Syntax>,
    #[serde(default)]
    pub matching_rules: Vec<MatchingRule>,
    #[serde(default)]
    pub attribute_types: Vec<AttributeType>,
}

/// In-memory schema registry
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    /// Syntaxes by OID
    syntaxes: HashMap<String, Syntax>,
    /// Matching rules by lower-cased OID and name
    rules: HashMap<String, MatchingRule>,
    /// Attribute types by OID
    attribute_types: BTreeMap<String, AttributeType>,
    /// Lower-cased name or OID to OID
    names: HashMap<String, String>,
}

impl SchemaRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_syntax(&mut self, syntax: Syntax) -> SchemaResult<()> {
        if self.syntaxes.contains_key(&syntax.oid) {
            return Err(SchemaError::Duplicate(syntax.oid));
        }
        self.syntaxes.insert(syntax.oid.clone(), syntax);
        Ok(())
    }

    pub fn add_matching_rule(&mut self, rule: MatchingRule) -> SchemaResult<()> {
        let keys = [rule.oid.to_lowercase(), rule.name.to_lowercase()];
        if let Some(taken) = keys.iter().find(|k| self.rules.contains_key(*k)) {
            return Err(SchemaError::Duplicate(taken.clone()));
        }
        for key in keys {
            self.rules.insert(key, rule.clone());
        }
        Ok(())
    }

    pub fn add_attribute_type(&mut self, attribute: AttributeType) -> SchemaResult<()> {
        let mut keys = vec![attribute.oid.to_lowercase()];
        keys.extend(attribute.names.iter().map(|n| n.to_lowercase()));

        if let Some(taken) = keys.iter().find(|k| self.names.contains_key(*k)) {
            return Err(SchemaError::Duplicate(taken.clone()));
        }
        for key in keys {
            self.names.insert(key, attribute.oid.clone());
        }
        self.attribute_types.insert(attribute.oid.clone(), attribute);
        Ok(())
    }

    /// Builds a registry from a definition and checks every reference resolves
    pub fn from_definition(definition: SchemaDefinition) -> SchemaResult<Self> {
        let mut registry = Self::new();
        for syntax in definition.syntaxes {
            registry.add_syntax(syntax)?;
        }
        for rule in definition.matching_rules {
            registry.add_matching_rule(rule)?;
        }
        for attribute in definition.attribute_types {
            registry.add_attribute_type(attribute)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_json_str(content: &str) -> SchemaResult<Self> {
        let definition: SchemaDefinition = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed("<inline>", e.to_string()))?;
        Self::from_definition(definition)
    }

    /// Loads a schema definition file
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let origin = path.display().to_string();
        let content = fs::read_to_string(path)
            .map_err(|e| SchemaError::malformed(&origin, format!("Failed to read file: {}", e)))?;
        let definition: SchemaDefinition = serde_json::from_str(&content)
            .map_err(|e| SchemaError::malformed(&origin, format!("Invalid JSON: {}", e)))?;
        let registry = Self::from_definition(definition)?;

        let count = registry.attribute_types.len().to_string();
        log_event_with_fields(Event::SchemaLoaded, &[("attribute_types", &count), ("path", &origin)]);
        Ok(registry)
    }

    /// Checks that every superior, syntax, and rule reference resolves
    pub fn validate(&self) -> SchemaResult<()> {
        for attribute in self.attribute_types.values() {
            self.superior_chain(attribute)?;
            if let Some(syntax) = &attribute.syntax {
                if !self.syntaxes.contains_key(syntax) {
                    return Err(SchemaError::UnknownSyntax {
                        attribute: attribute.name().to_string(),
                        syntax: syntax.clone(),
                    });
                }
            }
            for kind in [
                MatchingRuleKind::Equality,
                MatchingRuleKind::Ordering,
                MatchingRuleKind::Substring,
                MatchingRuleKind::Approximate,
            ] {
                if let Some(rule) = attribute.declared_rule(kind) {
                    self.rule(attribute, rule)?;
                }
            }
        }
        Ok(())
    }

    /// Number of registered attribute types
    pub fn attribute_type_count(&self) -> usize {
        self.attribute_types.len()
    }

    /// The attribute type followed by its superiors, nearest first
    fn superior_chain(&self, attribute: &AttributeType) -> SchemaResult<Vec<AttributeType>> {
        let mut chain = vec![attribute.clone()];
        let mut current = attribute.clone();

        while let Some(superior) = current.superior.clone() {
            if chain.len() > MAX_SUPERIOR_DEPTH {
                return Err(SchemaError::malformed(
                    attribute.name(),
                    "superior chain is cyclic or too deep",
                ));
            }
            current = self.resolve_attribute_type(&superior)?;
            chain.push(current.clone());
        }

        Ok(chain)
    }

    fn rule(&self, attribute: &AttributeType, rule: &str) -> SchemaResult<MatchingRule> {
        self.rules
            .get(&rule.to_lowercase())
            .cloned()
            .ok_or_else(|| SchemaError::UnknownMatchingRule {
                attribute: attribute.name().to_string(),
                rule: rule.to_string(),
            })
    }

    /// Superior of `attribute` resolved to an OID, if any
    fn superior_oid(&self, attribute: &AttributeType) -> Option<String> {
        let superior = attribute.superior.as_ref()?;
        self.names.get(&superior.to_lowercase()).cloned()
    }

    /// Registry preloaded with the common directory attribute types
    pub fn core() -> Self {
        let mut registry = Self::new();
        let loaded = registry.load_core();
        debug_assert!(loaded.is_ok(), "core schema conflicts: {:?}", loaded.err());
        registry
    }

    fn load_core(&mut self) -> SchemaResult<()> {
        const DIRECTORY_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.15";
        const IA5_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.26";
        const INTEGER: &str = "1.3.6.1.4.1.1466.115.121.1.27";
        const JPEG: &str = "1.3.6.1.4.1.1466.115.121.1.28";
        const OID: &str = "1.3.6.1.4.1.1466.115.121.1.38";
        const OCTET_STRING: &str = "1.3.6.1.4.1.1466.115.121.1.40";

        use MatchingRuleKind::{Equality, Ordering, Substring};

        let syntaxes = [
            Syntax::new(DIRECTORY_STRING, "Directory String", true),
            Syntax::new(IA5_STRING, "IA5 String", true),
            Syntax::new(INTEGER, "INTEGER", true),
            Syntax::new(JPEG, "JPEG", false),
            Syntax::new(OID, "OID", true),
            Syntax::new(OCTET_STRING, "Octet String", false),
        ];

        let rules = [
            MatchingRule::new("2.5.13.0", "objectIdentifierMatch", Normalizer::DeepTrimToLower, Comparator::Lexical),
            MatchingRule::new("2.5.13.2", "caseIgnoreMatch", Normalizer::DeepTrimToLower, Comparator::Lexical),
            MatchingRule::new("2.5.13.3", "caseIgnoreOrderingMatch", Normalizer::DeepTrimToLower, Comparator::Lexical),
            MatchingRule::new("2.5.13.4", "caseIgnoreSubstringsMatch", Normalizer::DeepTrimToLower, Comparator::Lexical),
            MatchingRule::new("2.5.13.5", "caseExactMatch", Normalizer::DeepTrim, Comparator::Lexical),
            MatchingRule::new("2.5.13.14", "integerMatch", Normalizer::NumericString, Comparator::Integer),
            MatchingRule::new("2.5.13.15", "integerOrderingMatch", Normalizer::NumericString, Comparator::Integer),
            MatchingRule::new("2.5.13.17", "octetStringMatch", Normalizer::NoOp, Comparator::Bytes),
            MatchingRule::new("1.3.6.1.4.1.1466.109.114.2", "caseIgnoreIA5Match", Normalizer::DeepTrimToLower, Comparator::Lexical),
            MatchingRule::new("1.3.6.1.4.1.1466.109.114.3", "caseIgnoreIA5SubstringsMatch", Normalizer::DeepTrimToLower, Comparator::Lexical),
        ];

        let attribute_types = [
            AttributeType::new("2.5.4.0", "objectClass")
                .with_syntax(OID)
                .with_rule(Equality, "objectIdentifierMatch"),
            AttributeType::new("2.5.4.41", "name")
                .with_syntax(DIRECTORY_STRING)
                .with_rule(Equality, "caseIgnoreMatch")
                .with_rule(Ordering, "caseIgnoreOrderingMatch")
                .with_rule(Substring, "caseIgnoreSubstringsMatch"),
            AttributeType::new("2.5.4.3", "cn").with_alias("commonName").with_superior("name"),
            AttributeType::new("2.5.4.4", "sn").with_alias("surname").with_superior("name"),
            AttributeType::new("2.5.4.42", "givenName").with_superior("name"),
            AttributeType::new("2.5.4.11", "ou")
                .with_alias("organizationalUnitName")
                .with_superior("name"),
            AttributeType::new("2.5.4.12", "title").with_superior("name"),
            AttributeType::new("2.5.4.13", "description")
                .with_syntax(DIRECTORY_STRING)
                .with_rule(Equality, "caseIgnoreMatch")
                .with_rule(Substring, "caseIgnoreSubstringsMatch"),
            AttributeType::new("0.9.2342.19200300.100.1.1", "uid")
                .with_alias("userid")
                .with_syntax(DIRECTORY_STRING)
                .with_rule(Equality, "caseIgnoreMatch")
                .with_rule(Substring, "caseIgnoreSubstringsMatch"),
            AttributeType::new("0.9.2342.19200300.100.1.3", "mail")
                .with_syntax(IA5_STRING)
                .with_rule(Equality, "caseIgnoreIA5Match")
                .with_rule(Substring, "caseIgnoreIA5SubstringsMatch"),
            AttributeType::new("1.3.6.1.1.1.1.0", "uidNumber")
                .with_syntax(INTEGER)
                .with_rule(Equality, "integerMatch")
                .with_rule(Ordering, "integerOrderingMatch"),
            AttributeType::new("2.5.4.35", "userPassword")
                .with_syntax(OCTET_STRING)
                .with_rule(Equality, "octetStringMatch"),
            AttributeType::new("0.9.2342.19200300.100.1.60", "jpegPhoto").with_syntax(JPEG),
        ];

        for syntax in syntaxes {
            self.add_syntax(syntax)?;
        }
        for rule in rules {
            self.add_matching_rule(rule)?;
        }
        for attribute in attribute_types {
            self.add_attribute_type(attribute)?;
        }
        Ok(())
    }
}

impl SchemaInfo for SchemaRegistry {
    fn resolve_attribute_type(&self, name: &str) -> SchemaResult<AttributeType> {
        self.names
            .get(&name.to_lowercase())
            .and_then(|oid| self.attribute_types.get(oid))
            .cloned()
            .ok_or_else(|| SchemaError::UnknownAttributeType(name.to_string()))
    }

    fn syntax_of(&self, attribute: &AttributeType) -> SchemaResult<Syntax> {
        let chain = self.superior_chain(attribute)?;
        let oid = chain
            .iter()
            .find_map(|a| a.syntax.clone())
            .ok_or_else(|| SchemaError::MissingSyntax {
                attribute: attribute.name().to_string(),
            })?;

        self.syntaxes
            .get(&oid)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownSyntax {
                attribute: attribute.name().to_string(),
                syntax: oid,
            })
    }

    fn matching_rule_for(
        &self,
        attribute: &AttributeType,
        kind: MatchingRuleKind,
    ) -> SchemaResult<Option<MatchingRule>> {
        let chain = self.superior_chain(attribute)?;
        match chain.iter().find_map(|a| a.declared_rule(kind).cloned()) {
            Some(rule) => self.rule(attribute, &rule).map(Some),
            None => Ok(None),
        }
    }

    fn descendants_of(&self, attribute: &AttributeType) -> SchemaResult<Vec<AttributeType>> {
        let mut descendants = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue = VecDeque::from([attribute.oid.clone()]);
        visited.insert(attribute.oid.clone());

        while let Some(parent) = queue.pop_front() {
            for child in self.attribute_types.values() {
                if visited.contains(&child.oid) {
                    continue;
                }
                if self.superior_oid(child).as_deref() == Some(parent.as_str()) {
                    visited.insert(child.oid.clone());
                    queue.push_back(child.oid.clone());
                    descendants.push(child.clone());
                }
            }
        }

        Ok(descendants)
    }
}
