//! Filter expression tree
//!
//! Produced by an upstream filter parser (or read as JSON) and consumed by
//! the evaluator and cursor builders.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::Value;

/// A parsed search filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionNode {
    And(Vec<ExpressionNode>),
    Or(Vec<ExpressionNode>),
    Not(Box<ExpressionNode>),
    Equality { attribute: String, value: Value },
    Presence { attribute: String },
    Substring(SubstringAssertion),
    GreaterOrEqual { attribute: String, value: Value },
    LessOrEqual { attribute: String, value: Value },
    ApproximateMatch { attribute: String, value: Value },
}

/// `initial*any*...*final` pattern on one attribute
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubstringAssertion {
    pub attribute: String,
    #[serde(default)]
    pub initial: Option<String>,
    #[serde(default)]
    pub any: Vec<String>,
    #[serde(default, rename = "final")]
    pub terminal: Option<String>,
}

impl SubstringAssertion {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            ..Self::default()
        }
    }

    pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn with_any(mut self, fragment: impl Into<String>) -> Self {
        self.any.push(fragment.into());
        self
    }

    pub fn with_final(mut self, terminal: impl Into<String>) -> Self {
        self.terminal = Some(terminal.into());
        self
    }
}

impl ExpressionNode {
    pub fn and(children: Vec<ExpressionNode>) -> Self {
        ExpressionNode::And(children)
    }

    pub fn or(children: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Or(children)
    }

    pub fn not(child: ExpressionNode) -> Self {
        ExpressionNode::Not(Box::new(child))
    }

    pub fn equality(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        ExpressionNode::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn presence(attribute: impl Into<String>) -> Self {
        ExpressionNode::Presence {
            attribute: attribute.into(),
        }
    }

    pub fn substring(assertion: SubstringAssertion) -> Self {
        ExpressionNode::Substring(assertion)
    }

    pub fn greater_or_equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        ExpressionNode::GreaterOrEqual {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn less_or_equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        ExpressionNode::LessOrEqual {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn approximate(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        ExpressionNode::ApproximateMatch {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Short name of the node kind, as used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ExpressionNode::And(_) => "and",
            ExpressionNode::Or(_) => "or",
            ExpressionNode::Not(_) => "not",
            ExpressionNode::Equality { .. } => "equality",
            ExpressionNode::Presence { .. } => "presence",
            ExpressionNode::Substring(_) => "substring",
            ExpressionNode::GreaterOrEqual { .. } => "greater_or_equal",
            ExpressionNode::LessOrEqual { .. } => "less_or_equal",
            ExpressionNode::ApproximateMatch { .. } => "approximate_match",
        }
    }

    /// Attribute a leaf asserts on; `None` for logical nodes
    pub fn attribute(&self) -> Option<&str> {
        match self {
            ExpressionNode::And(_) | ExpressionNode::Or(_) | ExpressionNode::Not(_) => None,
            ExpressionNode::Substring(assertion) => Some(&assertion.attribute),
            ExpressionNode::Equality { attribute, .. }
            | ExpressionNode::Presence { attribute }
            | ExpressionNode::GreaterOrEqual { attribute, .. }
            | ExpressionNode::LessOrEqual { attribute, .. }
            | ExpressionNode::ApproximateMatch { attribute, .. } => Some(attribute),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.attribute().is_some()
    }
}

/// RFC 4515-style rendering, for logs and diagnostics
impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionNode::And(children) => write_set(f, '&', children),
            ExpressionNode::Or(children) => write_set(f, '|', children),
            ExpressionNode::Not(child) => write!(f, "(!{})", child),
            ExpressionNode::Equality { attribute, value } => write!(f, "({}={})", attribute, value),
            ExpressionNode::Presence { attribute } => write!(f, "({}=*)", attribute),
            ExpressionNode::Substring(assertion) => {
                write!(f, "({}=", assertion.attribute)?;
                if let Some(initial) = &assertion.initial {
                    write!(f, "{}", initial)?;
                }
                write!(f, "*")?;
                for fragment in &assertion.any {
                    write!(f, "{}*", fragment)?;
                }
                if let Some(terminal) = &assertion.terminal {
                    write!(f, "{}", terminal)?;
                }
                write!(f, ")")
            }
            ExpressionNode::GreaterOrEqual { attribute, value } => write!(f, "({}>={})", attribute, value),
            ExpressionNode::LessOrEqual { attribute, value } => write!(f, "({}<={})", attribute, value),
            ExpressionNode::ApproximateMatch { attribute, value } => write!(f, "({}~={})", attribute, value),
        }
    }
}

fn write_set(f: &mut fmt::Formatter<'_>, operator: char, children: &[ExpressionNode]) -> fmt::Result {
    write!(f, "({}", operator)?;
    for child in children {
        write!(f, "{}", child)?;
    }
    write!(f, ")")
}
