//! AND, OR, and NOT evaluators
//!
//! Children run in the order given and short-circuit. An empty AND is
//! true, an empty OR is false.

use crate::errors::SearchResult;
use crate::filter::ExpressionNode;
use crate::store::{Entry, IndexEntry};

use super::Evaluator;

#[derive(Debug, Clone)]
pub struct AndEvaluator<'a> {
    node: ExpressionNode,
    children: Vec<Evaluator<'a>>,
}

impl<'a> AndEvaluator<'a> {
    pub fn new(node: ExpressionNode, children: Vec<Evaluator<'a>>) -> Self {
        Self { node, children }
    }

    pub fn children(&self) -> &[Evaluator<'a>] {
        &self.children
    }

    pub fn expression(&self) -> &ExpressionNode {
        &self.node
    }

    pub fn evaluate(&self, candidate: &mut IndexEntry) -> SearchResult<bool> {
        for child in &self.children {
            if !child.evaluate(candidate)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn evaluate_record(&self, entry: &Entry) -> SearchResult<bool> {
        for child in &self.children {
            if !child.evaluate_record(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct OrEvaluator<'a> {
    node: ExpressionNode,
    children: Vec<Evaluator<'a>>,
}

impl<'a> OrEvaluator<'a> {
    pub fn new(node: ExpressionNode, children: Vec<Evaluator<'a>>) -> Self {
        Self { node, children }
    }

    pub fn children(&self) -> &[Evaluator<'a>] {
        &self.children
    }

    pub fn expression(&self) -> &ExpressionNode {
        &self.node
    }

    pub fn evaluate(&self, candidate: &mut IndexEntry) -> SearchResult<bool> {
        for child in &self.children {
            if child.evaluate(candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn evaluate_record(&self, entry: &Entry) -> SearchResult<bool> {
        for child in &self.children {
            if child.evaluate_record(entry)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug, Clone)]
pub struct NotEvaluator<'a> {
    node: ExpressionNode,
    child: Box<Evaluator<'a>>,
}

impl<'a> NotEvaluator<'a> {
    pub fn new(node: ExpressionNode, child: Evaluator<'a>) -> Self {
        Self {
            node,
            child: Box::new(child),
        }
    }

    pub fn child(&self) -> &Evaluator<'a> {
        &self.child
    }

    pub fn expression(&self) -> &ExpressionNode {
        &self.node
    }

    pub fn evaluate(&self, candidate: &mut IndexEntry) -> SearchResult<bool> {
        Ok(!self.child.evaluate(candidate)?)
    }

    pub fn evaluate_record(&self, entry: &Entry) -> SearchResult<bool> {
        Ok(!self.child.evaluate_record(entry)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::context::SearchContext;
    use crate::evaluator::PresenceEvaluator;
    use crate::schema::SchemaRegistry;
    use crate::store::MemoryStore;

    #[test]
    fn test_empty_and_or() {
        let entry = Entry::new(1);
        let and = AndEvaluator::new(ExpressionNode::and(vec![]), vec![]);
        let or = OrEvaluator::new(ExpressionNode::or(vec![]), vec![]);
        assert!(and.evaluate_record(&entry).unwrap());
        assert!(!or.evaluate_record(&entry).unwrap());
        assert!(and.evaluate(&mut IndexEntry::new(1)).unwrap());
        assert!(!or.evaluate(&mut IndexEntry::new(1)).unwrap());
    }

    #[test]
    fn test_composites_combine_presence() {
        let schema = SchemaRegistry::core();
        let store = MemoryStore::new();
        let config = SearchConfig::full_scan();
        let ctx = SearchContext::new(&store, &schema, &config);

        let cn = Evaluator::Presence(PresenceEvaluator::new(ctx, "cn").unwrap());
        let mail = Evaluator::Presence(PresenceEvaluator::new(ctx, "mail").unwrap());
        let entry = Entry::new(1).with_attribute("cn", ["x"]);

        let both = AndEvaluator::new(ExpressionNode::and(vec![]), vec![cn.clone(), mail.clone()]);
        let either = OrEvaluator::new(ExpressionNode::or(vec![]), vec![cn, mail.clone()]);
        let no_mail = NotEvaluator::new(ExpressionNode::not(ExpressionNode::presence("mail")), mail);

        assert!(!both.evaluate_record(&entry).unwrap());
        assert!(either.evaluate_record(&entry).unwrap());
        assert!(no_mail.evaluate_record(&entry).unwrap());
    }
}
