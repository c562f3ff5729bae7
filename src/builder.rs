//! Builds evaluator and cursor trees from filter expressions
//!
//! Leaf cursors read the attribute's forward index when one exists and
//! `prefer_index_cursors` is set; otherwise they filter a full scan.
//! Single-child AND/OR nodes collapse to the child. NOT operands of an AND
//! are ordered last so a positive operand drives when one exists.
//!
//! Equality reads a single index key only when key identity is the rule's
//! equality; other comparators filter the whole index.
//!
//! Estimates feed the AND driver choice:
//! - exact-key equality on an indexed attribute: ids under the key
//! - other indexed leaves: index size
//! - scans and NOT: store size
//! - OR: sum of operands; AND: smallest operand

use uuid::Uuid;

use crate::context::SearchContext;
use crate::cursor::{
    collect_ids, AndCursor, BoxCursor, Direction, EntryListCursor, IndexLeafCursor, NotCursor, Operand,
    OrCursor, ScanCursor,
};
use crate::errors::SearchResult;
use crate::evaluator::{
    AndEvaluator, ApproximateEvaluator, EqualityEvaluator, Evaluator, NotEvaluator, OrEvaluator, OrderingEvaluator,
    PresenceEvaluator, SubstringEvaluator, ValueAssertion,
};
use crate::filter::ExpressionNode;
use crate::observability::{log_event_with_fields, Event};
use crate::store::EntryId;

/// Evaluator for `node` and its whole subtree
pub fn build_evaluator<'a>(ctx: SearchContext<'a>, node: &ExpressionNode) -> SearchResult<Evaluator<'a>> {
    let evaluator = match node {
        ExpressionNode::And(children) => Evaluator::And(AndEvaluator::new(
            node.clone(),
            build_children(ctx, children)?,
        )),
        ExpressionNode::Or(children) => Evaluator::Or(OrEvaluator::new(
            node.clone(),
            build_children(ctx, children)?,
        )),
        ExpressionNode::Not(child) => {
            Evaluator::Not(NotEvaluator::new(node.clone(), build_evaluator(ctx, child)?))
        }
        ExpressionNode::Equality { attribute, value } => {
            Evaluator::Equality(EqualityEvaluator::new(ctx, attribute, value)?)
        }
        ExpressionNode::Presence { attribute } => {
            Evaluator::Presence(PresenceEvaluator::new(ctx, attribute)?)
        }
        ExpressionNode::Substring(assertion) => {
            Evaluator::Substring(SubstringEvaluator::new(ctx, assertion)?)
        }
        ExpressionNode::GreaterOrEqual { attribute, value } => {
            Evaluator::Ordering(OrderingEvaluator::greater_or_equal(ctx, attribute, value)?)
        }
        ExpressionNode::LessOrEqual { attribute, value } => {
            Evaluator::Ordering(OrderingEvaluator::less_or_equal(ctx, attribute, value)?)
        }
        ExpressionNode::ApproximateMatch { attribute, value } => {
            Evaluator::Approximate(ApproximateEvaluator::new(ctx, attribute, value)?)
        }
    };
    Ok(evaluator)
}

fn build_children<'a>(ctx: SearchContext<'a>, children: &[ExpressionNode]) -> SearchResult<Vec<Evaluator<'a>>> {
    children.iter().map(|child| build_evaluator(ctx, child)).collect()
}

/// Cursor yielding exactly the entries that satisfy `node`
pub fn build_cursor<'a>(ctx: SearchContext<'a>, node: &ExpressionNode) -> SearchResult<BoxCursor<'a>> {
    Ok(build_operand(ctx, node)?.cursor)
}

/// Cursor, evaluator, and estimate for `node`
pub fn build_operand<'a>(ctx: SearchContext<'a>, node: &ExpressionNode) -> SearchResult<Operand<'a>> {
    match node {
        ExpressionNode::And(children) => match children.as_slice() {
            [] => {
                let cursor = scan_all(ctx, build_evaluator(ctx, node)?)?;
                Ok(Operand::new(cursor, build_evaluator(ctx, node)?).with_estimate(ctx.store.count()))
            }
            [only] => build_operand(ctx, only),
            _ => {
                let mut operands = children
                    .iter()
                    .map(|child| build_operand(ctx, child))
                    .collect::<SearchResult<Vec<_>>>()?;
                // Stable: positive operands keep their order ahead of negations
                operands.sort_by_key(|operand| matches!(operand.evaluator, Evaluator::Not(_)));
                let estimate = operands.iter().filter_map(|operand| operand.estimate).min();
                let cursor = AndCursor::new(operands)?.with_stats(ctx.stats);
                let operand = Operand::new(Box::new(cursor), build_evaluator(ctx, node)?);
                Ok(with_optional_estimate(operand, estimate))
            }
        },
        ExpressionNode::Or(children) => match children.as_slice() {
            [] => Ok(Operand::new(Box::new(EntryListCursor::empty()), build_evaluator(ctx, node)?).with_estimate(0)),
            [only] => build_operand(ctx, only),
            _ => {
                let operands = children
                    .iter()
                    .map(|child| build_operand(ctx, child))
                    .collect::<SearchResult<Vec<_>>>()?;
                let estimate = operands
                    .iter()
                    .map(|operand| operand.estimate)
                    .try_fold(0u64, |total, estimate| estimate.map(|e| total.saturating_add(e)));
                let cursor = OrCursor::new(operands)?.with_stats(ctx.stats);
                let operand = Operand::new(Box::new(cursor), build_evaluator(ctx, node)?);
                Ok(with_optional_estimate(operand, estimate))
            }
        },
        ExpressionNode::Not(child) => {
            let negated = build_evaluator(ctx, child)?;
            let cursor = NotCursor::new(ctx.store.all_entries()?, negated).with_stats(ctx.stats);
            Ok(Operand::new(Box::new(cursor), build_evaluator(ctx, node)?).with_estimate(ctx.store.count()))
        }
        _ => build_leaf(ctx, node),
    }
}

fn build_leaf<'a>(ctx: SearchContext<'a>, node: &ExpressionNode) -> SearchResult<Operand<'a>> {
    let evaluator = build_evaluator(ctx, node)?;

    if ctx.config.prefer_index_cursors {
        let index = evaluator
            .attribute()
            .and_then(|attribute| ctx.store.index(attribute));
        if let Some(index) = index {
            if let Evaluator::Equality(equality) = &evaluator {
                if let Some(key) = equality.lookup_key().cloned() {
                    let estimate = index.count_of(&key);
                    let cursor = IndexLeafCursor::on_key(index, key)?.with_stats(ctx.stats);
                    return Ok(Operand::new(Box::new(cursor), evaluator).with_estimate(estimate));
                }
            }
            if index.has_reverse() {
                let assertion = evaluator
                    .assertion()
                    .cloned()
                    .unwrap_or(ValueAssertion::Present);
                let cursor = IndexLeafCursor::new(index, assertion)?.with_stats(ctx.stats);
                return Ok(Operand::new(Box::new(cursor), evaluator).with_estimate(index.count()));
            }
        }
    }

    let cursor = scan_all(ctx, evaluator.clone())?;
    Ok(Operand::new(cursor, evaluator).with_estimate(ctx.store.count()))
}

fn scan_all<'a>(ctx: SearchContext<'a>, evaluator: Evaluator<'a>) -> SearchResult<BoxCursor<'a>> {
    let cursor = ScanCursor::new(ctx.store.all_entries()?, evaluator).with_stats(ctx.stats);
    Ok(Box::new(cursor))
}

fn with_optional_estimate(operand: Operand<'_>, estimate: Option<u64>) -> Operand<'_> {
    match estimate {
        Some(estimate) => operand.with_estimate(estimate),
        None => operand,
    }
}

/// Runs `node` to completion and returns matching ids in traversal order.
///
/// Start and completion are logged under a fresh search id. The cursor is closed on success and on failure; a close failure after
/// a successful traversal is reported.
pub fn search_ids(ctx: SearchContext<'_>, node: &ExpressionNode, direction: Direction) -> SearchResult<Vec<EntryId>> {
    let search_id = Uuid::new_v4().to_string();
    let filter = node.to_string();
    log_event_with_fields(Event::SearchStart, &[("search_id", &search_id), ("filter", &filter)]);

    let mut cursor = build_cursor(ctx, node)?;
    let ids = match collect_ids(cursor.as_mut(), direction) {
        Ok(ids) => ids,
        Err(e) => {
            // The traversal error takes precedence over a close failure
            let _ = cursor.close_with_cause(&e);
            return Err(e);
        }
    };
    cursor.close()?;

    log_event_with_fields(
        Event::SearchComplete,
        &[
            ("search_id", &search_id),
            ("filter", &filter),
            ("matches", &ids.len().to_string()),
        ],
    );
    Ok(ids)
}
