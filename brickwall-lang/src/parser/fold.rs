//! Implements folding a flat chain of nodes into a tree by operator precedence.

use tracing::trace;

use crate::{
    ast::{AstKind, NodeId, siblings},
    compile::CompileError,
};

use super::{ParseErrorKind, infrastructure::Parser};

/// The operator chosen for the next folding step.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// The operator node.
    node: NodeId,
    /// The node in front of the operator.
    pred: Option<NodeId>,
    /// The node in front of `pred`.
    pred_pred: Option<NodeId>,
    /// The precedence of the operator.
    precedence: u8,
}

/// Finds the unfolded operator with the highest precedence, preferring the leftmost one.
fn find_candidate(p: &Parser<'_, '_>, head: NodeId) -> Option<Candidate> {
    let nodes = p.nodes();
    let mut best: Option<Candidate> = None;
    let mut pred = None;
    let mut pred_pred = None;

    for id in siblings(nodes, Some(head)) {
        let node = &nodes[id];
        if !node.is_folded()
            && let Some(precedence) = node.precedence()
            && best.is_none_or(|best| precedence > best.precedence)
        {
            best = Some(Candidate {
                node: id,
                pred,
                pred_pred,
                precedence,
            });
        }

        pred_pred = pred;
        pred = Some(id);
    }

    best
}

/// Checks that `operand` can be used as the operand of `operator`.
///
/// An operand that is itself an operator that was not folded yet means that two operators
/// are adjacent.
fn usable_operand(
    p: &Parser<'_, '_>,
    operator: NodeId,
    operand: Option<NodeId>,
) -> Result<NodeId, CompileError> {
    let nodes = p.nodes();
    match operand {
        Some(operand)
            if nodes[operand].is_folded()
                || (nodes[operand].precedence().is_none()
                    && nodes[operand].kind != AstKind::ScriptEnd) =>
        {
            Ok(operand)
        }
        _ => Err(p.error(ParseErrorKind::MissingOperand(nodes[operator].token.kind))),
    }
}

/// Folds the chain starting at `head` until no unfolded operator remains.
///
/// Returns the new head of the chain.
pub(super) fn fold(p: &mut Parser<'_, '_>, mut head: NodeId) -> Result<NodeId, CompileError> {
    while let Some(candidate) = find_candidate(p, head) {
        let op = candidate.node;
        let pred = usable_operand(p, op, candidate.pred)?;

        if p.nodes()[op].kind == AstKind::ArrayAccess {
            // the index is already in `param2`, only the indexed value is missing
            let nodes = p.nodes_mut();
            nodes[op].param1 = Some(pred);
            nodes[pred].next = None;
        } else {
            let succ = usable_operand(p, op, p.nodes()[op].next)?;

            let nodes = p.nodes_mut();
            let after = nodes[succ].next;
            nodes[op].param1 = Some(pred);
            nodes[op].param2 = Some(succ);
            nodes[op].next = after;
            nodes[pred].next = None;
            nodes[succ].next = None;
        }

        match candidate.pred_pred {
            Some(pred_pred) => p.nodes_mut()[pred_pred].next = Some(op),
            None => head = op,
        }

        trace!(
            operator = ?p.nodes()[op].kind,
            precedence = candidate.precedence,
            "folded operator"
        );
    }

    Ok(head)
}
