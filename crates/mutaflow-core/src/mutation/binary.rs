//! Binary operator replacement

use super::{MutationContext, MutationHandler, MutationOperator, Replacement};
use crate::error::MutationError;
use crate::syntax::{BinaryOp, Graft, GraftChild, NodeId, NodeKind, SyntaxTree};

/// Swaps a binary operator for each other arithmetic or comparison operator.
///
/// Operands, and the expression itself, gain parentheses wherever the new
/// operator's precedence would otherwise regroup the printed text.
pub struct BinaryOperatorMutation;

impl BinaryOperatorMutation {
    fn operand(child: NodeId, wrap: bool) -> GraftChild {
        if wrap {
            GraftChild::New(Graft::parenthesized(GraftChild::Existing(child)))
        } else {
            GraftChild::Existing(child)
        }
    }

    /// Whether `node`, rewritten to bind at `precedence`, needs parentheses
    /// to stay where it is under its parent.
    fn needs_parens(tree: &SyntaxTree, node: NodeId, precedence: u8) -> bool {
        let Some(parent) = tree.parent(node) else {
            return false;
        };
        match tree.kind(parent) {
            NodeKind::Binary { op } => {
                let is_left = tree.children(parent).first() == Some(&node);
                if is_left {
                    precedence < op.precedence()
                } else {
                    precedence <= op.precedence()
                }
            }
            NodeKind::PrefixUnary { .. } | NodeKind::PostfixUnary { .. } => true,
            _ => false,
        }
    }

    fn rewrite(tree: &SyntaxTree, node: NodeId, op: BinaryOp) -> Graft {
        let precedence = op.precedence();
        let children = tree.children(node);
        let operands = children
            .iter()
            .enumerate()
            .map(|(i, &child)| {
                let child_precedence = tree.kind(child).precedence();
                let wrap = if i == 0 {
                    child_precedence < precedence
                } else {
                    child_precedence <= precedence
                };
                Self::operand(child, wrap)
            })
            .collect();
        let graft = Graft::retoken(tree, node, NodeKind::Binary { op }).with_children(operands);
        if Self::needs_parens(tree, node, precedence) {
            Graft::parenthesized(GraftChild::New(graft))
        } else {
            graft
        }
    }
}

impl MutationHandler for BinaryOperatorMutation {
    fn name(&self) -> &'static str {
        "binary_operator"
    }

    fn operator(&self) -> MutationOperator {
        MutationOperator::BinaryOperator
    }

    fn applies_to(&self, tree: &SyntaxTree, node: NodeId, _ctx: &MutationContext<'_>) -> bool {
        matches!(tree.kind(node), NodeKind::Binary { .. })
    }

    fn mutations(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        _ctx: &MutationContext<'_>,
    ) -> Result<Vec<Replacement>, MutationError> {
        let NodeKind::Binary { op: current } = *tree.kind(node) else {
            return Err(MutationError::Inapplicable {
                handler: self.name(),
                node,
            });
        };
        Ok(BinaryOp::MUTABLE
            .iter()
            .filter(|&&op| op != current)
            .map(|&op| {
                let summary = format!("`{}` -> `{}`", current.symbol(), op.symbol());
                Replacement::new(Self::rewrite(tree, node, op), summary)
            })
            .collect())
    }
}
