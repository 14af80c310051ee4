//! Statement deletion

use super::{MutationContext, MutationHandler, MutationOperator, Replacement};
use crate::error::MutationError;
use crate::syntax::{Graft, NodeId, NodeKind, SyntaxTree};

/// Replaces a statement with an empty statement.
///
/// Blocks and empty statements are left alone; deleting a block's contents
/// is covered statement by statement.
pub struct StatementDeletion;

impl MutationHandler for StatementDeletion {
    fn name(&self) -> &'static str {
        "statement_deletion"
    }

    fn operator(&self) -> MutationOperator {
        MutationOperator::StatementDeletion
    }

    fn applies_to(&self, tree: &SyntaxTree, node: NodeId, _ctx: &MutationContext<'_>) -> bool {
        let kind = tree.kind(node);
        kind.is_statement() && !matches!(kind, NodeKind::Block | NodeKind::EmptyStatement)
    }

    fn mutations(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        ctx: &MutationContext<'_>,
    ) -> Result<Vec<Replacement>, MutationError> {
        if !self.applies_to(tree, node, ctx) {
            return Err(MutationError::Inapplicable {
                handler: self.name(),
                node,
            });
        }
        let graft = Graft::synthetic(NodeKind::EmptyStatement);
        let summary = format!("delete {}", tree.kind(node).name());
        Ok(vec![Replacement::new(graft, summary)])
    }
}
