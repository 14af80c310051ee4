//! Identifier replacement guided by reaching definitions

use super::{MutationContext, MutationHandler, MutationOperator, Replacement};
use crate::error::MutationError;
use crate::syntax::{Graft, NodeId, NodeKind, SyntaxTree};

/// Replaces an identifier with another variable that has a definition
/// reaching the same point.
///
/// Only identifiers inside an analyzed method qualify.
pub struct IdentifierReplacement;

impl MutationHandler for IdentifierReplacement {
    fn name(&self) -> &'static str {
        "identifier_replacement"
    }

    fn operator(&self) -> MutationOperator {
        MutationOperator::IdentifierReplacement
    }

    fn applies_to(&self, tree: &SyntaxTree, node: NodeId, ctx: &MutationContext<'_>) -> bool {
        matches!(tree.kind(node), NodeKind::Identifier { .. })
            && ctx.dataflow.is_some_and(|df| df.has_reaching_definitions(node))
    }

    fn mutations(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        ctx: &MutationContext<'_>,
    ) -> Result<Vec<Replacement>, MutationError> {
        let inapplicable = || MutationError::Inapplicable {
            handler: self.name(),
            node,
        };
        let NodeKind::Identifier { name } = tree.kind(node) else {
            return Err(inapplicable());
        };
        let dataflow = ctx.dataflow.ok_or_else(inapplicable)?;
        let reaching = dataflow.reaching_definitions(node)?;

        Ok(reaching
            .names()
            .into_iter()
            .filter(|other| *other != name.as_str())
            .map(|other| {
                let graft = Graft::retoken(
                    tree,
                    node,
                    NodeKind::Identifier {
                        name: other.to_string(),
                    },
                );
                Replacement::new(graft, format!("`{name}` -> `{other}`"))
            })
            .collect())
    }
}
