//! Increment and decrement swaps

use super::{MutationContext, MutationHandler, MutationOperator, Replacement};
use crate::error::MutationError;
use crate::syntax::{Graft, NodeId, NodeKind, SyntaxTree, UnaryOp};

fn flip(op: UnaryOp) -> Option<UnaryOp> {
    match op {
        UnaryOp::Increment => Some(UnaryOp::Decrement),
        UnaryOp::Decrement => Some(UnaryOp::Increment),
        _ => None,
    }
}

fn summary(from: UnaryOp, to: UnaryOp) -> String {
    format!("`{}` -> `{}`", from.symbol(), to.symbol())
}

/// `x++` becomes `x--` and the other way round.
pub struct PostfixUnaryMutation;

impl MutationHandler for PostfixUnaryMutation {
    fn name(&self) -> &'static str {
        "postfix_unary"
    }

    fn operator(&self) -> MutationOperator {
        MutationOperator::UnaryOperator
    }

    fn applies_to(&self, tree: &SyntaxTree, node: NodeId, _ctx: &MutationContext<'_>) -> bool {
        matches!(tree.kind(node), NodeKind::PostfixUnary { .. })
    }

    fn mutations(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        _ctx: &MutationContext<'_>,
    ) -> Result<Vec<Replacement>, MutationError> {
        let inapplicable = MutationError::Inapplicable {
            handler: self.name(),
            node,
        };
        let NodeKind::PostfixUnary { op } = *tree.kind(node) else {
            return Err(inapplicable);
        };
        let flipped = flip(op).ok_or(inapplicable)?;
        let graft = Graft::retoken(tree, node, NodeKind::PostfixUnary { op: flipped });
        Ok(vec![Replacement::new(graft, summary(op, flipped))])
    }
}

/// `++x` and `--x` swap; any other prefix operator is replaced by both.
pub struct PrefixUnaryMutation;

impl MutationHandler for PrefixUnaryMutation {
    fn name(&self) -> &'static str {
        "prefix_unary"
    }

    fn operator(&self) -> MutationOperator {
        MutationOperator::UnaryOperator
    }

    fn applies_to(&self, tree: &SyntaxTree, node: NodeId, _ctx: &MutationContext<'_>) -> bool {
        matches!(tree.kind(node), NodeKind::PrefixUnary { .. })
    }

    fn mutations(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        _ctx: &MutationContext<'_>,
    ) -> Result<Vec<Replacement>, MutationError> {
        let NodeKind::PrefixUnary { op } = *tree.kind(node) else {
            return Err(MutationError::Inapplicable {
                handler: self.name(),
                node,
            });
        };
        let targets = match flip(op) {
            Some(flipped) => vec![flipped],
            None => vec![UnaryOp::Increment, UnaryOp::Decrement],
        };
        Ok(targets
            .into_iter()
            .map(|to| {
                let graft = Graft::retoken(tree, node, NodeKind::PrefixUnary { op: to });
                Replacement::new(graft, summary(op, to))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn rendered(handler: &dyn MutationHandler, source: &str) -> Vec<String> {
        let tree = parse(source).unwrap();
        let ctx = MutationContext::default();
        let node = tree.preorder().find(|&id| handler.applies_to(&tree, id, &ctx)).unwrap();
        handler
            .mutations(&tree, node, &ctx)
            .unwrap()
            .into_iter()
            .map(|r| tree.replace(node, r.graft).render())
            .collect()
    }

    #[test]
    fn test_postfix_flip() {
        assert_eq!(
            rendered(&PostfixUnaryMutation, "class C { void M(int y) { y++; } }"),
            vec!["class C { void M(int y) { y--; } }"]
        );
        assert_eq!(
            rendered(&PostfixUnaryMutation, "class C { void M(int y) { y--; } }"),
            vec!["class C { void M(int y) { y++; } }"]
        );
    }

    #[test]
    fn test_prefix_flip() {
        assert_eq!(
            rendered(&PrefixUnaryMutation, "class C { void M(int y) { --y; } }"),
            vec!["class C { void M(int y) { ++y; } }"]
        );
    }

    #[test]
    fn test_other_prefix_operators_get_both_steps() {
        assert_eq!(
            rendered(&PrefixUnaryMutation, "class C { int M(int y) { return -y; } }"),
            vec![
                "class C { int M(int y) { return ++y; } }",
                "class C { int M(int y) { return --y; } }"
            ]
        );
        assert_eq!(
            rendered(&PrefixUnaryMutation, "class C { bool M(bool b) { return !b; } }").len(),
            2
        );
    }
}
