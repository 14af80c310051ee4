//! Pure subtree replacement

use super::ast::{Node, NodeId, NodeKind, Span, SyntaxTree};

/// Description of a replacement subtree.
///
/// Children are either subtrees of the tree being rewritten, copied with
/// their spans, or further grafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graft {
    kind: NodeKind,
    children: Vec<GraftChild>,
    span: Option<Span>,
    token: Option<Span>,
    trailing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraftChild {
    Existing(NodeId),
    New(Graft),
}

impl Graft {
    /// A synthesized node, printed canonically.
    pub fn synthetic(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            span: None,
            token: None,
            trailing: None,
        }
    }

    /// Same extent and children as `target`, with a different kind. The
    /// token span of `target` prints the new kind's token text.
    pub fn retoken(tree: &SyntaxTree, target: NodeId, kind: NodeKind) -> Self {
        let node = tree.node(target);
        Self {
            kind,
            children: node.children.iter().map(|&c| GraftChild::Existing(c)).collect(),
            span: Some(node.span),
            token: node.token,
            trailing: None,
        }
    }

    /// Synthesized parentheses around `inner`.
    pub fn parenthesized(inner: GraftChild) -> Self {
        Self::synthetic(NodeKind::Parenthesized).with_child(inner)
    }

    pub fn with_child(mut self, child: GraftChild) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<GraftChild>) -> Self {
        self.children = children;
        self
    }

    pub fn with_trailing(mut self, trailing: Option<String>) -> Self {
        self.trailing = trailing;
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[GraftChild] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [GraftChild] {
        &mut self.children
    }

    pub fn trailing(&self) -> Option<&str> {
        self.trailing.as_deref()
    }

    pub fn is_synthetic(&self) -> bool {
        self.span.is_none()
    }
}

impl SyntaxTree {
    /// Returns a new tree in which `target`'s subtree is swapped for `graft`.
    pub fn replace(&self, target: NodeId, graft: Graft) -> SyntaxTree {
        let mut out = Vec::with_capacity(self.nodes.len() + 2);
        let mut graft = Some(graft);
        self.copy_into(self.root(), None, target, &mut graft, &mut out);
        SyntaxTree {
            source: self.source.clone(),
            nodes: out,
        }
    }

    fn copy_into(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        target: NodeId,
        graft: &mut Option<Graft>,
        out: &mut Vec<Node>,
    ) -> NodeId {
        if id == target {
            if let Some(g) = graft.take() {
                let anchor = self.span(target);
                return self.emit_graft(g, parent, anchor, out);
            }
        }

        let new_id = NodeId(out.len() as u32);
        let mut node = self.node(id).clone();
        let old_children = std::mem::take(&mut node.children);
        node.parent = parent;
        out.push(node);
        for child in old_children {
            let copied = self.copy_into(child, Some(new_id), target, graft, out);
            out[new_id.index()].children.push(copied);
        }
        new_id
    }

    fn emit_graft(&self, graft: Graft, parent: Option<NodeId>, anchor: Span, out: &mut Vec<Node>) -> NodeId {
        let synthetic = graft.is_synthetic();
        let span = graft
            .span
            .or_else(|| self.graft_extent(&graft))
            .unwrap_or(anchor);
        let new_id = NodeId(out.len() as u32);
        out.push(Node {
            kind: graft.kind,
            parent,
            children: Vec::new(),
            span,
            token: graft.token,
            synthetic,
            trailing: graft.trailing,
        });
        for child in graft.children {
            let copied = match child {
                GraftChild::Existing(old) => self.copy_subtree(old, new_id, out),
                GraftChild::New(g) => self.emit_graft(g, Some(new_id), span, out),
            };
            out[new_id.index()].children.push(copied);
        }
        new_id
    }

    fn copy_subtree(&self, id: NodeId, parent: NodeId, out: &mut Vec<Node>) -> NodeId {
        let mut none = None;
        // No target inside a copied subtree: NodeId(u32::MAX) never matches.
        self.copy_into(id, Some(parent), NodeId(u32::MAX), &mut none, out)
    }

    /// Extent of a graft: its own span, else the cover of its children.
    fn graft_extent(&self, graft: &Graft) -> Option<Span> {
        if let Some(span) = graft.span {
            return Some(span);
        }
        graft
            .children
            .iter()
            .filter_map(|child| match child {
                GraftChild::Existing(id) => Some(self.span(*id)),
                GraftChild::New(g) => self.graft_extent(g),
            })
            .reduce(Span::cover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, BinaryOp};

    fn first(tree: &SyntaxTree, pred: impl Fn(&NodeKind) -> bool) -> NodeId {
        tree.preorder().find(|&id| pred(tree.kind(id))).unwrap()
    }

    #[test]
    fn test_replace_retoken_keeps_shape() {
        let tree = parse("class C { int M(int a) { return a + 1; } }").unwrap();
        let add = first(&tree, |k| matches!(k, NodeKind::Binary { .. }));
        let mutated = tree.replace(add, Graft::retoken(&tree, add, NodeKind::Binary { op: BinaryOp::Sub }));

        assert_eq!(mutated.len(), tree.len());
        assert_eq!(mutated.kind(add), &NodeKind::Binary { op: BinaryOp::Sub });
        assert_eq!(mutated.span(add), tree.span(add));
        assert_ne!(mutated, tree);
        // the original is untouched
        assert_eq!(tree.kind(add), &NodeKind::Binary { op: BinaryOp::Add });
    }

    #[test]
    fn test_replace_with_empty_statement() {
        let tree = parse("class C { void M() { int x = 1; x = 2; } }").unwrap();
        let stmt = first(&tree, |k| matches!(k, NodeKind::ExpressionStatement));
        let mutated = tree.replace(stmt, Graft::synthetic(NodeKind::EmptyStatement));

        assert_eq!(mutated.len(), tree.len() - 3);
        assert_eq!(mutated.kind(stmt), &NodeKind::EmptyStatement);
        assert!(mutated.node(stmt).synthetic);
        assert_eq!(mutated.span(stmt), tree.span(stmt));
        for id in mutated.preorder().skip(1) {
            assert!(mutated.children(mutated.parent(id).unwrap()).contains(&id));
        }
    }

    #[test]
    fn test_replace_parenthesized_extent() {
        let tree = parse("class C { int M(int a) { return a * 2; } }").unwrap();
        let mul = first(&tree, |k| matches!(k, NodeKind::Binary { .. }));
        let left = tree.children(mul)[0];
        let graft = Graft::retoken(&tree, mul, NodeKind::Binary { op: BinaryOp::Mul })
            .with_children(vec![
                GraftChild::New(Graft::parenthesized(GraftChild::Existing(left))),
                GraftChild::Existing(tree.children(mul)[1]),
            ]);
        let mutated = tree.replace(mul, graft);
        let paren = mutated.children(mul)[0];
        assert_eq!(mutated.kind(paren), &NodeKind::Parenthesized);
        assert_eq!(mutated.span(paren), tree.span(left));
    }
}
