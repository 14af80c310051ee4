//! Lossless rendering back to source text
//!
//! Source-backed nodes are printed by walking the gaps between their
//! children's spans, so whitespace and comments survive untouched. A node's
//! token span is printed from its kind, which is how retokened operators
//! appear. Synthesized nodes have no source of their own and print
//! canonically.

use super::ast::{NodeId, NodeKind, SyntaxTree};

impl SyntaxTree {
    /// Text of the whole tree.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.source.len() + 32);
        if !self.is_empty() {
            self.render_into(self.root(), &mut out);
        }
        out
    }

    /// Text of a single subtree.
    pub fn render_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        if node.synthetic {
            self.render_synthetic(id, out);
        } else {
            let mut cursor = node.span.start;
            for &child in &node.children {
                let child_span = self.span(child);
                if child_span.start >= cursor {
                    self.emit_gap(id, cursor, child_span.start, out);
                }
                self.render_into(child, out);
                cursor = cursor.max(child_span.end);
            }
            if node.span.end >= cursor {
                self.emit_gap(id, cursor, node.span.end, out);
            }
        }

        if let Some(text) = &node.trailing {
            out.push_str(" /* ");
            out.push_str(text);
            out.push_str(" */");
        }
    }

    /// Source text in `[from, to)`, with the node's own token substituted.
    fn emit_gap(&self, id: NodeId, from: usize, to: usize, out: &mut String) {
        let node = self.node(id);
        match (node.token, node.kind.token_text()) {
            (Some(token), Some(text)) if from <= token.start && token.end <= to => {
                out.push_str(&self.source[from..token.start]);
                out.push_str(&text);
                out.push_str(&self.source[token.end..to]);
            }
            _ => out.push_str(&self.source[from..to]),
        }
    }

    fn render_children(&self, id: NodeId, separator: &str, out: &mut String) {
        for (i, &child) in self.children(id).iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            self.render_into(child, out);
        }
    }

    fn render_synthetic(&self, id: NodeId, out: &mut String) {
        let children = self.children(id);
        let kind = self.kind(id);
        match kind {
            NodeKind::CompilationUnit => self.render_children(id, "\n", out),
            NodeKind::Using { path } => {
                out.push_str("using ");
                out.push_str(path);
                out.push(';');
            }
            NodeKind::Namespace { name } => {
                out.push_str("namespace ");
                out.push_str(name);
                out.push_str(" { ");
                self.render_children(id, " ", out);
                out.push_str(" }");
            }
            NodeKind::Class { name, modifiers } => {
                for m in modifiers {
                    out.push_str(m.keyword());
                    out.push(' ');
                }
                out.push_str("class ");
                out.push_str(name);
                out.push_str(" { ");
                self.render_children(id, " ", out);
                out.push_str(" }");
            }
            NodeKind::Field { modifiers } => {
                for m in modifiers {
                    out.push_str(m.keyword());
                    out.push(' ');
                }
                self.render_children(id, " ", out);
                out.push(';');
            }
            NodeKind::Method {
                name,
                modifiers,
                return_type,
            } => {
                for m in modifiers {
                    out.push_str(m.keyword());
                    out.push(' ');
                }
                out.push_str(return_type.keyword());
                out.push(' ');
                out.push_str(name);
                out.push('(');
                let (params, body) = children.split_at(children.len().saturating_sub(1));
                for (i, &param) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.render_into(param, out);
                }
                out.push_str(") ");
                for &b in body {
                    self.render_into(b, out);
                }
            }
            NodeKind::Parameter { name, ty } => {
                out.push_str(ty.keyword());
                out.push(' ');
                out.push_str(name);
            }
            NodeKind::Block => {
                if children.is_empty() {
                    out.push_str("{ }");
                } else {
                    out.push_str("{ ");
                    self.render_children(id, " ", out);
                    out.push_str(" }");
                }
            }
            NodeKind::LocalDeclaration | NodeKind::ExpressionStatement => {
                self.render_children(id, "", out);
                out.push(';');
            }
            NodeKind::VariableDeclaration { ty } => {
                out.push_str(ty.keyword());
                out.push(' ');
                self.render_children(id, ", ", out);
            }
            NodeKind::VariableDeclarator { name } => {
                out.push_str(name);
                if let Some(&init) = children.first() {
                    out.push_str(" = ");
                    self.render_into(init, out);
                }
            }
            NodeKind::EmptyStatement => out.push(';'),
            NodeKind::If => {
                out.push_str("if (");
                if let Some(&cond) = children.first() {
                    self.render_into(cond, out);
                }
                out.push_str(") ");
                for (i, &branch) in children.iter().enumerate().skip(1) {
                    if i > 1 {
                        out.push(' ');
                    }
                    self.render_into(branch, out);
                }
            }
            NodeKind::Else => {
                out.push_str("else ");
                self.render_children(id, "", out);
            }
            NodeKind::While => {
                out.push_str("while (");
                if let Some(&cond) = children.first() {
                    self.render_into(cond, out);
                }
                out.push_str(") ");
                for &body in children.iter().skip(1) {
                    self.render_into(body, out);
                }
            }
            NodeKind::For => {
                out.push_str("for (");
                for (i, &part) in children.iter().take(3).enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    self.render_into(part, out);
                }
                out.push_str(") ");
                for &body in children.iter().skip(3) {
                    self.render_into(body, out);
                }
            }
            NodeKind::Return => {
                out.push_str("return");
                for &value in children {
                    out.push(' ');
                    self.render_into(value, out);
                }
                out.push(';');
            }
            NodeKind::Assignment { op } => self.render_infix(id, op.symbol(), out),
            NodeKind::Binary { op } => self.render_infix(id, op.symbol(), out),
            NodeKind::PrefixUnary { op } => {
                out.push_str(op.symbol());
                self.render_children(id, "", out);
            }
            NodeKind::PostfixUnary { op } => {
                self.render_children(id, "", out);
                out.push_str(op.symbol());
            }
            NodeKind::Identifier { name } => out.push_str(name),
            NodeKind::Literal { value } => out.push_str(&value.text),
            NodeKind::Parenthesized => {
                out.push('(');
                self.render_children(id, "", out);
                out.push(')');
            }
            NodeKind::Invocation { callee } => {
                out.push_str(callee);
                out.push('(');
                self.render_children(id, ", ", out);
                out.push(')');
            }
        }
    }

    fn render_infix(&self, id: NodeId, symbol: &str, out: &mut String) {
        let separator = format!(" {symbol} ");
        self.render_children(id, &separator, out);
    }
}
