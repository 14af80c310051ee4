//! Arena-backed syntax tree
//!
//! Every tree owns a flat `Vec<Node>` whose indices are assigned in preorder.
//! Subtrees are therefore contiguous, and two trees with the same shape
//! produce the same `(kind, arity)` sequence, which is what structural
//! equality and hashing compare. Source text is shared between a tree and
//! every tree derived from it with [`SyntaxTree::replace`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Built-in types of the language subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    Int,
    Double,
    Bool,
    String,
    Void,
}

impl TypeName {
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeName::Int => "int",
            TypeName::Double => "double",
            TypeName::Bool => "bool",
            TypeName::String => "string",
            TypeName::Void => "void",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Internal,
    Static,
}

impl Modifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Internal => "internal",
            Modifier::Static => "static",
        }
    }
}

/// Binary operators, including the short-circuit logical ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Operators the binary mutation cycles through.
    pub const MUTABLE: [BinaryOp; 10] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Lt,
        BinaryOp::Le,
        BinaryOp::Gt,
        BinaryOp::Ge,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter. All levels are left-associative.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Simple and compound assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::RemAssign => "%=",
        }
    }

    /// The arithmetic a compound assignment performs, `None` for `=`.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::RemAssign => Some(BinaryOp::Rem),
        }
    }

    pub fn is_compound(&self) -> bool {
        self.binary_op().is_some()
    }
}

/// Unary operators. Only `++` and `--` appear in postfix position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Increment,
    Decrement,
    Not,
    Negate,
    Plus,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Increment => "++",
            UnaryOp::Decrement => "--",
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
            UnaryOp::Plus => "+",
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self, UnaryOp::Increment | UnaryOp::Decrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    Int,
    Double,
    Bool,
    String,
}

/// A literal keeps its exact source spelling so rendering is lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
}

impl Literal {
    pub fn new(kind: LiteralKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Integer value, if this is an integer literal that fits in `i64`.
    pub fn as_int(&self) -> Option<i64> {
        match self.kind {
            LiteralKind::Int => self.text.parse().ok(),
            _ => None,
        }
    }
}

/// Closed set of node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    CompilationUnit,
    Using { path: String },
    Namespace { name: String },
    Class { name: String, modifiers: Vec<Modifier> },
    Field { modifiers: Vec<Modifier> },
    Method { name: String, modifiers: Vec<Modifier>, return_type: TypeName },
    Parameter { name: String, ty: TypeName },
    Block,
    LocalDeclaration,
    VariableDeclaration { ty: TypeName },
    VariableDeclarator { name: String },
    ExpressionStatement,
    EmptyStatement,
    If,
    Else,
    While,
    For,
    Return,
    Assignment { op: AssignOp },
    Binary { op: BinaryOp },
    PrefixUnary { op: UnaryOp },
    PostfixUnary { op: UnaryOp },
    Identifier { name: String },
    Literal { value: Literal },
    Parenthesized,
    Invocation { callee: String },
}

impl NodeKind {
    /// Text printed in place of the node's token span.
    pub fn token_text(&self) -> Option<Cow<'_, str>> {
        match self {
            NodeKind::Assignment { op } => Some(Cow::Borrowed(op.symbol())),
            NodeKind::Binary { op } => Some(Cow::Borrowed(op.symbol())),
            NodeKind::PrefixUnary { op } | NodeKind::PostfixUnary { op } => Some(Cow::Borrowed(op.symbol())),
            NodeKind::Identifier { name } => Some(Cow::Borrowed(name.as_str())),
            NodeKind::Literal { value } => Some(Cow::Borrowed(value.text.as_str())),
            _ => None,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block
                | NodeKind::LocalDeclaration
                | NodeKind::ExpressionStatement
                | NodeKind::EmptyStatement
                | NodeKind::If
                | NodeKind::While
                | NodeKind::For
                | NodeKind::Return
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Assignment { .. }
                | NodeKind::Binary { .. }
                | NodeKind::PrefixUnary { .. }
                | NodeKind::PostfixUnary { .. }
                | NodeKind::Identifier { .. }
                | NodeKind::Literal { .. }
                | NodeKind::Parenthesized
                | NodeKind::Invocation { .. }
        )
    }

    /// Binding strength of an expression kind, used to decide parenthesization.
    pub fn precedence(&self) -> u8 {
        match self {
            NodeKind::Assignment { .. } => 0,
            NodeKind::Binary { op } => op.precedence(),
            NodeKind::PrefixUnary { .. } => 7,
            NodeKind::PostfixUnary { .. } => 8,
            _ => 9,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "CompilationUnit",
            NodeKind::Using { .. } => "Using",
            NodeKind::Namespace { .. } => "Namespace",
            NodeKind::Class { .. } => "Class",
            NodeKind::Field { .. } => "Field",
            NodeKind::Method { .. } => "Method",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::Block => "Block",
            NodeKind::LocalDeclaration => "LocalDeclaration",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::VariableDeclarator { .. } => "VariableDeclarator",
            NodeKind::ExpressionStatement => "ExpressionStatement",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::If => "If",
            NodeKind::Else => "Else",
            NodeKind::While => "While",
            NodeKind::For => "For",
            NodeKind::Return => "Return",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::PrefixUnary { .. } => "PrefixUnary",
            NodeKind::PostfixUnary { .. } => "PostfixUnary",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::Parenthesized => "Parenthesized",
            NodeKind::Invocation { .. } => "Invocation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Source extent; for synthesized nodes, the extent of what they replaced
    pub span: Span,
    /// Operator, identifier or literal token inside `span`
    pub token: Option<Span>,
    /// Printed canonically instead of from source
    pub synthetic: bool,
    /// Comment text emitted right after the node
    pub trailing: Option<String>,
}

/// Immutable syntax tree over shared source text.
#[derive(Clone)]
pub struct SyntaxTree {
    pub(crate) source: Arc<str>,
    pub(crate) nodes: Vec<Node>,
}

impl SyntaxTree {
    /// Builds a tree from nodes stored in arbitrary order, renumbering them
    /// in preorder starting at `root`.
    pub(crate) fn from_unordered(source: Arc<str>, raw: Vec<Node>, root: NodeId) -> Self {
        let mut nodes: Vec<Node> = Vec::with_capacity(raw.len());
        let mut slots: Vec<Option<Node>> = raw.into_iter().map(Some).collect();

        // (old id, new parent)
        let mut stack = vec![(root, None::<NodeId>)];
        while let Some((old, parent)) = stack.pop() {
            let Some(mut node) = slots.get_mut(old.index()).and_then(Option::take) else {
                continue;
            };
            let new_id = NodeId(nodes.len() as u32);
            if let Some(p) = parent {
                nodes[p.index()].children.push(new_id);
            }
            let old_children = std::mem::take(&mut node.children);
            node.parent = parent;
            nodes.push(node);
            for &child in old_children.iter().rev() {
                stack.push((child, Some(new_id)));
            }
        }

        Self { source, nodes }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node lookup. Ids from another tree are a caller bug and panic.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    /// All node ids in preorder.
    pub fn preorder(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// `id` followed by all of its descendants, in preorder.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        (id.0..self.subtree_end(id)).map(NodeId)
    }

    /// One past the last preorder index of `id`'s subtree.
    fn subtree_end(&self, id: NodeId) -> u32 {
        let mut last = id;
        while let Some(&child) = self.node(last).children.last() {
            last = child;
        }
        last.0 + 1
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Method declarations in source order.
    pub fn methods(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.preorder()
            .filter(|&id| matches!(self.kind(id), NodeKind::Method { .. }))
    }

    /// Name of the innermost method containing `id`, if any.
    pub fn enclosing_method(&self, id: NodeId) -> Option<&str> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| match self.kind(n) {
                NodeKind::Method { name, .. } => Some(name.as_str()),
                _ => None,
            })
    }

    /// 1-based line and column of a node's first byte.
    pub fn line_col(&self, id: NodeId) -> (usize, usize) {
        super::line_col(&self.source, self.span(id).start)
    }

    pub fn structurally_equal(&self, a: NodeId, other: &SyntaxTree, b: NodeId) -> bool {
        let (ea, eb) = (self.subtree_end(a), other.subtree_end(b));
        if ea - a.0 != eb - b.0 {
            return false;
        }
        (a.0..ea).zip(b.0..eb).all(|(x, y)| {
            let (nx, ny) = (&self.nodes[x as usize], &other.nodes[y as usize]);
            nx.kind == ny.kind && nx.children.len() == ny.children.len()
        })
    }
}

impl PartialEq for SyntaxTree {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.len() == other.nodes.len()
            && self
                .nodes
                .iter()
                .zip(&other.nodes)
                .all(|(a, b)| a.kind == b.kind && a.children.len() == b.children.len())
    }
}

impl Eq for SyntaxTree {}

impl Hash for SyntaxTree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nodes.len().hash(state);
        for node in &self.nodes {
            node.kind.hash(state);
            node.children.len().hash(state);
        }
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("nodes", &self.nodes.len())
            .field("text", &self.render())
            .finish()
    }
}

impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
