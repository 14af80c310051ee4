//! Mutation operators, candidate generation and validation
//!
//! Each operator family has its own handler that knows which nodes it can
//! rewrite and how. The registry asks handlers in a fixed order and the first
//! one that applies to a node produces all candidates for that node.

mod binary;
mod generator;
mod identifier;
mod statement;
mod unary;
mod validator;

pub use binary::BinaryOperatorMutation;
pub use generator::MutationGenerator;
pub use identifier::IdentifierReplacement;
pub use statement::StatementDeletion;
pub use unary::{PostfixUnaryMutation, PrefixUnaryMutation};
pub use validator::Validator;

use crate::config::OperatorSelection;
use crate::dataflow::MethodDataflow;
use crate::error::MutationError;
use crate::syntax::{Graft, NodeId, SyntaxTree};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Operator family that produced a mutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOperator {
    BinaryOperator,
    UnaryOperator,
    StatementDeletion,
    IdentifierReplacement,
}

impl MutationOperator {
    pub const ALL: [MutationOperator; 4] = [
        MutationOperator::BinaryOperator,
        MutationOperator::UnaryOperator,
        MutationOperator::StatementDeletion,
        MutationOperator::IdentifierReplacement,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MutationOperator::BinaryOperator => "binary_operator",
            MutationOperator::UnaryOperator => "unary_operator",
            MutationOperator::StatementDeletion => "statement_deletion",
            MutationOperator::IdentifierReplacement => "identifier_replacement",
        }
    }
}

impl fmt::Display for MutationOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a handler sees besides the node itself.
#[derive(Clone, Copy, Default)]
pub struct MutationContext<'a> {
    /// Data flow of the enclosing method; `None` outside methods
    pub dataflow: Option<&'a MethodDataflow>,
}

/// One rewrite of a node, before it is applied to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub graft: Graft,
    /// Short summary such as "`+` -> `-`"
    pub summary: String,
}

impl Replacement {
    pub fn new(graft: Graft, summary: impl Into<String>) -> Self {
        Self {
            graft,
            summary: summary.into(),
        }
    }
}

/// Trait for mutation handlers
pub trait MutationHandler {
    /// Stable handler name, used in logs and errors
    fn name(&self) -> &'static str;

    fn operator(&self) -> MutationOperator;

    /// Check if this handler can rewrite `node`
    fn applies_to(&self, tree: &SyntaxTree, node: NodeId, ctx: &MutationContext<'_>) -> bool;

    /// All rewrites of `node`
    fn mutations(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        ctx: &MutationContext<'_>,
    ) -> Result<Vec<Replacement>, MutationError>;
}

/// Registry of enabled mutation handlers, in priority order
pub struct MutationRegistry {
    handlers: Vec<Box<dyn MutationHandler + Send + Sync>>,
}

impl MutationRegistry {
    /// All handlers, in their fixed order.
    pub fn new() -> Self {
        Self::from_selection(&OperatorSelection::default())
    }

    pub fn empty() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn from_selection(selection: &OperatorSelection) -> Self {
        let mut registry = Self::empty();
        if selection.binary {
            registry.register(Box::new(BinaryOperatorMutation));
        }
        if selection.unary {
            registry.register(Box::new(PostfixUnaryMutation));
            registry.register(Box::new(PrefixUnaryMutation));
        }
        if selection.statement {
            registry.register(Box::new(StatementDeletion));
        }
        if selection.identifier {
            registry.register(Box::new(IdentifierReplacement));
        }
        registry
    }

    pub fn register(&mut self, handler: Box<dyn MutationHandler + Send + Sync>) {
        self.handlers.push(handler);
    }

    /// First handler that applies to `node`.
    pub fn handler_for(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        ctx: &MutationContext<'_>,
    ) -> Option<&(dyn MutationHandler + Send + Sync)> {
        self.handlers
            .iter()
            .map(|h| h.as_ref())
            .find(|h| h.applies_to(tree, node, ctx))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for MutationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete mutated file plus where and how it was mutated.
///
/// Equality and hashing only look at the tree's structure, so two rewrites
/// that produce the same program are the same mutant.
#[derive(Debug, Clone)]
pub struct Mutant {
    tree: SyntaxTree,
    operator: MutationOperator,
    target: NodeId,
    method: Option<String>,
    description: String,
    line: usize,
    column: usize,
}

impl Mutant {
    pub fn new(original: &SyntaxTree, tree: SyntaxTree, operator: MutationOperator, target: NodeId, summary: &str) -> Self {
        let (line, column) = original.line_col(target);
        let method = original.enclosing_method(target).map(str::to_string);
        let description = format!("{line}:{column} {operator}: {summary}");
        Self {
            tree,
            operator,
            target,
            method,
            description,
            line,
            column,
        }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn into_tree(self) -> SyntaxTree {
        self.tree
    }

    pub fn operator(&self) -> MutationOperator {
        self.operator
    }

    /// The mutated node's id in the original tree.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn render(&self) -> String {
        self.tree.render()
    }
}

impl PartialEq for Mutant {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl Eq for Mutant {}

impl Hash for Mutant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tree.hash(state);
    }
}
