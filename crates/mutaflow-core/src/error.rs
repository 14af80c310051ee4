//! Error types for mutaflow-core

use crate::syntax::NodeId;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T, E = MutaflowError> = std::result::Result<T, E>;

/// A lexical or syntactic error in the input text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    /// 1-based line of the offending token
    pub line: usize,
    /// 1-based column of the offending token
    pub column: usize,
    /// Byte offset of the offending token
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = crate::syntax::line_col(source, offset);
        Self {
            line,
            column,
            offset,
            message: message.into(),
        }
    }
}

/// Contract violations of the per-method data-flow tables.
///
/// These indicate a caller bug: generation only queries nodes that were
/// visited while building the CFG of the method currently being mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataflowError {
    #[error("node {0} is not part of the analyzed method")]
    UnanalyzedNode(NodeId),

    #[error("node {0} is not a method declaration")]
    NotAMethod(NodeId),
}

/// Failures while building mutation candidates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("handler `{handler}` cannot mutate node {node}")]
    Inapplicable { handler: &'static str, node: NodeId },

    #[error(transparent)]
    Dataflow(#[from] DataflowError),
}

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("marker text must not contain `*/`: {0:?}")]
    InvalidMarker(String),

    #[error("all mutation operators are disabled")]
    NoOperators,
}

/// Umbrella error for the mutation pipeline.
#[derive(Error, Debug)]
pub enum MutaflowError {
    #[error("parse error at {0}")]
    Parse(#[from] ParseError),

    /// The unmutated source produced error diagnostics
    #[error("source does not compile ({count} error(s)):\n{summary}")]
    SourceRejected { count: usize, summary: String },

    #[error(transparent)]
    Dataflow(#[from] DataflowError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_position() {
        let err = ParseError::at("int x;\n  @", 9, "unexpected character `@`");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert_eq!(err.to_string(), "2:3: unexpected character `@`");
    }

    #[test]
    fn test_mutation_error_wraps_dataflow() {
        let err: MutationError = DataflowError::UnanalyzedNode(NodeId(7)).into();
        assert_eq!(err.to_string(), "node #7 is not part of the analyzed method");
    }
}
