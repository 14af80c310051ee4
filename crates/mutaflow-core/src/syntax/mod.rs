//! Front end for the supported C# subset
//!
//! - `lexer`: tokens and trivia skipping
//! - `parser`: recursive descent into an arena tree
//! - `rewrite`: pure subtree replacement with grafts
//! - `render`: lossless printing of original and rewritten trees

mod ast;
mod lexer;
mod parser;
mod render;
mod rewrite;

pub use ast::{
    AssignOp, BinaryOp, Literal, LiteralKind, Modifier, Node, NodeId, NodeKind, Span, SyntaxTree, TypeName,
    UnaryOp,
};
pub use parser::parse;
pub use rewrite::{Graft, GraftChild};

/// 1-based line and column (in characters) of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |n| n + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "ab\ncd\n\nxyz";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 4), (2, 2));
        assert_eq!(line_col(source, 7), (4, 1));
        assert_eq!(line_col(source, 100), (4, 4));
    }
}
