//! Compilation contract and the built-in semantic checker
//!
//! A [`Compiler`] turns a syntax tree into diagnostics. A tree is accepted
//! iff none of them has error severity.

mod checker;

pub use checker::Checker;

use crate::syntax::{Span, SyntaxTree};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// C#-style code such as `CS0103`
    pub code: &'static str,
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip)]
    pub span: Span,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "({},{}): {} {}: {}",
            self.line, self.column, severity, self.code, self.message
        )
    }
}

/// Diagnostics of one compilation, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// True when compilation would succeed.
    pub fn is_accepted(&self) -> bool {
        !self.has_errors()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.items.iter().any(|d| d.code == code)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.items.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Anything that can judge whether a tree compiles.
pub trait Compiler: Send + Sync {
    fn compile(&self, tree: &SyntaxTree) -> Diagnostics;
}

impl<C: Compiler + ?Sized> Compiler for &C {
    fn compile(&self, tree: &SyntaxTree) -> Diagnostics {
        (**self).compile(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(severity: Severity, code: &'static str) -> Diagnostic {
        Diagnostic {
            severity,
            code,
            message: "message".to_string(),
            line: 3,
            column: 7,
            span: Span::default(),
        }
    }

    #[test]
    fn test_warnings_do_not_reject() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(diagnostic(Severity::Warning, "CS0168"));
        assert!(diagnostics.is_accepted());
        diagnostics.push(diagnostic(Severity::Error, "CS0103"));
        assert!(!diagnostics.is_accepted());
        assert_eq!(diagnostics.errors().count(), 1);
        assert_eq!(diagnostics.warnings().count(), 1);
        assert!(diagnostics.has_code("CS0168"));
    }

    #[test]
    fn test_diagnostic_display() {
        let d = diagnostic(Severity::Error, "CS0103");
        assert_eq!(d.to_string(), "(3,7): error CS0103: message");
    }
}
