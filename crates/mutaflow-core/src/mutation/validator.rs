//! Keeps the candidates that compile

use super::Mutant;
use crate::compile::{Checker, Compiler};
use rayon::prelude::*;
use tracing::debug;

/// Filters candidate mutants through a [`Compiler`].
///
/// Output order always matches input order, with or without parallelism.
pub struct Validator<C: Compiler = Checker> {
    compiler: C,
    parallel: bool,
}

impl<C: Compiler> Validator<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            parallel: true,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// A mutant is valid when compiling it reports no errors.
    pub fn is_valid(&self, mutant: &Mutant) -> bool {
        let diagnostics = self.compiler.compile(mutant.tree());
        if diagnostics.has_errors() {
            debug!(
                mutant = mutant.description(),
                errors = diagnostics.errors().count(),
                first = diagnostics.errors().next().map(|d| d.code),
                "discarding mutant that does not compile"
            );
            false
        } else {
            true
        }
    }

    pub fn validate(&self, candidates: Vec<Mutant>) -> Vec<Mutant> {
        self.validate_with(candidates, |_, _| {})
    }

    /// Like [`Validator::validate`], reporting each verdict to `observer`.
    /// The observer may run on several threads at once.
    pub fn validate_with<F>(&self, candidates: Vec<Mutant>, observer: F) -> Vec<Mutant>
    where
        F: Fn(&Mutant, bool) + Sync,
    {
        let check = |mutant: &Mutant| {
            let valid = self.is_valid(mutant);
            observer(mutant, valid);
            valid
        };
        if self.parallel {
            candidates.into_par_iter().filter(|m| check(m)).collect()
        } else {
            candidates.into_iter().filter(|m| check(m)).collect()
        }
    }
}

impl Default for Validator<Checker> {
    fn default() -> Self {
        Self::new(Checker::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::Diagnostics;
    use crate::mutation::MutationGenerator;
    use crate::syntax::{parse, SyntaxTree};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts everything
    struct Lenient;

    impl Compiler for Lenient {
        fn compile(&self, _tree: &SyntaxTree) -> Diagnostics {
            Diagnostics::new()
        }
    }

    const SOURCE: &str = "class C { int M(int x) { int y = x + 1; return y; } }";

    #[test]
    fn test_drops_candidates_with_errors() {
        let tree = parse(SOURCE).unwrap();
        let candidates = MutationGenerator::new().generate(&tree).unwrap();
        let total = candidates.len();
        let valid = Validator::default().validate(candidates);
        assert!(valid.len() < total);
        let checker = Checker::new();
        assert!(valid.iter().all(|m| checker.compile(m.tree()).is_accepted()));
        // `x + 1` -> `x == 1` assigns a bool to an int
        assert!(!valid.iter().any(|m| m.render().contains("x == 1")));
        // deleting the declaration leaves `y` undeclared
        assert!(!valid.iter().any(|m| !m.render().contains("int y")));
    }

    #[test]
    fn test_parallel_preserves_order() {
        let tree = parse(SOURCE).unwrap();
        let candidates = MutationGenerator::new().generate(&tree).unwrap();
        let sequential = Validator::default().parallel(false).validate(candidates.clone());
        let parallel = Validator::default().parallel(true).validate(candidates);
        let a: Vec<String> = sequential.iter().map(Mutant::render).collect();
        let b: Vec<String> = parallel.iter().map(Mutant::render).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_observer_sees_every_candidate() {
        let tree = parse(SOURCE).unwrap();
        let candidates = MutationGenerator::new().generate(&tree).unwrap();
        let total = candidates.len();
        let seen = AtomicUsize::new(0);
        let kept = Validator::new(Lenient).validate_with(candidates, |_, valid| {
            assert!(valid);
            seen.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(seen.load(Ordering::Relaxed), total);
        assert_eq!(kept.len(), total);
    }
}
