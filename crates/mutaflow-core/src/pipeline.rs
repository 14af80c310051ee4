//! Parse, check, generate and validate in one place

use crate::compile::{Checker, Compiler, Diagnostics};
use crate::config::MutationConfig;
use crate::error::{MutaflowError, Result};
use crate::mutation::{Mutant, MutationGenerator, Validator};
use crate::syntax::{parse, SyntaxTree};
use tracing::{debug, info, warn};

/// Everything produced for one source file.
#[derive(Debug)]
pub struct MutationRun {
    pub original: SyntaxTree,
    /// Warnings reported for the unmutated source
    pub diagnostics: Diagnostics,
    /// Candidates produced before validation
    pub candidates: usize,
    /// Compiling mutants, in generation order
    pub mutants: Vec<Mutant>,
}

impl MutationRun {
    pub fn rejected(&self) -> usize {
        self.candidates - self.mutants.len()
    }
}

/// Main pipeline
pub struct MutaflowPipeline<C: Compiler = Checker> {
    config: MutationConfig,
    generator: MutationGenerator,
    validator: Validator<C>,
}

impl MutaflowPipeline<Checker> {
    pub fn new() -> Self {
        let config = MutationConfig::default();
        Self {
            generator: MutationGenerator::from_config(&config),
            validator: Validator::new(Checker::new()).parallel(config.parallel_validation),
            config,
        }
    }

    pub fn from_config(config: MutationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            generator: MutationGenerator::from_config(&config),
            validator: Validator::new(Checker::new()).parallel(config.parallel_validation),
            config,
        })
    }
}

impl Default for MutaflowPipeline<Checker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Compiler> MutaflowPipeline<C> {
    /// Swap the compiler used for the original source and for every mutant.
    pub fn with_compiler<D: Compiler>(self, compiler: D) -> MutaflowPipeline<D> {
        MutaflowPipeline {
            validator: Validator::new(compiler).parallel(self.config.parallel_validation),
            generator: self.generator,
            config: self.config,
        }
    }

    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    pub fn generator(&self) -> &MutationGenerator {
        &self.generator
    }

    pub fn parse(&self, source: &str) -> Result<SyntaxTree> {
        Ok(parse(source)?)
    }

    /// Compile the unmutated tree; errors reject the whole input.
    pub fn check(&self, tree: &SyntaxTree) -> Result<Diagnostics> {
        let diagnostics = self.validator.compiler().compile(tree);
        if diagnostics.has_errors() {
            let errors: Vec<String> = diagnostics.errors().map(|d| d.to_string()).collect();
            return Err(MutaflowError::SourceRejected {
                count: errors.len(),
                summary: errors.join("\n"),
            });
        }
        for warning in diagnostics.warnings() {
            warn!("{warning}");
        }
        Ok(diagnostics)
    }

    pub fn generate(&self, tree: &SyntaxTree) -> Result<Vec<Mutant>> {
        Ok(self.generator.generate(tree)?)
    }

    pub fn validate(&self, candidates: Vec<Mutant>) -> Vec<Mutant> {
        self.validator.validate(candidates)
    }

    pub fn validate_with<F>(&self, candidates: Vec<Mutant>, observer: F) -> Vec<Mutant>
    where
        F: Fn(&Mutant, bool) + Sync,
    {
        self.validator.validate_with(candidates, observer)
    }

    /// Parse, check, generate and validate `source`.
    pub fn run(&self, source: &str) -> Result<MutationRun> {
        self.run_with(source, |_, _| {})
    }

    pub fn run_with<F>(&self, source: &str, observer: F) -> Result<MutationRun>
    where
        F: Fn(&Mutant, bool) + Sync,
    {
        let original = self.parse(source)?;
        debug!(nodes = original.len(), "parsed source");
        let diagnostics = self.check(&original)?;
        let candidates = self.generate(&original)?;
        let total = candidates.len();
        let mutants = self.validate_with(candidates, observer);
        info!(candidates = total, valid = mutants.len(), "mutation run finished");
        Ok(MutationRun {
            original,
            diagnostics,
            candidates: total,
            mutants,
        })
    }
}
