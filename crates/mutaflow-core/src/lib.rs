//! # Mutaflow Core
//!
//! Front end, data-flow engine and mutant generator for single-file C#
//! programs.
//!
//! ## Modules
//!
//! - **[`syntax`]** - Lexer, parser, immutable syntax tree, rewriting and rendering
//! - **[`compile`]** - Semantic checker that decides whether a tree compiles
//! - **[`dataflow`]** - CFG construction, reaching definitions and live variables
//! - **[`mutation`]** - Mutation operators, candidate generation and validation
//! - **[`pipeline`]** - The whole run behind one type
//!
//! ## Quick Start
//!
//! ```rust
//! use mutaflow_core::MutaflowPipeline;
//!
//! let pipeline = MutaflowPipeline::new();
//! let run = pipeline
//!     .run("class C { int M(int x) { int y = x + 1; return y; } }")
//!     .unwrap();
//! for mutant in &run.mutants {
//!     println!("{}", mutant.description());
//! }
//! ```

pub mod compile;
pub mod config;
pub mod dataflow;
pub mod error;
pub mod mutation;
pub mod pipeline;
pub mod syntax;

pub use compile::{Checker, Compiler, Diagnostic, Diagnostics, Severity};
pub use config::{MutationConfig, OperatorSelection, DEFAULT_MARKER};
pub use dataflow::{Cfg, CfgBuilder, DataflowOptions, Definition, FactSet, MethodDataflow, Use};
pub use error::{ConfigError, DataflowError, MutaflowError, MutationError, ParseError, Result};
pub use mutation::{Mutant, MutationGenerator, MutationOperator, MutationRegistry, Validator};
pub use pipeline::{MutaflowPipeline, MutationRun};
pub use syntax::{parse, NodeId, NodeKind, SyntaxTree};
