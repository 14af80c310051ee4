//! Control flow and data flow analysis of method bodies
//!
//! This module implements a classic dataflow framework with:
//! - Control Flow Graph (CFG) construction over statements and conditions
//! - A powerset fact lattice with union as join
//! - Worklist-based fixpoint solver for forward and backward problems
//! - Reaching definitions and live variables
//! - Per-method tables indexed by use and definition site

mod cfg;
mod lattice;
mod liveness;
mod reaching;
mod solver;
mod tables;

pub use cfg::{Cfg, CfgBuilder, Successors};
pub use lattice::{Definition, FactSet, Named, Use};
pub use liveness::{is_condition, step_uses, LiveVariables};
pub use reaching::{generated_definitions, ReachingDefinitions};
pub use solver::{DataflowAnalysis, DataflowDirection, FixpointResult, FixpointSolver};
pub use tables::{DataflowOptions, MethodDataflow};
