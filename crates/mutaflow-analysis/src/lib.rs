//! # Mutaflow Analysis
//!
//! Metrics, reports and graph export on top of `mutaflow-core`.
//!
//! ## Modules
//!
//! - **[`metrics`]** - Per-method CFG and data-flow metrics, mutation statistics
//! - **[`graph`]** - CFGs as petgraph graphs, Graphviz output
//! - **[`report`]** - JSON report of a mutation run
//!
//! ## Quick Start
//!
//! ```rust
//! use mutaflow_analysis::prelude::*;
//! use mutaflow_core::parse;
//!
//! let tree = parse("class C { void M(int n) { while (n > 0) { n--; } } }").unwrap();
//! let result = Analyzer::new().analyze(&tree).unwrap();
//! assert_eq!(result.method_metrics[0].loops, 1);
//! ```

pub mod graph;
pub mod metrics;
pub mod report;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::graph::CfgGraph;
    pub use crate::metrics::{
        calculate_cyclomatic, qualified_name, AnalysisResult, Analyzer, ComplexityDistribution, MethodMetrics,
        ModuleMetrics, MutationMetrics, OperatorStats,
    };
    pub use crate::report::{MutantEntry, MutationReport};
}

pub use graph::CfgGraph;
pub use metrics::{AnalysisResult, Analyzer, MethodMetrics, ModuleMetrics, MutationMetrics};
pub use report::MutationReport;
