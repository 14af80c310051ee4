//! CFG, data-flow and mutation metrics
//!
//! This module reports per-method graph shape and data-flow statistics, and
//! per-operator mutation counts for a run.

use crate::graph::CfgGraph;
use anyhow::{Context, Result};
use mutaflow_core::{Cfg, DataflowOptions, MethodDataflow, Mutant, MutationOperator, NodeId, NodeKind, SyntaxTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub module_metrics: ModuleMetrics,
    pub method_metrics: Vec<MethodMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleMetrics {
    pub total_methods: usize,
    pub total_cfg_nodes: usize,
    pub total_definitions: usize,
    pub avg_cyclomatic_complexity: f64,
    pub max_cyclomatic_complexity: u32,
    pub cyclomatic_distribution: ComplexityDistribution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodMetrics {
    /// `Class.Method`
    pub name: String,
    pub line: usize,
    pub parameters: usize,
    pub cfg_nodes: usize,
    pub cfg_edges: usize,
    /// Steps without successors
    pub exits: usize,
    pub loops: usize,
    pub cyclomatic_complexity: u32,
    pub definitions: usize,
    pub uses: usize,
    pub reaching_iterations: usize,
    pub liveness_iterations: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityDistribution {
    pub low: usize,       // complexity <= 5
    pub medium: usize,    // 5 < complexity <= 10
    pub high: usize,      // 10 < complexity <= 20
    pub very_high: usize, // complexity > 20
}

impl ComplexityDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, complexity: u32) {
        match complexity {
            0..=5 => self.low += 1,
            6..=10 => self.medium += 1,
            11..=20 => self.high += 1,
            _ => self.very_high += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.very_high
    }
}

/// Candidate and survivor counts of one operator family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStats {
    pub candidates: usize,
    pub valid: usize,
}

impl OperatorStats {
    pub fn rejected(&self) -> usize {
        self.candidates.saturating_sub(self.valid)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationMetrics {
    pub candidates: usize,
    pub valid: usize,
    /// Share of candidates that compile, in percent
    pub validity_rate: f64,
    pub by_operator: BTreeMap<MutationOperator, OperatorStats>,
}

impl MutationMetrics {
    /// Counts candidates; call [`MutationMetrics::record_survivors`] after validation.
    pub fn from_candidates(candidates: &[Mutant]) -> Self {
        let mut metrics = Self::default();
        for mutant in candidates {
            metrics.by_operator.entry(mutant.operator()).or_default().candidates += 1;
        }
        metrics.candidates = candidates.len();
        metrics
    }

    pub fn record_survivors(&mut self, survivors: &[Mutant]) {
        for stats in self.by_operator.values_mut() {
            stats.valid = 0;
        }
        for mutant in survivors {
            self.by_operator.entry(mutant.operator()).or_default().valid += 1;
        }
        self.valid = survivors.len();
        self.validity_rate = if self.candidates > 0 {
            (self.valid as f64 / self.candidates as f64) * 100.0
        } else {
            0.0
        };
    }
}

/// Cyclomatic complexity of a CFG: `E - N + 2` for a single exit, one more
/// for each further exit. A loop with no exit still counts one.
pub fn calculate_cyclomatic(cfg: &Cfg) -> u32 {
    if cfg.is_empty() {
        return 1;
    }
    let exits = cfg.leaves().count().max(1);
    let value = cfg.edge_count() as i64 - cfg.len() as i64 + 1 + exits as i64;
    value.max(1) as u32
}

/// Main analyzer for method metrics
pub struct Analyzer {
    options: DataflowOptions,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            options: DataflowOptions::default(),
        }
    }

    pub fn with_options(options: DataflowOptions) -> Self {
        Self { options }
    }

    pub fn analyze(&self, tree: &SyntaxTree) -> Result<AnalysisResult> {
        let method_metrics: Vec<MethodMetrics> = tree
            .methods()
            .map(|m| self.analyze_method(tree, m))
            .collect::<Result<Vec<_>>>()?;

        let module_metrics = self.calculate_module_metrics(&method_metrics);
        debug!(methods = module_metrics.total_methods, "analyzed module");

        Ok(AnalysisResult {
            module_metrics,
            method_metrics,
        })
    }

    pub fn analyze_method(&self, tree: &SyntaxTree, method: NodeId) -> Result<MethodMetrics> {
        let name = qualified_name(tree, method);
        let dataflow = MethodDataflow::analyze_with(tree, method, self.options)
            .with_context(|| format!("analyzing method {name}"))?;
        let cfg = dataflow.cfg();
        let (reaching_iterations, liveness_iterations) = dataflow.iterations();
        let parameters = tree
            .children(method)
            .iter()
            .filter(|&&c| matches!(tree.kind(c), NodeKind::Parameter { .. }))
            .count();

        Ok(MethodMetrics {
            line: tree.line_col(method).0,
            parameters,
            cfg_nodes: cfg.len(),
            cfg_edges: cfg.edge_count(),
            exits: cfg.leaves().count(),
            loops: CfgGraph::new(tree, cfg).loop_count(),
            cyclomatic_complexity: calculate_cyclomatic(cfg),
            definitions: dataflow.definitions().len(),
            uses: dataflow.use_sites().count(),
            reaching_iterations,
            liveness_iterations,
            name,
        })
    }

    fn calculate_module_metrics(&self, methods: &[MethodMetrics]) -> ModuleMetrics {
        let total_methods = methods.len();
        let avg_cyclomatic = if total_methods > 0 {
            methods.iter().map(|m| m.cyclomatic_complexity as f64).sum::<f64>() / total_methods as f64
        } else {
            0.0
        };

        let mut distribution = ComplexityDistribution::new();
        for m in methods {
            distribution.add(m.cyclomatic_complexity);
        }

        ModuleMetrics {
            total_methods,
            total_cfg_nodes: methods.iter().map(|m| m.cfg_nodes).sum(),
            total_definitions: methods.iter().map(|m| m.definitions).sum(),
            avg_cyclomatic_complexity: avg_cyclomatic,
            max_cyclomatic_complexity: methods.iter().map(|m| m.cyclomatic_complexity).max().unwrap_or(0),
            cyclomatic_distribution: distribution,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// `Class.Method`, or the bare method name outside a class.
pub fn qualified_name(tree: &SyntaxTree, method: NodeId) -> String {
    let method_name = match tree.kind(method) {
        NodeKind::Method { name, .. } => name.as_str(),
        _ => "?",
    };
    let class = tree.ancestors(method).find_map(|a| match tree.kind(a) {
        NodeKind::Class { name, .. } => Some(name.as_str()),
        _ => None,
    });
    match class {
        Some(class) => format!("{class}.{method_name}"),
        None => method_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutaflow_core::{parse, MutationGenerator, Validator};
    use quickcheck_macros::quickcheck;

    const SOURCE: &str = "class Calc {
    int Abs(int x) {
        if (x < 0) { return -x; }
        return x;
    }
    int Sum(int n) {
        int total = 0;
        for (int i = 0; i < n; i++) { total += i; }
        return total;
    }
    void Empty() { }
}";

    #[test]
    fn test_analyze_module() {
        let tree = parse(SOURCE).unwrap();
        let result = Analyzer::new().analyze(&tree).unwrap();
        assert_eq!(result.module_metrics.total_methods, 3);
        let names: Vec<&str> = result.method_metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Calc.Abs", "Calc.Sum", "Calc.Empty"]);

        let abs = &result.method_metrics[0];
        assert_eq!(abs.line, 2);
        assert_eq!(abs.parameters, 1);
        assert_eq!(abs.cfg_nodes, 3);
        assert_eq!(abs.exits, 2);
        assert_eq!(abs.cyclomatic_complexity, 2);
        assert_eq!(abs.loops, 0);

        let sum = &result.method_metrics[1];
        assert_eq!(sum.loops, 1);
        assert_eq!(sum.cyclomatic_complexity, 2);
        assert_eq!(sum.definitions, 3);

        let empty = &result.method_metrics[2];
        assert_eq!(empty.cfg_nodes, 0);
        assert_eq!(empty.cyclomatic_complexity, 1);
        assert_eq!(result.module_metrics.cyclomatic_distribution.low, 3);
    }

    #[test]
    fn test_cyclomatic_of_endless_loop() {
        let tree = parse("class C { void M(int n) { while (n > 0) { n--; } } }").unwrap();
        let metrics = Analyzer::new().analyze(&tree).unwrap();
        assert_eq!(metrics.method_metrics[0].exits, 0);
        assert_eq!(metrics.method_metrics[0].cyclomatic_complexity, 2);
    }

    #[test]
    fn test_mutation_metrics() {
        let tree = parse("class C { int M(int x) { int y = x + 1; return y; } }").unwrap();
        let candidates = MutationGenerator::new().generate(&tree).unwrap();
        let mut metrics = MutationMetrics::from_candidates(&candidates);
        assert_eq!(metrics.by_operator[&MutationOperator::BinaryOperator].candidates, 9);
        assert_eq!(metrics.by_operator[&MutationOperator::StatementDeletion].candidates, 2);

        let survivors = Validator::default().validate(candidates);
        metrics.record_survivors(&survivors);
        let binary = metrics.by_operator[&MutationOperator::BinaryOperator];
        // `-`, `*` and `/` keep the declaration an int
        assert_eq!(binary.valid, 3);
        assert_eq!(binary.rejected(), 6);
        assert_eq!(metrics.by_operator[&MutationOperator::StatementDeletion].valid, 0);
        assert!(metrics.validity_rate > 0.0 && metrics.validity_rate < 100.0);
    }

    #[test]
    fn test_complexity_distribution() {
        let mut dist = ComplexityDistribution::new();

        dist.add(3); // low
        dist.add(8); // medium
        dist.add(15); // high
        dist.add(25); // very_high

        assert_eq!(dist.low, 1);
        assert_eq!(dist.medium, 1);
        assert_eq!(dist.high, 1);
        assert_eq!(dist.very_high, 1);
        assert_eq!(dist.total(), 4);
    }

    #[quickcheck]
    fn prop_distribution_counts_every_value(values: Vec<u32>) -> bool {
        let mut dist = ComplexityDistribution::new();
        for &v in &values {
            dist.add(v);
        }
        dist.total() == values.len()
    }
}
