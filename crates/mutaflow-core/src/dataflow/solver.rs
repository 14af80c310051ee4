//! Dataflow analysis framework with worklist-based fixpoint solver

use super::cfg::Cfg;
use crate::syntax::NodeId;
use fnv::{FnvHashMap, FnvHashSet};
use std::collections::VecDeque;
use tracing::trace;

/// Direction of dataflow analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataflowDirection {
    Forward,
    Backward,
}

/// Generic trait for dataflow analyses
pub trait DataflowAnalysis {
    /// The type of facts being propagated
    type Fact: Clone + PartialEq;

    /// Direction of the analysis
    fn direction(&self) -> DataflowDirection;

    /// Boundary fact: flows into the entry (forward) or out of leaves (backward)
    fn initial_fact(&self) -> Self::Fact;

    /// Bottom element for the lattice
    fn bottom(&self) -> Self::Fact;

    /// Join/merge facts from multiple predecessors or successors
    fn join(&self, facts: &[&Self::Fact]) -> Self::Fact;

    /// Transfer function: OUT from IN (forward) or IN from OUT (backward)
    fn transfer(&self, node: NodeId, input: &Self::Fact) -> Self::Fact;
}

/// Result of fixpoint computation
#[derive(Debug, Clone)]
pub struct FixpointResult<F> {
    /// Facts at entry of each node
    pub in_facts: FnvHashMap<NodeId, F>,
    /// Facts at exit of each node
    pub out_facts: FnvHashMap<NodeId, F>,
    /// Number of worklist pops to reach the fixpoint
    pub iterations: usize,
}

impl<F> FixpointResult<F> {
    pub fn fact_in(&self, node: NodeId) -> Option<&F> {
        self.in_facts.get(&node)
    }

    pub fn fact_out(&self, node: NodeId) -> Option<&F> {
        self.out_facts.get(&node)
    }
}

/// Worklist-based fixpoint solver
///
/// The worklist starts with every node of the graph, so nodes unreachable
/// from the entry still get facts. Transfer functions must be monotone over
/// a finite lattice; the solver has no iteration cap.
pub struct FixpointSolver;

impl FixpointSolver {
    /// Compute fixpoint for a dataflow analysis
    pub fn solve<A: DataflowAnalysis>(analysis: &A, cfg: &Cfg) -> FixpointResult<A::Fact> {
        let result = match analysis.direction() {
            DataflowDirection::Forward => Self::solve_forward(analysis, cfg),
            DataflowDirection::Backward => Self::solve_backward(analysis, cfg),
        };
        trace!(
            direction = ?analysis.direction(),
            nodes = cfg.len(),
            iterations = result.iterations,
            "reached fixpoint"
        );
        result
    }

    /// `order` first, then any remaining nodes in build order.
    fn seed(cfg: &Cfg, order: Vec<NodeId>) -> (VecDeque<NodeId>, FnvHashSet<NodeId>) {
        let mut in_worklist: FnvHashSet<NodeId> = order.iter().copied().collect();
        let mut worklist: VecDeque<NodeId> = order.into();
        for node in cfg.nodes() {
            if in_worklist.insert(node) {
                worklist.push_back(node);
            }
        }
        (worklist, in_worklist)
    }

    fn solve_forward<A: DataflowAnalysis>(analysis: &A, cfg: &Cfg) -> FixpointResult<A::Fact> {
        let mut in_facts: FnvHashMap<NodeId, A::Fact> = FnvHashMap::default();
        let mut out_facts: FnvHashMap<NodeId, A::Fact> = FnvHashMap::default();

        // Initialize all nodes with bottom
        for node in cfg.nodes() {
            in_facts.insert(node, analysis.bottom());
            out_facts.insert(node, analysis.bottom());
        }

        let predecessors = cfg.predecessors();
        let initial = analysis.initial_fact();
        let (mut worklist, mut in_worklist) = Self::seed(cfg, cfg.reverse_postorder());
        let mut iterations = 0;

        while let Some(node) = worklist.pop_front() {
            in_worklist.remove(&node);
            iterations += 1;

            // Compute input by joining predecessor outputs
            let mut incoming: Vec<&A::Fact> = predecessors
                .get(&node)
                .into_iter()
                .flatten()
                .filter_map(|pred| out_facts.get(pred))
                .collect();
            if Some(node) == cfg.entry() {
                incoming.push(&initial);
            }
            let new_in = if incoming.is_empty() {
                analysis.bottom()
            } else {
                analysis.join(&incoming)
            };

            // Apply transfer function
            let new_out = analysis.transfer(node, &new_in);
            in_facts.insert(node, new_in);

            // Check if output changed
            let changed = out_facts.get(&node).map_or(true, |old| old != &new_out);
            if changed {
                out_facts.insert(node, new_out);

                // Add successors to worklist
                for &succ in cfg.successors(node) {
                    if in_worklist.insert(succ) {
                        worklist.push_back(succ);
                    }
                }
            }
        }

        FixpointResult {
            in_facts,
            out_facts,
            iterations,
        }
    }

    fn solve_backward<A: DataflowAnalysis>(analysis: &A, cfg: &Cfg) -> FixpointResult<A::Fact> {
        let mut in_facts: FnvHashMap<NodeId, A::Fact> = FnvHashMap::default();
        let mut out_facts: FnvHashMap<NodeId, A::Fact> = FnvHashMap::default();

        // Initialize all nodes with bottom
        for node in cfg.nodes() {
            in_facts.insert(node, analysis.bottom());
            out_facts.insert(node, analysis.bottom());
        }

        let predecessors = cfg.predecessors();
        let initial = analysis.initial_fact();
        let (mut worklist, mut in_worklist) = Self::seed(cfg, cfg.postorder());
        let mut iterations = 0;

        while let Some(node) = worklist.pop_front() {
            in_worklist.remove(&node);
            iterations += 1;

            // Compute output by joining successor inputs
            let successors = cfg.successors(node);
            let new_out = if successors.is_empty() {
                analysis.join(&[&initial])
            } else {
                let outgoing: Vec<&A::Fact> = successors.iter().filter_map(|s| in_facts.get(s)).collect();
                analysis.join(&outgoing)
            };

            // Apply transfer function (backward)
            let new_in = analysis.transfer(node, &new_out);
            out_facts.insert(node, new_out);

            // Check if input changed
            let changed = in_facts.get(&node).map_or(true, |old| old != &new_in);
            if changed {
                in_facts.insert(node, new_in);

                // Add predecessors to worklist
                for &pred in predecessors.get(&node).into_iter().flatten() {
                    if in_worklist.insert(pred) {
                        worklist.push_back(pred);
                    }
                }
            }
        }

        FixpointResult {
            in_facts,
            out_facts,
            iterations,
        }
    }
}
