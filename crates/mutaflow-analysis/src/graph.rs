//! CFGs as petgraph graphs, and Graphviz export

use mutaflow_core::{Cfg, NodeId, SyntaxTree};
use petgraph::algo::tarjan_scc;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Longest label kept before truncation
const MAX_LABEL: usize = 48;

/// A method's CFG with printable node labels.
///
/// Edge weights are the successor's position in the source node's successor
/// list, so a condition's first edge is its taken branch.
pub struct CfgGraph {
    pub graph: DiGraph<String, usize>,
    pub entry: Option<NodeIndex>,
}

impl CfgGraph {
    pub fn new(tree: &SyntaxTree, cfg: &Cfg) -> Self {
        let mut graph = DiGraph::with_capacity(cfg.len(), cfg.edge_count());
        let mut index: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(cfg.len());
        for node in cfg.nodes() {
            index.insert(node, graph.add_node(label(tree, node)));
        }
        for from in cfg.nodes() {
            for (position, to) in cfg.successors(from).iter().enumerate() {
                if let (Some(&a), Some(&b)) = (index.get(&from), index.get(to)) {
                    graph.add_edge(a, b, position);
                }
            }
        }
        let entry = cfg.entry().and_then(|e| index.get(&e).copied());
        Self { graph, entry }
    }

    /// Number of loops: strongly connected components with a cycle.
    pub fn loop_count(&self) -> usize {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| match scc.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            })
            .count()
    }

    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]))
    }
}

/// Single-line rendering of a step, shortened for display.
fn label(tree: &SyntaxTree, node: NodeId) -> String {
    let text = tree.render_node(node);
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > MAX_LABEL {
        let cut: String = flat.chars().take(MAX_LABEL - 3).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
