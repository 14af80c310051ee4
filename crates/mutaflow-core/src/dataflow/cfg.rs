//! Control flow graph construction over method bodies
//!
//! Nodes of the graph are the leading syntax node of each executed step:
//! plain statements themselves, the condition of an `if` or `while`, and the
//! initializer, condition and incrementer of a `for`. Edges connect a step
//! to every step that may execute right after it.

use crate::error::DataflowError;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use fnv::{FnvHashMap, FnvHashSet};
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::trace;

/// Successor (or predecessor) list; steps have at most two successors.
pub type Successors = SmallVec<[NodeId; 2]>;

/// Control Flow Graph of one method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cfg {
    entry: Option<NodeId>,
    edges: IndexMap<NodeId, Successors>,
}

impl Cfg {
    pub fn new() -> Self {
        Self::default()
    }

    /// First step of the body; `None` for an empty body.
    pub fn entry(&self) -> Option<NodeId> {
        self.entry
    }

    pub fn set_entry(&mut self, entry: Option<NodeId>) {
        self.entry = entry;
    }

    pub fn add_node(&mut self, node: NodeId) {
        self.edges.entry(node).or_default();
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.add_node(to);
        let successors = self.edges.entry(from).or_default();
        if !successors.contains(&to) {
            successors.push(to);
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.edges.contains_key(&node)
    }

    /// Nodes in the order they were built.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.edges.keys().copied()
    }

    /// Successors of `node`; empty for leaves and for unknown nodes.
    pub fn successors(&self, node: NodeId) -> &[NodeId] {
        self.edges.get(&node).map_or(&[], |s| s.as_slice())
    }

    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edges
            .iter()
            .flat_map(|(&from, succs)| succs.iter().map(move |&to| (from, to)))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|s| s.len()).sum()
    }

    /// Nodes without successors.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .iter()
            .filter(|(_, succs)| succs.is_empty())
            .map(|(&node, _)| node)
    }

    /// Inverted adjacency.
    pub fn predecessors(&self) -> FnvHashMap<NodeId, Successors> {
        let mut preds: FnvHashMap<NodeId, Successors> = self.nodes().map(|n| (n, Successors::new())).collect();
        for (from, to) in self.edges() {
            preds.entry(to).or_default().push(from);
        }
        preds
    }

    /// Get nodes in reverse postorder (useful for forward dataflow)
    pub fn reverse_postorder(&self) -> Vec<NodeId> {
        let mut order = self.postorder();
        order.reverse();
        order
    }

    /// Get nodes reachable from the entry in postorder (useful for backward dataflow)
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut visited = FnvHashSet::default();
        let mut postorder = Vec::with_capacity(self.len());
        let Some(entry) = self.entry else {
            return postorder;
        };

        // (node, index of the next successor to explore)
        let mut stack = vec![(entry, 0usize)];
        visited.insert(entry);
        while let Some((node, next)) = stack.pop() {
            match self.successors(node).get(next) {
                Some(&succ) => {
                    stack.push((node, next + 1));
                    if visited.insert(succ) {
                        stack.push((succ, 0));
                    }
                }
                None => postorder.push(node),
            }
        }
        postorder
    }

    /// Nodes reachable from the entry.
    pub fn reachable(&self) -> FnvHashSet<NodeId> {
        self.postorder().into_iter().collect()
    }
}

/// Continuations in effect while building a statement. At most one is set:
/// entering a construct that provides one clears the other.
#[derive(Debug, Clone, Copy, Default)]
struct Continuation {
    loop_back: Option<NodeId>,
    if_forward: Option<NodeId>,
}

impl Continuation {
    fn looping(target: NodeId) -> Self {
        Self {
            loop_back: Some(target),
            if_forward: None,
        }
    }

    fn forward(target: NodeId) -> Self {
        Self {
            loop_back: None,
            if_forward: Some(target),
        }
    }

    fn target(&self) -> Option<NodeId> {
        self.loop_back.or(self.if_forward)
    }
}

/// Builder for constructing a CFG from a method declaration
pub struct CfgBuilder<'t> {
    tree: &'t SyntaxTree,
    cfg: Cfg,
    visited: FnvHashSet<NodeId>,
}

impl<'t> CfgBuilder<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        Self {
            tree,
            cfg: Cfg::new(),
            visited: FnvHashSet::default(),
        }
    }

    pub fn build_method(self, method: NodeId) -> Result<Cfg, DataflowError> {
        let body = match self.tree.kind(method) {
            NodeKind::Method { .. } => self.tree.children(method).last().copied(),
            _ => None,
        };
        let body = body.ok_or(DataflowError::NotAMethod(method))?;
        Ok(self.build_body(body))
    }

    /// Builds the graph of a block used as a method body.
    pub fn build_body(mut self, body: NodeId) -> Cfg {
        let entry = self.first_step(body);
        self.cfg.set_entry(entry);
        self.build_stmt(body, Continuation::default());
        trace!(
            nodes = self.cfg.len(),
            edges = self.cfg.edge_count(),
            "built control flow graph"
        );
        self.cfg
    }

    /// Leading step of a statement: the condition of `if`/`while`, the
    /// initializer of `for`, the first step of a block.
    fn first_step(&self, stmt: NodeId) -> Option<NodeId> {
        let tree = self.tree;
        match tree.kind(stmt) {
            NodeKind::Block => tree.children(stmt).iter().find_map(|&c| self.first_step(c)),
            NodeKind::If | NodeKind::While | NodeKind::For => tree.children(stmt).first().copied(),
            NodeKind::LocalDeclaration
            | NodeKind::ExpressionStatement
            | NodeKind::EmptyStatement
            | NodeKind::Return => Some(stmt),
            _ => None,
        }
    }

    /// First step after `stmt` within its enclosing block.
    fn next_step(&self, stmt: NodeId) -> Option<NodeId> {
        let tree = self.tree;
        let parent = tree.parent(stmt)?;
        if tree.kind(parent) != &NodeKind::Block {
            return None;
        }
        let siblings = tree.children(parent);
        let pos = siblings.iter().position(|&s| s == stmt)?;
        siblings[pos + 1..].iter().find_map(|&s| self.first_step(s))
    }

    /// Marks `node` as built; false if it already was.
    fn visit(&mut self, node: NodeId) -> bool {
        if self.visited.insert(node) {
            self.cfg.add_node(node);
            true
        } else {
            false
        }
    }

    fn edge_to_start(&mut self, from: NodeId, stmt: NodeId, fallback: Option<NodeId>) {
        if let Some(to) = self.first_step(stmt).or(fallback) {
            self.cfg.add_edge(from, to);
        }
    }

    fn build_stmt(&mut self, stmt: NodeId, cont: Continuation) {
        let tree = self.tree;
        let children = tree.children(stmt);
        match tree.kind(stmt) {
            NodeKind::Block => {
                let inner = self.next_step(stmt).map_or(cont, Continuation::forward);
                for &child in children {
                    self.build_stmt(child, inner);
                }
            }
            NodeKind::If => {
                let (Some(&cond), Some(&then)) = (children.first(), children.get(1)) else {
                    return;
                };
                if !self.visit(cond) {
                    return;
                }
                let branch = self.next_step(stmt).map_or(cont, Continuation::forward);
                self.edge_to_start(cond, then, branch.target());
                let otherwise = children.get(2).and_then(|&e| tree.children(e).first().copied());
                match otherwise {
                    Some(otherwise) => self.edge_to_start(cond, otherwise, branch.target()),
                    None => {
                        if let Some(to) = branch.target() {
                            self.cfg.add_edge(cond, to);
                        }
                    }
                }
                self.build_stmt(then, branch);
                if let Some(otherwise) = otherwise {
                    self.build_stmt(otherwise, branch);
                }
            }
            NodeKind::While => {
                let (Some(&cond), Some(&body)) = (children.first(), children.get(1)) else {
                    return;
                };
                if !self.visit(cond) {
                    return;
                }
                // an empty body loops straight back to the condition
                self.edge_to_start(cond, body, Some(cond));
                if let Some(exit) = self.next_step(stmt).or(cont.target()) {
                    self.cfg.add_edge(cond, exit);
                }
                self.build_stmt(body, Continuation::looping(cond));
            }
            NodeKind::For => {
                let [init, cond, step, body] = children else {
                    return;
                };
                if !self.visit(*init) {
                    return;
                }
                self.visit(*cond);
                self.visit(*step);
                self.cfg.add_edge(*init, *cond);
                self.edge_to_start(*cond, *body, Some(*step));
                if let Some(exit) = self.next_step(stmt).or(cont.target()) {
                    self.cfg.add_edge(*cond, exit);
                }
                self.cfg.add_edge(*step, *cond);
                self.build_stmt(*body, Continuation::looping(*step));
            }
            NodeKind::Return => {
                self.visit(stmt);
            }
            NodeKind::LocalDeclaration | NodeKind::ExpressionStatement | NodeKind::EmptyStatement => {
                if !self.visit(stmt) {
                    return;
                }
                if let Some(next) = self.next_step(stmt).or(cont.target()) {
                    self.cfg.add_edge(stmt, next);
                }
            }
            _ => {}
        }
    }
}
