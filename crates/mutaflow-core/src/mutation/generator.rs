//! Candidate generation over a whole file

use super::{Mutant, MutationContext, MutationRegistry};
use crate::config::{MutationConfig, DEFAULT_MARKER};
use crate::dataflow::{DataflowOptions, MethodDataflow};
use crate::error::MutationError;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use indexmap::IndexSet;
use tracing::{debug, trace};

/// Walks a tree in preorder and asks the registry for rewrites of every node.
pub struct MutationGenerator {
    registry: MutationRegistry,
    marker: Option<String>,
    options: DataflowOptions,
}

/// Data flow of the method currently being walked, valid up to `last`.
struct MethodScope {
    last: NodeId,
    dataflow: MethodDataflow,
}

impl MutationGenerator {
    pub fn new() -> Self {
        Self {
            registry: MutationRegistry::new(),
            marker: Some(DEFAULT_MARKER.to_string()),
            options: DataflowOptions::default(),
        }
    }

    pub fn from_config(config: &MutationConfig) -> Self {
        Self {
            registry: MutationRegistry::from_selection(&config.operators),
            marker: config.marker.clone(),
            options: config.dataflow,
        }
    }

    pub fn with_registry(mut self, registry: MutationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_marker(mut self, marker: Option<String>) -> Self {
        self.marker = marker;
        self
    }

    pub fn with_options(mut self, options: DataflowOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &MutationRegistry {
        &self.registry
    }

    /// All distinct candidate mutants of `tree`, in preorder of their
    /// targets. None of them is structurally equal to `tree`.
    pub fn generate(&self, tree: &SyntaxTree) -> Result<Vec<Mutant>, MutationError> {
        let mut candidates = IndexSet::new();
        let mut scope: Option<MethodScope> = None;
        let mut duplicates = 0usize;

        for node in tree.preorder() {
            if scope.as_ref().is_some_and(|s| node > s.last) {
                scope = None;
            }
            if matches!(tree.kind(node), NodeKind::Method { .. }) {
                let dataflow = MethodDataflow::analyze_with(tree, node, self.options)?;
                let last = tree.descendants(node).last().unwrap_or(node);
                scope = Some(MethodScope { last, dataflow });
            }

            let ctx = MutationContext {
                dataflow: scope.as_ref().map(|s| &s.dataflow),
            };
            let Some(handler) = self.registry.handler_for(tree, node, &ctx) else {
                continue;
            };
            for replacement in handler.mutations(tree, node, &ctx)? {
                let graft = replacement.graft.with_trailing(self.marker.clone());
                let mutated = tree.replace(node, graft);
                if mutated == *tree {
                    continue;
                }
                trace!(node = %node, handler = handler.name(), "candidate");
                let mutant = Mutant::new(tree, mutated, handler.operator(), node, &replacement.summary);
                if !candidates.insert(mutant) {
                    duplicates += 1;
                }
            }
        }

        debug!(candidates = candidates.len(), duplicates, "generated mutation candidates");
        Ok(candidates.into_iter().collect())
    }
}

impl Default for MutationGenerator {
    fn default() -> Self {
        Self::new()
    }
}
