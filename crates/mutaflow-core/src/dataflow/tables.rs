//! Per-method data-flow tables
//!
//! `MethodDataflow` runs the CFG builder and both analyses for one method and
//! indexes the results by use site and by definition site, so that callers
//! can ask about any identifier in the method without walking the tree.

use super::cfg::{Cfg, CfgBuilder};
use super::lattice::{Definition, FactSet, Use};
use super::liveness::LiveVariables;
use super::reaching::{generated_definitions, ReachingDefinitions};
use super::solver::{FixpointResult, FixpointSolver};
use crate::error::DataflowError;
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Knobs for the analyses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataflowOptions {
    /// Count identifiers in `if`/`while`/`for` conditions as uses
    pub condition_uses: bool,
}

#[derive(Debug, Clone)]
struct UseSite {
    step: NodeId,
    name: String,
}

/// Data-flow facts of one method, indexed for mutation queries
#[derive(Debug, Clone)]
pub struct MethodDataflow {
    method: NodeId,
    cfg: Cfg,
    reaching: FixpointResult<FactSet<Definition>>,
    liveness: FixpointResult<FactSet<Use>>,
    uses: FnvHashMap<NodeId, UseSite>,
    def_steps: FnvHashMap<NodeId, NodeId>,
    definitions: FactSet<Definition>,
}

impl MethodDataflow {
    pub fn analyze(tree: &SyntaxTree, method: NodeId) -> Result<Self, DataflowError> {
        Self::analyze_with(tree, method, DataflowOptions::default())
    }

    pub fn analyze_with(tree: &SyntaxTree, method: NodeId, options: DataflowOptions) -> Result<Self, DataflowError> {
        let cfg = CfgBuilder::new(tree).build_method(method)?;
        let reaching = FixpointSolver::solve(&ReachingDefinitions::new(tree, &cfg), &cfg);
        let liveness = FixpointSolver::solve(&LiveVariables::new(tree, &cfg, options.condition_uses), &cfg);

        let mut uses = FnvHashMap::default();
        let mut def_steps = FnvHashMap::default();
        let mut definitions = FactSet::new();
        for step in cfg.nodes() {
            for id in tree.descendants(step) {
                if let NodeKind::Identifier { name } = tree.kind(id) {
                    uses.insert(
                        id,
                        UseSite {
                            step,
                            name: name.clone(),
                        },
                    );
                }
            }
            for def in generated_definitions(tree, step) {
                def_steps.insert(def.site, step);
                definitions.insert(def);
            }
        }

        debug!(
            method = tree.enclosing_method(method).unwrap_or("?"),
            steps = cfg.len(),
            reaching_iterations = reaching.iterations,
            liveness_iterations = liveness.iterations,
            "analyzed method"
        );

        Ok(Self {
            method,
            cfg,
            reaching,
            liveness,
            uses,
            def_steps,
            definitions,
        })
    }

    pub fn method(&self) -> NodeId {
        self.method
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    /// Worklist iterations of the reaching-definitions and liveness solvers.
    pub fn iterations(&self) -> (usize, usize) {
        (self.reaching.iterations, self.liveness.iterations)
    }

    /// Every definition in the method.
    pub fn definitions(&self) -> &FactSet<Definition> {
        &self.definitions
    }

    /// Identifier nodes inside analyzed steps.
    pub fn use_sites(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.uses.keys().copied()
    }

    // ---- node-level facts ----------------------------------------------

    pub fn reaching_in(&self, step: NodeId) -> Option<&FactSet<Definition>> {
        self.reaching.fact_in(step)
    }

    pub fn reaching_out(&self, step: NodeId) -> Option<&FactSet<Definition>> {
        self.reaching.fact_out(step)
    }

    pub fn live_in(&self, step: NodeId) -> Option<&FactSet<Use>> {
        self.liveness.fact_in(step)
    }

    pub fn live_out_at(&self, step: NodeId) -> Option<&FactSet<Use>> {
        self.liveness.fact_out(step)
    }

    // ---- use-site queries ----------------------------------------------

    /// CFG step containing an identifier.
    pub fn step_of_use(&self, use_site: NodeId) -> Option<NodeId> {
        self.uses.get(&use_site).map(|u| u.step)
    }

    pub fn has_reaching_definitions(&self, use_site: NodeId) -> bool {
        self.uses.contains_key(&use_site)
    }

    /// Definitions reaching the step that contains `use_site`.
    pub fn reaching_definitions(&self, use_site: NodeId) -> Result<&FactSet<Definition>, DataflowError> {
        self.uses
            .get(&use_site)
            .and_then(|u| self.reaching.fact_in(u.step))
            .ok_or(DataflowError::UnanalyzedNode(use_site))
    }

    /// Use-def chain: reaching definitions of the identifier's own variable.
    pub fn definitions_of_use(&self, use_site: NodeId) -> Result<Vec<&Definition>, DataflowError> {
        let site = self
            .uses
            .get(&use_site)
            .ok_or(DataflowError::UnanalyzedNode(use_site))?;
        Ok(self.reaching_definitions(use_site)?.named(&site.name).collect())
    }

    // ---- definition-site queries ---------------------------------------

    /// Uses live after the step containing the definition at `def_site`.
    pub fn live_out(&self, def_site: NodeId) -> Result<&FactSet<Use>, DataflowError> {
        self.def_steps
            .get(&def_site)
            .and_then(|&step| self.liveness.fact_out(step))
            .ok_or(DataflowError::UnanalyzedNode(def_site))
    }

    /// Def-use chain: live uses of `name` after its definition at `def_site`.
    pub fn def_use_chain(&self, def_site: NodeId, name: &str) -> Result<Vec<&Use>, DataflowError> {
        Ok(self.live_out(def_site)?.named(name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn analyze(body: &str) -> (SyntaxTree, MethodDataflow) {
        let tree = parse(&format!("class C {{ void M() {{ {body} }} }}")).unwrap();
        let method = tree.methods().next().unwrap();
        let dataflow = MethodDataflow::analyze(&tree, method).unwrap();
        (tree, dataflow)
    }

    /// Identifier nodes named `name`, in source order.
    fn idents(tree: &SyntaxTree, name: &str) -> Vec<NodeId> {
        tree.preorder()
            .filter(|&id| matches!(tree.kind(id), NodeKind::Identifier { name: n } if n == name))
            .collect()
    }

    #[test]
    fn test_use_def_chain() {
        let (tree, df) = analyze("int x = 0; int y = 1; x = y; Console.WriteLine(x);");
        let x_read = *idents(&tree, "x").last().unwrap();
        let defs = df.definitions_of_use(x_read).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(tree.render_node(defs[0].site), "x = y");
    }

    #[test]
    fn test_def_use_chain() {
        let (tree, df) = analyze("int x = 0; int y = 1; x = y; Console.WriteLine(x);");
        let assign = tree
            .preorder()
            .find(|&id| matches!(tree.kind(id), NodeKind::Assignment { .. }))
            .unwrap();
        let chain = df.def_use_chain(assign, "x").unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].site, *idents(&tree, "x").last().unwrap());
        assert!(df.def_use_chain(assign, "y").unwrap().is_empty());
    }

    #[test]
    fn test_def_use_chain_outlives_name() {
        let (tree, df) = analyze("int x = 0; x = x + 1; Console.WriteLine(x);");
        let decl = tree
            .preorder()
            .find(|&id| matches!(tree.kind(id), NodeKind::LocalDeclaration))
            .unwrap();
        let chain = {
            let name = String::from("x");
            df.def_use_chain(decl, &name).unwrap()
        };
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].name, "x");
    }

    #[test]
    fn test_unanalyzed_nodes() {
        let (tree, df) = analyze("int x = 0;");
        let root = tree.root();
        assert!(!df.has_reaching_definitions(root));
        assert_eq!(df.reaching_definitions(root), Err(DataflowError::UnanalyzedNode(root)));
        assert_eq!(df.live_out(root), Err(DataflowError::UnanalyzedNode(root)));
    }

    #[test]
    fn test_definitions_listed() {
        let (_, df) = analyze("int a = 1, b = 2; a = b; for (int i = 0; i < a; i++) { b = i; }");
        let names: Vec<&str> = df.definitions().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"i"));
    }
}
