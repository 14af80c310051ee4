//! Live variables
//!
//! A backward may-analysis: `OUT[n]` is the union of the successors' `IN`,
//! and `IN[n] = uses(n) ∪ (OUT[n] - uses of names n defines)`.

use super::cfg::Cfg;
use super::lattice::{FactSet, Use};
use super::reaching::{first_assignment, generated_definitions};
use super::solver::{DataflowAnalysis, DataflowDirection};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use fnv::FnvHashMap;

/// True if `node` is the condition of an `if`, `while` or `for`.
pub fn is_condition(tree: &SyntaxTree, node: NodeId) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    let position = tree.children(parent).iter().position(|&c| c == node);
    match tree.kind(parent) {
        NodeKind::If | NodeKind::While => position == Some(0),
        NodeKind::For => position == Some(1),
        _ => false,
    }
}

fn identifiers_in(tree: &SyntaxTree, root: NodeId, into: &mut FactSet<Use>) {
    for id in tree.descendants(root) {
        if let NodeKind::Identifier { name } = tree.kind(id) {
            into.insert(Use::new(id, name.clone()));
        }
    }
}

/// Variables read by a CFG step.
///
/// Conditions read nothing unless `condition_uses` is set. An assignment
/// reads its right-hand side, plus its target when compound. Declarations
/// read their initializers. Any other step reads every identifier in it.
pub fn step_uses(tree: &SyntaxTree, step: NodeId, condition_uses: bool) -> FactSet<Use> {
    let mut uses = FactSet::new();
    if is_condition(tree, step) {
        if condition_uses {
            identifiers_in(tree, step, &mut uses);
        }
        return uses;
    }

    if let Some(assignment) = first_assignment(tree, step) {
        let children = tree.children(assignment);
        if let Some(&value) = children.get(1) {
            identifiers_in(tree, value, &mut uses);
        }
        let compound = matches!(tree.kind(assignment), NodeKind::Assignment { op } if op.is_compound());
        if let (true, Some(&target)) = (compound, children.first()) {
            identifiers_in(tree, target, &mut uses);
        }
        return uses;
    }

    let declaration = match tree.kind(step) {
        NodeKind::LocalDeclaration => tree.children(step).first().copied(),
        NodeKind::VariableDeclaration { .. } => Some(step),
        _ => None,
    };
    match declaration {
        Some(declaration) => {
            for &declarator in tree.children(declaration) {
                for &init in tree.children(declarator) {
                    identifiers_in(tree, init, &mut uses);
                }
            }
        }
        None => identifiers_in(tree, step, &mut uses),
    }
    uses
}

/// Backward live-variables analysis over one method's CFG
pub struct LiveVariables {
    uses: FnvHashMap<NodeId, FactSet<Use>>,
    defined: FnvHashMap<NodeId, Vec<String>>,
}

impl LiveVariables {
    pub fn new(tree: &SyntaxTree, cfg: &Cfg, condition_uses: bool) -> Self {
        let mut uses = FnvHashMap::default();
        let mut defined = FnvHashMap::default();
        for node in cfg.nodes() {
            uses.insert(node, step_uses(tree, node, condition_uses));
            let names = generated_definitions(tree, node).into_iter().map(|d| d.name).collect();
            defined.insert(node, names);
        }
        Self { uses, defined }
    }

    pub fn uses(&self, node: NodeId) -> Option<&FactSet<Use>> {
        self.uses.get(&node)
    }
}

impl DataflowAnalysis for LiveVariables {
    type Fact = FactSet<Use>;

    fn direction(&self) -> DataflowDirection {
        DataflowDirection::Backward
    }

    fn initial_fact(&self) -> Self::Fact {
        FactSet::new()
    }

    fn bottom(&self) -> Self::Fact {
        FactSet::new()
    }

    fn join(&self, facts: &[&Self::Fact]) -> Self::Fact {
        let mut joined = FactSet::new();
        for fact in facts {
            joined.union_with(fact);
        }
        joined
    }

    fn transfer(&self, node: NodeId, output: &Self::Fact) -> Self::Fact {
        let mut live = output.clone();
        if let Some(names) = self.defined.get(&node) {
            live.kill(names.iter().map(String::as_str));
        }
        if let Some(uses) = self.uses.get(&node) {
            live.union_with(uses);
        }
        live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn names(uses: &FactSet<Use>) -> Vec<&str> {
        uses.names().into_iter().collect()
    }

    fn find(tree: &SyntaxTree, text: &str) -> NodeId {
        tree.preorder().find(|&id| tree.render_node(id) == text).unwrap()
    }

    #[test]
    fn test_step_uses() {
        let tree = parse(
            "class C { void M(int p) { int a = p + 1, b = a; b += a; p = b * 2; Console.WriteLine(p); while (a < b) { } } }",
        )
        .unwrap();
        assert_eq!(names(&step_uses(&tree, find(&tree, "int a = p + 1, b = a;"), false)), vec!["a", "p"]);
        assert_eq!(names(&step_uses(&tree, find(&tree, "b += a;"), false)), vec!["a", "b"]);
        assert_eq!(names(&step_uses(&tree, find(&tree, "p = b * 2;"), false)), vec!["b"]);
        assert_eq!(names(&step_uses(&tree, find(&tree, "Console.WriteLine(p);"), false)), vec!["p"]);
    }

    #[test]
    fn test_condition_uses_are_optional() {
        let tree = parse("class C { void M(int a, int b) { while (a < b) { a = a + 1; } } }").unwrap();
        let cond = find(&tree, "a < b");
        assert!(is_condition(&tree, cond));
        assert!(step_uses(&tree, cond, false).is_empty());
        assert_eq!(names(&step_uses(&tree, cond, true)), vec!["a", "b"]);
    }

    #[test]
    fn test_for_parts() {
        let tree = parse("class C { void M(int n) { for (int i = n; i < n; i++) { } } }").unwrap();
        assert!(is_condition(&tree, find(&tree, "i < n")));
        assert!(!is_condition(&tree, find(&tree, "i++")));
        assert_eq!(names(&step_uses(&tree, find(&tree, "int i = n"), false)), vec!["n"]);
        assert_eq!(names(&step_uses(&tree, find(&tree, "i++"), false)), vec!["i"]);
    }
}
