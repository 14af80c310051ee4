//! Reaching definitions
//!
//! A forward may-analysis: `IN[n]` is the union of the predecessors' `OUT`,
//! and `OUT[n] = (IN[n] - defs of names n defines) ∪ gen(n)`.

use super::cfg::Cfg;
use super::lattice::{Definition, FactSet};
use super::solver::{DataflowAnalysis, DataflowDirection};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};
use fnv::FnvHashMap;

/// Definitions generated by a CFG step.
///
/// The first assignment in the step's subtree wins (compound assignments
/// included). Otherwise a local declaration, or a `for` initializer
/// declaration, defines each of its declarators.
pub fn generated_definitions(tree: &SyntaxTree, step: NodeId) -> FactSet<Definition> {
    let mut gen = FactSet::new();
    if let Some(assignment) = first_assignment(tree, step) {
        if let Some(name) = assignment_target(tree, assignment) {
            gen.insert(Definition::new(assignment, name));
        }
        return gen;
    }

    let declaration = match tree.kind(step) {
        NodeKind::LocalDeclaration => tree.children(step).first().copied(),
        NodeKind::VariableDeclaration { .. } => Some(step),
        _ => None,
    };
    if let Some(declaration) = declaration {
        for name in declarator_names(tree, declaration) {
            gen.insert(Definition::new(step, name));
        }
    }
    gen
}

pub(crate) fn first_assignment(tree: &SyntaxTree, step: NodeId) -> Option<NodeId> {
    tree.descendants(step)
        .find(|&id| matches!(tree.kind(id), NodeKind::Assignment { .. }))
}

/// Variable written by an assignment, looking through parentheses.
pub(crate) fn assignment_target(tree: &SyntaxTree, assignment: NodeId) -> Option<&str> {
    let mut target = *tree.children(assignment).first()?;
    while tree.kind(target) == &NodeKind::Parenthesized {
        target = *tree.children(target).first()?;
    }
    match tree.kind(target) {
        NodeKind::Identifier { name } => Some(name),
        _ => None,
    }
}

pub(crate) fn declarator_names(tree: &SyntaxTree, declaration: NodeId) -> impl Iterator<Item = &str> + '_ {
    tree.children(declaration)
        .iter()
        .filter_map(move |&d| match tree.kind(d) {
            NodeKind::VariableDeclarator { name } => Some(name.as_str()),
            _ => None,
        })
}

/// Forward reaching-definitions analysis over one method's CFG
pub struct ReachingDefinitions {
    gen: FnvHashMap<NodeId, FactSet<Definition>>,
}

impl ReachingDefinitions {
    pub fn new(tree: &SyntaxTree, cfg: &Cfg) -> Self {
        let gen = cfg
            .nodes()
            .map(|node| (node, generated_definitions(tree, node)))
            .collect();
        Self { gen }
    }

    /// Definitions generated at `node` (empty for unknown nodes).
    pub fn generated(&self, node: NodeId) -> Option<&FactSet<Definition>> {
        self.gen.get(&node)
    }
}

impl DataflowAnalysis for ReachingDefinitions {
    type Fact = FactSet<Definition>;

    fn direction(&self) -> DataflowDirection {
        DataflowDirection::Forward
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

    fn transfer(&self, node: NodeId, input: &Self::Fact) -> Self::Fact {
        let mut out = input.clone();
        if let Some(gen) = self.gen.get(&node) {
            out.kill(gen.names());
            out.union_with(gen);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn step(tree: &SyntaxTree, text: &str) -> NodeId {
        tree.preorder()
            .filter(|&id| match tree.kind(id) {
                NodeKind::VariableDeclaration { .. } => true,
                kind => kind.is_statement(),
            })
            .find(|&id| tree.render_node(id) == text)
            .unwrap()
    }

    fn gen_names(tree: &SyntaxTree, text: &str) -> Vec<String> {
        generated_definitions(tree, step(tree, text))
            .into_iter()
            .map(|d| d.name)
            .collect()
    }

    #[test]
    fn test_gen_rules() {
        let tree = parse(
            "class C { void M() { int a = 1, b; a += 2; b = a = 3; Console.WriteLine(a); for (int i = 0, j = 1; i < j; i++) { } } }",
        )
        .unwrap();
        assert_eq!(gen_names(&tree, "int a = 1, b;"), vec!["a", "b"]);
        assert_eq!(gen_names(&tree, "a += 2;"), vec!["a"]);
        // first assignment in preorder is the outer one
        assert_eq!(gen_names(&tree, "b = a = 3;"), vec!["b"]);
        assert!(gen_names(&tree, "Console.WriteLine(a);").is_empty());
        assert_eq!(gen_names(&tree, "int i = 0, j = 1"), vec!["i", "j"]);
    }

    #[test]
    fn test_declaration_sites_are_the_statement() {
        let tree = parse("class C { void M() { int a = 1; } }").unwrap();
        let decl = step(&tree, "int a = 1;");
        let gen = generated_definitions(&tree, decl);
        assert!(gen.contains(&Definition::new(decl, "a")));
    }
}
