//! Integration tests for mutant generation and validation
//!
//! Test Strategy:
//! - Operator mutation completeness on a single `+`
//! - Statement deletion touches nothing but the deleted statement
//! - Validation drops mutants referencing undeclared names
//! - Kept mutants survive render -> parse -> compile
//! - The `if`/`else` with increments scenario, end to end

use mutaflow_core::{
    parse, Checker, Compiler, MutaflowPipeline, Mutant, MutationConfig, MutationGenerator, MutationOperator,
    OperatorSelection,
};

fn only(operators: OperatorSelection) -> MutationConfig {
    MutationConfig {
        operators,
        marker: None,
        ..MutationConfig::default()
    }
}

fn none() -> OperatorSelection {
    OperatorSelection {
        binary: false,
        unary: false,
        statement: false,
        identifier: false,
    }
}

#[test]
fn test_binary_operator_completeness() {
    let source = "class C { int M(int a, int b) { return a + b; } }";
    let tree = parse(source).unwrap();
    let config = only(OperatorSelection {
        binary: true,
        ..none()
    });
    let mutants = MutationGenerator::from_config(&config).generate(&tree).unwrap();
    assert_eq!(mutants.len(), 9);

    let mut operators: Vec<String> = Vec::new();
    for mutant in &mutants {
        let text = mutant.render();
        // only the operator token differs
        let prefix = "class C { int M(int a, int b) { return a ";
        let suffix = " b; } }";
        assert!(text.starts_with(prefix) && text.ends_with(suffix), "{text}");
        operators.push(text[prefix.len()..text.len() - suffix.len()].to_string());
    }
    operators.sort();
    assert_eq!(operators, vec!["!=", "*", "-", "/", "<", "<=", "==", ">", ">="]);
}

#[test]
fn test_statement_deletion_preserves_everything_else() {
    let source = "class C {\n    void M(int a) {\n        a = 1; // first\n        a = 2;\n        Console.WriteLine(a);\n    }\n}\n";
    let tree = parse(source).unwrap();
    let config = only(OperatorSelection {
        statement: true,
        ..none()
    });
    let mutants = MutationGenerator::from_config(&config).generate(&tree).unwrap();
    assert_eq!(mutants.len(), 3);
    assert_eq!(
        mutants[1].render(),
        "class C {\n    void M(int a) {\n        a = 1; // first\n        ;\n        Console.WriteLine(a);\n    }\n}\n"
    );
    for mutant in &mutants {
        let span = tree.span(mutant.target());
        let text = mutant.render();
        assert_eq!(&text[..span.start], &source[..span.start]);
        assert!(text.ends_with(&source[span.end..]));
    }
}

#[test]
fn test_markers_follow_the_replacement() {
    let source = "class C { void M(int a) { a = a + 1; } }";
    let tree = parse(source).unwrap();
    let mutants = MutationGenerator::new().generate(&tree).unwrap();
    let deletion = mutants
        .iter()
        .find(|m| m.operator() == MutationOperator::StatementDeletion)
        .unwrap();
    assert_eq!(deletion.render(), "class C { void M(int a) { ; /* Mutation */ } }");
    let binary = mutants
        .iter()
        .find(|m| m.operator() == MutationOperator::BinaryOperator)
        .unwrap();
    assert_eq!(binary.render(), "class C { void M(int a) { a = a - 1 /* Mutation */; } }");
}

#[test]
fn test_validator_drops_undeclared_references() {
    let source = "class C { void M() { int x = 0; int y = x; Console.WriteLine(y); } }";
    let run = MutaflowPipeline::new().run(source).unwrap();
    for mutant in &run.mutants {
        // deleting a declaration that is read later never survives
        let text = mutant.render();
        assert!(text.contains("int y"), "{text}");
    }
    assert!(run.rejected() > 0);
}

#[test]
fn test_kept_mutants_survive_reparse_and_compile() {
    let source = "class C {
    static int Sum(int n) {
        int total = 0;
        for (int i = 0; i < n; i++) {
            if (i % 2 == 0) { total += i; } else { total = total - 1; }
        }
        return total;
    }
    static void Main() {
        int k = 10;
        while (k > 0) { k--; }
        Console.WriteLine(Sum(k));
    }
}";
    let run = MutaflowPipeline::new().run(source).unwrap();
    assert!(!run.mutants.is_empty());
    let checker = Checker::new();
    for mutant in &run.mutants {
        let text = mutant.render();
        let reparsed = parse(&text).unwrap_or_else(|e| panic!("{e}\n{text}"));
        assert_eq!(&reparsed, mutant.tree(), "{text}");
        assert!(checker.compile(&reparsed).is_accepted(), "{text}");
    }
}

#[test]
fn test_end_to_end_scenario() {
    let source = "class C { void M(int x, int y) { if (x == 0) { y++; } else { --y; } x = y - 3; } }";
    let run = MutaflowPipeline::new().run(source).unwrap();
    assert_eq!(run.candidates, 24);

    let texts: Vec<String> = run.mutants.iter().map(Mutant::render).collect();
    let kept = |needle: &str| texts.iter().any(|t| t.contains(needle));

    // comparisons stay boolean, arithmetic in the condition does not compile
    assert!(kept("if (x != 0 /* Mutation */)"));
    assert!(kept("if (x >= 0 /* Mutation */)"));
    assert!(!kept("if (x + 0"));
    // arithmetic stays int, comparisons assigned to an int do not compile
    assert!(kept("x = y + 3 /* Mutation */;"));
    assert!(!kept("x = y < 3"));
    // both increments flip
    assert!(kept("{ y-- /* Mutation */; }"));
    assert!(kept("{ ++y /* Mutation */; }"));
    // each statement can be deleted
    let deletions = run
        .mutants
        .iter()
        .filter(|m| m.operator() == MutationOperator::StatementDeletion)
        .count();
    assert_eq!(deletions, 4);
    // every mutant names its method and position
    assert!(run.mutants.iter().all(|m| m.method() == Some("M") && m.line() == 1));
}
