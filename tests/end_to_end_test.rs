//! End-to-end runs through the library entry point
//!
//! Test Strategy:
//! - Every written mutant parses, compiles and differs from the source
//! - `--report` writes metrics that agree with the written files
//! - `--dot` writes one graph per method
//! - Configuration files narrow the operator set

use indicatif::ProgressBar;
use mutaflow::output::mutant_file_name;
use mutaflow::{execute, Cli, REPORT_FILE};
use mutaflow_core::{parse, Checker, Compiler};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures/csharp_samples")
        .join(name)
}

fn cli(source: &str, output_dir: &Path) -> Cli {
    Cli {
        source: fixture(source),
        output_dir: output_dir.to_path_buf(),
        verbose: 0,
        quiet: true,
        config: None,
        report: false,
        dot: false,
        print: false,
    }
}

fn written(folder: &Path, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| fs::read_to_string(folder.join(mutant_file_name(i))).unwrap())
        .collect()
}

#[test]
fn test_written_mutants_compile() {
    let out = tempdir().unwrap();
    let original = fs::read_to_string(fixture("Loops.cs")).unwrap();
    let summary = execute(&cli("Loops.cs", out.path()), &ProgressBar::hidden()).unwrap();
    assert!(summary.written > 0);
    assert!(summary.written < summary.candidates);

    let checker = Checker::new();
    for text in written(&summary.output, summary.written) {
        assert_ne!(text, original);
        let tree = parse(&text).unwrap();
        assert!(checker.compile(&tree).is_accepted(), "mutant does not compile:\n{text}");
    }
}

#[test]
fn test_branch_scenario_files() {
    let out = tempdir().unwrap();
    let summary = execute(&cli("Branches.cs", out.path()), &ProgressBar::hidden()).unwrap();
    assert_eq!(summary.candidates, 24);

    let texts = written(&summary.output, summary.written);
    assert!(texts.iter().any(|t| t.contains("if (x != 0 /* Mutation */)")));
    assert!(texts.iter().any(|t| t.contains("{ y-- /* Mutation */; }")));
    assert!(!texts.iter().any(|t| t.contains("x = y < 3")));
}

#[test]
fn test_report_matches_files() {
    let out = tempdir().unwrap();
    let mut args = cli("Loops.cs", out.path());
    args.report = true;
    let summary = execute(&args, &ProgressBar::hidden()).unwrap();

    let json = fs::read_to_string(summary.output.join(REPORT_FILE)).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["mutations"]["candidates"], summary.candidates);
    assert_eq!(report["mutations"]["valid"], summary.written);
    assert_eq!(report["mutants"].as_array().unwrap().len(), summary.written);
    assert!(report["generated_at"].is_string());

    let methods = report["analysis"]["method_metrics"].as_array().unwrap();
    let names: Vec<&str> = methods.iter().map(|m| m["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Counter.Sum", "Counter.Countdown"]);
    assert!(methods.iter().all(|m| m["loops"] == 1));
}

#[test]
fn test_dot_per_method() {
    let out = tempdir().unwrap();
    let mut args = cli("Loops.cs", out.path());
    args.dot = true;
    let summary = execute(&args, &ProgressBar::hidden()).unwrap();

    for name in ["Counter.Sum.dot", "Counter.Countdown.dot"] {
        let dot = fs::read_to_string(summary.output.join(name)).unwrap();
        assert!(dot.starts_with("digraph"), "{name}: {dot}");
        assert!(dot.contains("->"));
    }
}

#[test]
fn test_config_limits_operators() {
    let out = tempdir().unwrap();
    let config = out.path().join("config.json");
    fs::write(
        &config,
        r#"{ "operators": { "binary": false, "unary": false, "identifier": false }, "marker": null }"#,
    )
    .unwrap();
    let mut args = cli("Calc.cs", &out.path().join("mutants"));
    args.config = Some(config);
    let summary = execute(&args, &ProgressBar::hidden()).unwrap();

    // only the two statement deletions are generated, and neither compiles
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.written, 0);
    assert!(summary.output.is_dir());
}
