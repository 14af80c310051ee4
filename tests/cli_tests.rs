//! Command-line behavior of the `mutaflow` binary
//!
//! Test Strategy:
//! - Argument validation: missing arguments, wrong extension
//! - Exit status and messages for rejected sources
//! - Output folder layout for a successful run
//! - `--print` and `--quiet`

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures/csharp_samples")
        .join(name)
}

fn mutaflow() -> Command {
    let mut cmd = Command::cargo_bin("mutaflow").unwrap();
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

fn only_output_dir(root: &Path) -> PathBuf {
    let entries: Vec<PathBuf> = fs::read_dir(root).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(entries.len(), 1, "expected one output folder, found {entries:?}");
    entries.into_iter().next().unwrap()
}

#[test]
fn test_requires_two_arguments() {
    mutaflow()
        .arg(fixture("Calc.cs"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("OUTPUT_DIR"));
}

#[test]
fn test_rejects_non_cs_file() {
    let out = tempdir().unwrap();
    let source = out.path().join("Calc.txt");
    fs::copy(fixture("Calc.cs"), &source).unwrap();

    mutaflow()
        .arg(&source)
        .arg(out.path().join("mutants"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Please include a single C# file with file extension .cs",
        ));
    assert!(!out.path().join("mutants").exists());
}

#[test]
fn test_missing_source_file() {
    let out = tempdir().unwrap();
    mutaflow()
        .arg(out.path().join("Nope.cs"))
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nope.cs"));
}

#[test]
fn test_source_with_compile_errors() {
    let out = tempdir().unwrap();
    mutaflow()
        .arg(fixture("Broken.cs"))
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("CS0103"));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_source_with_syntax_errors() {
    let out = tempdir().unwrap();
    mutaflow()
        .arg(fixture("Unparsable.cs"))
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing"));
}

#[test]
fn test_writes_output_folder() {
    let out = tempdir().unwrap();
    mutaflow()
        .arg(fixture("Calc.cs"))
        .arg(out.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("3 of 11 mutants compile"));

    let folder = only_output_dir(out.path());
    let name = folder.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("Output-"));
    assert_eq!(name.len(), "Output-".len() + 14);

    let mut files: Vec<String> = fs::read_dir(&folder)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    files.sort();
    assert_eq!(files, vec!["Mutant0.cs", "Mutant1.cs", "Mutant2.cs"]);
    let first = fs::read_to_string(folder.join("Mutant0.cs")).unwrap();
    assert!(first.contains("/* Mutation */"));
}

#[test]
fn test_print_flag() {
    let out = tempdir().unwrap();
    mutaflow()
        .args(["--print", "--quiet"])
        .arg(fixture("Calc.cs"))
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("// Mutant0.cs"))
        .stdout(predicate::str::contains("x - 1 /* Mutation */"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_invalid_config() {
    let out = tempdir().unwrap();
    let config = out.path().join("config.json");
    fs::write(&config, r#"{ "marker": "bad */ marker" }"#).unwrap();
    mutaflow()
        .arg("--config")
        .arg(&config)
        .arg(fixture("Calc.cs"))
        .arg(out.path().join("mutants"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}
