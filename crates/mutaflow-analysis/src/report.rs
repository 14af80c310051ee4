//! JSON run report

use crate::metrics::{AnalysisResult, MutationMetrics};
use anyhow::{Context, Result};
use mutaflow_core::{Mutant, MutationOperator};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One surviving mutant as listed in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutantEntry {
    /// Position in enumeration order, which is also the file number
    pub index: usize,
    pub operator: MutationOperator,
    pub method: Option<String>,
    pub line: usize,
    pub column: usize,
    pub description: String,
}

impl MutantEntry {
    pub fn new(index: usize, mutant: &Mutant) -> Self {
        Self {
            index,
            operator: mutant.operator(),
            method: mutant.method().map(str::to_string),
            line: mutant.line(),
            column: mutant.column(),
            description: mutant.description().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationReport {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub analysis: AnalysisResult,
    pub mutations: MutationMetrics,
    pub mutants: Vec<MutantEntry>,
}

impl MutationReport {
    pub fn new(source: impl Into<String>, analysis: AnalysisResult, mutations: MutationMetrics, survivors: &[Mutant]) -> Self {
        Self {
            source: source.into(),
            generated_at: None,
            analysis,
            mutations,
            mutants: survivors
                .iter()
                .enumerate()
                .map(|(i, m)| MutantEntry::new(i, m))
                .collect(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.generated_at = Some(timestamp.into());
        self
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing mutation report")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).with_context(|| format!("writing report to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Analyzer;
    use mutaflow_core::MutaflowPipeline;

    fn report() -> MutationReport {
        let run = MutaflowPipeline::new()
            .run("class C { int M(int x) { int y = x + 1; return y; } }")
            .unwrap();
        let analysis = Analyzer::new().analyze(&run.original).unwrap();
        let mutations = MutationMetrics::default();
        MutationReport::new("C.cs", analysis, mutations, &run.mutants)
    }

    #[test]
    fn test_entries_follow_survivors() {
        let report = report();
        assert_eq!(report.mutants.len(), 3);
        assert!(report.mutants.iter().enumerate().all(|(i, e)| e.index == i));
        assert!(report.mutants.iter().all(|e| e.method.as_deref() == Some("M")));
    }

    #[test]
    fn test_json_shape() {
        let json = report().with_timestamp("2024-01-01T00:00:00Z").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "C.cs");
        assert_eq!(value["generated_at"], "2024-01-01T00:00:00Z");
        assert_eq!(value["mutants"][0]["operator"], "binary_operator");
        assert_eq!(value["analysis"]["module_metrics"]["total_methods"], 1);
    }

    #[test]
    fn test_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let original = report();
        original.write(&path).unwrap();
        let loaded: MutationReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.mutants, original.mutants);
        assert_eq!(loaded.generated_at, None);
    }
}
