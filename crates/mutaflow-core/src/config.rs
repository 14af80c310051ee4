//! Generation settings, loadable from JSON

use crate::dataflow::DataflowOptions;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default text of the comment attached to every mutated node.
pub const DEFAULT_MARKER: &str = "Mutation";

/// Which operator families are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorSelection {
    pub binary: bool,
    pub unary: bool,
    pub statement: bool,
    pub identifier: bool,
}

impl OperatorSelection {
    pub fn any(&self) -> bool {
        self.binary || self.unary || self.statement || self.identifier
    }
}

impl Default for OperatorSelection {
    fn default() -> Self {
        Self {
            binary: true,
            unary: true,
            statement: true,
            identifier: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    pub operators: OperatorSelection,
    /// Comment text attached to mutated nodes; `None` disables the marker
    pub marker: Option<String>,
    pub dataflow: DataflowOptions,
    /// Compile candidates on the rayon pool
    pub parallel_validation: bool,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            operators: OperatorSelection::default(),
            marker: Some(DEFAULT_MARKER.to_string()),
            dataflow: DataflowOptions::default(),
            parallel_validation: true,
        }
    }
}

impl MutationConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if let Some(marker) = &self.marker {
            if marker.contains("*/") {
                return Err(ConfigError::InvalidMarker(marker.clone()));
            }
        }
        if !self.operators.any() {
            return Err(ConfigError::NoOperators);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MutaflowError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = MutationConfig::default();
        assert_eq!(config.marker.as_deref(), Some("Mutation"));
        assert!(config.operators.any());
        assert!(!config.dataflow.condition_uses);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: MutationConfig =
            serde_json::from_str(r#"{ "operators": { "identifier": false }, "marker": null }"#).unwrap();
        assert!(config.operators.binary);
        assert!(!config.operators.identifier);
        assert_eq!(config.marker, None);
        assert!(config.parallel_validation);
    }

    #[test]
    fn test_validation() {
        let mut config = MutationConfig {
            marker: Some("bad */ text".into()),
            ..MutationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidMarker("bad */ text".into())));
        config.marker = None;
        config.operators = OperatorSelection {
            binary: false,
            unary: false,
            statement: false,
            identifier: false,
        };
        assert_eq!(config.validate(), Err(ConfigError::NoOperators));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "dataflow": {{ "condition_uses": true }}, "parallel_validation": false }}"#).unwrap();
        let config = MutationConfig::from_file(file.path()).unwrap();
        assert!(config.dataflow.condition_uses);
        assert!(!config.parallel_validation);

        let mut bad = NamedTempFile::new().unwrap();
        write!(bad, r#"{{ "marker": "*/" }}"#).unwrap();
        assert!(matches!(MutationConfig::from_file(bad.path()), Err(MutaflowError::Config(_))));
    }
}
