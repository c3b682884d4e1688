//! Pipeline Configuration
//!
//! Defaults reproduce the build as run from the repository root: exports in
//! `exported_data/`, output to `config.json`, 128 habitats expected. A JSON
//! file may override any of them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::generator::{GeneratorOptions, METRIC_HABITAT_COUNT};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the TSV exports and `globals.json`
    pub source_dir: PathBuf,

    /// Normalized table, replaced on every run
    pub output_path: PathBuf,

    /// Optional dump of the raw table (methodology wording) for inspection
    pub raw_output: Option<PathBuf>,

    /// `null` disables the habitat count check
    pub expected_habitats: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            source_dir: PathBuf::from("exported_data"),
            output_path: PathBuf::from("config.json"),
            raw_output: None,
            expected_habitats: Some(METRIC_HABITAT_COUNT),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;

        serde_json::from_str(&contents).map_err(|source| PipelineError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            expected_habitats: self.expected_habitats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.source_dir, PathBuf::from("exported_data"));
        assert_eq!(config.output_path, PathBuf::from("config.json"));
        assert_eq!(config.raw_output, None);
        assert_eq!(config.generator_options(), GeneratorOptions::default());
    }

    #[test]
    fn test_partial_override() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"output_path": "build/config.json", "expected_habitats": null}"#)
                .unwrap();

        assert_eq!(config.source_dir, PathBuf::from("exported_data"));
        assert_eq!(config.output_path, PathBuf::from("build/config.json"));
        assert_eq!(config.expected_habitats, None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{"raw_output": "raw.json"}"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.raw_output, Some(PathBuf::from("raw.json")));
        assert_eq!(config.expected_habitats, Some(128));

        fs::write(&path, "{").unwrap();
        assert!(matches!(PipelineConfig::load(&path), Err(PipelineError::Json { .. })));
    }
}
