//! Source Specification Loading
//!
//! Reads the tables exported from the Metric calculation tool (tab-separated,
//! one row per habitat) and the hand-maintained `globals.json` of scoring
//! constants. Everything is kept as text exactly as written; interpretation
//! is left to the generator and normalizer.
//!
//! See http://publications.naturalengland.org.uk/publication/6049804846366720

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::vocabulary::Field;

pub const DISTINCTIVENESS_FILE: &str = "distinctiveness.tsv";
pub const CREATION_DIFFICULTY_FILE: &str = "creation_difficulty.tsv";
pub const ENHANCEMENT_DIFFICULTY_FILE: &str = "enhancement_difficulty.tsv";
pub const CREATION_TIME_FILE: &str = "creation_time.tsv";
pub const ENHANCEMENT_TIME_FILE: &str = "enhancement_time.tsv";
pub const GLOBALS_FILE: &str = "globals.json";

/// One exported table, all cells as text
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub path: PathBuf,
    /// Headers in file order
    pub headers: Vec<String>,
    /// Rows in file order; `None` marks an empty cell
    pub rows: Vec<Vec<Option<String>>>,
}

impl SourceTable {
    /// Display name for error messages
    pub fn origin(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Index of the `Habitat Description` column
    pub fn key_index(&self) -> Result<usize> {
        let header = Field::Habitat.source_header();
        self.column_index(header).ok_or_else(|| {
            PipelineError::specification(
                self.origin(),
                format!("missing '{}' column (found {:?})", header, self.headers),
            )
        })
    }
}

/// Everything the generator reads
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub distinctiveness: SourceTable,
    pub creation_difficulty: SourceTable,
    pub enhancement_difficulty: SourceTable,
    pub creation_time: SourceTable,
    pub enhancement_time: SourceTable,
    /// Verbose field name → scores or scalar, as written
    pub globals: Map<String, Value>,
}

impl SourceSpec {
    /// Load all exports from a directory
    pub fn load(dir: &Path) -> Result<Self> {
        info!("Loading source specification from {}", dir.display());

        let spec = SourceSpec {
            distinctiveness: load_table(&dir.join(DISTINCTIVENESS_FILE))?,
            creation_difficulty: load_table(&dir.join(CREATION_DIFFICULTY_FILE))?,
            enhancement_difficulty: load_table(&dir.join(ENHANCEMENT_DIFFICULTY_FILE))?,
            creation_time: load_table(&dir.join(CREATION_TIME_FILE))?,
            enhancement_time: load_table(&dir.join(ENHANCEMENT_TIME_FILE))?,
            globals: load_globals(&dir.join(GLOBALS_FILE))?,
        };

        info!("  Distinctiveness: {}", spec.distinctiveness.rows.len());
        info!("  Creation difficulty: {}", spec.creation_difficulty.rows.len());
        info!("  Enhancement difficulty: {}", spec.enhancement_difficulty.rows.len());
        info!("  Creation time: {}", spec.creation_time.rows.len());
        info!("  Enhancement time: {}", spec.enhancement_time.rows.len());
        info!("  Globals: {}", spec.globals.len());

        Ok(spec)
    }
}

/// Load a tab-separated export with every column read as text
pub fn load_table(path: &Path) -> Result<SourceTable> {
    if !path.is_file() {
        return Err(PipelineError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "source table not found"),
        ));
    }

    let parse_options = CsvParseOptions::default().with_separator(b'\t');

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.into()))
        .and_then(|reader| reader.finish())
        .map_err(|source| PipelineError::SourceTable {
            path: path.to_path_buf(),
            source,
        })?;

    let headers: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = vec![Vec::with_capacity(headers.len()); df.height()];

    for header in &headers {
        let values = df
            .column(header)
            .and_then(|column| column.str())
            .map_err(|source| PipelineError::SourceTable {
                path: path.to_path_buf(),
                source,
            })?;

        for (idx, row) in rows.iter_mut().enumerate() {
            let value = values
                .get(idx)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string());
            row.push(value);
        }
    }

    debug!(
        "Loaded {}: {} rows × {} columns",
        path.display(),
        df.height(),
        headers.len()
    );

    Ok(SourceTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

/// Load `globals.json`: a single JSON object
pub fn load_globals(path: &Path) -> Result<Map<String, Value>> {
    let contents = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;

    serde_json::from_str(&contents).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}
