//! Pipeline Errors
//!
//! Every failure is fatal: the run aborts and no output file is kept.

use std::io;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Error type for source loading, generation, normalization and output.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source specification is missing a field or uses an unknown label
    #[error("specification error in {origin}: {details}")]
    Specification { origin: String, details: String },

    #[error("failed to read source table {path:?}: {source}")]
    SourceTable {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A closed-vocabulary value survived normalization in verbose form
    #[error("value '{label}' of field '{field}' in {location} is not a canonical label")]
    Unnormalized {
        field: &'static str,
        location: String,
        label: String,
    },

    /// Two source labels collapsed onto the same key of one map
    #[error("labels '{first}' and '{second}' of field '{field}' both normalize to '{canonical}'")]
    Collision {
        field: &'static str,
        first: String,
        second: String,
        canonical: String,
    },
}

impl PipelineError {
    pub(crate) fn specification(origin: impl Into<String>, details: impl Into<String>) -> Self {
        PipelineError::Specification {
            origin: origin.into(),
            details: details.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the source data rather than the environment
    pub fn is_specification_error(&self) -> bool {
        matches!(self, PipelineError::Specification { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
