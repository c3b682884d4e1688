//! Metric Reference Table Builder
//!
//! Produces `config.json`, the lookup table of habitat categories and scoring
//! constants used by the biodiversity-scoring calculator, from the tables
//! exported out of the Biodiversity Metric 3.0 calculation tool.
//!
//! Structure:
//! - `data`: Loading the TSV exports (Polars) and `globals.json`
//! - `generator`: Raw table in the methodology's own wording, validated
//! - `normalizer/`: Ordered rewrite rules → canonical keys and labels
//! - `pipeline`: Load, generate, normalize, write atomically
//! - `utils/`: Habitat description splitting and JSON output

pub mod config;
pub mod data;
pub mod error;
pub mod generator;
pub mod normalizer;
pub mod pipeline;
pub mod table;
pub mod utils;
pub mod vocabulary;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use data::SourceSpec;
pub use error::{PipelineError, Result};
pub use generator::{generate, GeneratorOptions};
pub use normalizer::{normalize, NormalizationReport, RuleSet};
pub use pipeline::{run, PipelineSummary};
pub use table::{Cell, Global, NormalizedTable, RawTable};
pub use vocabulary::Field;
