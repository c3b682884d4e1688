//! Build Pipeline
//!
//! Load → generate → normalize → verify → write. Linear, single pass,
//! all-or-nothing: the output file is only replaced once every step has
//! succeeded.

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::config::PipelineConfig;
use crate::data::SourceSpec;
use crate::error::Result;
use crate::generator::generate;
use crate::normalizer::{normalize, NormalizationReport, RuleSet};
use crate::utils::write_json;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub output_path: PathBuf,
    pub raw_output: Option<PathBuf>,
    pub habitats: usize,
    pub globals: usize,
    pub report: NormalizationReport,
}

/// Run the pipeline with the standard rule list
pub fn run(config: &PipelineConfig) -> Result<PipelineSummary> {
    run_with_rules(config, &RuleSet::standard())
}

pub fn run_with_rules(config: &PipelineConfig, rules: &RuleSet) -> Result<PipelineSummary> {
    let start = Instant::now();

    let spec = SourceSpec::load(&config.source_dir)?;
    let raw = generate(&spec, rules, &config.generator_options())?;

    let (table, report) = normalize(&raw, rules)?;

    // Raw dump only once normalization succeeded
    if let Some(raw_path) = &config.raw_output {
        write_json(raw_path, &raw.to_json_value())?;
        info!("Wrote raw table to {}", raw_path.display());
    }

    write_json(&config.output_path, &table)?;

    info!(
        "Wrote {} ({} habitats) in {:?}",
        config.output_path.display(),
        table.habitats.len(),
        start.elapsed()
    );

    Ok(PipelineSummary {
        output_path: config.output_path.clone(),
        raw_output: config.raw_output.clone(),
        habitats: table.habitats.len(),
        globals: table.globals.len(),
        report,
    })
}
