// Build config.json from the Metric tool exports
//
// Usage: cargo run --bin build_config [pipeline.json]
//
// With no argument the defaults apply: exports in exported_data/, output to
// config.json. The output is regenerated and replaced on every run.

use anyhow::Context;
use metric_config::{pipeline, PipelineConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metric_config=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("Failed to load pipeline configuration: {:?}", path))?,
        None => PipelineConfig::default(),
    };

    tracing::info!("Configuration:");
    tracing::info!("  source_dir: {}", config.source_dir.display());
    tracing::info!("  output_path: {}", config.output_path.display());
    tracing::info!("  expected_habitats: {:?}", config.expected_habitats);

    let summary = pipeline::run(&config)
        .with_context(|| format!("Failed to build {}", config.output_path.display()))?;

    tracing::info!(
        "Done: {} habitats, {} globals, {} rewrites",
        summary.habitats,
        summary.globals,
        summary.report.total()
    );

    Ok(())
}
