pub mod extract;
pub mod names;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geoextract_core::{Gazetteer, Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(
    name = "geoextract",
    about = "Extract locations from free-form text",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the locations found in a document as JSON
    Extract {
        /// Input file, `-` or nothing for stdin
        input: Option<PathBuf>,
        /// JSON list of known locations
        #[arg(short, long)]
        locations: PathBuf,
        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// List the normalized target names of a field
    Names {
        #[arg(short, long)]
        locations: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Field to list, e.g. `street`
        #[arg(short, long, default_value = geoextract_core::NAME_FIELD)]
        field: String,
    },
}

/// Loads the directory and configuration and builds the pipeline.
pub fn load_pipeline(locations: &Path, config: Option<&Path>) -> Result<Pipeline> {
    let gazetteer = Gazetteer::from_path(locations)
        .with_context(|| format!("failed to load locations from {}", locations.display()))?;
    let config = match config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    tracing::debug!(locations = gazetteer.len(), "Loaded locations");
    config
        .build(Arc::new(gazetteer))
        .context("invalid pipeline configuration")
}
