use std::sync::Arc;

use anyhow::Context;
use geoextract_core::{Gazetteer, Pipeline, PipelineConfig};

use crate::config::ServerConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Builds the pipeline described by `config`.
    pub fn load(config: &ServerConfig) -> anyhow::Result<Self> {
        let gazetteer = match &config.locations {
            Some(path) => Gazetteer::from_path(path)
                .with_context(|| format!("failed to load locations from {}", path.display()))?,
            None => {
                tracing::warn!("GEOEXTRACT_LOCATIONS is not set, using an empty directory");
                Gazetteer::default()
            }
        };
        let pipeline_config = match &config.pipeline {
            Some(path) => PipelineConfig::from_path(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        tracing::info!(locations = gazetteer.len(), "Loaded locations");

        let pipeline = pipeline_config
            .build(Arc::new(gazetteer))
            .context("invalid pipeline configuration")?;
        Ok(Self::new(pipeline))
    }
}
