use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5000;

/// 1 MiB
pub const DEFAULT_MAX_BODY: usize = 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// JSON list of known locations. Without it every name lookup misses.
    pub locations: Option<PathBuf>,
    /// Pipeline configuration. The default pipeline is used without it.
    pub pipeline: Option<PathBuf>,
    /// Largest accepted request body in bytes
    pub max_body: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            locations: None,
            pipeline: None,
            max_body: DEFAULT_MAX_BODY,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the `GEOEXTRACT_*` variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            port: parse(&lookup, "GEOEXTRACT_PORT")?.unwrap_or(defaults.port),
            locations: lookup("GEOEXTRACT_LOCATIONS").map(PathBuf::from),
            pipeline: lookup("GEOEXTRACT_CONFIG").map(PathBuf::from),
            max_body: parse(&lookup, "GEOEXTRACT_MAX_BODY")?.unwrap_or(defaults.max_body),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .with_context(|| format!("invalid {key}: {value:?}"))
        })
        .transpose()
}
