use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("Invalid window widths: {min}..={max} (widths start at 1)")]
    InvalidWindow { min: usize, max: usize },

    #[error("Invalid segmentation margin ({horizontal}, {vertical}): both must be at least 1")]
    InvalidMargin { horizontal: usize, vertical: usize },

    #[error("Name index could not be built: {0}")]
    NameIndex(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_pattern(pattern: &str, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Compiles a regular expression, reporting failures as configuration errors.
pub(crate) fn compile(pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e))
}
