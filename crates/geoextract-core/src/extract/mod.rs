mod name;
mod pattern;
mod window;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::directory::TargetNames;
use crate::error::Result;
use crate::segment::Component;
use crate::span::Span;

pub use name::NameExtractor;
pub use pattern::{expand_blocks, PatternExtractor};
pub use window::{
    tokenize, NameNumberMatcher, PatternWindowMatcher, Token, Window, WindowExtractor,
    WindowMatcher,
};

/// Field name to extracted value. Ordered so equal mappings compare and hash equal.
pub type Fields = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    Name,
    Pattern,
    Window,
    Custom,
}

impl ExtractorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Pattern => "pattern",
            Self::Window => "window",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location fragment found in a document, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub fields: Fields,
    pub span: Span,
    pub source: ExtractorKind,
}

impl Candidate {
    #[must_use]
    pub const fn new(fields: Fields, span: Span, source: ExtractorKind) -> Self {
        Self {
            fields,
            span,
            source,
        }
    }

    /// Candidate with a single field.
    #[must_use]
    pub fn single(
        field: impl Into<String>,
        value: impl Into<String>,
        span: Span,
        source: ExtractorKind,
    ) -> Self {
        let mut fields = Fields::new();
        fields.insert(field.into(), value.into());
        Self::new(fields, span, source)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn with_fields(&self, fields: Fields) -> Self {
        Self {
            fields,
            span: self.span,
            source: self.source,
        }
    }
}

/// Finds candidate locations in a segmented document.
pub trait Extractor: Send + Sync {
    fn kind(&self) -> ExtractorKind;

    /// Fields whose target names this extractor needs.
    fn target_fields(&self) -> Vec<String> {
        Vec::new()
    }

    /// Receives the target names once, while the pipeline is built.
    fn set_target_names(&mut self, _names: &TargetNames) -> Result<()> {
        Ok(())
    }

    fn extract(&self, components: &[Component]) -> Vec<Candidate>;

    fn extract_text(&self, text: &str) -> Vec<Candidate> {
        self.extract(&[Component::whole(text)])
    }
}

/// Collects the named groups of a regex match that took part in it.
pub(crate) fn named_groups(regex: &regex::Regex, captures: &regex::Captures<'_>) -> Fields {
    regex
        .capture_names()
        .flatten()
        .filter_map(|name| {
            captures
                .name(name)
                .map(|m| (name.to_string(), m.as_str().to_string()))
        })
        .collect()
}

/// Character index of every byte offset that starts a char, for mapping
/// regex and automaton matches back to character positions.
pub(crate) struct CharIndex {
    starts: Vec<usize>,
    len: usize,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            starts: text.char_indices().map(|(i, _)| i).collect(),
            len: text.len(),
        }
    }

    /// Character position of byte offset `byte`, which must be a char boundary.
    pub(crate) fn of(&self, byte: usize) -> usize {
        if byte >= self.len {
            return self.starts.len();
        }
        self.starts.partition_point(|&start| start < byte)
    }
}
