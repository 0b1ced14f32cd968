#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::option_if_let_else)]

pub mod config;
pub mod consolidate;
pub mod directory;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod postprocess;
pub mod segment;
pub mod span;
pub mod validate;

pub use config::{PipelineConfig, StageConfig};
pub use consolidate::{consolidate, prune_subsumed, remove_duplicates};
pub use directory::{Gazetteer, Location, LocationDirectory, TargetNames, NAME_FIELD};
pub use error::{Error, Result};
pub use extract::{
    Candidate, Extractor, ExtractorKind, Fields, NameExtractor, NameNumberMatcher,
    PatternExtractor, PatternWindowMatcher, WindowExtractor, WindowMatcher,
};
pub use normalize::{BasicNormalizer, Normalizer, Rule};
pub use pipeline::{LocationRecord, Pipeline, PipelineBuilder, Stage};
pub use postprocess::{KeyFilterPostprocessor, Postprocessor};
pub use segment::{Component, Margin, Segmenter, Splitter};
pub use span::Span;
pub use validate::{NameValidator, Validator};
