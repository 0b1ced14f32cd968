//! JSON description of a pipeline.
//!
//! ```json
//! {
//!   "splitter": {"margin": [2, 1]},
//!   "normalizer": {"fold_diacritics": true, "substitutions": [["str\\b", "strasse"]]},
//!   "extractors": [
//!     {"kind": "name"},
//!     {"kind": "window", "blocks": {"street": "[^\\W\\d_]+"}, "patterns": ["{street} (?P<house_number>\\d+)"]}
//!   ],
//!   "validator": "disabled",
//!   "keep_fields": ["name", "street", "house_number"]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::directory::{LocationDirectory, NAME_FIELD};
use crate::error::Result;
use crate::extract::{
    expand_blocks, Extractor, NameExtractor, NameNumberMatcher, PatternExtractor,
    PatternWindowMatcher, WindowExtractor,
};
use crate::normalize::{BasicNormalizer, Rule};
use crate::pipeline::{Pipeline, Stage};
use crate::postprocess::KeyFilterPostprocessor;
use crate::segment::{Margin, Segmenter};
use crate::validate::NameValidator;

/// The literal `"disabled"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disabled {
    Disabled,
}

/// Either `"disabled"` or the stage's options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageConfig<T> {
    Off(Disabled),
    On(T),
}

impl<T: Default> Default for StageConfig<T> {
    fn default() -> Self {
        Self::On(T::default())
    }
}

impl<T> StageConfig<T> {
    fn into_stage<U>(self, build: impl FnOnce(T) -> Result<U>) -> Result<Stage<U>> {
        match self {
            Self::Off(Disabled::Disabled) => Ok(Stage::Disabled),
            Self::On(config) => Ok(Stage::Enabled(build(config)?)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitterConfig {
    pub margin: Margin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizerConfig {
    pub fold_diacritics: bool,
    pub rejoin_lines: bool,
    pub remove_hyphens: bool,
    pub remove_specials: bool,
    pub collapse_whitespace: bool,
    /// `[pattern, replacement]` pairs applied after the preset rules.
    pub substitutions: Vec<(String, String)>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fold_diacritics: false,
            rejoin_lines: true,
            remove_hyphens: true,
            remove_specials: true,
            collapse_whitespace: true,
            substitutions: Vec::new(),
        }
    }
}

impl NormalizerConfig {
    pub fn build(&self) -> Result<BasicNormalizer> {
        let presets = [
            (self.rejoin_lines, Rule::RejoinLines),
            (self.remove_hyphens, Rule::RemoveHyphens),
            (self.remove_specials, Rule::RemoveSpecials),
            (self.collapse_whitespace, Rule::CollapseWhitespace),
        ];
        let mut rules: Vec<Rule> = presets
            .into_iter()
            .filter_map(|(enabled, rule)| enabled.then_some(rule))
            .collect();
        for (pattern, replacement) in &self.substitutions {
            rules.push(Rule::substitute(pattern, replacement.as_str())?);
        }
        Ok(BasicNormalizer::new(rules).with_fold_diacritics(self.fold_diacritics))
    }
}

const fn default_min_len() -> usize {
    2
}

const fn default_max_len() -> usize {
    7
}

fn default_name_field() -> String {
    NAME_FIELD.to_string()
}

fn default_number_field() -> String {
    "house_number".to_string()
}

fn default_number_pattern() -> String {
    r"[1-9]\d*[a-z]?".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ExtractorConfig {
    Name {
        #[serde(default = "default_name_field")]
        field: String,
    },
    Pattern {
        patterns: Vec<String>,
        #[serde(default)]
        blocks: BTreeMap<String, String>,
        #[serde(default)]
        anchored: bool,
    },
    Window {
        patterns: Vec<String>,
        #[serde(default)]
        blocks: BTreeMap<String, String>,
        #[serde(default = "default_anchored")]
        anchored: bool,
        #[serde(default = "default_min_len")]
        min_len: usize,
        #[serde(default = "default_max_len")]
        max_len: usize,
    },
    NameNumber {
        field: String,
        #[serde(default = "default_number_field")]
        number_field: String,
        #[serde(default = "default_number_pattern")]
        number_pattern: String,
        #[serde(default = "default_min_len")]
        min_len: usize,
        #[serde(default = "default_max_len")]
        max_len: usize,
    },
}

const fn default_anchored() -> bool {
    true
}

fn expand(patterns: &[String], blocks: &BTreeMap<String, String>, anchored: bool) -> Vec<String> {
    patterns
        .iter()
        .map(|pattern| expand_blocks(pattern, blocks, anchored))
        .collect()
}

impl ExtractorConfig {
    pub fn build(&self) -> Result<Box<dyn Extractor>> {
        Ok(match self {
            Self::Name { field } => Box::new(NameExtractor::new(field.as_str())),
            Self::Pattern {
                patterns,
                blocks,
                anchored,
            } => Box::new(PatternExtractor::new(expand(patterns, blocks, *anchored))?),
            Self::Window {
                patterns,
                blocks,
                anchored,
                min_len,
                max_len,
            } => {
                let matcher = PatternWindowMatcher::new(expand(patterns, blocks, *anchored))?;
                Box::new(WindowExtractor::new(matcher, *min_len, *max_len)?)
            }
            Self::NameNumber {
                field,
                number_field,
                number_pattern,
                min_len,
                max_len,
            } => {
                let matcher =
                    NameNumberMatcher::new(field.as_str(), number_field.as_str(), number_pattern)?;
                Box::new(WindowExtractor::new(matcher, *min_len, *max_len)?)
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    pub fields: Vec<String>,
    pub trusted: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            fields: vec!["street".to_string(), "city".to_string()],
            trusted: vec![NAME_FIELD.to_string()],
        }
    }
}

impl ValidatorConfig {
    #[must_use]
    pub fn build(&self) -> NameValidator {
        NameValidator::new(self.fields.iter().cloned()).with_trusted(self.trusted.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub splitter: StageConfig<SplitterConfig>,
    pub normalizer: StageConfig<NormalizerConfig>,
    pub extractors: Vec<ExtractorConfig>,
    pub validator: StageConfig<ValidatorConfig>,
    pub keep_fields: Option<Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            splitter: StageConfig::default(),
            normalizer: StageConfig::default(),
            extractors: vec![ExtractorConfig::Name {
                field: default_name_field(),
            }],
            validator: StageConfig::default(),
            keep_fields: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Compiles every stage and resolves `directory` into target names.
    pub fn build(&self, directory: Arc<dyn LocationDirectory>) -> Result<Pipeline> {
        let splitter = self
            .splitter
            .clone()
            .into_stage(|config| Ok(Segmenter::new(config.margin)))?;
        let normalizer = self.normalizer.clone().into_stage(|config| config.build())?;
        let validator = self
            .validator
            .clone()
            .into_stage(|config| Ok(config.build()))?;

        let mut builder = Pipeline::builder()
            .splitter(splitter)
            .normalizer(normalizer)
            .validator(validator);
        for extractor in &self.extractors {
            builder = builder.boxed_extractor(extractor.build()?);
        }
        if let Some(fields) = &self.keep_fields {
            builder = builder.postprocessor(KeyFilterPostprocessor::new(fields.iter().cloned()));
        }

        builder.build(directory)
    }
}
