//! The extraction pipeline.
//!
//! Stages run in a fixed order: split, normalize, extract, denormalize and
//! augment, validate, consolidate, postprocess. Splitting, normalization and
//! validation are optional; a [`Stage::Disabled`] slot is the identity.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::consolidate::consolidate;
use crate::directory::{LocationDirectory, TargetNames, NAME_FIELD};
use crate::error::Result;
use crate::extract::{Candidate, Extractor, Fields};
use crate::normalize::{BasicNormalizer, Normalizer};
use crate::postprocess::Postprocessor;
use crate::segment::{Component, Segmenter, Splitter};
use crate::span::Span;
use crate::validate::{NameValidator, Validator};

/// An optional pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage<T> {
    Enabled(T),
    Disabled,
}

impl<T> Stage<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Stage<U> {
        match self {
            Self::Enabled(stage) => Stage::Enabled(f(stage)),
            Self::Disabled => Stage::Disabled,
        }
    }
}

/// A location found in a document: the surviving fields of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationRecord {
    #[serde(flatten)]
    pub fields: Fields,
    #[serde(skip)]
    pub span: Span,
}

impl LocationRecord {
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

impl From<Candidate> for LocationRecord {
    fn from(candidate: Candidate) -> Self {
        Self {
            fields: candidate.fields,
            span: candidate.span,
        }
    }
}

pub struct PipelineBuilder {
    splitter: Stage<Box<dyn Splitter>>,
    normalizer: Stage<Box<dyn Normalizer>>,
    extractors: Vec<Box<dyn Extractor>>,
    validator: Stage<Box<dyn Validator>>,
    postprocessors: Vec<Box<dyn Postprocessor>>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            splitter: Stage::Enabled(Box::new(Segmenter::default())),
            normalizer: Stage::Enabled(Box::new(BasicNormalizer::standard())),
            extractors: Vec::new(),
            validator: Stage::Enabled(Box::new(NameValidator::default())),
            postprocessors: Vec::new(),
        }
    }
}

impl PipelineBuilder {
    #[must_use]
    pub fn splitter<S: Splitter + 'static>(mut self, splitter: Stage<S>) -> Self {
        self.splitter = splitter.map(|s| Box::new(s) as Box<dyn Splitter>);
        self
    }

    #[must_use]
    pub fn normalizer<N: Normalizer + 'static>(mut self, normalizer: Stage<N>) -> Self {
        self.normalizer = normalizer.map(|n| Box::new(n) as Box<dyn Normalizer>);
        self
    }

    #[must_use]
    pub fn validator<V: Validator + 'static>(mut self, validator: Stage<V>) -> Self {
        self.validator = validator.map(|v| Box::new(v) as Box<dyn Validator>);
        self
    }

    /// Appends an extractor. Extractor output is concatenated in
    /// registration order.
    #[must_use]
    pub fn extractor<E: Extractor + 'static>(self, extractor: E) -> Self {
        self.boxed_extractor(Box::new(extractor))
    }

    #[must_use]
    pub fn boxed_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    #[must_use]
    pub fn postprocessor<P: Postprocessor + 'static>(mut self, postprocessor: P) -> Self {
        self.postprocessors.push(Box::new(postprocessor));
        self
    }

    /// Resolves the directory's names into [`TargetNames`] and hands them to
    /// every extractor.
    pub fn build(self, directory: Arc<dyn LocationDirectory>) -> Result<Pipeline> {
        let Self {
            splitter,
            normalizer,
            mut extractors,
            validator,
            postprocessors,
        } = self;

        let mut fields: BTreeSet<String> = directory.fields().into_iter().collect();
        for extractor in &extractors {
            fields.extend(extractor.target_fields());
        }

        let mut names = TargetNames::new();
        for field in &fields {
            for name in directory.names(field) {
                names.insert(field, normalize(&normalizer, &name), &name);
            }
        }

        for extractor in &mut extractors {
            extractor.set_target_names(&names)?;
        }

        info!(
            extractors = extractors.len(),
            names = ?fields.iter().map(|f| (f.as_str(), names.len(f))).collect::<Vec<_>>(),
            "Pipeline built"
        );

        Ok(Pipeline {
            directory,
            splitter,
            normalizer,
            extractors,
            validator,
            postprocessors,
            names,
        })
    }
}

fn normalize(normalizer: &Stage<Box<dyn Normalizer>>, text: &str) -> String {
    match normalizer {
        Stage::Enabled(normalizer) => normalizer.normalize(text),
        Stage::Disabled => text.to_string(),
    }
}

/// A fully configured extraction pipeline.
///
/// Immutable once built, so a single instance can serve concurrent calls to
/// [`Pipeline::extract`]. Rebuild it when the directory changes.
pub struct Pipeline {
    directory: Arc<dyn LocationDirectory>,
    splitter: Stage<Box<dyn Splitter>>,
    normalizer: Stage<Box<dyn Normalizer>>,
    extractors: Vec<Box<dyn Extractor>>,
    validator: Stage<Box<dyn Validator>>,
    postprocessors: Vec<Box<dyn Postprocessor>>,
    names: TargetNames,
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    #[must_use]
    pub const fn target_names(&self) -> &TargetNames {
        &self.names
    }

    pub fn extract(&self, text: &str) -> Vec<LocationRecord> {
        let components = self.components(text);
        debug!(components = components.len(), "Split document");

        let candidates: Vec<Candidate> = self
            .extractors
            .iter()
            .flat_map(|extractor| extractor.extract(&components))
            .map(|candidate| self.augment(candidate))
            .collect();
        debug!(candidates = candidates.len(), "Extracted candidates");

        let validated: Vec<Candidate> = match &self.validator {
            Stage::Enabled(validator) => candidates
                .into_iter()
                .filter(|candidate| {
                    let valid = validator.validate(candidate, self.directory.as_ref());
                    if !valid {
                        trace!(span = %candidate.span, fields = ?candidate.fields, "Invalid");
                    }
                    valid
                })
                .collect(),
            Stage::Disabled => candidates,
        };
        debug!(validated = validated.len(), "Validated candidates");

        let consolidated = consolidate(validated);
        debug!(consolidated = consolidated.len(), "Consolidated candidates");

        consolidated
            .into_iter()
            .filter_map(|candidate| {
                self.postprocessors
                    .iter()
                    .try_fold(candidate, |candidate, p| p.postprocess(candidate))
            })
            .map(LocationRecord::from)
            .collect()
    }

    fn components(&self, text: &str) -> Vec<Component> {
        let components = match &self.splitter {
            Stage::Enabled(splitter) => splitter.split(text),
            Stage::Disabled => vec![Component::whole(text)],
        };
        match &self.normalizer {
            Stage::Enabled(normalizer) => components
                .iter()
                .map(|component| component.with_text(normalizer.normalize(component.text())))
                .collect(),
            Stage::Disabled => components,
        }
    }

    /// Maps normalized values back to their canonical spelling and adds the
    /// attributes of the named location. Existing fields are kept.
    fn augment(&self, candidate: Candidate) -> Candidate {
        let mut fields: Fields = candidate
            .fields
            .iter()
            .map(|(field, value)| {
                let canonical = self
                    .names
                    .canonical(field, value)
                    .or_else(|| self.names.canonical(NAME_FIELD, value))
                    .unwrap_or(value.as_str());
                (field.clone(), canonical.to_string())
            })
            .collect();

        if let Some(details) = fields
            .get(NAME_FIELD)
            .and_then(|name| self.directory.details(name))
        {
            for (key, value) in details {
                fields.entry(key).or_insert(value);
            }
        }

        candidate.with_fields(fields)
    }
}
