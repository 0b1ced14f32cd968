use tracing::trace;

use crate::directory::{LocationDirectory, NAME_FIELD};
use crate::extract::Candidate;

/// Decides whether a candidate describes a real location.
pub trait Validator: Send + Sync {
    fn validate(&self, candidate: &Candidate, directory: &dyn LocationDirectory) -> bool;
}

/// Checks name-bearing fields against the location directory.
///
/// A candidate carrying one of the `trusted` fields is accepted as is. For
/// every other candidate each of the checked `fields` it carries must be a
/// known name of that type. Candidates with none of the fields pass.
#[derive(Debug, Clone)]
pub struct NameValidator {
    fields: Vec<String>,
    trusted: Vec<String>,
}

impl NameValidator {
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            trusted: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_trusted<I, S>(mut self, trusted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted = trusted.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for NameValidator {
    fn default() -> Self {
        Self::new(["street", "city"]).with_trusted([NAME_FIELD])
    }
}

impl Validator for NameValidator {
    fn validate(&self, candidate: &Candidate, directory: &dyn LocationDirectory) -> bool {
        if self.trusted.iter().any(|field| candidate.fields.contains_key(field)) {
            return true;
        }
        self.fields.iter().all(|field| match candidate.get(field) {
            Some(value) if !directory.exists(field, value) => {
                trace!(field = %field, value = %value, "Unknown name");
                false
            }
            _ => true,
        })
    }
}
