use std::collections::BTreeSet;

use crate::extract::Candidate;

/// Final transformation of consolidated candidates. Returning `None` drops
/// the candidate.
pub trait Postprocessor: Send + Sync {
    fn postprocess(&self, candidate: Candidate) -> Option<Candidate>;
}

/// Restricts candidates to an allow-list of fields. Never drops a candidate.
#[derive(Debug, Clone)]
pub struct KeyFilterPostprocessor {
    keep: BTreeSet<String>,
}

impl KeyFilterPostprocessor {
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keep: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl Postprocessor for KeyFilterPostprocessor {
    fn postprocess(&self, mut candidate: Candidate) -> Option<Candidate> {
        candidate.fields.retain(|key, _| self.keep.contains(key));
        Some(candidate)
    }
}
