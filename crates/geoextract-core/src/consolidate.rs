//! Reduction of a document's candidates to a non-redundant set.
//!
//! Different extractors, and different window widths of the same extractor,
//! usually report the same real-world location several times with varying
//! completeness. Consolidation keeps the most complete variant of every
//! occurrence and then drops repeated mentions.

use std::collections::HashSet;

use tracing::trace;

use crate::extract::{Candidate, Fields};

/// True when `smaller` is a strict subset of `larger`: every field of
/// `smaller` appears in `larger` with the same value and `larger` has more.
fn is_strict_subset(smaller: &Fields, larger: &Fields) -> bool {
    smaller.len() < larger.len()
        && smaller
            .iter()
            .all(|(key, value)| larger.get(key) == Some(value))
}

/// Removes every candidate whose fields are a strict subset of those of an
/// overlapping candidate.
///
/// Each candidate is compared against the full input, so a chain
/// `a ⊂ b ⊂ c` of overlapping candidates leaves only `c`. Candidates whose
/// spans do not overlap are never compared. Survivors keep their order.
#[must_use]
pub fn prune_subsumed(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let dominated: Vec<bool> = candidates
        .iter()
        .map(|candidate| {
            candidates.iter().any(|other| {
                candidate.span.overlaps(&other.span)
                    && is_strict_subset(&candidate.fields, &other.fields)
            })
        })
        .collect();

    candidates
        .into_iter()
        .zip(dominated)
        .filter_map(|(candidate, dominated)| {
            if dominated {
                trace!(span = %candidate.span, fields = ?candidate.fields, "Subsumed");
                None
            } else {
                Some(candidate)
            }
        })
        .collect()
}

/// Drops candidates whose fields equal those of an earlier candidate,
/// regardless of their spans.
#[must_use]
pub fn remove_duplicates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<Fields> = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| {
            let first = seen.insert(candidate.fields.clone());
            if !first {
                trace!(span = %candidate.span, fields = ?candidate.fields, "Duplicate");
            }
            first
        })
        .collect()
}

/// Subsumption pruning followed by duplicate removal.
#[must_use]
pub fn consolidate(candidates: Vec<Candidate>) -> Vec<Candidate> {
    remove_duplicates(prune_subsumed(candidates))
}
