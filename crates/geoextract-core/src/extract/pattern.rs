use std::collections::BTreeMap;

use super::{named_groups, Candidate, CharIndex, Extractor, ExtractorKind};
use crate::error::{compile, Result};
use crate::segment::Component;

/// Replaces every `{block}` in `pattern` by the named group
/// `(?P<block>...)` and optionally anchors the result with `^...$`.
///
/// Braces that do not name a known block (e.g. `\d{5}`) are left alone.
#[must_use]
pub fn expand_blocks(pattern: &str, blocks: &BTreeMap<String, String>, anchored: bool) -> String {
    let mut expanded = blocks.iter().fold(pattern.to_string(), |acc, (name, block)| {
        acc.replace(&format!("{{{name}}}"), &format!("(?P<{name}>{block})"))
    });
    if anchored {
        expanded = format!("^(?:{expanded})$");
    }
    expanded
}

/// Regular-expression extractor over whole components.
///
/// Every match of every pattern becomes a candidate whose fields are the
/// named groups that took part in the match. Matches of different patterns
/// may overlap.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    patterns: Vec<regex::Regex>,
}

impl PatternExtractor {
    /// Compiles `patterns`, failing on the first invalid one.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| compile(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }
}

impl Extractor for PatternExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Pattern
    }

    fn extract(&self, components: &[Component]) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for component in components {
            let text = component.text();
            let index = CharIndex::new(text);

            for pattern in &self.patterns {
                for captures in pattern.captures_iter(text) {
                    let fields = named_groups(pattern, &captures);
                    if fields.is_empty() {
                        continue;
                    }
                    let Some(whole) = captures.get(0) else {
                        continue;
                    };
                    let span = component.locate(index.of(whole.start()), index.of(whole.end()));
                    candidates.push(Candidate::new(fields, span, ExtractorKind::Pattern));
                }
            }
        }

        candidates
    }
}
