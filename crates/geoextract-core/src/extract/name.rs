use aho_corasick::{AhoCorasick, MatchKind};

use super::{Candidate, CharIndex, Extractor, ExtractorKind};
use crate::directory::{TargetNames, NAME_FIELD};
use crate::error::{Error, Result};
use crate::segment::Component;

/// Exact matcher for a (possibly large) set of fixed names.
///
/// All names are compiled into one Aho-Corasick automaton, so a scan costs
/// time linear in the text plus the number of matches. Only whole tokens
/// match: a name must be delimited by whitespace or the text boundary. Of
/// several names matching at the same position the longest wins, and
/// reported matches never overlap.
pub struct NameExtractor {
    field: String,
    names: Vec<String>,
    automaton: Option<AhoCorasick>,
}

impl NameExtractor {
    /// An extractor for `field` without names. The pipeline injects them.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            names: Vec::new(),
            automaton: None,
        }
    }

    /// Builds the automaton from `names` directly.
    pub fn with_names<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_names(names.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    fn set_names(&mut self, names: Vec<String>) -> Result<()> {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();
        names.dedup();

        self.automaton = if names.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::Standard)
                    .build(&names)
                    .map_err(|e| Error::NameIndex(e.to_string()))?,
            )
        };
        self.names = names;
        Ok(())
    }

    fn extract_component(&self, automaton: &AhoCorasick, component: &Component) -> Vec<Candidate> {
        let text = component.text();
        let index = CharIndex::new(text);
        let delimited_before = |byte: usize| {
            text[..byte]
                .chars()
                .next_back()
                .is_none_or(char::is_whitespace)
        };
        let delimited_after =
            |byte: usize| text[byte..].chars().next().is_none_or(char::is_whitespace);

        let mut hits: Vec<(usize, usize, usize)> = automaton
            .find_overlapping_iter(text)
            .filter(|m| delimited_before(m.start()) && delimited_after(m.end()))
            .map(|m| (m.start(), m.end(), m.pattern().as_usize()))
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut candidates = Vec::new();
        let mut covered = 0;
        for (start, end, pattern) in hits {
            if start < covered {
                continue;
            }
            covered = end;
            let span = component.locate(index.of(start), index.of(end));
            candidates.push(Candidate::single(
                self.field.clone(),
                self.names[pattern].clone(),
                span,
                ExtractorKind::Name,
            ));
        }
        candidates
    }
}

impl Default for NameExtractor {
    fn default() -> Self {
        Self::new(NAME_FIELD)
    }
}

impl std::fmt::Debug for NameExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameExtractor")
            .field("field", &self.field)
            .field("names", &self.names.len())
            .finish()
    }
}

impl Extractor for NameExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Name
    }

    fn target_fields(&self) -> Vec<String> {
        vec![self.field.clone()]
    }

    fn set_target_names(&mut self, names: &TargetNames) -> Result<()> {
        let names = names.normalized(&self.field).map(String::from).collect();
        self.set_names(names)
    }

    fn extract(&self, components: &[Component]) -> Vec<Candidate> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };
        components
            .iter()
            .flat_map(|component| self.extract_component(automaton, component))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{Segmenter, Splitter};
    use crate::span::Span;

    const NAMES: [&str; 4] = ["foo", "foobar", "a space", "öüä"];

    fn extractor() -> NameExtractor {
        NameExtractor::default().with_names(NAMES).unwrap()
    }

    fn spans(text: &str) -> Vec<(usize, usize, String)> {
        extractor()
            .extract_text(text)
            .into_iter()
            .map(|c| (c.span.start, c.span.len(), c.fields["name"].clone()))
            .collect()
    }

    #[test]
    fn test_repeated_name() {
        let extractor = NameExtractor::default().with_names(["Hauptstr"]).unwrap();
        let candidates = extractor.extract_text("Hauptstr 5 Hauptstr 10");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].span, Span::new(0, 8));
        assert_eq!(candidates[1].span, Span::new(11, 19));
        assert!(candidates.iter().all(|c| c.get("name") == Some("Hauptstr")));
        assert!(candidates.iter().all(|c| c.source == ExtractorKind::Name));
    }

    #[test]
    fn test_match_positions() {
        for name in NAMES {
            let len = name.chars().count();
            assert_eq!(spans(&format!("{name} x")), vec![(0, len, name.to_string())]);
            assert_eq!(spans(&format!("x {name}")), vec![(2, len, name.to_string())]);
            assert_eq!(spans(&format!("x {name} y")), vec![(2, len, name.to_string())]);
            assert_eq!(spans(name), vec![(0, len, name.to_string())]);
        }
    }

    #[test]
    fn test_word_only_matches() {
        assert!(spans("xfoo xfooy foox").is_empty());
    }

    #[test]
    fn test_longest_match_wins() {
        assert_eq!(spans("foobar"), vec![(0, 6, "foobar".to_string())]);
        assert_eq!(spans("foo foobar"), vec![(0, 3, "foo".into()), (4, 6, "foobar".into())]);
    }

    #[test]
    fn test_overlapping_names_do_not_overlap_in_output() {
        let extractor = NameExtractor::new("street")
            .with_names(["am markt", "markt platz", "markt"])
            .unwrap();
        let found: Vec<String> = extractor
            .extract_text("am markt platz")
            .into_iter()
            .map(|c| c.fields["street"].clone())
            .collect();
        assert_eq!(found, vec!["am markt"]);
    }

    #[test]
    fn test_rejected_partial_match_does_not_hide_later_one() {
        let extractor = NameExtractor::default().with_names(["a b", "b c"]).unwrap();
        let found = extractor.extract_text("xa b c");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name"), Some("b c"));
        assert_eq!(found[0].span, Span::new(3, 6));
    }

    #[test]
    fn test_empty_names_yield_nothing() {
        let extractor = NameExtractor::default();
        assert!(extractor.extract_text("foobar").is_empty());
        assert!(extractor.extract_text("").is_empty());

        let blank = NameExtractor::default().with_names(["", "  "]).unwrap();
        assert!(blank.extract_text("anything at all").is_empty());

        let mut injected = NameExtractor::default();
        injected.set_target_names(&TargetNames::new()).unwrap();
        assert!(injected.extract_text("foo").is_empty());
    }

    #[test]
    fn test_injected_names() {
        let mut names = TargetNames::new();
        names.insert("street", "kaiserstrasse".into(), "Kaiserstraße");
        let mut extractor = NameExtractor::new("street");
        assert_eq!(extractor.target_fields(), vec!["street"]);
        extractor.set_target_names(&names).unwrap();
        let found = extractor.extract_text("in der kaiserstrasse 12");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("street"), Some("kaiserstrasse"));
        assert_eq!(found[0].span, Span::new(7, 20));
    }

    #[test]
    fn test_component_offsets() {
        let components = Segmenter::default().split("left  \n      foo");
        let found = extractor().extract(&components);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, Span::new(13, 16));
    }
}
