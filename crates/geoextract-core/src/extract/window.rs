//! Sliding windows over whitespace-separated tokens.
//!
//! Street and city names often contain spaces, so a matcher looking at a
//! fixed number of words would either miss names or swallow neighbouring
//! words. Scanning windows of every width between `min_len` and `max_len`
//! gives the short, correct variants a chance to match; the overly long ones
//! are removed later by validation and consolidation.

use std::collections::HashSet;

use super::{named_groups, Candidate, Extractor, ExtractorKind, Fields};
use crate::directory::TargetNames;
use crate::error::{compile, Error, Result};
use crate::segment::Component;
use crate::span::Span;

/// A whitespace-delimited token and the characters it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: Span,
}

/// Splits `text` at whitespace. Spans are character positions in `text`.
#[must_use]
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut chars = 0;

    for (byte, c) in text.char_indices() {
        match (c.is_whitespace(), current) {
            (true, Some((start_byte, start))) => {
                tokens.push(Token {
                    text: &text[start_byte..byte],
                    span: Span::new(start, chars),
                });
                current = None;
            }
            (false, None) => current = Some((byte, chars)),
            _ => {}
        }
        chars += 1;
    }
    if let Some((start_byte, start)) = current {
        tokens.push(Token {
            text: &text[start_byte..],
            span: Span::new(start, chars),
        });
    }

    tokens
}

/// The tokens of all components in order, with document spans.
fn document_tokens(components: &[Component]) -> Vec<Token<'_>> {
    components
        .iter()
        .flat_map(|component| {
            tokenize(component.text())
                .into_iter()
                .map(move |token| Token {
                    text: token.text,
                    span: component.locate(token.span.start, token.span.end),
                })
        })
        .collect()
}

/// Consecutive tokens, joined by single spaces in `text`.
#[derive(Debug, Clone)]
pub struct Window<'a> {
    pub tokens: &'a [Token<'a>],
    pub text: String,
}

impl<'a> Window<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        let text = tokens
            .iter()
            .map(|token| token.text)
            .collect::<Vec<_>>()
            .join(" ");
        Self { tokens, text }
    }

    /// Smallest span covering every token. Tokens from different components
    /// are not necessarily in document order.
    #[must_use]
    pub fn span(&self) -> Span {
        let start = self.tokens.iter().map(|t| t.span.start).min().unwrap_or(0);
        let end = self.tokens.iter().map(|t| t.span.end).max().unwrap_or(start);
        Span::new(start, end)
    }
}

/// Decides which windows form a plausible location.
pub trait WindowMatcher: Send + Sync {
    /// Zero or more field mappings found in `window`.
    fn match_window(&self, window: &Window<'_>) -> Vec<Fields>;

    fn target_fields(&self) -> Vec<String> {
        Vec::new()
    }

    fn set_target_names(&mut self, _names: &TargetNames) -> Result<()> {
        Ok(())
    }
}

/// Runs a [`WindowMatcher`] over every window of every width in
/// `min_len..=max_len`. For `n` tokens and width `k` that is the `n - k + 1`
/// windows starting at token `0` through `n - k`.
///
/// The token sequence is that of the whole document: components are
/// tokenized in order and concatenated, so windows may span components.
#[derive(Debug, Clone)]
pub struct WindowExtractor<M> {
    matcher: M,
    min_len: usize,
    max_len: usize,
}

impl<M: WindowMatcher> WindowExtractor<M> {
    pub fn new(matcher: M, min_len: usize, max_len: usize) -> Result<Self> {
        if min_len == 0 || min_len > max_len {
            return Err(Error::InvalidWindow {
                min: min_len,
                max: max_len,
            });
        }
        Ok(Self {
            matcher,
            min_len,
            max_len,
        })
    }

    #[must_use]
    pub const fn matcher(&self) -> &M {
        &self.matcher
    }
}

impl<M: WindowMatcher> Extractor for WindowExtractor<M> {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Window
    }

    fn target_fields(&self) -> Vec<String> {
        self.matcher.target_fields()
    }

    fn set_target_names(&mut self, names: &TargetNames) -> Result<()> {
        self.matcher.set_target_names(names)
    }

    fn extract(&self, components: &[Component]) -> Vec<Candidate> {
        let tokens = document_tokens(components);
        let mut candidates = Vec::new();

        for width in self.min_len..=self.max_len.min(tokens.len()) {
            for slice in tokens.windows(width) {
                let window = Window::new(slice);
                for fields in self.matcher.match_window(&window) {
                    if !fields.is_empty() {
                        candidates.push(Candidate::new(fields, window.span(), ExtractorKind::Window));
                    }
                }
            }
        }

        candidates
    }
}

/// Searches each window with a list of regular expressions; the named groups
/// of the first match of each pattern become the fields.
#[derive(Debug, Clone)]
pub struct PatternWindowMatcher {
    patterns: Vec<regex::Regex>,
}

impl PatternWindowMatcher {
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

impl WindowMatcher for PatternWindowMatcher {
    fn match_window(&self, window: &Window<'_>) -> Vec<Fields> {
        self.patterns
            .iter()
            .filter_map(|pattern| {
                pattern
                    .captures(&window.text)
                    .map(|captures| named_groups(pattern, &captures))
            })
            .collect()
    }
}

/// Matches `<known name> <number>`: the last token of the window must match
/// the number pattern and the tokens before it must form a known name.
#[derive(Debug, Clone)]
pub struct NameNumberMatcher {
    field: String,
    number_field: String,
    number: regex::Regex,
    names: HashSet<String>,
}

impl NameNumberMatcher {
    /// Fails when `number_pattern` does not compile. The pattern must match
    /// the whole last token.
    pub fn new(
        field: impl Into<String>,
        number_field: impl Into<String>,
        number_pattern: &str,
    ) -> Result<Self> {
        Ok(Self {
            field: field.into(),
            number_field: number_field.into(),
            number: compile(&format!("^(?:{number_pattern})$"))?,
            names: HashSet::new(),
        })
    }

    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }
}

impl WindowMatcher for NameNumberMatcher {
    fn match_window(&self, window: &Window<'_>) -> Vec<Fields> {
        let Some((last, name_tokens)) = window.tokens.split_last() else {
            return Vec::new();
        };
        if name_tokens.is_empty() || !self.number.is_match(last.text) {
            return Vec::new();
        }

        let name = name_tokens
            .iter()
            .map(|token| token.text)
            .collect::<Vec<_>>()
            .join(" ");
        if !self.names.contains(&name) {
            return Vec::new();
        }

        let mut fields = Fields::new();
        fields.insert(self.field.clone(), name);
        fields.insert(self.number_field.clone(), last.text.to_string());
        vec![fields]
    }

    fn target_fields(&self) -> Vec<String> {
        vec![self.field.clone()]
    }

    fn set_target_names(&mut self, names: &TargetNames) -> Result<()> {
        self.names = names.normalized(&self.field).map(String::from).collect();
        Ok(())
    }
}
