use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{compile, Result};

/// Maps text to its canonical form before matching.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// A single rewriting step applied before Unicode and case folding.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Replace every match of `pattern` with `replacement` (`$1` etc. allowed).
    Substitute {
        pattern: regex::Regex,
        replacement: String,
    },
    /// Re-join words and number ranges hyphenated across a line break.
    RejoinLines,
    /// Drop hyphens between two letters.
    RemoveHyphens,
    /// Replace special characters outside of numbers with a space.
    RemoveSpecials,
    /// Collapse every whitespace run to a single space.
    CollapseWhitespace,
}

impl Rule {
    pub fn substitute(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        Ok(Self::Substitute {
            pattern: compile(pattern)?,
            replacement: replacement.into(),
        })
    }

    fn apply(&self, text: &str) -> String {
        match self {
            Self::Substitute {
                pattern,
                replacement,
            } => pattern.replace_all(text, replacement.as_str()).into_owned(),
            Self::RejoinLines => rejoin_lines(text),
            Self::RemoveHyphens => remove_hyphens(text),
            Self::RemoveSpecials => remove_specials(text),
            Self::CollapseWhitespace => collapse_whitespace(text),
        }
    }
}

/// Rule-based normalizer.
///
/// Rules run in order, then the text is NFKC-normalized (optionally with
/// diacritics removed) and lowercased, and finally trimmed.
#[derive(Debug, Clone, Default)]
pub struct BasicNormalizer {
    rules: Vec<Rule>,
    fold_diacritics: bool,
}

impl BasicNormalizer {
    /// A normalizer with the given rules. No rules means folding and trimming only.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            fold_diacritics: false,
        }
    }

    /// Line re-joining, hyphen removal, special character removal and
    /// whitespace collapsing, in that order.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            Rule::RejoinLines,
            Rule::RemoveHyphens,
            Rule::RemoveSpecials,
            Rule::CollapseWhitespace,
        ])
    }

    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a substitution rule, failing on an invalid pattern.
    pub fn with_substitution(self, pattern: &str, replacement: &str) -> Result<Self> {
        Ok(self.with_rule(Rule::substitute(pattern, replacement)?))
    }

    /// Strip combining marks after decomposition (`ö` becomes `o`).
    #[must_use]
    pub const fn with_fold_diacritics(mut self, fold: bool) -> Self {
        self.fold_diacritics = fold;
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl Normalizer for BasicNormalizer {
    fn normalize(&self, text: &str) -> String {
        let rewritten = self
            .rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc));

        let folded: String = if self.fold_diacritics {
            rewritten.nfkd().filter(|c| !is_combining_mark(*c)).nfc().collect()
        } else {
            rewritten.nfkc().collect()
        };

        folded.to_lowercase().trim().to_string()
    }
}

fn is_letter(c: char) -> bool {
    c.is_alphabetic()
}

fn is_special(c: char) -> bool {
    !c.is_alphanumeric() && c != '_' && !c.is_whitespace()
}

fn rejoin_lines(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;

        let joinable = c == '-' && i >= 2 && {
            let before = chars[i - 2];
            is_letter(before) || before.is_ascii_digit()
        };
        if !joinable {
            continue;
        }

        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() && chars[j] != '\n' {
            j += 1;
        }
        if j >= chars.len() || chars[j] != '\n' {
            continue;
        }
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }

        // Number ranges only join when another digit follows.
        let digit_range = chars[i - 2].is_ascii_digit();
        if digit_range && !chars.get(j).is_some_and(char::is_ascii_digit) {
            continue;
        }
        i = j;
    }

    out
}

fn remove_hyphens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '-' && i > 0 && is_letter(chars[i - 1]) {
            let mut j = i;
            while j < chars.len() && chars[j] == '-' {
                j += 1;
            }
            if chars.get(j).copied().is_some_and(is_letter) {
                i = j;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

/// Runs of special characters become a space unless they sit next to a digit
/// with no whitespace on either side (`2.3`, `-2.3e-34`, `1234-`, `+134`).
fn remove_specials(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !is_special(chars[i]) {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && is_special(chars[i]) {
            i += 1;
        }
        let before = start.checked_sub(1).map(|k| chars[k]);
        let after = chars.get(i).copied();

        let touches_digit = before.is_some_and(|c| c.is_ascii_digit())
            || after.is_some_and(|c| c.is_ascii_digit());
        let touches_space =
            before.is_some_and(char::is_whitespace) || after.is_some_and(char::is_whitespace);

        if touches_digit && !touches_space {
            out.extend(&chars[start..i]);
        } else {
            out.push(' ');
        }
    }

    out
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn check(normalizer: &BasicNormalizer, input: &str, expected: &str) {
        assert_eq!(normalizer.normalize(input), expected, "input {input:?}");
    }

    #[test]
    fn test_no_rules_folds_and_trims() {
        let normalizer = BasicNormalizer::new(Vec::new());
        check(&normalizer, "  Hauptstraße 5 ", "hauptstraße 5");
        check(&normalizer, "ＡＢＣ", "abc");
        check(&normalizer, "foo-bar!", "foo-bar!");
        check(&normalizer, "", "");
    }

    #[test]
    fn test_fold_diacritics() {
        let normalizer = BasicNormalizer::default().with_fold_diacritics(true);
        check(&normalizer, "Öüä", "oua");
        check(&BasicNormalizer::default(), "Öüä", "öüä");
    }

    #[test]
    fn test_rejoin_lines() {
        let joined = BasicNormalizer::standard();
        let not_joined = BasicNormalizer::new(vec![
            Rule::RemoveHyphens,
            Rule::RemoveSpecials,
            Rule::CollapseWhitespace,
        ]);
        for (input, with, without) in [
            ("foo-\nbar", "foobar", "foo bar"),
            ("foo- \nbar", "foobar", "foo bar"),
            ("foo -\nbar", "foo bar", "foo bar"),
            ("foo\n-bar", "foo bar", "foo bar"),
            ("foo\nbar", "foo bar", "foo bar"),
            ("1-\n2", "1-2", "1 2"),
        ] {
            check(&joined, input, with);
            check(&not_joined, input, without);
        }
    }

    #[test]
    fn test_remove_hyphens() {
        let removed = BasicNormalizer::standard();
        let kept = BasicNormalizer::new(vec![Rule::RemoveSpecials, Rule::CollapseWhitespace]);
        for (input, with, without) in [
            ("foo-bar", "foobar", "foo bar"),
            ("f-o-o-b-a-r", "foobar", "f o o b a r"),
            ("Karl--Friedrich", "karlfriedrich", "karl friedrich"),
            ("1-2", "1-2", "1-2"),
            ("1-2-3", "1-2-3", "1-2-3"),
            ("2000-3000", "2000-3000", "2000-3000"),
        ] {
            check(&removed, input, with);
            check(&kept, input, without);
        }
    }

    #[test]
    fn test_remove_specials() {
        let normalizer = BasicNormalizer::new(vec![Rule::RemoveSpecials, Rule::CollapseWhitespace]);
        for (input, expected) in [
            ("hello?", "hello"),
            ("!hello", "hello"),
            ("foo!?#bar", "foo bar"),
            ("#f!$o?/o+", "f o o"),
            ("2.3", "2.3"),
            ("-2.3", "-2.3"),
            ("-2.3e-34", "-2.3e-34"),
            ("1234-", "1234-"),
            ("1+2", "1+2"),
            ("+134", "+134"),
        ] {
            check(&normalizer, input, expected);
        }
    }

    #[test]
    fn test_substitutions_in_order() {
        let normalizer = BasicNormalizer::new(Vec::new())
            .with_substitution(r"b\b", "bar")
            .unwrap();
        check(&normalizer, "foob", "foobar");

        let normalizer = BasicNormalizer::new(Vec::new())
            .with_substitution("a", "b")
            .unwrap()
            .with_substitution("b", "c")
            .unwrap();
        check(&normalizer, "ab", "cc");
    }

    #[test]
    fn test_trim_runs_last() {
        let normalizer = BasicNormalizer::new(Vec::new())
            .with_substitution("x", "  ")
            .unwrap();
        check(&normalizer, "xabcx", "abc");
    }

    #[test]
    fn test_case_folding_after_substitution() {
        let normalizer = BasicNormalizer::new(Vec::new())
            .with_substitution(r"(?i)str\b", "strasse")
            .unwrap();
        check(&normalizer, "Hauptstr 5", "hauptstrasse 5");
    }

    #[test]
    fn test_invalid_substitution_fails_at_construction() {
        let err = BasicNormalizer::new(Vec::new())
            .with_substitution("(unclosed", "x")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_whitespace_collapse() {
        check(
            &BasicNormalizer::standard(),
            " \n \r \t a \n \r \t b \n \r \t ",
            "a b",
        );
    }
}
