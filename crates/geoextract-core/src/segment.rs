//! Layout-aware splitting of a document into visually separate chunks.
//!
//! A document is read as a grid of characters: each line is a row and each
//! character a column. Non-whitespace cells that lie close to each other
//! (see [`Margin`]) form one [`Component`]. Text that wraps onto the next line
//! stays together while columns separated by a wide gutter come apart.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::span::Span;

/// A chunk of a document together with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    text: String,
    span: Span,
    runs: Vec<Span>,
    /// Document offset of every character of `text`. `None` means the text is
    /// laid out linearly from `span.start`.
    offsets: Option<Vec<usize>>,
}

impl Component {
    /// A component covering a whole document, as used when splitting is off.
    #[must_use]
    pub fn whole(text: &str) -> Self {
        let len = text.chars().count();
        let span = Span::new(0, len);
        Self {
            text: text.to_string(),
            span,
            runs: if len == 0 { Vec::new() } else { vec![span] },
            offsets: None,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Smallest span enclosing every character. Components laid out side by
    /// side have overlapping spans; their [`Self::runs`] never overlap.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Maximal runs of consecutive document offsets occupied by this
    /// component's characters.
    #[must_use]
    pub fn runs(&self) -> &[Span] {
        &self.runs
    }

    /// Returns a copy of this component carrying a different text, e.g. the
    /// output of a normalizer. The position mapping survives only when the
    /// character count is unchanged.
    #[must_use]
    pub fn with_text(&self, text: String) -> Self {
        let offsets = self
            .offsets
            .as_ref()
            .filter(|offsets| offsets.len() == text.chars().count())
            .cloned();
        Self {
            text,
            span: self.span,
            runs: self.runs.clone(),
            offsets,
        }
    }

    /// Translates a character range of [`Self::text`] into document offsets.
    #[must_use]
    pub fn locate(&self, start: usize, end: usize) -> Span {
        match &self.offsets {
            Some(offsets) if start < end && end <= offsets.len() => {
                Span::new(offsets[start], offsets[end - 1] + 1)
            }
            Some(offsets) if start == end => {
                let at = offsets.get(start).copied().unwrap_or(self.span.end);
                Span::new(at, at)
            }
            _ => {
                let clamp = |i: usize| (self.span.start + i).min(self.span.end);
                Span::new(clamp(start), clamp(end))
            }
        }
    }
}

/// Splits a document into ordered components.
pub trait Splitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<Component>;
}

/// How far apart two non-whitespace cells may be and still belong together.
///
/// Cells join when their column distance is at most `horizontal` and their
/// row distance at most `vertical`. `Margin::new(1, 1)` is plain 8-neighbor
/// adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct Margin {
    horizontal: usize,
    vertical: usize,
}

impl Margin {
    pub const fn new(horizontal: usize, vertical: usize) -> Result<Self> {
        if horizontal == 0 || vertical == 0 {
            return Err(Error::InvalidMargin {
                horizontal,
                vertical,
            });
        }
        Ok(Self {
            horizontal,
            vertical,
        })
    }

    #[must_use]
    pub const fn horizontal(&self) -> usize {
        self.horizontal
    }

    #[must_use]
    pub const fn vertical(&self) -> usize {
        self.vertical
    }
}

impl Default for Margin {
    /// A single space between words does not split a line, a blank line does.
    fn default() -> Self {
        Self {
            horizontal: 2,
            vertical: 1,
        }
    }
}

impl TryFrom<(usize, usize)> for Margin {
    type Error = Error;

    fn try_from((horizontal, vertical): (usize, usize)) -> Result<Self> {
        Self::new(horizontal, vertical)
    }
}

impl From<Margin> for (usize, usize) {
    fn from(margin: Margin) -> Self {
        (margin.horizontal, margin.vertical)
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    row: usize,
    col: usize,
    offset: usize,
    ch: char,
}

/// Connected-component splitter over the character grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
    margin: Margin,
}

impl Segmenter {
    #[must_use]
    pub const fn new(margin: Margin) -> Self {
        Self { margin }
    }

    /// Non-whitespace cells in row-major order plus the index of the first
    /// cell of every row.
    fn grid(text: &str) -> (Vec<Cell>, Vec<usize>) {
        let mut cells = Vec::new();
        let mut row_starts = vec![0];
        let (mut row, mut col) = (0, 0);

        for (offset, ch) in text.chars().enumerate() {
            if ch == '\n' {
                row += 1;
                col = 0;
                row_starts.push(cells.len());
                continue;
            }
            if !ch.is_whitespace() {
                cells.push(Cell {
                    row,
                    col,
                    offset,
                    ch,
                });
            }
            col += 1;
        }

        (cells, row_starts)
    }

    fn label(&self, cells: &[Cell], row_starts: &[usize]) -> Vec<usize> {
        let mut sets = DisjointSets::new(cells.len());
        let row_cells = |row: usize| {
            let start = row_starts[row];
            let end = row_starts.get(row + 1).copied().unwrap_or(cells.len());
            &cells[start..end]
        };

        for (i, cell) in cells.iter().enumerate() {
            let reach = cell.col + self.margin.horizontal;

            let same_row = cells[i + 1..]
                .iter()
                .take_while(|other| other.row == cell.row && other.col <= reach);
            for j in (i + 1..).zip(same_row).map(|(j, _)| j) {
                sets.union(i, j);
            }

            let last_row = (cell.row + self.margin.vertical).min(row_starts.len() - 1);
            for row in cell.row + 1..=last_row {
                let base = row_starts[row];
                let below = row_cells(row);
                let first = below.partition_point(|other| {
                    other.col + self.margin.horizontal < cell.col
                });
                for (k, _) in below[first..]
                    .iter()
                    .enumerate()
                    .take_while(|(_, other)| other.col <= reach)
                {
                    sets.union(i, base + first + k);
                }
            }
        }

        (0..cells.len()).map(|i| sets.find(i)).collect()
    }

    /// Joins the runs of a component with single spaces. A gap that follows
    /// a word or number hyphenated at the end of a row becomes `'\n'`
    /// instead, so that line re-joining still applies.
    fn assemble(members: &[Cell]) -> Component {
        let mut text = String::new();
        let mut offsets = Vec::with_capacity(members.len());
        let mut runs: Vec<Span> = Vec::new();
        let mut last_row = 0;

        for cell in members {
            match runs.last_mut() {
                Some(run) if run.end == cell.offset => run.end += 1,
                Some(run) => {
                    let wrapped = cell.row > last_row && ends_with_hyphenation(&text);
                    text.push(if wrapped { '\n' } else { ' ' });
                    offsets.push(run.end);
                    runs.push(Span::new(cell.offset, cell.offset + 1));
                }
                None => runs.push(Span::new(cell.offset, cell.offset + 1)),
            }
            text.push(cell.ch);
            offsets.push(cell.offset);
            last_row = cell.row;
        }

        let start = runs.first().map_or(0, |run| run.start);
        let end = runs.last().map_or(0, |run| run.end);
        Component {
            text,
            span: Span::new(start, end),
            runs,
            offsets: Some(offsets),
        }
    }
}

fn ends_with_hyphenation(text: &str) -> bool {
    let mut tail = text.chars().rev();
    tail.next() == Some('-')
        && tail
            .next()
            .is_some_and(|c| c.is_alphabetic() || c.is_ascii_digit())
}

impl Splitter for Segmenter {
    /// Components come out sorted by their first character, i.e. by the
    /// top-most row and then the left-most column of that row.
    fn split(&self, text: &str) -> Vec<Component> {
        let (cells, row_starts) = Self::grid(text);
        if cells.is_empty() {
            return Vec::new();
        }

        let labels = self.label(&cells, &row_starts);

        // Cells are in offset order, so the first time a label shows up is
        // also the start of its component.
        let mut groups: Vec<Vec<Cell>> = Vec::new();
        let mut slot = vec![usize::MAX; cells.len()];
        for (cell, &label) in cells.iter().zip(&labels) {
            if slot[label] == usize::MAX {
                slot[label] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot[label]].push(*cell);
        }

        let components: Vec<Component> = groups.iter().map(|group| Self::assemble(group)).collect();
        tracing::trace!(components = components.len(), cells = cells.len(), "segmented document");
        components
    }
}

/// Union-find with path halving.
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => self.parent[a] = b,
            std::cmp::Ordering::Greater => self.parent[b] = a,
            std::cmp::Ordering::Equal => {
                self.parent[b] = a;
                self.rank[a] += 1;
            }
        }
    }
}
