//! Text ranges - byte/row/column intervals over a source unit
//!
//! Every node in the scope graph carries a `TextRange`. Ranges are half-open
//! on bytes (`start..end`) and ordered by start byte, then end byte.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a source unit.
///
/// Field order matters: the derived ordering compares `byte` first, so two
/// points from the same source order by byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    /// Byte offset from the start of the source
    pub byte: usize,
    /// Zero-based line
    pub row: usize,
    /// Zero-based byte column within the line
    pub column: usize,
}

impl Point {
    pub fn new(byte: usize, row: usize, column: usize) -> Self {
        Self { byte, row, column }
    }

    /// Compute the row and column of a byte offset in `src`.
    ///
    /// Offsets past the end of `src` are clamped to its length.
    pub fn from_byte(src: &str, byte: usize) -> Self {
        let byte = byte.min(src.len());
        let before = &src.as_bytes()[..byte];
        let row = before.iter().filter(|&&b| b == b'\n').count();
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        Self {
            byte,
            row,
            column: byte - line_start,
        }
    }
}

/// An immutable interval of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Point,
    pub end: Point,
}

impl TextRange {
    pub fn new(start: Point, end: Point) -> Self {
        debug_assert!(start.byte <= end.byte, "range start after end");
        Self { start, end }
    }

    /// Build a range from byte offsets, computing rows and columns from `src`.
    pub fn from_byte_span(src: &str, start: usize, end: usize) -> Self {
        Self::new(Point::from_byte(src, start), Point::from_byte(src, end))
    }

    /// Does this range fully enclose `other`?
    pub fn contains(&self, other: &TextRange) -> bool {
        self.start.byte <= other.start.byte && other.end.byte <= self.end.byte
    }

    /// Does this range cover the byte at `byte`?
    pub fn contains_byte(&self, byte: usize) -> bool {
        self.start.byte <= byte && byte < self.end.byte
    }

    /// Length in bytes
    pub fn size(&self) -> usize {
        self.end.byte - self.start.byte
    }

    /// The source text this range covers, if it lies within `src`
    pub fn slice<'s>(&self, src: &'s str) -> Option<&'s str> {
        src.get(self.start.byte..self.end.byte)
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.byte, self.end.byte)
    }
}
