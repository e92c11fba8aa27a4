//! Source positions and ranges.
//!
//! Every entity of the configuration model carries a [`Range`] pointing back
//! at the text it was parsed from. Positions are zero-based and columns are
//! counted in bytes from the start of the line, which matches the row/column
//! pairs produced by the syntax tree.
//!
//! # Overview
//!
//! - [`Position`] - A zero-based line/column pair
//! - [`Range`] - A half-open interval between two positions
//! - [`TextAndRange`] - A piece of text together with its range
//! - [`index_to_pos`] / [`pos_to_index`] - Conversions between byte offsets and positions

use serde::Serialize;

/// Columns added to a range's end so that it runs past the end of its line.
pub const LINE_END_COLUMNS: u32 = 999;

/// A zero-based line/column position in a document.
///
/// Positions order lexicographically: first by line, then by column.
///
/// # Examples
///
/// ```
/// # use ciyaml_core::range::Position;
/// let a = Position::new(1, 4);
/// let b = Position::new(2, 0);
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based byte column within the line.
    pub character: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Return a position shifted to the right on the same line.
    pub fn offset_character(self, delta: u32) -> Self {
        Self {
            line: self.line,
            character: self.character.saturating_add(delta),
        }
    }
}

/// A half-open range `[start, end)` of positions.
///
/// The all-zero range is used as the "unset" marker for optional sub-fields,
/// see [`Range::is_default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Range {
    /// Inclusive start position.
    pub start: Position,
    /// Exclusive end position.
    pub end: Position,
}

impl Range {
    /// Create a new range from two positions.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a range from raw line/column coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ciyaml_core::range::Range;
    /// let range = Range::from_coords(0, 2, 0, 8);
    /// assert_eq!(range.start.character, 2);
    /// assert_eq!(range.end.character, 8);
    /// ```
    pub fn from_coords(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Self {
        Self {
            start: Position::new(start_line, start_char),
            end: Position::new(end_line, end_char),
        }
    }

    /// Returns `true` if this is the all-zero range used for absent fields.
    pub fn is_default(&self) -> bool {
        *self == Range::default()
    }

    /// Returns `true` if `pos` lies inside the range.
    ///
    /// Both ends are treated inclusively so that a cursor placed right after
    /// the last character of an entity still belongs to it.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Returns `true` if `other` lies entirely inside this range.
    pub fn contains_range(&self, other: &Range) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    /// Returns `true` if the range spans a single line.
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Return the range with its end moved `delta` columns to the right.
    pub fn extend_end(self, delta: u32) -> Self {
        Self {
            start: self.start,
            end: self.end.offset_character(delta),
        }
    }

    /// Return the range with its end moved past the end of its line.
    pub fn extend_to_line_end(self) -> Self {
        self.extend_end(LINE_END_COLUMNS)
    }
}

/// A piece of text with the range it was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TextAndRange {
    pub text: String,
    pub range: Range,
}

impl TextAndRange {
    pub fn new(text: impl Into<String>, range: Range) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }
}

/// Convert a byte offset into a [`Position`].
///
/// Offsets past the end of `content` are clamped to the end of the document.
///
/// # Examples
///
/// ```
/// # use ciyaml_core::range::{index_to_pos, Position};
/// let content = "version: 2.1\njobs:\n";
/// assert_eq!(index_to_pos(13, content), Position::new(1, 0));
/// ```
pub fn index_to_pos(index: usize, content: &str) -> Position {
    let index = index.min(content.len());
    let before = &content.as_bytes()[..index];

    let line = before.iter().filter(|&&b| b == b'\n').count();
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);

    Position::new(line as u32, (index - line_start) as u32)
}

/// Convert a [`Position`] back into a byte offset.
///
/// Returns `None` when the line does not exist. A column past the end of its
/// line is clamped to the line end.
pub fn pos_to_index(pos: Position, content: &str) -> Option<usize> {
    let mut line_start = 0usize;
    for _ in 0..pos.line {
        let next = content[line_start..].find('\n')?;
        line_start += next + 1;
    }

    let line_end = content[line_start..]
        .find('\n')
        .map_or(content.len(), |offset| line_start + offset);

    Some((line_start + pos.character as usize).min(line_end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(0, 10) < Position::new(1, 0));
        assert!(Position::new(3, 2) < Position::new(3, 5));
        assert_eq!(Position::new(2, 2), Position::new(2, 2));
    }

    #[test]
    fn test_range_contains() {
        let range = Range::from_coords(1, 2, 3, 4);

        assert!(range.contains(Position::new(1, 2)));
        assert!(range.contains(Position::new(2, 0)));
        assert!(range.contains(Position::new(3, 4)));
        assert!(!range.contains(Position::new(1, 1)));
        assert!(!range.contains(Position::new(3, 5)));
        assert!(!range.contains(Position::new(0, 100)));
    }

    #[test]
    fn test_range_contains_range() {
        let outer = Range::from_coords(0, 0, 10, 0);
        let inner = Range::from_coords(2, 4, 3, 1);

        assert!(outer.contains_range(&inner));
        assert!(!inner.contains_range(&outer));
    }

    #[test]
    fn test_range_is_default() {
        assert!(Range::default().is_default());
        assert!(!Range::from_coords(0, 0, 0, 1).is_default());
    }

    #[test]
    fn test_range_extend_end() {
        let range = Range::from_coords(4, 2, 4, 7).extend_end(3);

        assert_eq!(range.start, Position::new(4, 2));
        assert_eq!(range.end, Position::new(4, 10));

        let open = Range::from_coords(4, 2, 4, 7).extend_to_line_end();
        assert_eq!(open.end, Position::new(4, 7 + LINE_END_COLUMNS));
    }

    #[test]
    fn test_index_to_pos() {
        let content = "ab\ncd\n\nef";

        assert_eq!(index_to_pos(0, content), Position::new(0, 0));
        assert_eq!(index_to_pos(2, content), Position::new(0, 2));
        assert_eq!(index_to_pos(3, content), Position::new(1, 0));
        assert_eq!(index_to_pos(6, content), Position::new(2, 0));
        assert_eq!(index_to_pos(8, content), Position::new(3, 1));
        assert_eq!(index_to_pos(100, content), Position::new(3, 2));
    }

    #[test]
    fn test_pos_to_index() {
        let content = "ab\ncd\n\nef";

        assert_eq!(pos_to_index(Position::new(0, 0), content), Some(0));
        assert_eq!(pos_to_index(Position::new(1, 1), content), Some(4));
        assert_eq!(pos_to_index(Position::new(2, 0), content), Some(6));
        assert_eq!(pos_to_index(Position::new(1, 50), content), Some(5));
        assert_eq!(pos_to_index(Position::new(9, 0), content), None);
    }
}
