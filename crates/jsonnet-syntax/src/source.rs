//! Source positions and ranges.
//!
//! All positions are 1-based and counted in Unicode code points, so a
//! multi-byte character advances a column by exactly one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position inside a source file.
///
/// `Location::UNSET` (0, 0) marks an absent position, `Location::UNBOUNDED`
/// (-1, -1) is accepted by the range-limited lexer to mean "no limit".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Location {
    pub line: i32,
    pub column: i32,
}

impl Location {
    pub const UNSET: Location = Location { line: 0, column: 0 };
    pub const UNBOUNDED: Location = Location {
        line: -1,
        column: -1,
    };

    #[must_use]
    pub const fn new(line: i32, column: i32) -> Self {
        Self { line, column }
    }

    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.line != 0 || self.column != 0
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.line == -1 && self.column == -1
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A contiguous span of source, `begin <= end` lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct LocationRange {
    pub file_name: String,
    pub begin: Location,
    pub end: Location,
}

impl LocationRange {
    #[must_use]
    pub fn new(file_name: impl Into<String>, begin: Location, end: Location) -> Self {
        Self {
            file_name: file_name.into(),
            begin,
            end,
        }
    }

    /// Whether the cursor position lies inside the range, inclusive of both
    /// endpoints. On the first line the column must not precede `begin`, on
    /// the last line it must not pass `end`; interior lines match any column.
    #[must_use]
    pub fn encloses(&self, cursor: Location) -> bool {
        if cursor.line < self.begin.line || cursor.line > self.end.line {
            return false;
        }
        if cursor.line == self.begin.line && cursor.column < self.begin.column {
            return false;
        }
        if cursor.line == self.end.line && cursor.column > self.end.column {
            return false;
        }
        true
    }

    /// Whether `self` spans no more source than `other`.
    #[must_use]
    pub fn is_within(&self, other: &LocationRange) -> bool {
        other.begin <= self.begin && self.end <= other.end
    }
}

impl fmt::Display for LocationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file_name.is_empty() {
            write!(f, "{}-{}", self.begin, self.end)
        } else {
            write!(f, "{}:{}-{}", self.file_name, self.begin, self.end)
        }
    }
}

/// The byte offset of a 1-based code-point location in `text`.
#[must_use]
pub fn byte_offset(text: &str, loc: Location) -> Option<usize> {
    if loc.line < 1 || loc.column < 1 {
        return None;
    }
    let mut line = 1;
    let mut column = 1;
    for (offset, c) in text.char_indices() {
        if line == loc.line && column == loc.column {
            return Some(offset);
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    if line == loc.line && column == loc.column {
        return Some(text.len());
    }
    None
}

/// The text a range covers, for tooling that echoes source back to the
/// user (hover signatures, default values).
#[must_use]
pub fn slice_range<'t>(text: &'t str, range: &LocationRange) -> Option<&'t str> {
    let begin = byte_offset(text, range.begin)?;
    let end = byte_offset(text, range.end)?;
    text.get(begin..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosure_is_inclusive_at_both_ends() {
        let range = LocationRange::new("f", Location::new(1, 7), Location::new(1, 10));
        assert!(range.encloses(Location::new(1, 7)));
        assert!(range.encloses(Location::new(1, 10)));
        assert!(!range.encloses(Location::new(1, 6)));
        assert!(!range.encloses(Location::new(1, 11)));
    }

    #[test]
    fn multi_line_enclosure() {
        let range = LocationRange::new("f", Location::new(2, 5), Location::new(4, 2));
        assert!(range.encloses(Location::new(3, 1)));
        assert!(range.encloses(Location::new(3, 99)));
        assert!(!range.encloses(Location::new(2, 4)));
        assert!(!range.encloses(Location::new(4, 3)));
    }

    #[test]
    fn slicing_counts_code_points() {
        let text = "local s = \"\u{3b1}\u{3b2}\";\ns";
        let range = LocationRange::new("f", Location::new(1, 11), Location::new(1, 15));
        assert_eq!(slice_range(text, &range), Some("\"\u{3b1}\u{3b2}\""));

        let eof = LocationRange::new("f", Location::new(2, 1), Location::new(2, 2));
        assert_eq!(slice_range(text, &eof), Some("s"));
    }
}
