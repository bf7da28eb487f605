//! Conversion between the core's 1-based code-point locations and the
//! protocol's 0-based UTF-16 positions.

use jsonnet_syntax::source::{Location, LocationRange};
use lsp_types::{Position, Range};

#[must_use]
pub fn position_to_location(text: &str, position: Position) -> Location {
    let line = position.line as i32 + 1;
    let Some(line_text) = text.lines().nth(position.line as usize) else {
        return Location::new(line, 1);
    };
    let mut utf16 = 0u32;
    let mut column = 1i32;
    for c in line_text.chars() {
        if utf16 >= position.character {
            break;
        }
        utf16 += c.len_utf16() as u32;
        column += 1;
    }
    Location::new(line, column)
}

#[must_use]
pub fn location_to_position(text: &str, loc: Location) -> Position {
    let line_idx = loc.line.max(1) as u32 - 1;
    let line_text = text.lines().nth(line_idx as usize).unwrap_or("");
    let mut character = 0u32;
    for (i, c) in line_text.chars().enumerate() {
        if i as i32 >= loc.column - 1 {
            break;
        }
        character += c.len_utf16() as u32;
    }
    Position::new(line_idx, character)
}

#[must_use]
pub fn range_to_lsp(text: &str, range: &LocationRange) -> Range {
    Range::new(
        location_to_position(text, range.begin),
        location_to_position(text, range.end),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_on_ascii() {
        let text = "local x = 1;\nx\n";
        let loc = Location::new(2, 1);
        let pos = location_to_position(text, loc);
        assert_eq!(pos, Position::new(1, 0));
        assert_eq!(position_to_location(text, pos), loc);
    }

    #[test]
    fn wide_characters_count_as_two_utf16_units() {
        let text = "{ \"k\": \"\u{1F600}x\" }";
        // The x sits one code point after the emoji but two UTF-16 units.
        let loc = position_to_location(text, Position::new(0, 11));
        assert_eq!(loc.column, 11);
    }
}
