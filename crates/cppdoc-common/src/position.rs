//! Line/column positions, derived from a `Span` and a `LineMap`.
//!
//! The core itself never formats diagnostic *messages* (that is left to an
//! external presentation layer, per the Non-goals), but it still needs to
//! translate byte spans into human-addressable locations so a downstream
//! renderer can point at source text.

use crate::span::Span;

/// A single line/column position (both 1-based, matching editor convention).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// A pair of `Location`s bracketing a `Span`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Range {
    pub start: Location,
    pub end: Location,
}

/// Maps byte offsets to line/column positions for one source file.
///
/// Built once per translation unit from the raw newline positions; lookups
/// are a binary search, matching the teacher's `LineMap` approach to
/// avoid re-scanning source text per diagnostic.
#[derive(Clone, Debug)]
pub struct LineMap {
    /// Byte offset of the start of each line; `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineMap { line_starts }
    }

    /// Translate a byte offset into a 1-based `Location`.
    pub fn location_of(&self, offset: u32) -> Location {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_index];
        Location { line: (line_index + 1) as u32, column: offset - line_start + 1 }
    }

    pub fn range_of(&self, span: Span) -> Range {
        Range { start: self.location_of(span.start), end: self.location_of(span.end) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_starts_at_one_one() {
        let map = LineMap::new("abc\ndef\n");
        assert_eq!(map.location_of(0), Location { line: 1, column: 1 });
        assert_eq!(map.location_of(4), Location { line: 2, column: 1 });
        assert_eq!(map.location_of(6), Location { line: 2, column: 3 });
    }

    #[test]
    fn range_of_spans_two_lines() {
        let map = LineMap::new("abc\ndef\n");
        let range = map.range_of(Span::new(2, 5));
        assert_eq!(range.start, Location { line: 1, column: 3 });
        assert_eq!(range.end, Location { line: 2, column: 2 });
    }
}
