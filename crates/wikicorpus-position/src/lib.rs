//! Byte offset to (line, column) translation.
//!
//! Trimmed down from a UTF-16/LSP-aware line index to the byte-oriented
//! subset the Textifier needs: a parse error carries a byte offset into the
//! article source, and the driver wants to report it as a 1-based line and
//! column plus a short snippet of surrounding text.

/// A 1-based (line, column) position, with column counted in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Indexes the byte offsets where each line of `text` starts, so that byte
/// offset → (line, column) lookups are `O(log n)` instead of rescanning the
/// whole text per error.
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

/// Half the width of the snippet window on each side of the reported offset.
const SNIPPET_RADIUS: usize = 15;

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts, len: text.len() }
    }

    /// Translates a byte offset into a 1-based (line, column) position.
    /// Offsets past the end of the text clamp to the last valid position.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = offset - self.line_starts[line_idx] + 1;
        Position { line: line_idx + 1, column }
    }

    /// Returns a short, single-line-safe snippet of `text` centered on
    /// `offset`, for inclusion in error messages.
    pub fn snippet<'a>(&self, text: &'a str, offset: usize) -> &'a str {
        let offset = offset.min(text.len());
        let start = text
            .char_indices()
            .rev()
            .find(|(i, _)| *i <= offset.saturating_sub(SNIPPET_RADIUS))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let end = text
            .char_indices()
            .find(|(i, _)| *i >= (offset + SNIPPET_RADIUS).min(text.len()))
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        &text[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_first_column() {
        let idx = LineIndex::new("hello\nworld");
        assert_eq!(idx.offset_to_position(0), Position { line: 1, column: 1 });
    }

    #[test]
    fn tracks_subsequent_lines() {
        let idx = LineIndex::new("ab\ncd\nef");
        assert_eq!(idx.offset_to_position(3), Position { line: 2, column: 1 });
        assert_eq!(idx.offset_to_position(4), Position { line: 2, column: 2 });
        assert_eq!(idx.offset_to_position(6), Position { line: 3, column: 1 });
    }

    #[test]
    fn clamps_past_end() {
        let idx = LineIndex::new("abc");
        assert_eq!(idx.offset_to_position(100), idx.offset_to_position(3));
    }

    #[test]
    fn snippet_around_offset() {
        let idx = LineIndex::new("0123456789");
        let s = idx.snippet("0123456789", 5);
        assert!(s.contains('5'));
    }
}
