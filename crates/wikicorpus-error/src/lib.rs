//! Parse error type shared by the Textifier and its driver.
//!
//! Mirrors the original's `Error(message, pos)` exception: a parse failure
//! carries a byte offset into the article, which the driver translates to a
//! line/column plus a short snippet before logging it and moving on to the
//! next article (see spec §7 — Textifier parse errors are fatal to the
//! current article only).

use wikicorpus_position::LineIndex;

/// A Textifier parse failure: an expected markup construct was not found (or
/// nesting was illegal) at `offset`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

pub type ParseResult<T> = Result<T, ParseError>;

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self { message: message.into(), offset }
    }

    /// Returns a copy of this error with `offset` shifted by `base`, used
    /// when a recursive parse (e.g. a link label) fails and the caller
    /// re-raises the error in terms of the outer article's offsets.
    pub fn offset_by(&self, base: usize) -> Self {
        Self { message: self.message.clone(), offset: self.offset + base }
    }

    /// Renders this error as `"message at line:column: <snippet>"` using a
    /// caller-supplied index over the original article text.
    pub fn render(&self, text: &str, index: &LineIndex) -> String {
        let pos = index.offset_to_position(self.offset);
        let snippet = index.snippet(text, self.offset);
        format!("{} at {}:{}: {}", self.message, pos.line, pos.column, snippet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_position_and_snippet() {
        let text = "hello [[broken link";
        let index = LineIndex::new(text);
        let err = ParseError::new("expected ]]", 6);
        let rendered = err.render(text, &index);
        assert!(rendered.contains("expected ]]"));
        assert!(rendered.contains("1:7"));
    }

    #[test]
    fn offset_by_shifts_position() {
        let err = ParseError::new("expected |", 5);
        let shifted = err.offset_by(10);
        assert_eq!(shifted.offset, 15);
        assert_eq!(shifted.message, "expected |");
    }
}
