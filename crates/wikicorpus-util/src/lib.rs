//! Shared leaf utilities for the wikicorpus pipeline.
//!
//! Every stage downstream of the Textifier reads and writes the same
//! `count<TAB>key` record format, needs to split a line on whitespace into
//! tokens, and (for the chunked/parallel stages) needs to parse a
//! human-friendly byte-size limit like `500m`. Collecting those three
//! concerns here keeps each stage crate free of copy-pasted parsing code.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Separator between a count and its key in a count record, and between the
/// two words of a collocation pair key.
pub const SEPARATOR: char = '\t';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkSizeError {
    #[error("invalid chunk size limit: {0}")]
    Invalid(String),
}

/// Parses a byte-size limit of the form `NUMBER[b|k|m|g]`, where the unit
/// suffix is case-insensitive and follows the `tmpfile`-era block/KiB/MiB/GiB
/// convention from the original counter: `b` = 512-byte block, `k` = KiB,
/// `m` = MiB, `g` = GiB, no suffix = bytes.
pub fn parse_chunk_size(s: &str) -> Result<usize, ChunkSizeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ChunkSizeError::Invalid(s.to_string()));
    }

    let (digits, unit) = match s.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&s[..s.len() - 1], Some(c.to_ascii_lowercase())),
        _ => (s, None),
    };

    let size: usize =
        digits.parse().map_err(|_| ChunkSizeError::Invalid(s.to_string()))?;

    let multiplier: usize = match unit {
        None => 1,
        Some('b') => 512,
        Some('k') => 1024,
        Some('m') => 1024 * 1024,
        Some('g') => 1024 * 1024 * 1024,
        Some(_) => return Err(ChunkSizeError::Invalid(s.to_string())),
    };

    size.checked_mul(multiplier).ok_or_else(|| ChunkSizeError::Invalid(s.to_string()))
}

/// Parses a `count<TAB>key` record line, returning `None` if the line is
/// malformed (no tab, or the count prefix isn't a non-negative integer).
/// Callers are expected to log and skip on `None`, per the "record parse
/// warning" policy shared by the merger, NGramCounter, and MutualInformation.
pub fn parse_count_line(line: &str) -> Option<(u64, &str)> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let (count_str, key) = line.split_once(SEPARATOR)?;
    let count: u64 = count_str.parse().ok()?;
    Some((count, key))
}

/// Formats a `count<TAB>key\n` record line.
pub fn format_count_line(count: u64, key: &str) -> String {
    format!("{count}{SEPARATOR}{key}\n")
}

/// Splits a line into whitespace-separated tokens, dropping empty runs.
/// Shared by the NGramCounter's window builder and the collocation counter's
/// per-sentence word extraction.
pub fn split_words(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ' ' || c == '\t' || c == '\r' || c == '\n' || c == '\x0c')
        .filter(|w| !w.is_empty())
        .collect()
}

fn abbreviation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Matches a run of single-letter-dot or Capital-lowercase-dot groups
        // (e.g. "U.S." or "Mr.") optionally followed by one trailing word and
        // the whitespace (or end of input) that terminates the match. See
        // spec §4.2.
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^((\w\.)|([A-Z][a-z]\.))+(\s*\w\.?)?(\s|$)+").unwrap()
    })
}

/// Returns the length, in bytes, of an abbreviation match anchored at the
/// start of `text`, or `None` if `text` does not start with one.
pub fn match_abbreviation(text: &str) -> Option<usize> {
    abbreviation_regex().find(text).map(|m| m.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_bytes() {
        assert_eq!(parse_chunk_size("1024").unwrap(), 1024);
    }

    #[test]
    fn parses_unit_suffixes() {
        assert_eq!(parse_chunk_size("1b").unwrap(), 512);
        assert_eq!(parse_chunk_size("1k").unwrap(), 1024);
        assert_eq!(parse_chunk_size("2m").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_chunk_size("1G").unwrap(), 1024 * 1024 * 1024);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_chunk_size("").is_err());
        assert!(parse_chunk_size("abc").is_err());
        assert!(parse_chunk_size("10x").is_err());
    }

    #[test]
    fn parses_count_records() {
        assert_eq!(parse_count_line("12\thello world\n"), Some((12, "hello world")));
        assert_eq!(parse_count_line("0\t<s> a"), Some((0, "<s> a")));
    }

    #[test]
    fn rejects_malformed_records() {
        assert_eq!(parse_count_line("no tab here"), None);
        assert_eq!(parse_count_line("abc\tkey"), None);
    }

    #[test]
    fn round_trips_count_records() {
        let line = format_count_line(3, "a b");
        assert_eq!(parse_count_line(&line), Some((3, "a b")));
    }

    #[test]
    fn splits_words_on_whitespace_runs() {
        assert_eq!(split_words("a  b\tc"), vec!["a", "b", "c"]);
        assert_eq!(split_words(""), Vec::<&str>::new());
    }

    #[test]
    fn matches_abbreviations() {
        assert!(match_abbreviation("U.S. is big").is_some());
        assert!(match_abbreviation("Mr. Smith ").is_some());
        assert!(match_abbreviation("hello world").is_none());
    }
}
