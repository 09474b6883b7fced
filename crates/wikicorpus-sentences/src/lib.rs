//! Splits a plaintext article (as produced by `wikicorpus-textify`) into one
//! sentence per line.
//!
//! Ported from the original `SentenceExtractor`: a single left-to-right scan
//! that collapses whitespace, breaks on paragraph boundaries, and emits a
//! newline after sentence-terminating punctuation. Runs of characters that
//! look like an abbreviation (`U.S.`, `Mr.`) are copied through as a unit
//! instead of being treated as a sentence boundary, using the same matcher
//! `wikicorpus-util` exposes for that purpose.

/// Scans plaintext and inserts one newline per sentence.
pub struct SentenceExtractor {
    separate_paragraphs: bool,
}

impl Default for SentenceExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SentenceExtractor {
    /// `separate_paragraphs` controls whether a blank source line (two
    /// consecutive newlines) is preserved as a paragraph break in the
    /// output. The original driver always enables this.
    pub fn new(separate_paragraphs: bool) -> Self {
        Self { separate_paragraphs }
    }

    pub fn extract(&self, input: &str) -> String {
        let bytes = input.as_bytes();
        let n = bytes.len();
        let mut pos = 0usize;
        let mut out: Vec<u8> = Vec::with_capacity(n + n / 8);

        while pos < n {
            if let Some(len) = wikicorpus_util::match_abbreviation(&input[pos..]) {
                out.extend_from_slice(&bytes[pos..pos + len]);
                pos += len;
                if bytes.get(pos).is_some_and(u8::is_ascii_uppercase) {
                    newline(&mut out, 1);
                }
                continue;
            }

            match bytes[pos] {
                b'\n' => {
                    if self.separate_paragraphs && bytes.get(pos + 1) == Some(&b'\n') {
                        newline(&mut out, 2);
                        pos += 1;
                    } else if !out.is_empty() && !ends_with_any(&out, b" \t\n") {
                        out.push(b' ');
                    }
                }
                b'.' => {
                    out.push(b'.');
                    let next = bytes.get(pos + 1).copied();
                    if next.is_some_and(is_ws) || next == Some(b'"') || next == Some(b'\'') {
                        if next == Some(b'"') || next == Some(b'\'') {
                            pos += 1;
                            out.push(bytes[pos]);
                        }
                        newline(&mut out, 1);
                    }
                }
                ch @ (b'?' | b'!') => {
                    out.push(ch);
                    newline(&mut out, 1);
                }
                ch @ (b' ' | b'\t') => {
                    if !out.is_empty() && !ends_with_any(&out, b" \t\r\n") {
                        out.push(ch);
                    }
                }
                ch => out.push(ch),
            }
            pos += 1;
        }

        newline(&mut out, 2);
        String::from_utf8_lossy(&out).into_owned()
    }
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn ends_with_any(out: &[u8], set: &[u8]) -> bool {
    matches!(out.last(), Some(b) if set.contains(b))
}

/// Ensures `out` ends with exactly `count` newlines, counting any that are
/// already there. A no-op on empty output: nothing has been written yet, so
/// there is no paragraph break to guarantee.
fn newline(out: &mut Vec<u8>, count: i64) {
    if out.is_empty() {
        return;
    }
    let mut i = out.len();
    let mut remaining = count;
    while i > 0 && out[i - 1] == b'\n' {
        i -= 1;
        remaining -= 1;
    }
    while remaining > 0 {
        out.push(b'\n');
        remaining -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_newline_becomes_paragraph_break() {
        let e = SentenceExtractor::default();
        assert_eq!(e.extract("line one\n\nline two"), "line one\n\nline two\n\n");
    }

    #[test]
    fn single_newline_collapses_to_space() {
        let e = SentenceExtractor::default();
        assert_eq!(e.extract("line one\nline two"), "line one line two\n\n");
    }

    #[test]
    fn repeated_spaces_collapse_to_one() {
        let e = SentenceExtractor::default();
        assert_eq!(e.extract("a   b"), "a b\n\n");
    }

    #[test]
    fn period_before_capitalized_word_breaks_sentence() {
        let e = SentenceExtractor::default();
        let got = e.extract("Hello world. Goodbye world.");
        assert_eq!(got.matches('\n').count() >= 2, true);
        assert!(got.starts_with("Hello world."));
        assert!(got.contains("Goodbye world."));
    }

    #[test]
    fn quote_after_period_is_carried_onto_the_same_sentence() {
        let e = SentenceExtractor::default();
        let got = e.extract("She said \"hi.\" Then left.");
        // The closing quote is pulled onto the line with its sentence,
        // not pushed onto the next one.
        assert!(got.contains("hi.\"\n"));
    }

    #[test]
    fn abbreviation_is_not_split() {
        let e = SentenceExtractor::default();
        let got = e.extract("U.S. forces arrived.");
        assert!(!got.starts_with("U.\n"));
        assert!(got.contains("U.S."));
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let e = SentenceExtractor::default();
        assert_eq!(e.extract(""), "");
    }

    #[test]
    fn disabling_paragraph_separation_collapses_blank_lines_too() {
        let e = SentenceExtractor::new(false);
        let got = e.extract("line one\n\nline two");
        assert!(!got.contains("one\n\ntwo") || true);
        // Without paragraph separation the double newline falls through to
        // the single-newline collapse-to-space rule on its first byte, then
        // the second newline repeats that rule again but is itself swallowed
        // because the preceding char is already whitespace.
        assert_eq!(got, "line one line two\n\n");
    }

    #[test]
    fn idempotent_on_already_extracted_output() {
        let e = SentenceExtractor::default();
        let once = e.extract("Hello world. Goodbye world.");
        let twice = e.extract(&once);
        assert_eq!(once.trim_end_matches('\n'), twice.trim_end_matches('\n'));
    }
}
