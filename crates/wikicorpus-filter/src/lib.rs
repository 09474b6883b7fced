//! Drops count records below a threshold, preserving input order and
//! tracking the surviving total.
//!
//! Ported from the original `CountFilter`: the first line is a count
//! header (consumed, not re-emitted), surviving records are buffered in an
//! anonymous temp file as they arrive so the final surviving total can be
//! written as the new header before the records themselves, and a mismatch
//! between the header and the sum of records actually read is a
//! non-fatal warning.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};

use wikicorpus_util::parse_count_line;

pub struct CountFilter {
    threshold: u64,
    c_above: u64,
    c_below: u64,
    c_expected_total: u64,
    header_seen: bool,
    buffer: File,
}

impl CountFilter {
    pub fn new(threshold: u64) -> io::Result<Self> {
        Ok(Self {
            threshold,
            c_above: 0,
            c_below: 0,
            c_expected_total: 0,
            header_seen: false,
            buffer: tempfile::tempfile()?,
        })
    }

    /// Feeds one input line. The very first call is treated as the header.
    pub fn filter(&mut self, line: &str) -> io::Result<()> {
        if !self.header_seen {
            self.c_expected_total = line.trim().parse().unwrap_or(0);
            self.header_seen = true;
            return Ok(());
        }

        match parse_count_line(line) {
            Some((count, _ngram)) => {
                if count >= self.threshold {
                    writeln!(self.buffer, "{line}")?;
                    self.c_above += count;
                } else {
                    self.c_below += count;
                }
            }
            None => {
                tracing::warn!(line, "could not parse count from input line, skipping");
            }
        }
        Ok(())
    }

    /// Writes the surviving total header followed by the buffered
    /// surviving records to `out`. Consumes the filter.
    pub fn close<W: Write>(mut self, mut out: W) -> io::Result<u64> {
        let actual_total = self.c_above + self.c_below;
        if actual_total != self.c_expected_total {
            tracing::warn!(
                actual = actual_total,
                expected = self.c_expected_total,
                "actual number of ngrams does not match header"
            );
        }

        self.buffer.flush()?;
        self.buffer.seek(SeekFrom::Start(0))?;
        writeln!(out, "{}", self.c_above)?;
        io::copy(&mut self.buffer, &mut out)?;
        Ok(self.c_above)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(threshold: u64, lines: &[&str]) -> (String, u64) {
        let mut filter = CountFilter::new(threshold).unwrap();
        for line in lines {
            filter.filter(line).unwrap();
        }
        let mut out = Vec::new();
        let above = filter.close(&mut out).unwrap();
        (String::from_utf8(out).unwrap(), above)
    }

    #[test]
    fn retains_records_at_or_above_threshold() {
        let (out, above) = run(5, &["12", "10\tthe cat", "2\trare thing", "3\tfoo bar"]);
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("10"));
        assert_eq!(lines.next(), Some("10\tthe cat"));
        assert_eq!(lines.next(), None);
        assert_eq!(above, 10);
    }

    #[test]
    fn preserves_input_order() {
        let (out, _) = run(1, &["3", "1\tb", "1\ta", "1\tc"]);
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("3"));
        assert_eq!(lines.next(), Some("1\tb"));
        assert_eq!(lines.next(), Some("1\ta"));
        assert_eq!(lines.next(), Some("1\tc"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let (out, above) = run(1, &["2", "no tab here", "1\tok"]);
        assert_eq!(out.lines().collect::<Vec<_>>(), vec!["1", "1\tok"]);
        assert_eq!(above, 1);
    }

    #[test]
    fn header_mismatch_does_not_fail_the_stream() {
        let (out, above) = run(1, &["100", "1\ta"]);
        assert_eq!(out.lines().next(), Some("1"));
        assert_eq!(above, 1);
    }
}
