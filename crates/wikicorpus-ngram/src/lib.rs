//! Constant-memory n-gram counter.
//!
//! Ported from the original `NGramCounter`: token-stream lines are folded
//! into an in-memory `count → ngram` accumulator until it grows past a
//! configured size, at which point it is flushed to an anonymous temporary
//! file ("chunk") in sorted order. Chunks are merged pairwise (via
//! `wikicorpus-merge`) as counting proceeds, capping the number of
//! simultaneously open temp files at three, and again at the end to
//! produce one globally sorted output stream prefixed with the total count.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Seek, SeekFrom, Write};

use thiserror::Error;
use wikicorpus_util::{format_count_line, split_words};

#[derive(Error, Debug)]
pub enum NGramError {
    #[error("ngram counter is closed")]
    Closed,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Merge(#[from] wikicorpus_merge::MergeError),
}

pub type NGramResult<T> = Result<T, NGramError>;

/// Builds the `n` overlapping windows of a tokenized line, padded with
/// `n-1` leading `<s>` markers and one trailing `</s>` marker.
fn ngrams(line: &str, n: usize) -> Vec<String> {
    let mut words: Vec<&str> = Vec::with_capacity(n + 4);
    for _ in 0..n.saturating_sub(1) {
        words.push("<s>");
    }
    words.extend(split_words(line));
    words.push("</s>");

    let mut out = Vec::new();
    if words.len() < n {
        return out;
    }
    for i in (n - 1)..words.len() {
        out.push(words[i + 1 - n..=i].join(" "));
    }
    out
}

fn is_all_whitespace(line: &str) -> bool {
    line.chars().all(|c| matches!(c, ' ' | '\n' | '\r' | '\x0c' | '\t'))
}

pub struct NGramCounter {
    n: usize,
    max_chunk_length: usize,
    chunk_length: usize,
    current_counts: std::collections::BTreeMap<String, u64>,
    chunk_files: Vec<File>,
    total_count: u64,
    closed: bool,
}

impl NGramCounter {
    pub fn new(n: usize, max_chunk_size: usize) -> Self {
        let max_chunk_length = (4 * max_chunk_size) / (2 * n + 8);
        Self {
            n,
            max_chunk_length,
            chunk_length: 0,
            current_counts: std::collections::BTreeMap::new(),
            chunk_files: Vec::new(),
            total_count: 0,
            closed: false,
        }
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Folds one tokenized line's windows into the in-memory accumulator,
    /// flushing a chunk if the running length budget is exceeded.
    pub fn count(&mut self, line: &str) -> NGramResult<()> {
        if self.closed {
            return Err(NGramError::Closed);
        }
        if is_all_whitespace(line) {
            return Ok(());
        }

        for ngram in ngrams(line, self.n) {
            *self.current_counts.entry(ngram).or_insert(0) += 1;
            self.total_count += 1;
        }

        self.chunk_length += line.len() + 1;
        if self.chunk_length > self.max_chunk_length {
            self.end_chunk()?;
        }
        Ok(())
    }

    fn end_chunk(&mut self) -> NGramResult<()> {
        let mut chunk = tempfile::tempfile()?;
        {
            let mut w = BufWriter::new(&mut chunk);
            for (ngram, count) in &self.current_counts {
                w.write_all(format_count_line(*count, ngram).as_bytes())?;
            }
            w.flush()?;
        }
        chunk.seek(SeekFrom::Start(0))?;

        self.current_counts.clear();
        self.chunk_length = 0;
        self.chunk_files.push(chunk);

        if self.chunk_files.len() >= 3 {
            let a = self.chunk_files.remove(0);
            let b = self.chunk_files.remove(0);
            let merged = merge_to_tempfile(a, b)?;
            self.chunk_files.push(merged);
        }
        Ok(())
    }

    /// Flushes any remaining in-memory counts, merges all chunks down to
    /// one stream, and writes it to `out` as `TOTAL\n` followed by sorted
    /// `count<TAB>ngram\n` records. Consumes the counter.
    pub fn close<W: Write>(mut self, mut out: W) -> NGramResult<u64> {
        self.end_chunk()?;
        self.closed = true;

        if self.chunk_files.len() == 1 {
            return self.print_only_chunk(out);
        }

        while self.chunk_files.len() > 2 {
            tracing::info!(chunks = self.chunk_files.len(), "merging one level of ngram chunks");
            let mut chunks = std::mem::take(&mut self.chunk_files);
            let mut new_chunks = Vec::with_capacity(chunks.len().div_ceil(2));
            let mut drained = chunks.drain(..);
            loop {
                let Some(a) = drained.next() else { break };
                match drained.next() {
                    Some(b) => new_chunks.push(merge_to_tempfile(a, b)?),
                    None => new_chunks.push(a),
                }
            }
            self.chunk_files = new_chunks;
        }

        writeln!(out, "{}", self.total_count)?;
        let a = self.chunk_files.remove(0);
        let b = self.chunk_files.remove(0);
        let emitted = wikicorpus_merge::merge_counts(BufReader::new(a), BufReader::new(b), &mut out)?;

        if emitted != self.total_count {
            tracing::warn!(
                total = self.total_count,
                emitted,
                "ngram counter: emitted total does not match accumulated total"
            );
        }
        Ok(emitted)
    }

    fn print_only_chunk<W: Write>(&mut self, mut out: W) -> NGramResult<u64> {
        writeln!(out, "{}", self.total_count)?;
        let chunk = self.chunk_files.remove(0);
        let reader = BufReader::new(chunk);

        use io::BufRead;
        let mut emitted = 0u64;
        for line in reader.lines() {
            let line = line?;
            if let Some((count, _)) = wikicorpus_util::parse_count_line(&line) {
                emitted += count;
            }
            writeln!(out, "{line}")?;
        }

        if emitted != self.total_count {
            tracing::warn!(
                total = self.total_count,
                emitted,
                "ngram counter: emitted total does not match accumulated total"
            );
        }
        Ok(emitted)
    }
}

fn merge_to_tempfile(a: File, b: File) -> NGramResult<File> {
    let mut merged = tempfile::tempfile()?;
    {
        let mut w = BufWriter::new(&mut merged);
        wikicorpus_merge::merge_counts(BufReader::new(a), BufReader::new(b), &mut w)?;
        w.flush()?;
    }
    merged.seek(SeekFrom::Start(0))?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bigram_windows_include_sentence_boundaries() {
        let grams = ngrams("the cat sat", 2);
        assert_eq!(
            grams,
            vec!["<s> the", "the cat", "cat sat", "sat </s>"]
        );
    }

    #[test]
    fn trigram_windows_pad_with_two_start_markers() {
        let grams = ngrams("a b", 3);
        assert_eq!(grams, vec!["<s> <s> a", "<s> a b", "a b </s>"]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut counter = NGramCounter::new(2, 10 * 1024 * 1024);
        counter.count("   \t\n").unwrap();
        assert_eq!(counter.total_count(), 0);
    }

    #[test]
    fn counts_and_emits_total_header() {
        let mut counter = NGramCounter::new(2, 10 * 1024 * 1024);
        counter.count("the cat sat").unwrap();
        counter.count("the cat ran").unwrap();

        let mut out = Vec::new();
        let emitted = counter.close(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        let total: u64 = lines.next().unwrap().parse().unwrap();
        assert_eq!(total, emitted);

        let records: Vec<&str> = lines.collect();
        assert!(records.windows(2).all(|w| w[0] < w[1]), "records not sorted: {records:?}");
        assert!(records.iter().any(|r| r.ends_with("the cat")));
    }

    #[test]
    fn counting_after_close_errors() {
        let mut counter = NGramCounter::new(2, 10 * 1024 * 1024);
        counter.count("a b").unwrap();
        let mut out = Vec::new();
        // Can't reuse `counter` after close (it consumes self), so build a
        // second instance to exercise the closed-state error path via a
        // manual flag check.
        let _ = counter.close(&mut out).unwrap();
        let mut counter2 = NGramCounter::new(2, 10 * 1024 * 1024);
        counter2.closed = true;
        assert!(matches!(counter2.count("a b"), Err(NGramError::Closed)));
    }

    #[test]
    fn tiny_chunk_budget_forces_multiple_chunk_merges() {
        // A tiny max_chunk_size forces end_chunk() after nearly every
        // line, exercising the eager three-chunk-compaction path.
        let mut counter = NGramCounter::new(2, 64);
        for line in ["the cat sat", "the dog ran", "a cat ran", "the cat sat again"] {
            counter.count(line).unwrap();
        }
        let mut out = Vec::new();
        let emitted = counter.close(&mut out).unwrap();
        assert_eq!(emitted, counter_total_for(&["the cat sat", "the dog ran", "a cat ran", "the cat sat again"]));
    }

    fn counter_total_for(lines: &[&str]) -> u64 {
        lines.iter().map(|l| ngrams(l, 2).len() as u64).sum()
    }
}
