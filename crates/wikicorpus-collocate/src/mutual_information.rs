//! Scores collocation counts by mutual information against a unigram
//! frequency table.
//!
//! Ported from `MutualInformation.cpp`: a table of unigram counts is
//! loaded into memory, then the collocation stream (already sorted by
//! first word) is consumed one group at a time — all `(w, v)` pairs
//! sharing a center word `w` are scored together and emitted sorted by
//! descending raw mutual information, normalised by `mi(w, w)`.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use wikicorpus_util::{parse_count_line, split_words};

pub struct Unigrams {
    counts: HashMap<String, u64>,
    total: u64,
}

impl Unigrams {
    /// Loads a unigram count file: header line `TOTAL`, then
    /// `count<TAB>word` records. Malformed records are skipped; repeated
    /// keys accumulate rather than overwrite.
    pub fn load<R: BufRead>(mut reader: R) -> io::Result<Self> {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let total: u64 = header.trim().parse().unwrap_or(0);

        let mut counts = HashMap::new();
        let mut errors = 0u64;
        for line in reader.lines() {
            let line = line?;
            match parse_count_line(&line) {
                Some((count, word)) => *counts.entry(word.to_string()).or_insert(0) += count,
                None => errors += 1,
            }
        }
        tracing::info!(unique = counts.len(), errors, "unigrams loaded");

        Ok(Self { counts, total })
    }

    pub fn count(&self, word: &str) -> Option<u64> {
        self.counts.get(word).copied()
    }
}

/// One scored collocation: `(normalised_mi, raw_mi, count, w, v)`.
pub struct MiRecord {
    pub normalised_mi: f64,
    pub raw_mi: f64,
    pub count: u64,
    pub w: String,
    pub v: String,
}

/// Scores every `(center, v)` pair in `counts` against `unigrams`,
/// filtering out words whose unigram count is below `count_cutoff`, and
/// returns them sorted by descending raw mutual information.
///
/// If `center` has no unigram entry, or its count is below the cutoff,
/// no records are produced. If `center` never co-occurs with itself in
/// `counts` the normalising factor is zero (matching the original, which
/// default-constructs a zero score for a missing map entry), so every
/// `normalised_mi` in the group is `+inf` or `NaN`.
pub fn score_group(center: &str, counts: &std::collections::BTreeMap<String, u64>, unigrams: &Unigrams, count_cutoff: u64) -> Vec<MiRecord> {
    let Some(c_w) = unigrams.count(center) else { return Vec::new() };
    if c_w < count_cutoff {
        return Vec::new();
    }
    let c_w = c_w as f64;
    let n = unigrams.total as f64;

    let mut raw: HashMap<&str, f64> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for (v, &c_wv) in counts {
        let Some(c_v) = unigrams.count(v) else {
            tracing::warn!(v, "unigram does not exist for collocation partner");
            continue;
        };
        if c_v < count_cutoff {
            continue;
        }
        let mi = (c_wv as f64) * n * n / (c_w * c_w * (c_v as f64));
        raw.insert(v.as_str(), mi);
        order.push(v.as_str());
    }

    let norm = raw.get(center).copied().unwrap_or(0.0);
    order.sort_by(|a, b| raw[b].partial_cmp(&raw[a]).unwrap_or(std::cmp::Ordering::Equal));

    order
        .into_iter()
        .map(|v| MiRecord {
            normalised_mi: raw[v] / norm,
            raw_mi: raw[v],
            count: counts[v],
            w: center.to_string(),
            v: v.to_string(),
        })
        .collect()
}

pub fn write_record<W: Write>(out: &mut W, r: &MiRecord) -> io::Result<()> {
    writeln!(out, "{}\t{}\t{}\t{}\t{}", r.normalised_mi, r.raw_mi, r.count, r.w, r.v)
}

/// Streams collocation records (sorted by first word) from `input`,
/// scoring and writing each center-word group as it completes.
pub fn run<R: BufRead, W: Write>(input: R, unigrams: &Unigrams, count_cutoff: u64, mut out: W) -> io::Result<()> {
    let mut current_word: Option<String> = None;
    let mut counts: std::collections::BTreeMap<String, u64> = std::collections::BTreeMap::new();

    for line in input.lines() {
        let line = line?;
        let Some((count, key)) = parse_count_line(&line) else { continue };
        let words = split_words(key);
        if words.len() != 2 {
            continue;
        }
        let (w, v) = (words[0], words[1]);

        if current_word.as_deref() != Some(w) {
            if let Some(prev) = current_word.take() {
                for r in score_group(&prev, &counts, unigrams, count_cutoff) {
                    write_record(&mut out, &r)?;
                }
            }
            counts.clear();
            current_word = Some(w.to_string());
        }
        counts.insert(v.to_string(), count);
    }

    if let Some(prev) = current_word {
        if !counts.is_empty() {
            for r in score_group(&prev, &counts, unigrams, count_cutoff) {
                write_record(&mut out, &r)?;
            }
        }
    }
    Ok(())
}
