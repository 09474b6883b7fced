//! Multi-threaded paragraph-context collocation counter.
//!
//! Ported from the original single-threaded `Collocations.cpp`: a document
//! is a sequence of paragraphs (runs of non-blank lines separated by blank
//! lines); within a paragraph, every word of a sentence is paired with
//! every distinct word in the surrounding context (the previous and next
//! sentence) and the pair is counted. The threading model is new relative
//! to the original — it splits the input at paragraph boundaries and
//! spreads the per-split counting and pairwise merging across worker
//! pools, per the scale-up redesign this crate targets.
//!
//! Unlike the original, which reopens the input file and seeks per
//! worker, this port reads the file into memory once (it already has to
//! scan it fully to find split points) and shares it behind an `Arc<str>`;
//! each split is then a zero-copy slice, so no additional file handles or
//! seeking are needed.

pub mod mutual_information;

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::sync::{Arc, Condvar, Mutex};

use thiserror::Error;
use wikicorpus_util::{format_count_line, split_words};

/// Split workers pause taking new splits once this many merge files are
/// pending, bounding the number of simultaneously open temp files.
const MERGE_BACKPRESSURE_LIMIT: usize = 5;

#[derive(Error, Debug)]
pub enum CollocateError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Merge(#[from] wikicorpus_merge::MergeError),
    #[error("merge queue did not converge to one file")]
    NotConverged,
}

pub type CollocateResult<T> = Result<T, CollocateError>;

/// Computes paragraph-aligned split boundaries over `text`, targeting
/// `split_size` bytes per split. Split point 0 and the text length are
/// always included.
fn compute_splits(text: &str, split_size: usize) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    if len == 0 {
        return Vec::new();
    }
    let split_size = split_size.max(1);

    let mut points = vec![0usize];
    let mut target = split_size;
    while target < len {
        let mut p = target;
        while p + 1 < len && !(bytes[p] == b'\n' && bytes[p + 1] == b'\n') {
            p += 1;
        }
        points.push(p.min(len));
        target += split_size;
    }
    points.push(len);
    points.sort_unstable();
    points.dedup();

    points.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Counts collocations within one split, returning a sorted `w -> v ->
/// count` map ready for serialization.
fn count_split(text: &str) -> BTreeMap<String, BTreeMap<String, u64>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut ht: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    let mut offset = 0;
    while offset < lines.len() {
        offset = paragraph_counts(&mut ht, &lines, offset);
    }
    ht
}

/// Accumulates collocation counts for the paragraph starting at `offset`,
/// returning the index of the first line of the next paragraph.
fn paragraph_counts(
    ht: &mut BTreeMap<String, BTreeMap<String, u64>>,
    lines: &[&str],
    mut offset: usize,
) -> usize {
    while offset < lines.len() && lines[offset].trim().is_empty() {
        offset += 1;
    }

    // Sentinel empty sentences before and after so every real sentence has
    // a context on both sides.
    let mut paragraph: Vec<Vec<&str>> = vec![Vec::new()];
    while offset < lines.len() && !lines[offset].trim().is_empty() {
        paragraph.push(split_words(lines[offset]));
        offset += 1;
    }
    paragraph.push(Vec::new());

    for i in 1..paragraph.len().saturating_sub(1) {
        let mut ctx_words: BTreeSet<&str> = BTreeSet::new();
        ctx_words.extend(paragraph[i - 1].iter().copied());
        ctx_words.extend(paragraph[i + 1].iter().copied());

        for &w in &paragraph[i] {
            for &v in &ctx_words {
                *ht.entry(w.to_string()).or_default().entry(v.to_string()).or_insert(0) += 1;
            }
        }
    }

    offset
}

fn write_split_chunk(counts: &BTreeMap<String, BTreeMap<String, u64>>) -> io::Result<File> {
    let mut chunk = tempfile::tempfile()?;
    {
        let mut w = BufWriter::new(&mut chunk);
        for (word, ctx) in counts {
            for (v, count) in ctx {
                w.write_all(format_count_line(*count, &format!("{word} {v}")).as_bytes())?;
            }
        }
        w.flush()?;
    }
    chunk.seek(SeekFrom::Start(0))?;
    Ok(chunk)
}

fn merge_to_tempfile(a: File, b: File) -> CollocateResult<File> {
    let mut merged = tempfile::tempfile()?;
    {
        let mut w = BufWriter::new(&mut merged);
        wikicorpus_merge::merge_counts(BufReader::new(a), BufReader::new(b), &mut w)?;
        w.flush()?;
    }
    merged.seek(SeekFrom::Start(0))?;
    Ok(merged)
}

struct State {
    splits: Vec<(usize, usize)>,
    splits_in_progress: usize,
    merge_queue: Vec<File>,
    error: Option<String>,
}

struct Shared {
    text: Arc<str>,
    state: Mutex<State>,
    cond: Condvar,
}

fn splits_remaining(state: &State) -> bool {
    !state.splits.is_empty() || state.splits_in_progress > 0
}

fn split_worker(shared: &Shared) {
    loop {
        let (start, end) = {
            let mut state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if state.error.is_some() {
                    return;
                }
                if state.merge_queue.len() > MERGE_BACKPRESSURE_LIMIT {
                    state = shared.cond.wait(state).unwrap_or_else(|e| e.into_inner());
                    continue;
                }
                break;
            }
            match state.splits.pop() {
                Some(range) => {
                    state.splits_in_progress += 1;
                    range
                }
                None => return,
            }
        };

        let counts = count_split(&shared.text[start..end]);
        let result = write_split_chunk(&counts);

        let mut state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.splits_in_progress -= 1;
        match result {
            Ok(chunk) => state.merge_queue.push(chunk),
            Err(e) => state.error.get_or_insert_with(|| e.to_string()),
        };
        shared.cond.notify_all();
    }
}

fn merge_worker(shared: &Shared) {
    loop {
        let pair = {
            let mut state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if state.error.is_some() {
                    return;
                }
                if state.merge_queue.len() >= 2 {
                    let b = state.merge_queue.pop().unwrap();
                    let a = state.merge_queue.pop().unwrap();
                    break Some((a, b));
                }
                if !splits_remaining(&state) {
                    return;
                }
                state = shared.cond.wait(state).unwrap_or_else(|e| e.into_inner());
            }
        };

        let Some((a, b)) = pair else { continue };
        match merge_to_tempfile(a, b) {
            Ok(merged) => {
                let mut state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
                state.merge_queue.push(merged);
                tracing::info!(pending = state.merge_queue.len(), "merged one pair of collocation chunks");
                shared.cond.notify_all();
            }
            Err(e) => {
                let mut state = shared.state.lock().unwrap_or_else(|e| e.into_inner());
                state.error.get_or_insert_with(|| e.to_string());
                shared.cond.notify_all();
            }
        }
    }
}

/// Counts collocations across `text`, writing sorted `count<TAB>w<SP>v`
/// records to `out`. Splits the text at (approximately) `split_size`-byte
/// paragraph boundaries and processes them across `threads` split workers
/// and `threads` merge workers.
pub fn run_collocation<W: Write>(text: &str, split_size: usize, threads: usize, mut out: W) -> CollocateResult<u64> {
    let splits = compute_splits(text, split_size);
    if splits.is_empty() {
        return Ok(0);
    }

    let shared = Arc::new(Shared {
        text: Arc::from(text),
        state: Mutex::new(State {
            splits,
            splits_in_progress: 0,
            merge_queue: Vec::new(),
            error: None,
        }),
        cond: Condvar::new(),
    });

    let threads = threads.max(1);
    std::thread::scope(|scope| {
        for _ in 0..threads {
            let shared = Arc::clone(&shared);
            scope.spawn(move || split_worker(&shared));
        }
        for _ in 0..threads {
            let shared = Arc::clone(&shared);
            scope.spawn(move || merge_worker(&shared));
        }
    });

    let mut state = shared.state.into_inner().unwrap_or_else(|e| e.into_inner());
    if let Some(err) = state.error.take() {
        return Err(CollocateError::Io(io::Error::other(err)));
    }
    if state.merge_queue.len() != 1 {
        return Err(CollocateError::NotConverged);
    }

    let mut final_chunk = state.merge_queue.remove(0);
    let mut emitted = 0u64;
    let reader = BufReader::new(&mut final_chunk);
    for line in reader.lines() {
        let line = line?;
        if let Some((count, _)) = wikicorpus_util::parse_count_line(&line) {
            emitted += count;
        }
        writeln!(out, "{line}")?;
    }
    Ok(emitted)
}
