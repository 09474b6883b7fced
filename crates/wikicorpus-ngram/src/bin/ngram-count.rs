use std::io::{self, BufRead, Write};

use clap::Parser;
use wikicorpus_ngram::NGramCounter;

/// Reads whitespace-tokenized lines on stdin, emits a header line with the
/// total ngram count followed by sorted `count<TAB>ngram` records.
#[derive(Parser, Debug)]
#[command(name = "ngram-count", version, about, long_about = None)]
struct Args {
    /// Ngram size
    #[arg(short = 'n', default_value_t = 2)]
    n: usize,

    /// In-memory chunk size limit before spilling to disk, e.g. 500m, 2g
    #[arg(short = 'm', default_value = "500m")]
    max_chunk_size: String,

    /// Log chunk-merge progress
    #[arg(short = 'v')]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.n == 0 {
        anyhow::bail!("invalid ngram size: {}", args.n);
    }
    let max_chunk_size = wikicorpus_util::parse_chunk_size(&args.max_chunk_size)?;
    if max_chunk_size < 10 * 1024 * 1024 {
        tracing::warn!("very small chunk size selected, performance might suffer");
    }

    let mut counter = NGramCounter::new(args.n, max_chunk_size);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        counter.count(&line?)?;
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let emitted = counter.close(&mut out)?;
    out.flush()?;
    tracing::info!(emitted, "ngram counting complete");

    Ok(())
}
