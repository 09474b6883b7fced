use std::fs;
use std::io::{self, Write};

use clap::Parser;

/// Counts word collocations across paragraph contexts in a plaintext file.
/// Reads the whole file, splits it into roughly `-m`-sized paragraph-aligned
/// chunks, and counts/merges them across a pool of worker threads.
#[derive(Parser, Debug)]
#[command(name = "collocate", version, about, long_about = None)]
struct Args {
    /// Input file to count collocations over
    file: String,

    /// Target size, in bytes, of each split (accepts suffixes like "50m")
    #[arg(short = 'm', long = "max-split-size", default_value = "50m")]
    max_split_size: String,

    /// Number of split/merge worker threads (each side gets this many)
    #[arg(short = 't', long = "threads", default_value_t = 4)]
    threads: usize,

    /// Log merge-round progress
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

    let split_size = wikicorpus_util::parse_chunk_size(&args.max_split_size)?;
    let text = fs::read_to_string(&args.file)?;

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let emitted = wikicorpus_collocate::run_collocation(&text, split_size, args.threads, &mut out)?;
    out.flush()?;
    tracing::info!(emitted, "collocation counting complete");

    Ok(())
}
