use std::fs::File;
use std::io::{self, BufReader, BufWriter};

use clap::Parser;

/// Merges two sorted count files into one, summing counts on key collision.
#[derive(Parser, Debug)]
#[command(name = "merge-counts", version, about, long_about = None)]
struct Args {
    /// First sorted count file
    file1: String,

    /// Second sorted count file
    file2: String,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    tracing::info!(file1 = %args.file1, file2 = %args.file2, "merging count files");

    let src1 = BufReader::new(File::open(&args.file1)?);
    let src2 = BufReader::new(File::open(&args.file2)?);
    let stdout = io::stdout();
    let out = BufWriter::new(stdout.lock());

    let total = wikicorpus_merge::merge_counts(src1, src2, out)?;
    tracing::info!(total, "merge complete");

    Ok(())
}
