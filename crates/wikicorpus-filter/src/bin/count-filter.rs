use std::io::{self, BufRead, Write};

use clap::Parser;
use wikicorpus_filter::CountFilter;

/// Drops count records below a threshold. Reads a `TOTAL` header line
/// followed by `count<TAB>ngram` records on stdin; writes the surviving
/// total followed by the surviving records, in input order, to stdout.
#[derive(Parser, Debug)]
#[command(name = "count-filter", version, about, long_about = None)]
struct Args {
    /// Minimum count to keep a record
    #[arg(short = 't', default_value_t = 5)]
    threshold: u64,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mut filter = CountFilter::new(args.threshold)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        filter.filter(&line?)?;
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let above = filter.close(&mut out)?;
    out.flush()?;
    tracing::info!(above, "count filtering complete");

    Ok(())
}
