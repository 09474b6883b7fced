use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use clap::Parser;
use wikicorpus_collocate::mutual_information::Unigrams;

/// Scores collocation count records (sorted by first word) on stdin against
/// a unigram count file, emitting `nmi<TAB>mi<TAB>count<TAB>w<TAB>v` records.
#[derive(Parser, Debug)]
#[command(name = "mutual-info", version, about, long_about = None)]
struct Args {
    /// Unigram count file (header line TOTAL, then count<TAB>word records)
    #[arg(long = "unigrams")]
    unigrams: String,

    /// Minimum unigram count required for either word in a pair
    #[arg(long = "ct", default_value_t = 0)]
    count_cutoff: u64,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let unigrams_file = File::open(&args.unigrams)?;
    let unigrams = Unigrams::load(BufReader::new(unigrams_file))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    wikicorpus_collocate::mutual_information::run(stdin.lock(), &unigrams, args.count_cutoff, &mut out)?;
    out.flush()?;

    Ok(())
}
