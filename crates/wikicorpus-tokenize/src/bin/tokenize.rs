use std::io::{self, BufRead, Write};

use clap::Parser;
use wikicorpus_tokenize::Tokenizer;

/// Splits sentence lines on stdin into a lowercased, space-delimited token
/// stream on stdout, one line of tokens per line of input.
#[derive(Parser, Debug)]
#[command(name = "tokenize", version, about, long_about = None)]
struct Args {
    /// Punctuation characters to keep in the output, surrounded by spaces
    #[arg(long, default_value = "")]
    keep: String,

    /// Keep parenthesized spans instead of eliding them
    #[arg(long)]
    parens: bool,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let mut tokenizer = Tokenizer::new(&args.keep, args.parens);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let mut lines_seen: u64 = 0;
    for line in stdin.lock().lines() {
        let line = line?;
        out.write_all(tokenizer.tokenize(&line).as_bytes())?;
        lines_seen += 1;
    }

    tracing::info!(lines_seen, "tokenization complete");
    Ok(())
}
