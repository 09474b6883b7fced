use std::io::{self, BufRead, Write};

use clap::Parser;
use wikicorpus_sentences::SentenceExtractor;

/// Splits plaintext articles on stdin into one sentence per line. Articles
/// are separated by a form-feed byte on its own line; the separator is
/// preserved in the output.
#[derive(Parser, Debug)]
#[command(name = "sentences", version, about, long_about = None)]
struct Args {}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let _args = Args::parse();
    let extractor = SentenceExtractor::default();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let mut article = String::new();
    let mut articles_seen: u64 = 0;

    for line in stdin.lock().lines() {
        let line = line?;
        if line == "\x0c" {
            articles_seen += 1;
            let extracted = extractor.extract(&article);
            out.write_all(extracted.as_bytes())?;
            out.write_all(b"\n\x0c\n")?;
            article.clear();
        } else {
            article.push_str(&line);
            article.push('\n');
        }
    }

    if !article.is_empty() {
        articles_seen += 1;
        let extracted = extractor.extract(&article);
        out.write_all(extracted.as_bytes())?;
    }

    tracing::info!(articles_seen, "sentence extraction complete");
    Ok(())
}
