use std::io::{self, BufRead, Write};

use clap::Parser;
use wikicorpus_position::LineIndex;
use wikicorpus_textify::Textifier;

/// Strips MediaWiki markup from articles on stdin, emitting plaintext on
/// stdout. Articles are separated by a form-feed byte on its own line;
/// the separator is preserved in the output.
#[derive(Parser, Debug)]
#[command(name = "textify", version, about, long_about = None, disable_help_flag = true)]
struct Args {
    /// Drop headings instead of keeping their text
    #[arg(short = 'h', long = "ignore-headings")]
    ignore_headings: bool,

    /// Print help
    #[arg(long = "help", action = clap::ArgAction::HelpLong)]
    help: Option<bool>,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let textifier = Textifier::new(args.ignore_headings);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    let mut article = String::new();
    let mut articles_seen: u64 = 0;
    let mut articles_failed: u64 = 0;

    for line in stdin.lock().lines() {
        let line = line?;
        if line == "\x0c" {
            articles_seen += 1;
            match textifier.textify(&article) {
                Ok(plain) => {
                    out.write_all(plain.as_bytes())?;
                    out.write_all(b"\n\x0c\n")?;
                }
                Err(err) => {
                    articles_failed += 1;
                    let index = LineIndex::new(&article);
                    tracing::warn!("{}", err.render(&article, &index));
                }
            }
            article.clear();
        } else {
            article.push_str(&line);
            article.push('\n');
        }
    }

    tracing::info!(articles_seen, articles_failed, "textify complete");
    Ok(())
}
