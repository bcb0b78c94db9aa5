// Word list -> letter-level training corpus.
//
// Reads `<word>`, `<count> <word>` or `<word> <count>` lines and writes
// `<count-or-word> <s> c1 ... cn </s>` lines for an n-gram estimation tool.

use anyhow::{Context, Result};
use arpascore_core::parse_wordlist_line;
use clap::Parser;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wlist2corpus")]
struct Args {
    /// Word list (default: stdin)
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    arpascore_tools::init_logging();
    let args = Args::parse();
    let input = arpascore_tools::open_input(args.input.as_deref())?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (i, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("read line {}", i + 1))?;
        if let Some(entry) = parse_wordlist_line(&line, i + 1)? {
            writeln!(out, "{}", entry.corpus_line())?;
        }
    }
    out.flush()?;
    Ok(())
}
