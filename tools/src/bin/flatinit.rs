use anyhow::{Context, Result};
use arpascore_core::{read_vocabulary, FlatModel};
use clap::Parser;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Uniform initial table over the substrings of a `<count> <substring>` list.
///
/// Writes `<ln(1/|V|)>\t<substring>` per distinct substring.
#[derive(Parser)]
#[command(name = "flatinit")]
struct Args {
    /// Substring list
    substrings: PathBuf,
}

fn main() -> Result<()> {
    arpascore_tools::init_logging();
    let args = Args::parse();
    let input = arpascore_tools::open_input(Some(args.substrings.as_path()))?;
    let vocab = read_vocabulary(input)
        .with_context(|| format!("read {}", args.substrings.display()))?;
    tracing::info!(symbols = vocab.len(), "read vocabulary");
    let flat = FlatModel::new(vocab)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for line in flat.lines() {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
