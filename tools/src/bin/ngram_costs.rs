use anyhow::{Context, Result};
use arpascore_core::{ArpaReader, Encoding, PrefixCosts};
use clap::Parser;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Print the accumulated prefix cost of every n-gram of an ARPA file.
#[derive(Parser)]
#[command(name = "ngram_costs")]
struct Args {
    /// ARPA back-off model
    model: PathBuf,

    /// Encoding of the model (utf8, latin1)
    #[arg(long, default_value = "utf8")]
    encoding: Encoding,
}

fn main() -> Result<()> {
    arpascore_tools::init_logging();
    let args = Args::parse();
    let input = arpascore_tools::open_input(Some(args.model.as_path()))?;
    let costs = PrefixCosts::from_arpa(ArpaReader::new(input, args.encoding))
        .with_context(|| format!("read {}", args.model.display()))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for line in costs.lines() {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
