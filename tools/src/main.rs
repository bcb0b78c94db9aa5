use anyhow::{anyhow, Context, Result};
use arpascore_core::{normalize_scores, ArpaModel, BackoffScorer, Config, Encoding, LineScorer, ScoredLine};
use clap::Parser;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

/// Exit status when no model is given.
const EARLY_EXIT: i32 = 2;

/// Score sequences under an ARPA back-off model.
///
/// Prints `<natural-log score> <sequence>` for every input line. The label of
/// `<label> <sequence>` lines is dropped unless --keep-label is given.
#[derive(Parser)]
#[command(name = "score")]
struct Args {
    /// ARPA back-off model
    model: Option<PathBuf>,

    /// Sequences to score, one per line (default: stdin)
    input: Option<PathBuf>,

    /// TOML configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Encoding of model and input (utf8, latin1)
    #[arg(long)]
    encoding: Option<Encoding>,

    /// Decimals of the printed scores
    #[arg(long)]
    precision: Option<usize>,

    /// Print `<score> <label> <sequence>` for labelled lines (default: the label is dropped)
    #[arg(long)]
    keep_label: bool,

    /// Normalize scores over the whole batch
    #[arg(long)]
    normalize: bool,

    /// Compose input to Unicode NFC before scoring
    #[arg(long)]
    nfc: bool,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_toml(path)
                .map_err(|e| anyhow!("load config {}: {e}", path.display()))?,
            None => Config::default(),
        };
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(precision) = self.precision {
            config.precision = precision;
        }
        config.keep_label |= self.keep_label;
        config.normalize |= self.normalize;
        config.nfc |= self.nfc;
        Ok(config)
    }
}

fn write_line<W: Write>(out: &mut W, scored: &ScoredLine, config: &Config) -> io::Result<()> {
    writeln!(out, "{}", scored.format(config.precision, config.keep_label))
}

/// Score the whole input into `out`.
///
/// Returns the exit status to leave with when the process must stop early;
/// nothing is written to `out` in that case.
fn run<W: Write>(args: &Args, out: W) -> Result<Option<i32>> {
    let Some(model_path) = args.model.as_deref() else {
        return Ok(Some(EARLY_EXIT));
    };
    let config = args.config()?;

    let model = ArpaModel::load(model_path, config.encoding)
        .with_context(|| format!("load model {}", model_path.display()))?;
    let scorer = BackoffScorer::new(&model);
    let input = arpascore_tools::open_input(args.input.as_deref())?;

    let mut out = BufWriter::new(out);
    let mut pending: Vec<ScoredLine> = Vec::new();
    let mut faults = 0usize;

    let mut lines = LineScorer::new(&scorer, &config, input);
    while let Some(result) = lines.next() {
        let result = result.with_context(|| format!("read input line {}", lines.line_number() + 1))?;
        match result {
            Ok(scored) if config.normalize => pending.push(scored),
            Ok(scored) => write_line(&mut out, &scored, &config)?,
            Err(fault) => {
                faults += 1;
                eprintln!("{fault}");
            }
        }
    }

    if config.normalize {
        let mut scores: Vec<f64> = pending.iter().map(|s| s.score).collect();
        let normalizer = normalize_scores(&mut scores);
        debug!(normalizer, "normalized batch");
        for (mut scored, score) in pending.into_iter().zip(scores) {
            scored.score = score;
            write_line(&mut out, &scored, &config)?;
        }
    }

    out.flush()?;
    debug!(lines = lines.line_number(), faults, "scoring finished");
    Ok(None)
}

fn main() -> Result<()> {
    arpascore_tools::init_logging();
    let args = Args::parse();

    let stdout = io::stdout();
    if let Some(status) = run(&args, stdout.lock())? {
        std::process::exit(status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "score",
            "letters.arpa",
            "--encoding",
            "latin1",
            "--precision",
            "3",
            "--keep-label",
        ])
        .unwrap();
        let config = args.config().unwrap();
        assert_eq!(config.encoding, Encoding::Latin1);
        assert_eq!(config.precision, 3);
        assert!(config.keep_label);
        assert!(!config.normalize);
        assert_eq!(args.model, Some(PathBuf::from("letters.arpa")));
        assert!(args.input.is_none());
    }

    #[test]
    fn model_argument_is_optional() {
        let args = Args::try_parse_from(["score"]).unwrap();
        assert!(args.model.is_none());
        assert_eq!(args.config().unwrap(), Config::default());
    }

    #[test]
    fn help_states_label_default() {
        use clap::CommandFactory;
        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("--keep-label"));
        assert!(help.contains("the label is dropped"));
    }

    #[test]
    fn missing_model_exits_early() {
        let args = Args::try_parse_from(["score"]).unwrap();
        let mut out = Vec::new();
        assert_eq!(run(&args, &mut out).unwrap(), Some(EARLY_EXIT));
        assert!(out.is_empty());
    }

    #[test]
    fn scores_input_file_into_writer() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("letters.arpa");
        let input = dir.path().join("words.txt");
        std::fs::write(&model, "\\1-grams:\n-1.0\ta\n-2.0\tb\n\\end\\\n").unwrap();
        std::fs::write(&input, "w1 ab\nba\n").unwrap();

        let args = Args::try_parse_from([
            "score",
            model.to_str().unwrap(),
            input.to_str().unwrap(),
            "--precision",
            "2",
            "--keep-label",
        ])
        .unwrap();
        let mut out = Vec::new();
        assert_eq!(run(&args, &mut out).unwrap(), None);
        assert_eq!(String::from_utf8(out).unwrap(), "-6.91 w1 ab\n-6.91 ba\n");
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(Args::try_parse_from(["score", "m.arpa", "--encoding", "koi8"]).is_err());
    }
}
