//! Line-at-a-time scoring of input batches.
//!
//! Each input line holds one sequence, optionally preceded by a label: a line
//! with exactly two whitespace-separated fields is `<label> <sequence>`, any
//! other line is the sequence itself. A line that cannot be scored yields a
//! [`ScoringFault`] and the batch carries on with the next line.
use crate::encoding::Encoding;
use crate::error::ScoringFault;
use crate::scorer::BackoffScorer;
use crate::Config;
use std::io::{self, BufRead};
use unicode_normalization::UnicodeNormalization;

/// One input line split into its label and sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLine {
    pub label: Option<String>,
    pub sequence: String,
}

/// Split an input line into an optional label and the sequence to score.
pub fn parse_input_line(line: &str) -> InputLine {
    let line = line.trim();
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(label), Some(sequence), None) => InputLine {
            label: Some(label.to_string()),
            sequence: sequence.to_string(),
        },
        _ => InputLine {
            label: None,
            sequence: line.to_string(),
        },
    }
}

/// One symbol per character, NFC-composed first when `nfc` is set.
pub fn symbols(sequence: &str, nfc: bool) -> Vec<String> {
    if nfc {
        sequence.nfc().map(String::from).collect()
    } else {
        sequence.chars().map(String::from).collect()
    }
}

/// A successfully scored input line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLine {
    pub label: Option<String>,
    pub sequence: String,
    /// Natural-log score.
    pub score: f64,
}

impl ScoredLine {
    /// Render as `<score> <sequence>`, or `<score> <label> <sequence>` when
    /// `keep_label` is set and the line had a label.
    pub fn format(&self, precision: usize, keep_label: bool) -> String {
        match (&self.label, keep_label) {
            (Some(label), true) => {
                format!("{:.*} {} {}", precision, self.score, label, self.sequence)
            }
            _ => format!("{:.*} {}", precision, self.score, self.sequence),
        }
    }
}

/// Score one decoded input line.
pub fn score_line(
    scorer: &BackoffScorer<'_>,
    line: &str,
    config: &Config,
) -> Result<ScoredLine, ScoringFault> {
    let InputLine { label, sequence } = parse_input_line(line);
    let symbols = symbols(&sequence, config.nfc);
    if let Some(position) = symbols.iter().position(|s| s.trim().is_empty()) {
        return Err(ScoringFault::WhitespaceSymbol { sequence, position });
    }
    let score = scorer.score(&symbols);
    Ok(ScoredLine {
        label,
        sequence,
        score,
    })
}

/// Iterator scoring every line of a reader.
///
/// Read failures are returned as the outer `io::Error`; faults of a single
/// line are returned as the inner `Err`.
pub struct LineScorer<'a, 'm, R> {
    scorer: &'a BackoffScorer<'m>,
    config: &'a Config,
    reader: R,
    buf: Vec<u8>,
    line: usize,
}

impl<'a, 'm, R: BufRead> LineScorer<'a, 'm, R> {
    pub fn new(scorer: &'a BackoffScorer<'m>, config: &'a Config, reader: R) -> Self {
        Self {
            scorer,
            config,
            reader,
            buf: Vec::new(),
            line: 0,
        }
    }

    /// 1-based number of the last line read.
    pub fn line_number(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for LineScorer<'_, '_, R> {
    type Item = io::Result<Result<ScoredLine, ScoringFault>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line += 1;
                let result = match self.config.encoding.decode(&self.buf) {
                    Some(text) => score_line(self.scorer, &text, self.config),
                    None => Err(ScoringFault::Encoding {
                        line: self.line,
                        sequence: Encoding::Latin1
                            .decode(&self.buf)
                            .map(|s| s.trim().to_string())
                            .unwrap_or_default(),
                    }),
                };
                Some(Ok(result))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Add two natural-log probabilities: `ln(exp(a) + exp(b))`.
pub fn add_log_domain(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

/// Turn scores into a distribution over the batch by subtracting their log-sum.
/// Returns the normalizer.
pub fn normalize_scores(scores: &mut [f64]) -> f64 {
    let normalizer = scores
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &s| add_log_domain(acc, s));
    if normalizer.is_finite() {
        for s in scores.iter_mut() {
            *s -= normalizer;
        }
    }
    normalizer
}
