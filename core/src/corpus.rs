// core/src/corpus.rs
//
// Converters around the model: word lists to letter-level training corpora,
// and flat (uniform) initial tables over a symbol vocabulary.

use crate::error::CorpusError;
use ahash::AHashSet;
use std::fmt;
use std::io::BufRead;

pub const SENTENCE_START: &str = "<s>";
pub const SENTENCE_END: &str = "</s>";

/// A word and its optional count from a word list line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordlistEntry {
    pub word: String,
    pub count: Option<String>,
}

// Plain decimal numbers only; "inf" and "nan" are words.
fn is_count(field: &str) -> bool {
    field.chars().all(|c| c.is_ascii_digit() || c == '.') && field.parse::<f64>().is_ok()
}

/// Parse `<word>`, `<count> <word>` or `<word> <count>`.
///
/// Returns `Ok(None)` for blank lines. `line_no` is only used in errors.
pub fn parse_wordlist_line(line: &str, line_no: usize) -> Result<Option<WordlistEntry>, CorpusError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [] => Ok(None),
        [word] => Ok(Some(WordlistEntry {
            word: word.to_string(),
            count: None,
        })),
        [first, second] if is_count(first) => Ok(Some(WordlistEntry {
            word: second.to_string(),
            count: Some(first.to_string()),
        })),
        [first, second] if is_count(second) => Ok(Some(WordlistEntry {
            word: first.to_string(),
            count: Some(second.to_string()),
        })),
        _ => Err(CorpusError::TooManyFields { line: line_no }),
    }
}

/// Training line for one word: the count (or the word when there is none),
/// then the word's letters between sentence markers.
///
/// `corpus_line("cat", None)` is `"cat <s> c a t </s>"`.
pub fn corpus_line(word: &str, count: Option<&str>) -> String {
    let mut out = String::with_capacity(word.len() * 2 + 16);
    out.push_str(count.unwrap_or(word));
    out.push(' ');
    out.push_str(SENTENCE_START);
    for c in word.chars() {
        out.push(' ');
        out.push(c);
    }
    out.push(' ');
    out.push_str(SENTENCE_END);
    out
}

impl WordlistEntry {
    pub fn corpus_line(&self) -> String {
        corpus_line(&self.word, self.count.as_deref())
    }
}

/// Read the vocabulary of a substring list: the second field of every
/// non-blank line, first occurrence order, duplicates dropped.
pub fn read_vocabulary<R: BufRead>(reader: R) -> Result<Vec<String>, CorpusError> {
    let mut seen = AHashSet::new();
    let mut vocab = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let symbol = line
            .split_whitespace()
            .nth(1)
            .ok_or(CorpusError::MissingField { line: i + 1 })?;
        if seen.insert(symbol.to_string()) {
            vocab.push(symbol.to_string());
        }
    }
    Ok(vocab)
}

/// Uniform distribution over a vocabulary, as natural-log probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatModel {
    log_prob: f64,
    symbols: Vec<String>,
}

impl FlatModel {
    pub fn new(symbols: Vec<String>) -> Result<Self, CorpusError> {
        if symbols.is_empty() {
            return Err(CorpusError::EmptyVocabulary);
        }
        let log_prob = (1.0 / symbols.len() as f64).ln();
        Ok(Self { log_prob, symbols })
    }

    pub fn log_prob(&self) -> f64 {
        self.log_prob
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Lines of `<logprob>\t<symbol>` with four decimals.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.symbols
            .iter()
            .map(move |s| format!("{:.4}\t{}", self.log_prob, s))
    }
}

impl fmt::Display for FlatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
