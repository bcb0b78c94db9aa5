// core/src/error.rs
//
// Error types for model loading, per-line scoring and the corpus helpers.

use std::io;
use std::path::PathBuf;

/// Failure while loading or parsing an ARPA model.
///
/// Everything except [`ModelError::Io`] and [`ModelError::Read`] is a format
/// error: the file was readable but its content cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("cannot open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read error at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: model is in interpolated format, only back-off models are supported")]
    Interpolated { line: usize },

    #[error("line {line}: invalid number {field:?}")]
    InvalidNumber { line: usize, field: String },

    #[error("line {line}: unrecognized section marker {text:?}")]
    InvalidSection { line: usize, text: String },

    #[error("line {line}: expected {expected} or {} symbols, found {found}", .expected + 1)]
    TokenCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid character encoding")]
    Encoding { line: usize },

    #[error("line {line}: prefix of {ngram:?} was not declared earlier")]
    MissingPrefix { line: usize, ngram: String },
}

impl ModelError {
    /// True for content errors, false for file access errors.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, ModelError::Io { .. } | ModelError::Read { .. })
    }
}

/// Non-fatal failure to score one input line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringFault {
    #[error("error scoring: {sequence} (line {line} is not valid in the input encoding)")]
    Encoding { line: usize, sequence: String },

    #[error("error scoring: {sequence} (whitespace symbol at position {position})")]
    WhitespaceSymbol { sequence: String, position: usize },
}

impl ScoringFault {
    /// The sequence that could not be scored.
    pub fn sequence(&self) -> &str {
        match self {
            ScoringFault::Encoding { sequence, .. } => sequence,
            ScoringFault::WhitespaceSymbol { sequence, .. } => sequence,
        }
    }
}

/// Failure in the word list and vocabulary converters.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: expected at most two fields with one numeric count")]
    TooManyFields { line: usize },

    #[error("line {line}: expected at least two fields")]
    MissingField { line: usize },

    #[error("vocabulary is empty")]
    EmptyVocabulary,
}
