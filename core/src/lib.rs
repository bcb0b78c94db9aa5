//! arpascore-core
//!
//! Scores symbol sequences (typically the letters of a word) under an n-gram
//! back-off language model stored in the ARPA text format.
//!
//! Public API:
//! - `ArpaModel` - Immutable n-gram table loaded from an ARPA file
//! - `ArpaReader` - Streaming parser over the entries of an ARPA file
//! - `BackoffScorer` - Katz back-off scoring with right-anchored context shrinking
//! - `LineScorer` - Line-at-a-time batch scoring with per-line faults
//! - `PrefixCosts`, `FlatModel`, `corpus_line` - Model-side converters
//! - `Config` - Scoring options with TOML persistence
//!
//! ```
//! use arpascore_core::{ArpaModel, BackoffScorer};
//!
//! let model: ArpaModel = "\\1-grams:\n-1.0\ta\n-2.0\tb\n\\end\\\n".parse().unwrap();
//! let scorer = BackoffScorer::new(&model);
//! let score = scorer.score(&["a", "b"]);
//! assert!((score - (-3.0 * std::f64::consts::LN_10)).abs() < 1e-9);
//! ```
use serde::{Deserialize, Serialize};

pub mod arpa;
pub use arpa::{ArpaEntry, ArpaModel, ArpaReader, NgramEntry};

pub mod scorer;
pub use scorer::{score, BackoffScorer};

pub mod batch;
pub use batch::{normalize_scores, parse_input_line, score_line, InputLine, LineScorer, ScoredLine};

pub mod costs;
pub use costs::PrefixCosts;

pub mod corpus;
pub use corpus::{corpus_line, parse_wordlist_line, read_vocabulary, FlatModel, WordlistEntry};

pub mod encoding;
pub use encoding::Encoding;

pub mod error;
pub use error::{CorpusError, ModelError, ScoringFault};

/// Options for loading models and scoring input batches.
///
/// Missing keys in a TOML file take their default values.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Encoding of the model and the input sequences
    pub encoding: Encoding,
    /// Decimals of the printed scores
    pub precision: usize,
    /// Print the label field of `<label> <sequence>` lines
    pub keep_label: bool,
    /// Subtract the log-sum of all scores of the batch from each score
    pub normalize: bool,
    /// Compose sequences to Unicode NFC before splitting them into symbols
    pub nfc: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            precision: 6,
            keep_label: false,
            normalize: false,
            nfc: false,
        }
    }
}

impl Config {
    /// Read scoring options from a TOML file such as `score.toml`.
    ///
    /// Keys missing from the file keep their defaults; an unknown encoding name
    /// is an error.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    /// Write these scoring options to `path`, replacing the file.
    pub fn save_toml<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parse scoring options, e.g. `encoding = "latin1"`.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// All options as TOML, defaults included.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
