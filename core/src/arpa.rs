//! ARPA back-off language model parsing.
//!
//! An ARPA file is read line by line. `\<n>-grams:` markers switch the current
//! order, and every data line below a marker holds a base-10 log-probability,
//! `n` symbols and, optionally, a base-10 back-off weight:
//!
//! ```text
//! \data\
//! ngram 1=2
//! ngram 2=1
//!
//! \1-grams:
//! -1.0	a	-0.5
//! -2.0	b
//!
//! \2-grams:
//! -0.3	a b
//!
//! \end\
//! ```
//!
//! [`ArpaReader`] streams the entries in file order; [`ArpaModel`] collects them
//! into an immutable lookup table keyed by the space-joined n-gram.
use crate::encoding::Encoding;
use crate::error::ModelError;
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, trace, warn};

/// Separator between symbols in an n-gram key.
pub const SEPARATOR: char = ' ';

/// Log-probability and optional back-off weight of one n-gram (both log10).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NgramEntry {
    pub log_prob: f64,
    pub backoff: Option<f64>,
}

impl NgramEntry {
    pub fn new(log_prob: f64, backoff: Option<f64>) -> Self {
        Self { log_prob, backoff }
    }
}

/// One data line of an ARPA file.
#[derive(Debug, Clone, PartialEq)]
pub struct ArpaEntry {
    /// Order of the section the line appeared in.
    pub order: usize,
    pub tokens: Vec<String>,
    pub log_prob: f64,
    pub backoff: Option<f64>,
}

impl ArpaEntry {
    /// Lookup key: the symbols joined by [`SEPARATOR`].
    pub fn key(&self) -> String {
        self.tokens.join(" ")
    }

    pub fn entry(&self) -> NgramEntry {
        NgramEntry::new(self.log_prob, self.backoff)
    }
}

enum Line {
    Skip,
    Entry(ArpaEntry),
    End,
}

/// Streaming parser yielding the entries of an ARPA file in file order.
///
/// Iteration stops at `\end\` or end of input. The first error is returned
/// once and ends the iteration.
pub struct ArpaReader<R> {
    reader: R,
    encoding: Encoding,
    buf: Vec<u8>,
    line: usize,
    curr_n: Option<usize>,
    max_order: usize,
    declared: BTreeMap<usize, u64>,
    done: bool,
}

impl<R: BufRead> ArpaReader<R> {
    pub fn new(reader: R, encoding: Encoding) -> Self {
        Self {
            reader,
            encoding,
            buf: Vec::new(),
            line: 0,
            curr_n: None,
            max_order: 0,
            declared: BTreeMap::new(),
            done: false,
        }
    }

    /// Counts from the `ngram <order>=<count>` header lines read so far.
    pub fn declared_counts(&self) -> &BTreeMap<usize, u64> {
        &self.declared
    }

    /// Highest order marker seen so far.
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line
    }

    fn classify(&mut self, text: &str) -> Result<Line, ModelError> {
        let line = text.trim();
        if line.is_empty() || line.starts_with(r"\data") {
            return Ok(Line::Skip);
        }
        if line.starts_with(r"\interpolated") {
            return Err(ModelError::Interpolated { line: self.line });
        }
        if line.starts_with(r"\end") {
            return Ok(Line::End);
        }
        if line.starts_with("ngram") {
            self.record_count(line);
            return Ok(Line::Skip);
        }
        if let Some(marker) = line.strip_prefix('\\') {
            let order = marker
                .split_once('-')
                .and_then(|(n, _)| n.trim().parse::<usize>().ok())
                .filter(|&n| n > 0)
                .ok_or_else(|| ModelError::InvalidSection {
                    line: self.line,
                    text: line.to_string(),
                })?;
            debug!(line = self.line, order, "entering n-gram section");
            self.curr_n = Some(order);
            self.max_order = self.max_order.max(order);
            return Ok(Line::Skip);
        }

        match self.curr_n {
            Some(order) => parse_data_line(line, order, self.line).map(Line::Entry),
            None => {
                trace!(line = self.line, "ignoring line before the first section");
                Ok(Line::Skip)
            }
        }
    }

    fn record_count(&mut self, line: &str) {
        let parsed = line["ngram".len()..]
            .split_once('=')
            .and_then(|(n, c)| Some((n.trim().parse::<usize>().ok()?, c.trim().parse::<u64>().ok()?)));
        match parsed {
            Some((order, count)) => {
                self.declared.insert(order, count);
            }
            None => debug!(line = self.line, "unreadable count declaration {:?}", line),
        }
    }
}

impl<R: BufRead> Iterator for ArpaReader<R> {
    type Item = Result<ArpaEntry, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    let buf = std::mem::take(&mut self.buf);
                    let classified = match self.encoding.decode(&buf) {
                        Some(text) => self.classify(&text),
                        None => Err(ModelError::Encoding { line: self.line }),
                    };
                    self.buf = buf;
                    match classified {
                        Ok(Line::Skip) => {}
                        Ok(Line::Entry(entry)) => return Some(Ok(entry)),
                        Ok(Line::End) => self.done = true,
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
                Err(source) => {
                    self.done = true;
                    return Some(Err(ModelError::Read {
                        line: self.line + 1,
                        source,
                    }));
                }
            }
        }
        None
    }
}

fn parse_number(field: &str, line: usize) -> Result<f64, ModelError> {
    field.parse::<f64>().map_err(|_| ModelError::InvalidNumber {
        line,
        field: field.to_string(),
    })
}

/// Split a data line into probability, `order` symbols and optional back-off.
///
/// The probability is separated from the symbols by a tab when the line has
/// one, otherwise by a space.
fn parse_data_line(line: &str, order: usize, line_no: usize) -> Result<ArpaEntry, ModelError> {
    let separator = if line.contains('\t') { '\t' } else { ' ' };
    let (prob, rest) = line.split_once(separator).unwrap_or((line, ""));
    let log_prob = parse_number(prob.trim(), line_no)?;

    let mut tokens: Vec<String> = rest.split_whitespace().map(str::to_owned).collect();
    let backoff = match tokens.len() {
        n if n == order => None,
        n if n == order + 1 => match tokens.pop() {
            Some(bo) => Some(parse_number(&bo, line_no)?),
            None => None,
        },
        found => {
            return Err(ModelError::TokenCount {
                line: line_no,
                expected: order,
                found,
            })
        }
    };

    Ok(ArpaEntry {
        order,
        tokens,
        log_prob,
        backoff,
    })
}

/// Immutable n-gram table of a back-off model.
///
/// Keys are symbol sequences joined by [`SEPARATOR`]. When the same key is
/// declared twice the last declaration wins.
#[derive(Debug, Clone, Default)]
pub struct ArpaModel {
    entries: AHashMap<String, NgramEntry>,
    max_order: usize,
    declared: BTreeMap<usize, u64>,
}

impl ArpaModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a model from an ARPA file.
    pub fn load<P: AsRef<Path>>(path: P, encoding: Encoding) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_reader(BufReader::new(file), encoding)?;
        info!(
            path = %path.display(),
            entries = model.len(),
            order = model.max_order(),
            "loaded ARPA model"
        );
        Ok(model)
    }

    /// Parse a model from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R, encoding: Encoding) -> Result<Self, ModelError> {
        let mut reader = ArpaReader::new(reader, encoding);
        let mut model = Self::new();
        let mut parsed: BTreeMap<usize, u64> = BTreeMap::new();

        for entry in reader.by_ref() {
            let entry = entry?;
            *parsed.entry(entry.order).or_default() += 1;
            let key = entry.key();
            if let Some(previous) = model.entries.insert(key.clone(), entry.entry()) {
                debug!(ngram = %key, ?previous, "n-gram declared twice, keeping the last one");
            }
        }

        for (&order, &count) in reader.declared_counts() {
            let found = parsed.get(&order).copied().unwrap_or(0);
            if found != count {
                warn!(order, declared = count, found, "n-gram count differs from header");
            }
        }

        model.max_order = reader.max_order();
        model.declared = reader.declared_counts().clone();
        Ok(model)
    }

    /// Insert or replace an entry. Returns the replaced entry, if any.
    pub fn insert(&mut self, key: impl Into<String>, entry: NgramEntry) -> Option<NgramEntry> {
        let key = key.into();
        if !key.is_empty() {
            self.max_order = self.max_order.max(key.split(SEPARATOR).count());
        }
        self.entries.insert(key, entry)
    }

    pub fn get(&self, key: &str) -> Option<NgramEntry> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn log_prob(&self, key: &str) -> Option<f64> {
        self.entries.get(key).map(|e| e.log_prob)
    }

    /// Back-off weight of `key`. `None` if the key is absent or has no weight.
    pub fn backoff(&self, key: &str) -> Option<f64> {
        self.entries.get(key).and_then(|e| e.backoff)
    }

    /// Highest n-gram order of the model.
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Count declared for `order` in the `\data\` header.
    pub fn declared_count(&self, order: usize) -> Option<u64> {
        self.declared.get(&order).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NgramEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromStr for ArpaModel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes(), Encoding::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIGRAM_MODEL: &str = "\\data\\\nngram 1=3\nngram 2=2\n\n\\1-grams:\n-1.0\ta\t-0.5\n-2.0\tb\n-0.7\t</s>\n\n\\2-grams:\n-0.3\ta b\n-0.2\tb a\n\n\\end\\\n";

    #[test]
    fn parses_entries_and_backoff_weights() {
        let model: ArpaModel = BIGRAM_MODEL.parse().expect("parse");
        assert_eq!(model.len(), 5);
        assert_eq!(model.max_order(), 2);
        assert_eq!(model.get("a"), Some(NgramEntry::new(-1.0, Some(-0.5))));
        assert_eq!(model.get("b"), Some(NgramEntry::new(-2.0, None)));
        assert_eq!(model.log_prob("a b"), Some(-0.3));
        assert_eq!(model.backoff("a"), Some(-0.5));
        assert_eq!(model.backoff("b"), None);
        assert_eq!(model.backoff("missing"), None);
        assert_eq!(model.declared_count(1), Some(3));
        assert_eq!(model.declared_count(2), Some(2));
        assert_eq!(model.declared_count(3), None);
    }

    #[test]
    fn space_separated_lines_are_accepted() {
        let text = "\\data\\\n\\1-grams:\n-1.5 x -0.25\n\\2-grams:\n-0.5 x y\n\\end\\\n";
        let model: ArpaModel = text.parse().expect("parse");
        assert_eq!(model.get("x"), Some(NgramEntry::new(-1.5, Some(-0.25))));
        assert_eq!(model.get("x y"), Some(NgramEntry::new(-0.5, None)));
    }

    #[test]
    fn tab_separated_backoff_on_higher_order() {
        let text = "\\2-grams:\n-0.4\tp q\t-0.1\n";
        let model: ArpaModel = text.parse().expect("parse");
        assert_eq!(model.get("p q"), Some(NgramEntry::new(-0.4, Some(-0.1))));
    }

    #[test]
    fn interpolated_model_is_rejected() {
        let text = "\\data\\\n\\interpolated\n\\1-grams:\n-1.0\ta\n";
        let err = text.parse::<ArpaModel>().unwrap_err();
        assert!(matches!(err, ModelError::Interpolated { line: 2 }));
        assert!(err.is_format_error());
    }

    #[test]
    fn bad_probability_is_a_hard_error() {
        let text = "\\1-grams:\n-1.0\ta\nabc\tb\n";
        let err = text.parse::<ArpaModel>().unwrap_err();
        match err {
            ModelError::InvalidNumber { line, field } => {
                assert_eq!(line, 3);
                assert_eq!(field, "abc");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bad_backoff_is_a_hard_error() {
        let text = "\\1-grams:\n-1.0\ta\tzz\n";
        assert!(matches!(
            text.parse::<ArpaModel>(),
            Err(ModelError::InvalidNumber { line: 2, .. })
        ));
    }

    #[test]
    fn wrong_symbol_count_is_rejected() {
        let text = "\\2-grams:\n-1.0\ta\n";
        assert!(matches!(
            text.parse::<ArpaModel>(),
            Err(ModelError::TokenCount {
                line: 2,
                expected: 2,
                found: 1
            })
        ));
        let text = "\\1-grams:\n-1.0\ta b c\n";
        assert!(matches!(
            text.parse::<ArpaModel>(),
            Err(ModelError::TokenCount { found: 3, .. })
        ));
    }

    #[test]
    fn unknown_marker_is_rejected() {
        let text = "\\bogus\n";
        assert!(matches!(
            text.parse::<ArpaModel>(),
            Err(ModelError::InvalidSection { line: 1, .. })
        ));
    }

    #[test]
    fn lines_before_first_section_are_ignored() {
        let text = "some preamble\n-1.0 a\n\\data\\\nngram 1=1\n\\1-grams:\n-2.0 b\n\\end\\\n";
        let model: ArpaModel = text.parse().expect("parse");
        assert_eq!(model.len(), 1);
        assert!(!model.contains("a"));
        assert_eq!(model.log_prob("b"), Some(-2.0));
    }

    #[test]
    fn nothing_after_end_marker_is_read() {
        let text = "\\1-grams:\n-1.0 a\n\\end\\\n-2.0 b\nnot even a number\n";
        let model: ArpaModel = text.parse().expect("parse");
        assert_eq!(model.len(), 1);
        assert!(!model.contains("b"));
    }

    #[test]
    fn duplicate_declaration_last_wins() {
        let text = "\\1-grams:\n-1.0 a -0.2\n-3.0 a\n";
        let model: ArpaModel = text.parse().expect("parse");
        assert_eq!(model.len(), 1);
        assert_eq!(model.get("a"), Some(NgramEntry::new(-3.0, None)));
    }

    #[test]
    fn reader_yields_entries_in_file_order() {
        let mut reader = ArpaReader::new(BIGRAM_MODEL.as_bytes(), Encoding::Utf8);
        let keys: Vec<(usize, String)> = reader
            .by_ref()
            .map(|e| e.map(|e| (e.order, e.key())))
            .collect::<Result<_, _>>()
            .expect("parse");
        assert_eq!(
            keys,
            vec![
                (1, "a".to_string()),
                (1, "b".to_string()),
                (1, "</s>".to_string()),
                (2, "a b".to_string()),
                (2, "b a".to_string()),
            ]
        );
        assert_eq!(reader.max_order(), 2);
        assert_eq!(reader.declared_counts().get(&1), Some(&3));
    }

    #[test]
    fn reader_stops_after_first_error() {
        let text = "\\1-grams:\nx a\n-1.0 b\n";
        let mut reader = ArpaReader::new(text.as_bytes(), Encoding::Utf8);
        assert!(matches!(reader.next(), Some(Err(ModelError::InvalidNumber { .. }))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn latin1_model_decodes_symbols() {
        let mut bytes = b"\\1-grams:\n-1.0\t".to_vec();
        bytes.push(0xe4);
        bytes.extend_from_slice(b"\n");
        let model = ArpaModel::from_reader(&bytes[..], Encoding::Latin1).expect("parse");
        assert_eq!(model.log_prob("ä"), Some(-1.0));

        let err = ArpaModel::from_reader(&bytes[..], Encoding::Utf8).unwrap_err();
        assert!(matches!(err, ModelError::Encoding { line: 2 }));
    }

    #[test]
    fn manual_insert_tracks_order() {
        let mut model = ArpaModel::new();
        assert!(model.is_empty());
        model.insert("a", NgramEntry::new(-1.0, None));
        model.insert("a b c", NgramEntry::new(-0.1, None));
        assert_eq!(model.max_order(), 3);
        let replaced = model.insert("a", NgramEntry::new(-2.0, Some(-0.3)));
        assert_eq!(replaced, Some(NgramEntry::new(-1.0, None)));
        assert_eq!(model.iter().count(), 2);
    }
}
