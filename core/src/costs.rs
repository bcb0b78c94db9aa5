//! Cumulative prefix costs of the n-grams in an ARPA file.
//!
//! Every n-gram gets its own log-probability plus the accumulated cost of its
//! `(n-1)`-symbol prefix, so the value of `abc` is `lp(a) + lp(ab) + lp(abc)`.
//! Keys are the symbols concatenated without a separator.
use crate::arpa::ArpaReader;
use crate::error::ModelError;
use ahash::AHashMap;
use std::io::BufRead;

/// Accumulated costs in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefixCosts {
    order: Vec<String>,
    costs: AHashMap<String, f64>,
}

impl PrefixCosts {
    /// Consume all entries of `reader`.
    ///
    /// A prefix must be declared before the n-grams extending it. A key seen
    /// again keeps its first position and takes the new cost.
    pub fn from_arpa<R: BufRead>(mut reader: ArpaReader<R>) -> Result<Self, ModelError> {
        let mut out = Self::default();
        while let Some(entry) = reader.next() {
            let entry = entry?;
            let prefix_cost = match entry.tokens.len() {
                0 | 1 => 0.0,
                n => {
                    let prefix = entry.tokens[..n - 1].concat();
                    out.get(&prefix).ok_or_else(|| ModelError::MissingPrefix {
                        line: reader.line_number(),
                        ngram: entry.key(),
                    })?
                }
            };
            let key = entry.tokens.concat();
            let cost = prefix_cost + entry.log_prob;
            if out.costs.insert(key.clone(), cost).is_none() {
                out.order.push(key);
            }
        }
        Ok(out)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.costs.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.order
            .iter()
            .filter_map(move |k| self.costs.get(k).map(|&c| (k.as_str(), c)))
    }

    /// Lines of `<cost> <key>` with four decimals.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.iter().map(|(k, c)| format!("{c:.4} {k}"))
    }
}
