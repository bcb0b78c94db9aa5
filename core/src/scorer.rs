// core/src/scorer.rs
//
// Katz back-off scoring of a symbol sequence against an ARPA model.

use crate::arpa::{ArpaModel, SEPARATOR};
use std::f64::consts::LN_10;

/// Scores symbol sequences against a loaded back-off model.
///
/// The scorer only borrows the model, so one model can serve any number of
/// scorers, including scorers on other threads.
#[derive(Debug, Clone, Copy)]
pub struct BackoffScorer<'m> {
    model: &'m ArpaModel,
}

impl<'m> BackoffScorer<'m> {
    pub fn new(model: &'m ArpaModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &'m ArpaModel {
        self.model
    }

    /// Total natural-log probability of `symbols`.
    ///
    /// The base-10 contributions of all positions are summed first and the sum
    /// is converted to natural log once.
    pub fn score<S: AsRef<str>>(&self, symbols: &[S]) -> f64 {
        self.score_log10(symbols) * LN_10
    }

    /// Total base-10 log probability of `symbols`. Empty input scores `0.0`.
    pub fn score_log10<S: AsRef<str>>(&self, symbols: &[S]) -> f64 {
        if symbols.is_empty() {
            return 0.0;
        }
        let mut key = String::new();
        (0..symbols.len())
            .map(|i| self.position_log10(symbols, i, &mut key))
            .sum()
    }

    /// Base-10 contribution of the symbol at position `i`.
    ///
    /// The n-gram window ends at `i` and is shortened from the left until it
    /// is in the model. Each time it is not, the back-off weight of its context
    /// (the window without its last symbol) is added. The loop ends on the first
    /// n-gram found or when the window is empty; in the latter case only the
    /// collected back-off weights are contributed.
    ///
    /// Windows longer than `max_order + 1` are never looked up: neither they nor
    /// their contexts can be in the table.
    pub fn position_log10<S: AsRef<str>>(&self, symbols: &[S], i: usize, key: &mut String) -> f64 {
        let mut total = 0.0;
        let first = (i + 1).saturating_sub(self.model.max_order() + 1);
        for start in first..=i {
            join_into(key, &symbols[start..=i]);
            if let Some(log_prob) = self.model.log_prob(key) {
                return total + log_prob;
            }
            if start < i {
                join_into(key, &symbols[start..i]);
                if let Some(backoff) = self.model.backoff(key) {
                    total += backoff;
                }
            }
        }
        total
    }
}

/// Natural-log score of `symbols` under `model`.
pub fn score<S: AsRef<str>>(symbols: &[S], model: &ArpaModel) -> f64 {
    BackoffScorer::new(model).score(symbols)
}

fn join_into<S: AsRef<str>>(key: &mut String, symbols: &[S]) {
    key.clear();
    for (i, s) in symbols.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.push_str(s.as_ref());
    }
}
