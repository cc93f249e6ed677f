//! Descriptive views over the prepared table.
//!
//! Each view is a pure function of [`PreparedTable`](crate::prepare::PreparedTable)
//! returning a serializable summary for the presentation layer.

pub mod crosstab;
pub mod descriptive;
pub mod modal;
pub mod overview;
pub mod trips;
mod utility;

pub use utility::{mean, pct};

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// A labelled count with its percentage of some total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// Counts occurrences of each key.
pub(crate) fn tally<K, I>(items: I) -> HashMap<K, usize>
where
    K: Eq + Hash,
    I: IntoIterator<Item = K>,
{
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

/// Turns label counts into shares, most frequent first (ties by label).
pub(crate) fn shares_by_count(counts: HashMap<String, usize>) -> Vec<Share> {
    let total: usize = counts.values().sum();
    let mut shares: Vec<Share> = counts
        .into_iter()
        .map(|(label, count)| Share {
            percent: pct(count, total),
            label,
            count,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    shares
}

/// Keeps the first `n` entries and recomputes percentages against their sum.
pub(crate) fn top_n_relative(mut shares: Vec<Share>, n: usize) -> Vec<Share> {
    shares.truncate(n);
    let total: usize = shares.iter().map(|s| s.count).sum();
    for share in &mut shares {
        share.percent = pct(share.count, total);
    }
    shares
}
