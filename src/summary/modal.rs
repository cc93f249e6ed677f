//! Modal share and multimodal combination rankings.

use super::{Share, shares_by_count, tally, top_n_relative};
use crate::codes;
use crate::prepare::{self, PreparedTable, TripContext, TripKind};
use serde::Serialize;
use std::collections::BTreeSet;

/// Modals listed per context in the modal-share view.
pub const TOP_MODALS: usize = 8;
/// Combinations listed in the integration view.
pub const TOP_COMBINATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalShare {
    pub context: TripContext,
    /// Top modals; percentages are relative to the listed modals only.
    pub top: Vec<Share>,
}

/// Every mention of every modal, monomodal and multimodal trips alike.
pub fn modal_share(table: &PreparedTable) -> Vec<ModalShare> {
    TripContext::ALL
        .iter()
        .map(|&context| {
            let freq = prepare::modal_frequencies(table.raw_column(context));
            let shares = freq
                .into_iter()
                .map(|(label, count)| Share {
                    label,
                    count,
                    percent: 0.0,
                })
                .collect();
            ModalShare {
                context,
                top: top_n_relative(shares, TOP_MODALS),
            }
        })
        .collect()
}

/// Canonical key for an unordered set of modal codes, e.g. `"A pé + Ônibus"`.
pub fn combination_key(modals: &[u8]) -> String {
    let names: BTreeSet<&str> = modals
        .iter()
        .map(|&m| codes::modal_name(i64::from(m)))
        .collect();
    names.into_iter().collect::<Vec<_>>().join(" + ")
}

/// Most common modal combinations across multimodal trips of all contexts.
///
/// Only trips classified multimodal whose cleaned list still holds more than
/// one code contribute.
pub fn modal_combinations(table: &PreparedTable) -> Vec<Share> {
    let keys = TripContext::ALL.iter().flat_map(|&context| {
        table
            .iter()
            .filter(move |r| r.trip(context) == TripKind::Multimodal)
            .map(move |r| r.modal_list(context))
            .filter(|list| list.len() > 1)
            .map(combination_key)
    });

    top_n_relative(shares_by_count(tally(keys)), TOP_COMBINATIONS)
}
