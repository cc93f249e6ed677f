//! Cross-tabulations of work modals against neighbourhood and demographics.

use crate::codes::{INCOME, MODAL};
use crate::prepare::{PreparedRecord, PreparedTable};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Neighbourhoods kept in the location heatmap.
pub const TOP_LOCATION_ROWS: usize = 20;

/// Income brackets shown in the demographic view (paid brackets only).
pub const PAID_INCOME_CODES: [i64; 7] = [1, 2, 3, 4, 5, 6, 7];

/// Dense row × column table. Columns are sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CrossTab {
    /// Counts `(row, column)` pairs. Rows come out sorted by name.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut cells: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        let mut columns: BTreeSet<String> = BTreeSet::new();

        for (row, col) in pairs {
            columns.insert(col.clone());
            *cells.entry(row).or_default().entry(col).or_insert(0) += 1;
        }

        let columns: Vec<String> = columns.into_iter().collect();
        let mut rows = Vec::with_capacity(cells.len());
        let mut values = Vec::with_capacity(cells.len());
        for (row, counts) in cells {
            values.push(
                columns
                    .iter()
                    .map(|c| counts.get(c).copied().unwrap_or(0) as f64)
                    .collect(),
            );
            rows.push(row);
        }

        Self {
            rows,
            columns,
            values,
        }
    }

    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|x| x == row)?;
        let c = self.columns.iter().position(|x| x == column)?;
        Some(self.values[r][c])
    }

    pub fn row_total(&self, row: usize) -> f64 {
        self.values[row].iter().sum()
    }

    /// Reorders rows to follow `order`; rows not listed are dropped.
    pub fn reorder_rows(&mut self, order: &[String]) {
        let mut rows = Vec::new();
        let mut values = Vec::new();
        for name in order {
            if let Some(i) = self.rows.iter().position(|r| r == name) {
                rows.push(self.rows[i].clone());
                values.push(self.values[i].clone());
            }
        }
        self.rows = rows;
        self.values = values;
    }

    /// Keeps the `n` rows with the largest totals, largest first.
    pub fn top_rows_by_total(&mut self, n: usize) {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| {
            self.row_total(b)
                .total_cmp(&self.row_total(a))
                .then_with(|| self.rows[a].cmp(&self.rows[b]))
        });
        order.truncate(n);
        let names: Vec<String> = order.iter().map(|&i| self.rows[i].clone()).collect();
        self.reorder_rows(&names);
    }

    /// Scales every row to percentages of its own total.
    pub fn normalize_rows(&mut self) {
        for row in &mut self.values {
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                for v in row.iter_mut() {
                    *v = *v / total * 100.0;
                }
            }
        }
    }
}

/// One `(record, modal name)` pair per code in the cleaned work modal list.
fn explode_work_modals(table: &PreparedTable) -> impl Iterator<Item = (&PreparedRecord, &'static str)> {
    table.iter().flat_map(|r| {
        r.work_modal_list
            .iter()
            .filter_map(move |&m| MODAL.get(i64::from(m)).map(|name| (r, name)))
    })
}

/// Work modal mentions per neighbourhood of residence, busiest neighbourhoods
/// first.
pub fn modal_by_neighborhood(table: &PreparedTable) -> CrossTab {
    let pairs = explode_work_modals(table).filter_map(|(r, modal)| {
        r.raw
            .neighborhood
            .as_ref()
            .map(|n| (n.clone(), modal.to_string()))
    });

    let mut tab = CrossTab::from_pairs(pairs);
    tab.top_rows_by_total(TOP_LOCATION_ROWS);
    tab
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicProfile {
    /// Row-normalised percentages, sex × modal.
    pub by_sex: CrossTab,
    /// Row-normalised percentages, income bracket × modal, in bracket order.
    pub by_income: CrossTab,
}

/// Modal split of work trips by sex and by income, undeclared modal excluded.
pub fn demographic_profile(table: &PreparedTable) -> DemographicProfile {
    let undeclared = MODAL.get(0);
    let declared = || explode_work_modals(table).filter(move |(_, m)| Some(*m) != undeclared);

    let mut by_sex = CrossTab::from_pairs(
        declared().filter_map(|(r, m)| r.sex_label.map(|s| (s.to_string(), m.to_string()))),
    );
    by_sex.normalize_rows();

    let mut by_income = CrossTab::from_pairs(declared().filter_map(|(r, m)| {
        r.raw
            .income
            .filter(|c| PAID_INCOME_CODES.contains(c))
            .and_then(|c| INCOME.get(c))
            .map(|label| (label.to_string(), m.to_string()))
    }));
    let income_order: Vec<String> = PAID_INCOME_CODES
        .iter()
        .filter_map(|&c| INCOME.get(c))
        .map(String::from)
        .collect();
    by_income.reorder_rows(&income_order);
    by_income.normalize_rows();

    DemographicProfile { by_sex, by_income }
}
