//! Count/percentage tables for the coded demographic columns.

use super::{Share, pct, shares_by_count, tally};
use crate::codes::{AGE_BRACKET, CodeTable, INCOME, SEX};
use crate::prepare::PreparedTable;
use serde::Serialize;

/// Neighbourhoods listed in [`DescriptiveStats::top_neighborhoods`].
pub const TOP_NEIGHBORHOODS: usize = 10;

/// Count of one questionnaire code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeShare {
    pub code: i64,
    /// `None` when the code has no entry in its table.
    pub label: Option<&'static str>,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    /// Most frequent first.
    pub sex: Vec<CodeShare>,
    /// In code order.
    pub age_bracket: Vec<CodeShare>,
    /// In code order.
    pub income: Vec<CodeShare>,
    pub top_neighborhoods: Vec<Share>,
}

/// Distribution of a coded column in code order. Missing codes are excluded
/// from both counts and the percentage base.
pub fn code_distribution<I>(codes: I, table: &CodeTable) -> Vec<CodeShare>
where
    I: IntoIterator<Item = Option<i64>>,
{
    let counts = tally(codes.into_iter().flatten());
    let total: usize = counts.values().sum();

    let mut dist: Vec<CodeShare> = counts
        .into_iter()
        .map(|(code, count)| CodeShare {
            code,
            label: table.get(code),
            count,
            percent: pct(count, total),
        })
        .collect();
    dist.sort_by_key(|s| s.code);
    dist
}

pub fn descriptive_stats(table: &PreparedTable) -> DescriptiveStats {
    let mut sex = code_distribution(table.iter().map(|r| r.raw.sex), &SEX);
    sex.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));

    let neighborhoods = tally(
        table
            .iter()
            .filter_map(|r| r.raw.neighborhood.as_deref())
            .map(String::from),
    );
    let total_respondents: usize = neighborhoods.values().sum();
    let mut top_neighborhoods = shares_by_count(neighborhoods);
    top_neighborhoods.truncate(TOP_NEIGHBORHOODS);
    for share in &mut top_neighborhoods {
        share.percent = pct(share.count, total_respondents);
    }

    DescriptiveStats {
        sex,
        age_bracket: code_distribution(table.iter().map(|r| r.raw.age_bracket), &AGE_BRACKET),
        income: code_distribution(table.iter().map(|r| r.raw.income), &INCOME),
        top_neighborhoods,
    }
}
