//! Headline numbers for the landing view.

use super::{Share, pct, shares_by_count, tally};
use crate::codes::AGE_BRACKET;
use crate::prepare::{PreparedTable, TripKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub respondents: usize,
    pub pct_working: f64,
    pub pct_studying: f64,
    /// Respondents with a multimodal work or class trip.
    pub multimodal_respondents: usize,
    pub mean_modal_count: f64,
    pub by_sex: Vec<Share>,
    /// In age-bracket code order.
    pub by_age: Vec<Share>,
}

pub fn overview(table: &PreparedTable) -> Overview {
    let n = table.len();

    let working = table.iter().filter(|r| r.works).count();
    let studying = table.iter().filter(|r| r.studies).count();
    let multimodal_respondents = table
        .iter()
        .filter(|r| r.work_trip == TripKind::Multimodal || r.class_trip == TripKind::Multimodal)
        .count();

    let modal_counts: Vec<f64> = table.iter().map(|r| r.modal_count as f64).collect();

    let by_sex = shares_by_count(tally(
        table.iter().filter_map(|r| r.sex_label).map(String::from),
    ));

    let age_counts = tally(table.iter().filter_map(|r| r.age_label));
    let age_total: usize = age_counts.values().sum();
    let by_age = AGE_BRACKET
        .iter()
        .filter_map(|(_, label)| {
            age_counts.get(label).map(|&count| Share {
                label: label.to_string(),
                count,
                percent: pct(count, age_total),
            })
        })
        .collect();

    Overview {
        respondents: n,
        pct_working: pct(working, n),
        pct_studying: pct(studying, n),
        multimodal_respondents,
        mean_modal_count: super::mean(&modal_counts),
        by_sex,
        by_age,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::prepare;
    use crate::record::RawRecord;

    fn rec(sex: i64, age: i64, work: i64, modals: Option<&str>) -> RawRecord {
        RawRecord {
            sex: Some(sex),
            age_bracket: Some(age),
            work_status: Some(work),
            work_modals: modals.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_overview_counts() {
        let table = prepare(vec![
            rec(1, 4, 1, Some("3,4")),
            rec(2, 3, 1, Some("3")),
            rec(2, 4, 2, None),
            rec(9, 9, 2, Some("0")),
        ]);
        let view = overview(&table);

        assert_eq!(view.respondents, 4);
        assert_eq!(view.pct_working, 50.0);
        assert_eq!(view.multimodal_respondents, 1);
        assert_eq!(view.mean_modal_count, 0.75);

        assert_eq!(view.by_sex[0].label, "Feminino");
        assert_eq!(view.by_sex[0].count, 2);
        assert_eq!(view.by_sex.iter().map(|s| s.count).sum::<usize>(), 3);

        let ages: Vec<&str> = view.by_age.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(ages, vec!["16 a 24 anos", "25 a 39 anos"]);
    }

    #[test]
    fn test_overview_empty_table() {
        let view = overview(&PreparedTable::default());
        assert_eq!(view.respondents, 0);
        assert_eq!(view.pct_working, 0.0);
        assert!(view.by_sex.is_empty());
    }
}
