//! Data preparation: derives flags, trip classifications, modal lists and
//! descriptive labels from the raw survey columns.
//!
//! Three different modal parsers live in this crate and must stay separate:
//!
//! - [`clean_modal_codes`]: digit-only tokens, last-digit correction above 12.
//! - [`modal_frequencies`]: loose integer parsing, unknown codes become "Outro".
//! - [`crate::classify::dataset::count_positive_modal_tokens`]: strict count
//!   of positive digit-only tokens, no correction.
//!
//! They disagree on malformed input and each view depends on its own rule.

use crate::codes::{self, AGE_BRACKET, INCOME, MAX_MODAL_CODE, SEX};
use crate::record::RawRecord;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Syntactic classification of a trip field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TripKind {
    Monomodal,
    Multimodal,
    #[serde(rename = "sem_resposta")]
    NoAnswer,
}

impl TripKind {
    /// Display order used by the trip-type views.
    pub const ALL: [TripKind; 3] = [TripKind::Monomodal, TripKind::Multimodal, TripKind::NoAnswer];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripKind::Monomodal => "monomodal",
            TripKind::Multimodal => "multimodal",
            TripKind::NoAnswer => "sem_resposta",
        }
    }

    /// 2 for multimodal, 1 for monomodal, 0 otherwise.
    pub fn modal_count(&self) -> u8 {
        match self {
            TripKind::Multimodal => 2,
            TripKind::Monomodal => 1,
            TripKind::NoAnswer => 0,
        }
    }
}

/// Which trip a raw modal field describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TripContext {
    Work,
    Class,
    Children,
}

impl TripContext {
    pub const ALL: [TripContext; 3] = [TripContext::Work, TripContext::Class, TripContext::Children];

    pub fn raw_field<'a>(&self, record: &'a RawRecord) -> Option<&'a str> {
        match self {
            TripContext::Work => record.work_modals.as_deref(),
            TripContext::Class => record.class_modals.as_deref(),
            TripContext::Children => record.children_modals.as_deref(),
        }
    }
}

/// A respondent row plus every derived column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRecord {
    pub raw: RawRecord,

    pub works: bool,
    pub studies: bool,

    pub work_trip: TripKind,
    pub class_trip: TripKind,
    pub children_trip: TripKind,

    pub uses_work_terminal: bool,
    pub uses_class_integration: bool,
    pub uses_integration: bool,

    pub work_modal_count: u8,
    pub class_modal_count: u8,
    pub modal_count: u8,

    pub work_modal_list: Vec<u8>,
    pub class_modal_list: Vec<u8>,
    pub children_modal_list: Vec<u8>,

    pub sex_label: Option<&'static str>,
    pub age_label: Option<&'static str>,
    pub income_label: Option<&'static str>,
}

impl PreparedRecord {
    pub fn trip(&self, context: TripContext) -> TripKind {
        match context {
            TripContext::Work => self.work_trip,
            TripContext::Class => self.class_trip,
            TripContext::Children => self.children_trip,
        }
    }

    pub fn modal_list(&self, context: TripContext) -> &[u8] {
        match context {
            TripContext::Work => &self.work_modal_list,
            TripContext::Class => &self.class_modal_list,
            TripContext::Children => &self.children_modal_list,
        }
    }
}

/// The enriched table. Same rows, same order, as the raw input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparedTable {
    pub rows: Vec<PreparedRecord>,
}

impl PreparedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreparedRecord> {
        self.rows.iter()
    }

    /// Raw modal strings of one context, in row order.
    pub fn raw_column(&self, context: TripContext) -> impl Iterator<Item = Option<&str>> {
        self.rows.iter().map(move |r| context.raw_field(&r.raw))
    }
}

/// `true` iff the status code equals 1.
pub fn status_flag(code: Option<i64>) -> bool {
    code == Some(1)
}

/// Classifies a raw trip field as monomodal, multimodal or no answer.
///
/// Purely syntactic: any comma makes the trip multimodal, even when only one
/// token would survive cleaning.
pub fn classify_trip(raw: Option<&str>) -> TripKind {
    let Some(value) = raw.map(str::trim) else {
        return TripKind::NoAnswer;
    };
    if value.is_empty() || value == "0" {
        TripKind::NoAnswer
    } else if value.contains(',') {
        TripKind::Multimodal
    } else {
        TripKind::Monomodal
    }
}

/// Parses a raw modal field into codes in `[0, 12]`.
///
/// Spaces are removed, only all-digit tokens are kept, and values above 12
/// are replaced by their last decimal digit (a known data-entry error, e.g.
/// `2005` → `5`). Unanswered fields yield an empty list.
pub fn clean_modal_codes(raw: Option<&str>) -> Vec<u8> {
    let raw = match raw {
        Some(r) if classify_trip(Some(r)) != TripKind::NoAnswer => r,
        _ => return Vec::new(),
    };

    let compact: String = raw.chars().filter(|c| *c != ' ').collect();
    compact
        .split(',')
        .filter(|tok| !tok.is_empty() && tok.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|tok| {
            let code = match tok.parse::<u64>() {
                Ok(n) if n <= MAX_MODAL_CODE as u64 => n,
                // last decimal digit; also covers tokens too long for u64
                _ => u64::from(tok.as_bytes()[tok.len() - 1] - b'0'),
            };
            (code <= MAX_MODAL_CODE as u64).then_some(code as u8)
        })
        .collect()
}

/// Counts modal names across a column of raw modal fields, most frequent first.
///
/// Fields are trimmed; blank and `"0"` fields are skipped. Each comma token is
/// trimmed and parsed as an integer; tokens that fail to parse are silently
/// dropped and codes missing from the modal table count as "Outro", including
/// integers too wide for `i64`. No last-digit correction is applied here.
pub fn modal_frequencies<'a, I>(column: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: HashMap<&'static str, usize> = HashMap::new();

    for line in column.into_iter().flatten() {
        let line = line.trim();
        if line.is_empty() || line == "0" {
            continue;
        }
        for token in line.split(',') {
            let token = token.trim();
            let name = match token.parse::<i64>() {
                Ok(code) => codes::modal_name(code),
                Err(_) if is_wide_integer(token) => codes::OTHER_MODAL,
                Err(_) => continue,
            };
            *counts.entry(name).or_default() += 1;
        }
    }

    let mut freq: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    freq
}

/// Signed all-digit token that only failed to parse because of its width.
fn is_wide_integer(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// A work terminal was used iff the terminal code is present and not `"0"`.
/// A missing code always reads as no terminal use.
pub fn uses_terminal(raw: Option<&str>) -> bool {
    raw.map(str::trim).is_some_and(|v| !v.is_empty() && v != "0")
}

/// Derives every column for one respondent.
pub fn prepare_record(raw: RawRecord) -> PreparedRecord {
    let work_trip = classify_trip(raw.work_modals.as_deref());
    let class_trip = classify_trip(raw.class_modals.as_deref());
    let children_trip = classify_trip(raw.children_modals.as_deref());

    let uses_work_terminal = uses_terminal(raw.work_terminal.as_deref());
    let uses_class_integration = status_flag(raw.class_integration);

    let work_modal_count = work_trip.modal_count();
    let class_modal_count = class_trip.modal_count();

    PreparedRecord {
        works: status_flag(raw.work_status),
        studies: status_flag(raw.study_status),
        work_trip,
        class_trip,
        children_trip,
        uses_work_terminal,
        uses_class_integration,
        uses_integration: uses_work_terminal || uses_class_integration,
        work_modal_count,
        class_modal_count,
        modal_count: work_modal_count.max(class_modal_count),
        work_modal_list: clean_modal_codes(raw.work_modals.as_deref()),
        class_modal_list: clean_modal_codes(raw.class_modals.as_deref()),
        children_modal_list: clean_modal_codes(raw.children_modals.as_deref()),
        sex_label: SEX.get_opt(raw.sex),
        age_label: AGE_BRACKET.get_opt(raw.age_bracket),
        income_label: INCOME.get_opt(raw.income),
        raw,
    }
}

/// Builds the prepared table. Never adds or removes rows.
#[tracing::instrument(skip(raw), fields(rows = raw.len()))]
pub fn prepare(raw: Vec<RawRecord>) -> PreparedTable {
    let rows: Vec<PreparedRecord> = raw.into_iter().map(prepare_record).collect();

    let multimodal_work = rows
        .iter()
        .filter(|r| r.work_trip == TripKind::Multimodal)
        .count();
    debug!(rows = rows.len(), multimodal_work, "Prepared survey table");

    PreparedTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_trip_no_answer() {
        assert_eq!(classify_trip(None), TripKind::NoAnswer);
        assert_eq!(classify_trip(Some("")), TripKind::NoAnswer);
        assert_eq!(classify_trip(Some("   ")), TripKind::NoAnswer);
        assert_eq!(classify_trip(Some("0")), TripKind::NoAnswer);
        assert_eq!(classify_trip(Some(" 0 ")), TripKind::NoAnswer);
    }

    #[test]
    fn test_classify_trip_comma_means_multimodal() {
        assert_eq!(classify_trip(Some("3")), TripKind::Monomodal);
        assert_eq!(classify_trip(Some("3,4")), TripKind::Multimodal);
        // syntactic only: junk after the comma still counts
        assert_eq!(classify_trip(Some("3,x")), TripKind::Multimodal);
        assert_eq!(classify_trip(Some("0,0")), TripKind::Multimodal);
        assert_eq!(classify_trip(Some("abc")), TripKind::Monomodal);
    }

    #[test]
    fn test_clean_modal_codes_last_digit_correction() {
        assert_eq!(clean_modal_codes(Some("2005,3")), vec![5, 3]);
        assert_eq!(clean_modal_codes(Some("15,3")), vec![5, 3]);
        assert_eq!(clean_modal_codes(Some("12,13")), vec![12, 3]);
        assert_eq!(clean_modal_codes(Some("99999999999999999999993")), vec![3]);
    }

    #[test]
    fn test_clean_modal_codes_drops_non_digit_tokens() {
        assert_eq!(clean_modal_codes(Some("3, 4,x,-1,,5.0")), vec![3, 4]);
        assert_eq!(clean_modal_codes(Some("1 1")), vec![11]);
        assert_eq!(clean_modal_codes(Some("0,3")), vec![0, 3]);
    }

    #[test]
    fn test_clean_modal_codes_unanswered_is_empty() {
        assert!(clean_modal_codes(None).is_empty());
        assert!(clean_modal_codes(Some("")).is_empty());
        assert!(clean_modal_codes(Some("0")).is_empty());
    }

    #[test]
    fn test_clean_modal_codes_always_in_range() {
        let inputs = ["13,14,25,100,7", "2005", "40,41", "1,2,3,4,5,6,7,8,9,10,11,12"];
        for input in inputs {
            for code in clean_modal_codes(Some(input)) {
                assert!(code <= MAX_MODAL_CODE, "{input} produced {code}");
            }
        }
    }

    #[test]
    fn test_modal_frequencies_loose_parsing() {
        let column = vec![
            Some("3,4"),
            Some(" 3 "),
            Some("2005,3"),
            Some("x,3"),
            Some("0"),
            Some(""),
            None,
        ];
        let freq = modal_frequencies(column);

        assert_eq!(freq[0], ("Ônibus".to_string(), 4));
        assert!(freq.contains(&("Metrô".to_string(), 1)));
        // 2005 parses as an integer and is looked up as-is
        assert!(freq.contains(&("Outro".to_string(), 1)));
        assert!(!freq.iter().any(|(name, _)| name == "Carro (dirigindo)"));
    }

    #[test]
    fn test_modal_frequencies_wide_integer_is_other() {
        let freq = modal_frequencies(vec![
            Some("99999999999999999999,3"),
            Some("-99999999999999999999"),
        ]);
        assert!(freq.contains(&("Outro".to_string(), 2)));
        assert!(freq.contains(&("Ônibus".to_string(), 1)));
        assert_eq!(freq.len(), 2);
    }

    #[test]
    fn test_modal_frequencies_empty_column() {
        let freq = modal_frequencies(vec![None, Some("0"), Some("abc")]);
        assert!(freq.is_empty());
    }

    #[test]
    fn test_modal_frequencies_sorted_descending() {
        let freq = modal_frequencies(vec![Some("1,5"), Some("5"), Some("5,1,9")]);
        let counts: Vec<usize> = freq.iter().map(|(_, c)| *c).collect();
        assert_eq!(counts, vec![3, 2, 1]);
    }

    #[test]
    fn test_uses_terminal() {
        assert!(!uses_terminal(None));
        assert!(!uses_terminal(Some("0")));
        assert!(!uses_terminal(Some(" 0")));
        assert!(uses_terminal(Some("15")));
    }

    #[test]
    fn test_prepare_record_derivations() {
        let raw = RawRecord {
            sex: Some(2),
            age_bracket: Some(4),
            income: Some(11),
            work_status: Some(1),
            study_status: Some(2),
            work_modals: Some("3,4".to_string()),
            class_modals: Some("1".to_string()),
            children_modals: None,
            work_terminal: Some("0".to_string()),
            class_integration: Some(1),
            ..Default::default()
        };
        let rec = prepare_record(raw);

        assert!(rec.works);
        assert!(!rec.studies);
        assert_eq!(rec.work_trip, TripKind::Multimodal);
        assert_eq!(rec.class_trip, TripKind::Monomodal);
        assert_eq!(rec.children_trip, TripKind::NoAnswer);
        assert!(!rec.uses_work_terminal);
        assert!(rec.uses_class_integration);
        assert!(rec.uses_integration);
        assert_eq!(rec.work_modal_count, 2);
        assert_eq!(rec.class_modal_count, 1);
        assert_eq!(rec.modal_count, 2);
        assert_eq!(rec.work_modal_list, vec![3, 4]);
        assert_eq!(rec.sex_label, Some("Feminino"));
        assert_eq!(rec.age_label, Some("25 a 39 anos"));
        assert_eq!(rec.income_label, None);
    }

    #[test]
    fn test_prepare_keeps_row_count_and_order() {
        let raw: Vec<RawRecord> = (1..=5)
            .map(|i| RawRecord {
                income: Some(i),
                ..Default::default()
            })
            .collect();
        let table = prepare(raw);

        assert_eq!(table.len(), 5);
        let incomes: Vec<_> = table.iter().map(|r| r.raw.income).collect();
        assert_eq!(incomes, vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn test_trip_kind_serializes_to_labels() {
        assert_eq!(serde_json::to_string(&TripKind::NoAnswer).unwrap(), "\"sem_resposta\"");
        assert_eq!(serde_json::to_string(&TripKind::Multimodal).unwrap(), "\"multimodal\"");
    }
}
