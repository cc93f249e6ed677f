//! Feature matrix and integration labels for the classifiers.

use crate::error::{Result, SurveyError};
use crate::prepare::PreparedTable;
use crate::record::RawRecord;
use crate::regression::{VALID_AGE, VALID_INCOME};
use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::{debug, info};

/// Column order of [`ClassificationDataset::features`].
pub const FEATURE_NAMES: [&str; 4] = ["renda", "faixa_etaria", "sexo", "num_modais_trabalho"];

pub const VALID_SEX: [i64; 2] = [1, 2];

/// Counts the positive integer tokens of a raw modal field.
///
/// Spaces are removed, the field is split on commas and a token counts when
/// it is all ASCII digits with a value above zero. Unlike
/// [`crate::prepare::clean_modal_codes`] there is no last-digit correction
/// and no upper bound, so `"15,3"` counts 2 and `"0,3"` counts 1.
pub fn count_positive_modal_tokens(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return 0;
    };
    let compact: String = raw.chars().filter(|c| *c != ' ').collect();
    compact
        .split(',')
        .filter(|tok| !tok.is_empty() && tok.bytes().all(|b| b.is_ascii_digit()))
        // any nonzero digit makes the value positive, however long the token
        .filter(|tok| tok.bytes().any(|b| b != b'0'))
        .count()
}

/// Integration label: a work terminal or a class integration was used.
pub fn integration_target(raw: &RawRecord) -> bool {
    raw.work_terminal_integration == Some(1) || raw.class_integration == Some(1)
}

fn in_training_population(raw: &RawRecord, modal_tokens: usize) -> bool {
    raw.income.is_some_and(|c| VALID_INCOME.contains(&c))
        && raw.age_bracket.is_some_and(|c| VALID_AGE.contains(&c))
        && raw.sex.is_some_and(|c| VALID_SEX.contains(&c))
        && modal_tokens > 0
}

/// Filtered rows as a dense feature matrix and 0/1 label vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationDataset {
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
}

impl ClassificationDataset {
    pub fn new(features: Array2<f64>, labels: Array1<f64>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(SurveyError::ShapeMismatch {
                expected: format!("labels length = {}", features.nrows()),
                actual: format!("labels length = {}", labels.len()),
            });
        }
        Ok(Self { features, labels })
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&y| y > 0.5).count()
    }

    pub fn negatives(&self) -> usize {
        self.n_rows() - self.positives()
    }

    /// Fraction of positive labels; 0.0 for an empty dataset.
    pub fn positive_rate(&self) -> f64 {
        if self.n_rows() == 0 {
            0.0
        } else {
            self.positives() as f64 / self.n_rows() as f64
        }
    }

    /// Rejects datasets that cannot be split and scored.
    pub fn ensure_trainable(&self) -> Result<()> {
        if self.n_rows() == 0 {
            return Err(SurveyError::InsufficientData(
                "no rows left after filtering".to_string(),
            ));
        }
        if self.positives() == 0 || self.negatives() == 0 {
            return Err(SurveyError::InsufficientData(format!(
                "labels have a single class ({} positive, {} negative)",
                self.positives(),
                self.negatives()
            )));
        }
        Ok(())
    }
}

/// Sizes of the training population and of both partitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub rows: usize,
    pub positives: usize,
    pub negatives: usize,
    pub positive_rate: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl TrainingSummary {
    pub fn new(dataset: &ClassificationDataset, train_rows: usize, test_rows: usize) -> Self {
        Self {
            rows: dataset.n_rows(),
            positives: dataset.positives(),
            negatives: dataset.negatives(),
            positive_rate: dataset.positive_rate(),
            train_rows,
            test_rows,
        }
    }
}

fn feature_row(raw: &RawRecord, modal_tokens: usize) -> Option<[f64; 4]> {
    Some([
        raw.income? as f64,
        raw.age_bracket? as f64,
        raw.sex? as f64,
        modal_tokens as f64,
    ])
}

/// Builds the classification dataset from the prepared table.
///
/// The work modal count is recomputed from the raw field with
/// [`count_positive_modal_tokens`]; the prepared count is not used. Rows
/// outside the valid income, age and sex codes or with no positive modal
/// token are dropped.
///
/// # Errors
///
/// [`SurveyError::InsufficientData`] when no rows survive or the labels hold
/// a single class.
pub fn build_dataset(table: &PreparedTable) -> Result<ClassificationDataset> {
    let rows: Vec<([f64; 4], f64)> = table
        .iter()
        .map(|r| &r.raw)
        .filter_map(|raw| {
            let tokens = count_positive_modal_tokens(raw.work_modals.as_deref());
            if !in_training_population(raw, tokens) {
                return None;
            }
            let label = if integration_target(raw) { 1.0 } else { 0.0 };
            feature_row(raw, tokens).map(|f| (f, label))
        })
        .collect();

    debug!(
        total = table.len(),
        kept = rows.len(),
        "Filtered classification population"
    );

    let n = rows.len();
    let mut flat = Vec::with_capacity(n * FEATURE_NAMES.len());
    let mut labels = Vec::with_capacity(n);
    for (features, label) in rows {
        flat.extend_from_slice(&features);
        labels.push(label);
    }

    let features = Array2::from_shape_vec((n, FEATURE_NAMES.len()), flat).map_err(|e| {
        SurveyError::ShapeMismatch {
            expected: format!("{} x {}", n, FEATURE_NAMES.len()),
            actual: e.to_string(),
        }
    })?;

    let dataset = ClassificationDataset::new(features, Array1::from_vec(labels))?;
    dataset.ensure_trainable()?;

    info!(
        rows = dataset.n_rows(),
        positives = dataset.positives(),
        positive_rate = dataset.positive_rate(),
        "Classification dataset ready"
    );
    Ok(dataset)
}
