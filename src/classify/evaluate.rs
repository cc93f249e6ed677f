//! Fits every classifier on the same split and compares them.

use super::dataset::{TrainingSummary, build_dataset};
use super::metrics::{
    ConfusionMatrix, PrecisionRecallCurve, RocCurve, auc, average_precision,
    precision_recall_curve, roc_curve,
};
use super::models::{Classifier, DecisionTree, LogisticRegression, RandomForest};
use super::split::{TrainTestSplit, stratified_split};
use crate::error::{Result, SurveyError};
use crate::prepare::PreparedTable;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Scores closer than this are treated as tied.
const TIE_TOLERANCE: f64 = 1e-12;

/// Split and model hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    pub seed: u64,
    pub test_fraction: f64,
    pub logistic_max_iter: usize,
    pub logistic_c: f64,
    pub tree_max_depth: usize,
    pub forest_trees: usize,
    pub forest_max_depth: usize,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.3,
            logistic_max_iter: 1000,
            logistic_c: 1.0,
            tree_max_depth: 5,
            forest_trees: 100,
            forest_max_depth: 10,
        }
    }
}

impl EvaluationSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(SurveyError::InvalidConfig(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.logistic_max_iter == 0 || !(self.logistic_c > 0.0) {
            return Err(SurveyError::InvalidConfig(
                "logistic_max_iter and logistic_c must be positive".to_string(),
            ));
        }
        if self.tree_max_depth == 0 || self.forest_trees == 0 || self.forest_max_depth == 0 {
            return Err(SurveyError::InvalidConfig(
                "tree depth, forest size and forest depth must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The three classifiers in report order, unfitted.
    pub fn models(&self) -> Vec<Box<dyn Classifier>> {
        vec![
            Box::new(
                LogisticRegression::new()
                    .with_max_iter(self.logistic_max_iter)
                    .with_c(self.logistic_c),
            ),
            Box::new(
                DecisionTree::new()
                    .with_max_depth(self.tree_max_depth)
                    .with_random_state(self.seed),
            ),
            Box::new(
                RandomForest::new(self.forest_trees)
                    .with_max_depth(self.forest_max_depth)
                    .with_random_state(self.seed),
            ),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
    F1,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Accuracy, Metric::Precision, Metric::Recall, Metric::F1];

    pub fn of(&self, eval: &ModelEvaluation) -> f64 {
        match self {
            Metric::Accuracy => eval.accuracy,
            Metric::Precision => eval.precision,
            Metric::Recall => eval.recall,
            Metric::F1 => eval.f1,
        }
    }
}

/// Everything measured for one model on the held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelEvaluation {
    pub model: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub roc: RocCurve,
    pub roc_auc: f64,
    pub precision_recall: PrecisionRecallCurve,
    pub average_precision: f64,
}

/// Models attaining the maximum of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricLeader {
    pub metric: Metric,
    pub value: f64,
    pub models: Vec<String>,
}

impl MetricLeader {
    pub fn is_tie(&self) -> bool {
        self.models.len() > 1
    }
}

/// Whether a model leads a metric and how many models share the lead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStrength {
    pub model: String,
    pub metric: Metric,
    pub is_best: bool,
    pub tied_with: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub summary: TrainingSummary,
    pub models: Vec<ModelEvaluation>,
    /// Every model sharing the highest F1; more than one means a tie.
    pub best_by_f1: Vec<String>,
    pub leaders: Vec<MetricLeader>,
    pub strengths: Vec<ModelStrength>,
}

/// Fits `model` on the training rows and scores it on the test rows.
pub fn evaluate_model(model: &mut dyn Classifier, split: &TrainTestSplit) -> Result<ModelEvaluation> {
    model.fit(&split.x_train, &split.y_train)?;
    let scores = model.predict_proba(&split.x_test)?;
    let predictions = model.predict(&split.x_test)?;

    let cm = ConfusionMatrix::from_predictions(&split.y_test, &predictions)?;
    let roc = roc_curve(&split.y_test, &scores)?;
    let pr = precision_recall_curve(&split.y_test, &scores)?;

    Ok(ModelEvaluation {
        model: model.name().to_string(),
        accuracy: cm.accuracy(),
        precision: cm.precision(),
        recall: cm.recall(),
        f1: cm.f1(),
        confusion_matrix: cm,
        roc_auc: auc(&roc.fpr, &roc.tpr),
        roc,
        average_precision: average_precision(&pr),
        precision_recall: pr,
    })
}

/// Leaders of `metric`, or `None` when there are no models.
pub fn metric_leader(models: &[ModelEvaluation], metric: Metric) -> Option<MetricLeader> {
    let value = models
        .iter()
        .map(|m| metric.of(m))
        .max_by(|a, b| a.total_cmp(b))?;
    let leaders = models
        .iter()
        .filter(|m| (metric.of(m) - value).abs() <= TIE_TOLERANCE)
        .map(|m| m.model.clone())
        .collect();
    Some(MetricLeader {
        metric,
        value,
        models: leaders,
    })
}

/// For every model and metric, whether the model attains the maximum and the
/// size of the group sharing it.
pub fn count_ties(models: &[ModelEvaluation]) -> Vec<ModelStrength> {
    let leaders: Vec<MetricLeader> = Metric::ALL
        .iter()
        .filter_map(|&metric| metric_leader(models, metric))
        .collect();

    models
        .iter()
        .flat_map(|m| {
            leaders.iter().map(move |leader| {
                let is_best = leader.models.contains(&m.model);
                ModelStrength {
                    model: m.model.clone(),
                    metric: leader.metric,
                    is_best,
                    tied_with: if is_best { leader.models.len() } else { 0 },
                }
            })
        })
        .collect()
}

/// Runs the classification pipeline end to end.
///
/// # Errors
///
/// [`SurveyError::InsufficientData`] when filtering leaves no rows, a single
/// class, or too few rows of a class to stratify; [`SurveyError::InvalidConfig`]
/// for bad settings.
#[tracing::instrument(skip(table, settings), fields(rows = table.len()))]
pub fn evaluate(table: &PreparedTable, settings: &EvaluationSettings) -> Result<EvaluationReport> {
    settings.validate()?;
    let dataset = build_dataset(table)?;
    let split = stratified_split(&dataset, settings.test_fraction, settings.seed)?;
    let summary = TrainingSummary::new(&dataset, split.y_train.len(), split.y_test.len());
    info!(
        train = summary.train_rows,
        test = summary.test_rows,
        "Training classifiers"
    );

    let mut models = Vec::new();
    for mut model in settings.models() {
        let eval = evaluate_model(model.as_mut(), &split)?;
        info!(
            model = %eval.model,
            accuracy = eval.accuracy,
            f1 = eval.f1,
            roc_auc = eval.roc_auc,
            "Model evaluated"
        );
        models.push(eval);
    }

    let leaders: Vec<MetricLeader> = Metric::ALL
        .iter()
        .filter_map(|&metric| metric_leader(&models, metric))
        .collect();
    let best_by_f1 = leaders
        .iter()
        .find(|l| l.metric == Metric::F1)
        .map(|l| l.models.clone())
        .unwrap_or_default();
    if best_by_f1.len() > 1 {
        warn!(models = ?best_by_f1, "Best F1 is shared by several models");
    }

    Ok(EvaluationReport {
        summary,
        strengths: count_ties(&models),
        models,
        best_by_f1,
        leaders,
    })
}
