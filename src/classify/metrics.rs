//! Binary classification metrics and threshold curves.

use crate::error::{Result, SurveyError};
use ndarray::Array1;
use serde::Serialize;

/// Counts of a binary confusion matrix, positive class = 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t > 0.5, p > 0.5) {
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_positive += 1,
                (true, false) => cm.false_negative += 1,
                (true, true) => cm.true_positive += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    /// `[[tn, fp], [fn, tp]]`, rows are actual classes.
    pub fn as_matrix(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// 0.0 when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// 0.0 when there are no actual positives.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

fn check_lengths(a: &Array1<f64>, b: &Array1<f64>) -> Result<()> {
    if a.len() != b.len() {
        return Err(SurveyError::ShapeMismatch {
            expected: format!("length {}", a.len()),
            actual: format!("length {}", b.len()),
        });
    }
    Ok(())
}

/// Cumulative false/true positive counts at each distinct score, highest
/// score first.
struct BinaryCurve {
    fps: Vec<f64>,
    tps: Vec<f64>,
    thresholds: Vec<f64>,
}

fn binary_curve(y_true: &Array1<f64>, scores: &Array1<f64>) -> Result<BinaryCurve> {
    check_lengths(y_true, scores)?;
    let positives = y_true.iter().filter(|&&y| y > 0.5).count();
    if positives == 0 || positives == y_true.len() {
        return Err(SurveyError::InsufficientData(
            "curves need both classes in the true labels".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut curve = BinaryCurve {
        fps: Vec::new(),
        tps: Vec::new(),
        thresholds: Vec::new(),
    };
    let (mut tp, mut fp) = (0.0, 0.0);
    for (k, &i) in order.iter().enumerate() {
        if y_true[i] > 0.5 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_score = order
            .get(k + 1)
            .is_none_or(|&next| scores[next] != scores[i]);
        if last_of_score {
            curve.tps.push(tp);
            curve.fps.push(fp);
            curve.thresholds.push(scores[i]);
        }
    }
    Ok(curve)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Decreasing; the first entry is one above the highest score and
    /// yields the `(0, 0)` point.
    pub thresholds: Vec<f64>,
}

/// ROC curve over every distinct score.
///
/// # Errors
///
/// [`SurveyError::InsufficientData`] when `y_true` lacks either class.
pub fn roc_curve(y_true: &Array1<f64>, scores: &Array1<f64>) -> Result<RocCurve> {
    let curve = binary_curve(y_true, scores)?;
    let fp_total = curve.fps.last().copied().unwrap_or(0.0);
    let tp_total = curve.tps.last().copied().unwrap_or(0.0);

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![curve.thresholds.first().copied().unwrap_or(0.0) + 1.0];
    fpr.extend(curve.fps.iter().map(|v| v / fp_total));
    tpr.extend(curve.tps.iter().map(|v| v / tp_total));
    thresholds.extend(curve.thresholds);

    Ok(RocCurve {
        fpr,
        tpr,
        thresholds,
    })
}

/// Area under a piecewise-linear curve by the trapezoidal rule.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecisionRecallCurve {
    /// Ends with 1.0.
    pub precision: Vec<f64>,
    /// Decreasing, ends with 0.0.
    pub recall: Vec<f64>,
    /// Increasing; one fewer than the points.
    pub thresholds: Vec<f64>,
}

/// Precision-recall pairs for every distinct score down to the first one
/// reaching full recall, in increasing threshold order.
///
/// # Errors
///
/// [`SurveyError::InsufficientData`] when `y_true` lacks either class.
pub fn precision_recall_curve(
    y_true: &Array1<f64>,
    scores: &Array1<f64>,
) -> Result<PrecisionRecallCurve> {
    let curve = binary_curve(y_true, scores)?;
    let tp_total = curve.tps.last().copied().unwrap_or(0.0);
    let full_recall = curve
        .tps
        .iter()
        .position(|&tp| tp == tp_total)
        .unwrap_or(curve.tps.len() - 1);

    let mut precision = Vec::with_capacity(full_recall + 2);
    let mut recall = Vec::with_capacity(full_recall + 2);
    let mut thresholds = Vec::with_capacity(full_recall + 1);
    for k in (0..=full_recall).rev() {
        let (tp, fp) = (curve.tps[k], curve.fps[k]);
        precision.push(if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) });
        recall.push(tp / tp_total);
        thresholds.push(curve.thresholds[k]);
    }
    precision.push(1.0);
    recall.push(0.0);

    Ok(PrecisionRecallCurve {
        precision,
        recall,
        thresholds,
    })
}

/// Average precision: precision at each threshold weighted by the recall
/// gained there.
pub fn average_precision(curve: &PrecisionRecallCurve) -> f64 {
    // recall is stored decreasing
    curve
        .recall
        .windows(2)
        .zip(&curve.precision)
        .map(|(r, p)| (r[0] - r[1]) * p)
        .sum()
}
