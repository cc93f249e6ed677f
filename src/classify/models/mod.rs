//! Binary classifiers used by the integration evaluation.

mod forest;
mod logistic;
mod tree;

pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use tree::{DecisionTree, TreeNode};

use crate::error::{Result, SurveyError};
use ndarray::{Array1, Array2};

/// Probability above which a row is predicted positive.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A binary classifier over dense `f64` features with 0/1 labels.
pub trait Classifier {
    /// Display name used in reports.
    fn name(&self) -> &'static str;

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Probability of the positive class for each row of `x`.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// 0/1 predictions at [`DECISION_THRESHOLD`].
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p > DECISION_THRESHOLD { 1.0 } else { 0.0 }))
    }
}

pub(crate) fn check_training_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(SurveyError::ShapeMismatch {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(SurveyError::InsufficientData(
            "cannot fit on zero rows".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_features(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(SurveyError::ShapeMismatch {
            expected: format!("{n_features} features"),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use ndarray::{Array1, Array2};

    /// Two features; label is 1 exactly when the first feature exceeds 5.
    pub fn threshold_data() -> (Array2<f64>, Array1<f64>) {
        let n = 40;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 { (i % 10) as f64 + 0.5 } else { (i / 10) as f64 }
        });
        let y = x.column(0).mapv(|v| if v > 5.0 { 1.0 } else { 0.0 });
        (x, y)
    }
}
