use super::{Classifier, check_features, check_training_shapes};
use crate::error::{Result, SurveyError};
use ndarray::{Array1, Array2, Axis};
use tracing::debug;

/// L2-regularised logistic regression fitted by batch gradient descent.
///
/// Features are standardised internally with the training mean and standard
/// deviation; the penalty strength is `1 / (c * n_samples)`, so `c` plays
/// the role of an inverse regularisation weight.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub max_iter: usize,
    pub learning_rate: f64,
    pub tol: f64,
    pub c: f64,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            max_iter: 1000,
            learning_rate: 0.1,
            tol: 1e-6,
            c: 1.0,
            coefficients: None,
            intercept: 0.0,
            mean: None,
            scale: None,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v.clamp(-500.0, 500.0)).exp()))
    }

    fn standardize(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (Some(mean), Some(scale)) = (&self.mean, &self.scale) else {
            return Err(SurveyError::ModelNotFitted);
        };
        Ok((x - &mean.view().insert_axis(Axis(0))) / &scale.view().insert_axis(Axis(0)))
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "Regressão Logística"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_shapes(x, y)?;
        let n_samples = x.nrows();

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| SurveyError::InsufficientData("cannot fit on zero rows".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 { s } else { 1.0 });
        self.mean = Some(mean);
        self.scale = Some(scale);
        let xs = self.standardize(x)?;

        let alpha = 1.0 / (self.c * n_samples as f64);
        let lr = self.learning_rate;
        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            let predictions = Self::sigmoid(&(xs.dot(&weights) + bias));

            let errors = &predictions - y;
            let dw = (xs.t().dot(&errors) / n_samples as f64) + (alpha * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        debug!(iterations, intercept = bias, "Logistic regression converged");
        self.coefficients = Some(weights);
        self.intercept = bias;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(SurveyError::ModelNotFitted)?;
        check_features(x, coefficients.len())?;
        let xs = self.standardize(x)?;
        Ok(Self::sigmoid(&(xs.dot(coefficients) + self.intercept)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::threshold_data;
    use super::*;
    use ndarray::array;

    #[test]
    fn test_logistic_learns_threshold() {
        let (x, y) = threshold_data();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&x).unwrap();
        let correct = pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(correct as f64 / y.len() as f64 >= 0.9, "accuracy {correct}/40");

        let proba = model.predict_proba(&array![[9.5, 0.0], [0.5, 0.0]]).unwrap();
        assert!(proba[0] > 0.5);
        assert!(proba[1] < 0.5);
    }

    #[test]
    fn test_logistic_constant_feature_does_not_produce_nan() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = LogisticRegression::new().with_max_iter(200);
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| p.is_finite() && (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_logistic_coefficients_follow_signal() {
        let (x, y) = threshold_data();
        let mut model = LogisticRegression::new().with_learning_rate(0.5).with_c(10.0);
        assert!(model.coefficients().is_none());
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients().unwrap();
        assert_eq!(coef.len(), 2);
        assert!(coef[0] > 0.0);
        assert!(coef[0].abs() > coef[1].abs());
    }

    #[test]
    fn test_logistic_not_fitted() {
        let model = LogisticRegression::new();
        let err = model.predict_proba(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, SurveyError::ModelNotFitted));
    }

    #[test]
    fn test_logistic_rejects_wrong_width() {
        let (x, y) = threshold_data();
        let mut model = LogisticRegression::new().with_max_iter(10);
        model.fit(&x, &y).unwrap();
        let err = model.predict_proba(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, SurveyError::ShapeMismatch { .. }));
    }
}
