//! Income → number-of-modals linear regression view.

use crate::error::{Result, SurveyError};
use crate::prepare::{PreparedRecord, PreparedTable};
use serde::Serialize;
use tracing::info;

/// Income brackets accepted by the regression and classification filters.
pub const VALID_INCOME: [i64; 7] = [1, 2, 3, 4, 5, 6, 7];
/// Working-age brackets (16 to 59 years).
pub const VALID_AGE: [i64; 3] = [3, 4, 5];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub income: f64,
    pub modal_count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeRegression {
    pub rows: usize,
    pub intercept: f64,
    pub slope: f64,
    pub r2: f64,
    pub rmse: f64,
    /// Fitted values at each paid income bracket.
    pub line: Vec<LinePoint>,
}

/// Ordinary least squares fit `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleLinearFit {
    pub intercept: f64,
    pub slope: f64,
}

impl SimpleLinearFit {
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(SurveyError::ShapeMismatch {
                expected: format!("y length = {}", x.len()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.len() < 2 {
            return Err(SurveyError::InsufficientData(format!(
                "regression needs at least 2 rows, got {}",
                x.len()
            )));
        }

        let n = x.len() as f64;
        let x_mean = x.iter().sum::<f64>() / n;
        let y_mean = y.iter().sum::<f64>() / n;

        let sxx: f64 = x.iter().map(|v| (v - x_mean).powi(2)).sum();
        // constant predictor: flat line through the mean response
        if sxx == 0.0 {
            return Ok(Self {
                intercept: y_mean,
                slope: 0.0,
            });
        }
        let sxy: f64 = x
            .iter()
            .zip(y)
            .map(|(a, b)| (a - x_mean) * (b - y_mean))
            .sum();

        let slope = sxy / sxx;
        Ok(Self {
            intercept: y_mean - slope * x_mean,
            slope,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Coefficient of determination; 0.0 when `y` is constant and the fit is
    /// not perfect, 1.0 when it is.
    pub fn r2(&self, x: &[f64], y: &[f64]) -> f64 {
        let n = y.len() as f64;
        let y_mean = y.iter().sum::<f64>() / n;
        let ss_res: f64 = x
            .iter()
            .zip(y)
            .map(|(a, b)| (b - self.predict(*a)).powi(2))
            .sum();
        let ss_tot: f64 = y.iter().map(|b| (b - y_mean).powi(2)).sum();

        if ss_tot == 0.0 {
            if ss_res == 0.0 { 1.0 } else { 0.0 }
        } else {
            1.0 - ss_res / ss_tot
        }
    }

    pub fn rmse(&self, x: &[f64], y: &[f64]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let mse = x
            .iter()
            .zip(y)
            .map(|(a, b)| (b - self.predict(*a)).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        mse.sqrt()
    }
}

fn in_regression_sample(r: &PreparedRecord) -> bool {
    r.raw.income.is_some_and(|c| VALID_INCOME.contains(&c))
        && r.raw.age_bracket.is_some_and(|c| VALID_AGE.contains(&c))
        && r.work_modal_count > 0
}

/// Regresses the prepared work modal count on income bracket.
///
/// # Errors
///
/// [`SurveyError::InsufficientData`] when fewer than two rows survive the
/// filter. A single retained income yields a flat line at the mean count.
#[tracing::instrument(skip(table), fields(rows = table.len()))]
pub fn income_regression(table: &PreparedTable) -> Result<IncomeRegression> {
    let (x, y): (Vec<f64>, Vec<f64>) = table
        .iter()
        .filter(|r| in_regression_sample(r))
        .filter_map(|r| r.raw.income.map(|inc| (inc as f64, r.work_modal_count as f64)))
        .unzip();

    let fit = SimpleLinearFit::fit(&x, &y)?;
    let r2 = fit.r2(&x, &y);
    let rmse = fit.rmse(&x, &y);
    info!(rows = x.len(), slope = fit.slope, r2, "Income regression fitted");

    Ok(IncomeRegression {
        rows: x.len(),
        intercept: fit.intercept,
        slope: fit.slope,
        r2,
        rmse,
        line: VALID_INCOME
            .iter()
            .map(|&inc| LinePoint {
                income: inc as f64,
                modal_count: fit.predict(inc as f64),
            })
            .collect(),
    })
}
