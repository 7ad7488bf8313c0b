//! Ordinary least squares for the after_event x high_earnings interaction model.

use crate::data::FinalRecord;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

/// Model terms, in design-matrix column order.
pub const TERMS: [&str; 4] = [
    "(Intercept)",
    "after_event",
    "high_earnings",
    "after_event:high_earnings",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    #[error("Not enough observations: {observations} rows for {parameters} parameters")]
    InsufficientData {
        observations: usize,
        parameters: usize,
    },
    #[error("Design matrix is singular: cell after_event={after_event}, high_earnings={high_earnings} is empty")]
    EmptyCell {
        after_event: bool,
        high_earnings: bool,
    },
    #[error("Design matrix is singular")]
    Singular,
}

/// One estimated term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

impl Coefficient {
    /// R-style significance code.
    pub fn significance(&self) -> &'static str {
        match self.p_value {
            p if p < 0.001 => "***",
            p if p < 0.01 => "**",
            p if p < 0.05 => "*",
            p if p < 0.1 => ".",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionSummary {
    pub coefficients: Vec<Coefficient>,
    pub observations: usize,
    pub residual_df: usize,
    pub residual_std_error: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
}

impl RegressionSummary {
    pub fn coefficient(&self, term: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.term == term)
    }

    /// The treatment effect of interest.
    pub fn interaction(&self) -> Option<&Coefficient> {
        self.coefficient(TERMS[3])
    }
}

pub struct Estimator;

impl Estimator {
    pub fn design_row(record: &FinalRecord) -> [f64; 4] {
        let after = f64::from(u8::from(record.after_event));
        let high = f64::from(u8::from(record.high_earnings));
        [1.0, after, high, after * high]
    }

    /// Fit `standardized_index ~ after_event * high_earnings`.
    pub fn fit(records: &[FinalRecord]) -> Result<RegressionSummary, EstimateError> {
        let parameters = TERMS.len();
        if records.len() <= parameters {
            return Err(EstimateError::InsufficientData {
                observations: records.len(),
                parameters,
            });
        }
        for after_event in [false, true] {
            for high_earnings in [false, true] {
                let present = records
                    .iter()
                    .any(|r| r.after_event == after_event && r.high_earnings == high_earnings);
                if !present {
                    return Err(EstimateError::EmptyCell {
                        after_event,
                        high_earnings,
                    });
                }
            }
        }

        let x = DMatrix::from_row_iterator(
            records.len(),
            parameters,
            records.iter().flat_map(Self::design_row),
        );
        let y = DVector::from_iterator(records.len(), records.iter().map(|r| r.standardized_index));
        Self::ols(&x, &y, &TERMS)
    }

    /// Closed-form OLS with classical standard errors.
    ///
    /// Solves `(X^T X) beta = X^T y`; p-values are two-sided Student t with
    /// `n - p` degrees of freedom.
    pub fn ols(
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        terms: &[&str],
    ) -> Result<RegressionSummary, EstimateError> {
        let (n, p) = x.shape();
        if n <= p {
            return Err(EstimateError::InsufficientData {
                observations: n,
                parameters: p,
            });
        }

        let xt = x.transpose();
        let xtx_inv = (&xt * x).try_inverse().ok_or(EstimateError::Singular)?;
        if xtx_inv.iter().any(|v| !v.is_finite()) {
            return Err(EstimateError::Singular);
        }
        let beta = &xtx_inv * (&xt * y);

        let residuals = y - x * &beta;
        let rss = residuals.norm_squared();
        let residual_df = n - p;
        let sigma2 = rss / residual_df as f64;

        let y_mean = y.mean();
        let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
        let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };
        let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / residual_df as f64;

        let t_dist = StudentsT::new(0.0, 1.0, residual_df as f64).ok();
        let coefficients = (0..p)
            .map(|j| {
                let estimate = beta[j];
                let std_error = (sigma2 * xtx_inv[(j, j)]).max(0.0).sqrt();
                let t_value = estimate / std_error;
                let p_value = match &t_dist {
                    Some(dist) if t_value.is_finite() => 2.0 * (1.0 - dist.cdf(t_value.abs())),
                    Some(_) if t_value.is_infinite() => 0.0,
                    _ => f64::NAN,
                };
                Coefficient {
                    term: terms.get(j).map(|t| t.to_string()).unwrap_or_else(|| format!("x{}", j)),
                    estimate,
                    std_error,
                    t_value,
                    p_value,
                }
            })
            .collect();

        Ok(RegressionSummary {
            coefficients,
            observations: n,
            residual_df,
            residual_std_error: sigma2.sqrt(),
            r_squared,
            adj_r_squared,
        })
    }
}
