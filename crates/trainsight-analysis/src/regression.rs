//! Logistic regression of the outcome on frame columns.
//!
//! [`fit_encoded`] fits an already encoded design matrix and labels every
//! coefficient with its column name. [`fit_frame`] runs the whole pipeline:
//! complete-case filtering, encoding and fitting.

use serde::Serialize;
use trainsight_stats::logistic::{FitError, IrlsOptions, LogisticFit, fit_logistic};

use crate::{
    encoding::{EncodeError, EncodedDesignMatrix, EncodingMode, INTERCEPT, encode},
    frame::{DatasetFrame, FrameError},
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum RegressionError {
    #[display("cannot select regression rows: {_0}")]
    Frame(FrameError),
    #[display("cannot encode regression features: {_0}")]
    Encode(EncodeError),
    #[display("cannot fit logistic model: {_0}")]
    Fit(FitError),
}

/// One coefficient of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionTerm {
    pub name: String,
    pub coefficient: f64,
    pub standard_error: Option<f64>,
    pub z_value: Option<f64>,
    pub p_value: Option<f64>,
}

impl RegressionTerm {
    /// `exp(β)`: multiplicative change in the odds per unit of the term.
    #[must_use]
    pub fn odds_ratio(&self) -> f64 {
        self.coefficient.exp()
    }

    /// Whether the coefficient differs from zero at level `alpha`.
    ///
    /// Always `false` when no p-value could be computed.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value.is_some_and(|p| p < alpha)
    }

    #[must_use]
    pub fn is_intercept(&self) -> bool {
        self.name == INTERCEPT
    }
}

/// Fitted logistic model with named terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    /// Terms in design matrix column order, intercept first.
    pub terms: Vec<RegressionTerm>,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub converged: bool,
    pub separation_suspected: bool,
    /// Rows used for the fit.
    pub observations: usize,
}

impl RegressionResult {
    fn from_fit(column_names: &[String], fit: LogisticFit, observations: usize) -> Self {
        let at = |values: &Option<Vec<f64>>, j: usize| values.as_ref().map(|v| v[j]);
        let terms = column_names
            .iter()
            .enumerate()
            .map(|(j, name)| RegressionTerm {
                name: name.clone(),
                coefficient: fit.coefficients[j],
                standard_error: at(&fit.standard_errors, j),
                z_value: at(&fit.z_values, j),
                p_value: at(&fit.p_values, j),
            })
            .collect();
        Self {
            terms,
            log_likelihood: fit.log_likelihood,
            iterations: fit.iterations,
            converged: fit.converged,
            separation_suspected: fit.separation_suspected,
            observations,
        }
    }

    #[must_use]
    pub fn term(&self, name: &str) -> Option<&RegressionTerm> {
        self.terms.iter().find(|t| t.name == name)
    }

    /// Non-intercept terms from the largest coefficient to the smallest.
    #[must_use]
    pub fn ranked_terms(&self) -> Vec<&RegressionTerm> {
        let mut terms: Vec<_> = self.terms.iter().filter(|t| !t.is_intercept()).collect();
        terms.sort_by(|a, b| b.coefficient.total_cmp(&a.coefficient));
        terms
    }
}

/// Fits the outcome against an encoded design matrix.
pub fn fit_encoded(
    design: &EncodedDesignMatrix,
    outcome: &[f64],
    options: &IrlsOptions,
) -> Result<RegressionResult, FitError> {
    let fit = fit_logistic(&design.matrix, outcome, options)?;
    if fit.separation_suspected {
        log::warn!(
            "logistic fit stopped after {} iterations: a feature separates the outcome, \
             coefficients are not finite estimates",
            fit.iterations
        );
    } else if !fit.converged {
        log::warn!(
            "logistic fit did not converge within {} iterations",
            options.max_iterations
        );
    }
    Ok(RegressionResult::from_fit(
        &design.column_names,
        fit,
        design.matrix.rows(),
    ))
}

/// Regresses the outcome of `frame` on `features`.
///
/// Rows with a missing value in any numeric feature are left out before
/// encoding.
pub fn fit_frame(
    frame: &DatasetFrame,
    features: &[&str],
    mode: EncodingMode,
    options: &IrlsOptions,
) -> Result<RegressionResult, RegressionError> {
    let complete = frame.complete_cases(features)?;
    if complete.len() < frame.len() {
        log::info!(
            "regression uses {} of {} rows after removing missing values",
            complete.len(),
            frame.len()
        );
    }
    let design = encode(&complete, features, mode)?;
    Ok(fit_encoded(&design, &complete.outcome_values(), options)?)
}
