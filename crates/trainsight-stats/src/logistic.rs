//! Binary logistic regression fitted by iteratively reweighted least squares.
//!
//! The model is `P(y = 1 | x) = σ(xᵀβ)`. Starting from `β = 0`, every
//! iteration solves the weighted normal equations
//!
//! ```text
//! (Xᵀ W X) Δβ = Xᵀ (y − p),    W = diag(p (1 − p))
//! ```
//!
//! through a Cholesky factorization and stops once the largest coefficient
//! change falls below [`IrlsOptions::tolerance`].
//!
//! # Degenerate inputs
//!
//! - Collinear, constant or all-zero columns make `Xᵀ W X` singular at the
//!   starting point; this is reported as [`FitError::SingularDesign`].
//! - Separated data (a covariate that predicts the outcome perfectly) has no
//!   finite maximum. The fit stops as soon as the fitted probabilities
//!   saturate or the likelihood gain stalls while the coefficients keep
//!   growing, and reports [`LogisticFit::separation_suspected`] without
//!   standard errors.

use serde::{Deserialize, Serialize};

use crate::{
    distribution::normal_two_tailed_p,
    linalg::{Cholesky, Matrix},
    special::{log1pexp, sigmoid},
};

/// Relative pivot tolerance for the Hessian factorization.
const SINGULAR_TOLERANCE: f64 = 1e-10;
/// Residual below which every fitted probability counts as saturated.
const SATURATION_RESIDUAL: f64 = 1e-8;
/// Coefficient magnitude beyond which a stalled likelihood indicates divergence.
const DIVERGENCE_MAGNITUDE: f64 = 8.0;

/// Stopping rules for [`fit_logistic`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrlsOptions {
    pub max_iterations: usize,
    /// Convergence threshold on `max |Δβ|`.
    pub tolerance: f64,
}

impl Default for IrlsOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum FitError {
    #[display("design matrix is singular (column {column} is collinear or constant)")]
    SingularDesign { column: usize },
    #[display("design matrix has {rows} rows but {outcomes} outcomes were given")]
    DimensionMismatch { rows: usize, outcomes: usize },
    #[display("outcome at row {row} is {value}, expected 0 or 1")]
    InvalidOutcome { row: usize, value: f64 },
    #[display("design matrix has no rows or no columns")]
    EmptyDesign,
}

/// A fitted logistic model.
///
/// All vectors are aligned with the design matrix columns. Standard errors and
/// the statistics derived from them are `None` when the information matrix
/// could not be inverted at the final estimate, which only happens for
/// separated data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticFit {
    pub coefficients: Vec<f64>,
    pub standard_errors: Option<Vec<f64>>,
    pub z_values: Option<Vec<f64>>,
    pub p_values: Option<Vec<f64>>,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub converged: bool,
    pub separation_suspected: bool,
}

struct Evaluation {
    probabilities: Vec<f64>,
    weights: Vec<f64>,
    log_likelihood: f64,
}

fn evaluate(x: &Matrix, y: &[f64], beta: &[f64]) -> Evaluation {
    let eta = x.mul_vec(beta);
    let mut probabilities = Vec::with_capacity(eta.len());
    let mut weights = Vec::with_capacity(eta.len());
    let mut log_likelihood = 0.0;
    for (&e, &yi) in eta.iter().zip(y) {
        let p = sigmoid(e);
        probabilities.push(p);
        // p (1 − p) without cancellation near saturation
        weights.push(p * sigmoid(-e));
        log_likelihood += yi * e - log1pexp(e);
    }
    Evaluation {
        probabilities,
        weights,
        log_likelihood,
    }
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

fn validate(x: &Matrix, y: &[f64]) -> Result<(), FitError> {
    if x.rows() == 0 || x.cols() == 0 {
        return Err(FitError::EmptyDesign);
    }
    if x.rows() != y.len() {
        return Err(FitError::DimensionMismatch {
            rows: x.rows(),
            outcomes: y.len(),
        });
    }
    if let Some((row, &value)) = y
        .iter()
        .enumerate()
        .find(|(_, v)| **v != 0.0 && **v != 1.0)
    {
        return Err(FitError::InvalidOutcome { row, value });
    }
    Ok(())
}

/// Fits `P(y = 1 | x) = σ(xᵀβ)` by maximum likelihood.
///
/// `x` must already contain the intercept column if one is wanted. Reaching
/// the iteration cap is not an error: the result reports `converged = false`.
///
/// # Examples
///
/// ```
/// use trainsight_stats::linalg::Matrix;
/// use trainsight_stats::logistic::{IrlsOptions, fit_logistic};
///
/// let x = Matrix::from_rows(&[
///     vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0],
///     vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0],
/// ]).unwrap();
/// let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
///
/// let fit = fit_logistic(&x, &y, &IrlsOptions::default()).unwrap();
/// assert!(fit.converged);
/// // log-odds 1:3 in the reference group, 3:1 in the other
/// assert!((fit.coefficients[0] + 3.0_f64.ln()).abs() < 1e-8);
/// assert!((fit.coefficients[1] - 2.0 * 3.0_f64.ln()).abs() < 1e-8);
/// ```
pub fn fit_logistic(x: &Matrix, y: &[f64], options: &IrlsOptions) -> Result<LogisticFit, FitError> {
    validate(x, y)?;

    let mut beta = vec![0.0; x.cols()];
    let mut state = evaluate(x, y, &beta);
    let mut hessian = Cholesky::decompose(&x.weighted_gram(&state.weights), SINGULAR_TOLERANCE)
        .map_err(|e| FitError::SingularDesign { column: e.pivot })?;

    let mut iterations = 0;
    let mut converged = false;
    let mut separation_suspected = false;
    let mut previous_step = f64::INFINITY;

    while iterations < options.max_iterations {
        iterations += 1;

        let residuals: Vec<f64> = y
            .iter()
            .zip(&state.probabilities)
            .map(|(yi, pi)| yi - pi)
            .collect();
        let step = hessian.solve(&x.transpose_mul(&residuals));
        for (b, d) in beta.iter_mut().zip(&step) {
            *b += d;
        }
        let max_step = max_abs(&step);

        let next = evaluate(x, y, &beta);
        let gain = next.log_likelihood - state.log_likelihood;
        state = next;
        log::debug!(
            "IRLS iteration {iterations}: log-likelihood {:.6}, max |Δβ| {max_step:.3e}",
            state.log_likelihood
        );

        if max_step < options.tolerance {
            converged = true;
            break;
        }

        let saturated = y
            .iter()
            .zip(&state.probabilities)
            .all(|(yi, pi)| (yi - pi).abs() < SATURATION_RESIDUAL);
        let stalled = gain < options.tolerance
            && max_step > 0.5 * previous_step
            && max_abs(&beta) > DIVERGENCE_MAGNITUDE;
        if saturated || stalled {
            separation_suspected = true;
            break;
        }
        previous_step = max_step;

        match Cholesky::decompose(&x.weighted_gram(&state.weights), SINGULAR_TOLERANCE) {
            Ok(next) => hessian = next,
            Err(_) => {
                separation_suspected = true;
                break;
            }
        }
    }

    let mut fit = LogisticFit {
        coefficients: beta,
        standard_errors: None,
        z_values: None,
        p_values: None,
        log_likelihood: state.log_likelihood,
        iterations,
        converged,
        separation_suspected,
    };

    if !fit.separation_suspected {
        match Cholesky::decompose(&x.weighted_gram(&state.weights), SINGULAR_TOLERANCE) {
            Ok(information) => fill_standard_errors(&mut fit, &information),
            Err(_) => fit.separation_suspected = true,
        }
    }
    if fit.separation_suspected {
        fit.converged = false;
    }
    Ok(fit)
}

fn fill_standard_errors(fit: &mut LogisticFit, information: &Cholesky) {
    let covariance = information.inverse();
    let se: Vec<f64> = (0..fit.coefficients.len())
        .map(|j| covariance.get(j, j).max(0.0).sqrt())
        .collect();
    let z: Vec<f64> = fit
        .coefficients
        .iter()
        .zip(&se)
        .map(|(b, s)| b / s)
        .collect();
    fit.p_values = Some(z.iter().map(|&z| normal_two_tailed_p(z)).collect());
    fit.z_values = Some(z);
    fit.standard_errors = Some(se);
}
