//! Two-sample hypothesis testing.
//!
//! [`welch_t_test`] compares the means of two independent samples without
//! assuming equal variances. Samples with fewer than two observations cannot
//! produce a variance estimate, so the test reports
//! [`WelchOutcome::Indeterminate`] instead of dividing by zero.
//!
//! # Examples
//!
//! ```
//! use trainsight_stats::hypothesis::{HypothesisTest, WelchOutcome, welch_t_test};
//!
//! let treated = [5.1, 4.9, 5.6, 5.8, 6.0, 5.5];
//! let control = [4.2, 4.8, 4.4, 4.0, 4.6, 4.5];
//!
//! let WelchOutcome::Determinate(test) = welch_t_test(&treated, &control) else {
//!     panic!("both groups have at least two values");
//! };
//! assert!(test.t > 0.0);
//! assert!(test.is_significant(0.05));
//! ```

use serde::Serialize;

use crate::{
    descriptive::{mean, sample_variance},
    distribution::student_t_two_tailed_p,
};

/// Significance level used when callers do not choose one.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Common view over test results.
pub trait HypothesisTest {
    /// The test statistic.
    fn statistic(&self) -> f64;
    /// Degrees of freedom of the reference distribution, when it has any.
    fn degrees_of_freedom(&self) -> Option<f64>;
    /// The p-value of the test.
    fn p_value(&self) -> f64;

    /// Whether the null hypothesis is rejected at significance level `alpha`.
    fn is_significant(&self, alpha: f64) -> bool {
        self.p_value() < alpha
    }
}

/// Size, mean, and unbiased variance of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleSummary {
    pub n: usize,
    pub mean: f64,
    pub variance: f64,
}

impl SampleSummary {
    /// Summarizes `values`, or returns `None` for an empty sample.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        Some(Self {
            n: values.len(),
            mean,
            variance: sample_variance(values, mean),
        })
    }

    #[expect(clippy::cast_precision_loss)]
    fn variance_of_mean(&self) -> f64 {
        self.variance / self.n as f64
    }
}

/// Result of Welch's unequal-variance t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchTTest {
    /// `(mean₁ − mean₀) / sqrt(s₁²/n₁ + s₀²/n₀)`
    pub t: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub df: f64,
    /// Two-tailed p-value.
    pub p_value: f64,
    /// The first group (numerator side of the mean difference).
    pub group1: SampleSummary,
    /// The second group.
    pub group0: SampleSummary,
}

impl HypothesisTest for WelchTTest {
    fn statistic(&self) -> f64 {
        self.t
    }

    fn degrees_of_freedom(&self) -> Option<f64> {
        Some(self.df)
    }

    fn p_value(&self) -> f64 {
        self.p_value
    }
}

/// Outcome of [`welch_t_test`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WelchOutcome {
    Determinate(WelchTTest),
    /// At least one group has fewer than two observations.
    Indeterminate { n1: usize, n0: usize },
}

impl WelchOutcome {
    /// The test result, if it could be computed.
    #[must_use]
    pub fn test(&self) -> Option<&WelchTTest> {
        match self {
            WelchOutcome::Determinate(test) => Some(test),
            WelchOutcome::Indeterminate { .. } => None,
        }
    }
}

/// Runs Welch's t-test of `group1` against `group0`.
///
/// Values must already be free of missing entries. When both groups have zero
/// variance the statistic is `0` for equal means (p = 1) and `±∞` otherwise
/// (p = 0); degrees of freedom then fall back to `n₁ + n₀ − 2`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn welch_t_test(group1: &[f64], group0: &[f64]) -> WelchOutcome {
    let indeterminate = WelchOutcome::Indeterminate {
        n1: group1.len(),
        n0: group0.len(),
    };
    if group1.len() < 2 || group0.len() < 2 {
        return indeterminate;
    }
    let (Some(s1), Some(s0)) = (
        SampleSummary::from_values(group1),
        SampleSummary::from_values(group0),
    ) else {
        return indeterminate;
    };

    let v1 = s1.variance_of_mean();
    let v0 = s0.variance_of_mean();
    let se2 = v1 + v0;
    let diff = s1.mean - s0.mean;

    let (t, df) = if se2 > 0.0 {
        let t = diff / se2.sqrt();
        let df = se2 * se2 / (v1 * v1 / (s1.n - 1) as f64 + v0 * v0 / (s0.n - 1) as f64);
        (t, df)
    } else {
        let pooled_df = (s1.n + s0.n - 2) as f64;
        let t = if diff == 0.0 {
            0.0
        } else {
            f64::INFINITY.copysign(diff)
        };
        (t, pooled_df)
    };

    WelchOutcome::Determinate(WelchTTest {
        t,
        df,
        p_value: student_t_two_tailed_p(t, df),
        group1: s1,
        group0: s0,
    })
}
