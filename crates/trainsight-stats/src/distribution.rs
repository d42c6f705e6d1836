//! Cumulative distribution and tail functions used for p-values.

use std::f64::consts::SQRT_2;

use crate::special::{erfc, regularized_beta, regularized_gamma_q};

/// Standard normal CDF `Φ(z)`.
///
/// # Examples
///
/// ```
/// use trainsight_stats::distribution::normal_cdf;
///
/// assert!((normal_cdf(0.0) - 0.5).abs() < 1e-15);
/// assert!((normal_cdf(1.959_963_984_540_054) - 0.975).abs() < 1e-12);
/// ```
#[must_use]
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

/// Two-tailed p-value `P(|Z| >= |z|)` under the standard normal.
#[must_use]
pub fn normal_two_tailed_p(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    erfc(z.abs() / SQRT_2).min(1.0)
}

/// Two-tailed p-value `P(|T| >= |t|)` for Student's t with `df` degrees of freedom.
///
/// Uses `P = I_{df / (df + t²)}(df / 2, 1 / 2)`; infinite `t` gives 0.
///
/// # Examples
///
/// ```
/// use trainsight_stats::distribution::student_t_two_tailed_p;
///
/// assert_eq!(student_t_two_tailed_p(0.0, 5.0), 1.0);
/// // t = 2.228 is the 97.5% quantile for 10 degrees of freedom
/// assert!((student_t_two_tailed_p(2.228_138_851_986_27, 10.0) - 0.05).abs() < 1e-9);
/// ```
#[must_use]
pub fn student_t_two_tailed_p(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    let x = df / (df + t * t);
    regularized_beta(x, 0.5 * df, 0.5).clamp(0.0, 1.0)
}

/// Upper tail `P(X >= x)` of the chi-square distribution with `df` degrees of freedom.
///
/// # Examples
///
/// ```
/// use trainsight_stats::distribution::chi_square_sf;
///
/// // 3.841 is the 95% quantile for one degree of freedom
/// assert!((chi_square_sf(3.841_458_820_694_124, 1.0) - 0.05).abs() < 1e-9);
/// ```
#[must_use]
pub fn chi_square_sf(x: f64, df: f64) -> f64 {
    if x.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    regularized_gamma_q(0.5 * df, 0.5 * x).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_cdf_symmetry() {
        for z in [0.1, 0.5, 1.0, 2.0, 3.5] {
            assert!((normal_cdf(z) + normal_cdf(-z) - 1.0).abs() < 1e-14);
        }
    }

    #[test]
    fn test_normal_two_tailed_known_values() {
        assert!((normal_two_tailed_p(0.0) - 1.0).abs() < 1e-15);
        assert!((normal_two_tailed_p(1.959_963_984_540_054) - 0.05).abs() < 1e-12);
        assert!((normal_two_tailed_p(-2.575_829_303_548_901) - 0.01).abs() < 1e-12);
        assert!(normal_two_tailed_p(40.0) < 1e-300);
    }

    #[test]
    fn test_student_t_approaches_normal() {
        let t = 1.96;
        let p_t = student_t_two_tailed_p(t, 1e4);
        let p_z = normal_two_tailed_p(t);
        assert!((p_t - p_z).abs() < 1e-4);
    }

    #[test]
    fn test_student_t_cauchy_case() {
        // df = 1 is Cauchy: P(|T| >= 1) = 0.5
        assert!((student_t_two_tailed_p(1.0, 1.0) - 0.5).abs() < 1e-12);
        assert_eq!(student_t_two_tailed_p(f64::INFINITY, 3.0), 0.0);
    }

    #[test]
    fn test_chi_square_two_df_is_exponential() {
        // With 2 degrees of freedom the survival function is exp(-x/2)
        for x in [0.5, 2.0, 7.0] {
            assert!((chi_square_sf(x, 2.0) - (-x / 2.0).exp()).abs() < 1e-13);
        }
        assert_eq!(chi_square_sf(0.0, 4.0), 1.0);
    }

    #[test]
    fn test_invalid_degrees_of_freedom() {
        assert!(chi_square_sf(1.0, 0.0).is_nan());
        assert!(student_t_two_tailed_p(1.0, -1.0).is_nan());
    }
}
