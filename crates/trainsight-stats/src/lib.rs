//! Numerical routines behind the training participation analysis.
//!
//! This crate is free of any knowledge about datasets or columns. It provides:
//!
//! - **Descriptive statistics**: mean, median, variance, standard deviation
//! - **Percentiles**: linearly interpolated percentiles for box-plot summaries
//! - **Distributions**: normal, Student-t and chi-square tail probabilities,
//!   built on the special functions in [`special`]
//! - **Hypothesis tests**: Welch's t-test and the chi-square test of independence
//! - **Logistic regression**: IRLS maximum-likelihood fitting with singular design
//!   and separation detection
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing samples
//! - [`percentiles`]: Percentile computation and storage
//! - [`special`]: Log-gamma, incomplete beta/gamma, erfc, logistic helpers
//! - [`distribution`]: CDFs and tail probabilities used for p-values
//! - [`hypothesis`]: The [`HypothesisTest`](hypothesis::HypothesisTest) trait and Welch's t-test
//! - [`contingency`]: Contingency tables and the chi-square test
//! - [`linalg`]: Dense matrices and Cholesky factorization
//! - [`logistic`]: Logistic regression via IRLS
//!
//! # Examples
//!
//! ## Comparing two samples
//!
//! ```
//! use trainsight_stats::hypothesis::{HypothesisTest, welch_t_test};
//!
//! let outcome = welch_t_test(&[3.1, 2.9, 3.4, 3.0], &[3.0, 3.2, 2.8, 3.1]);
//! let test = outcome.test().unwrap();
//! assert!(!test.is_significant(0.05));
//! ```
//!
//! ## Testing independence
//!
//! ```
//! use trainsight_stats::contingency::ContingencyTable;
//!
//! let table = ContingencyTable::from_counts(&[[100, 0], [0, 100]]);
//! let test = table.chi_square_test();
//! assert!((test.statistic - 200.0).abs() < 1e-9);
//! assert!(test.p_value < 1e-40);
//! ```

pub mod contingency;
pub mod descriptive;
pub mod distribution;
pub mod hypothesis;
pub mod linalg;
pub mod logistic;
pub mod percentiles;
pub mod special;
