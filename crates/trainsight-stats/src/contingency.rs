//! Contingency tables and the chi-square test of independence.
//!
//! A [`ContingencyTable`] counts co-occurrences of two categorical variables.
//! Row and column labels are kept in sorted order so the same observations
//! always produce the same table.
//!
//! # Expected counts of zero
//!
//! A row or column whose total is zero has expected count 0 in every cell it
//! touches. Those cells are left out of the statistic and the result carries
//! [`ChiSquareTest::low_count_warning`], so a degenerate table never yields
//! `NaN`.
//!
//! # Examples
//!
//! ```
//! use trainsight_stats::contingency::ContingencyTable;
//! use trainsight_stats::hypothesis::HypothesisTest;
//!
//! let table = ContingencyTable::from_pairs([
//!     ("female", "yes"), ("female", "yes"), ("female", "no"),
//!     ("male", "no"), ("male", "no"), ("male", "yes"),
//! ]);
//! assert_eq!(table.row_labels(), ["female", "male"]);
//! assert_eq!(table.count(0, 1), 2); // female & yes
//!
//! let test = table.chi_square_test();
//! assert_eq!(test.dof, 1);
//! assert!(!test.is_significant(0.05));
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{distribution::chi_square_sf, hypothesis::HypothesisTest};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ContingencyError {
    #[display("expected {expected} rows of counts, got {actual}")]
    RowCountMismatch { expected: usize, actual: usize },
    #[display("row {row} has {actual} counts, expected {expected}")]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Observed co-occurrence counts of two categorical variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContingencyTable {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Creates a table from explicit labels and a row-major grid of counts.
    pub fn new(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        counts: Vec<Vec<u64>>,
    ) -> Result<Self, ContingencyError> {
        if counts.len() != row_labels.len() {
            return Err(ContingencyError::RowCountMismatch {
                expected: row_labels.len(),
                actual: counts.len(),
            });
        }
        if let Some((row, r)) = counts
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != col_labels.len())
        {
            return Err(ContingencyError::ColumnCountMismatch {
                row,
                expected: col_labels.len(),
                actual: r.len(),
            });
        }
        Ok(Self {
            row_labels,
            col_labels,
            counts,
        })
    }

    /// Creates a table with generated labels (`r0`, `r1`, ... / `c0`, `c1`, ...).
    #[must_use]
    pub fn from_counts<const C: usize>(counts: &[[u64; C]]) -> Self {
        let row_labels = (0..counts.len()).map(|i| format!("r{i}")).collect();
        let col_labels = (0..C).map(|j| format!("c{j}")).collect();
        let counts = counts.iter().map(|r| r.to_vec()).collect();
        Self {
            row_labels,
            col_labels,
            counts,
        }
    }

    /// Cross-tabulates `(row category, column category)` observations.
    ///
    /// Labels are the distinct observed values in sorted order.
    #[must_use]
    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut cells = BTreeMap::<(String, String), u64>::new();
        let mut rows = BTreeMap::<String, usize>::new();
        let mut cols = BTreeMap::<String, usize>::new();
        for (a, b) in pairs {
            let (a, b) = (a.into(), b.into());
            rows.entry(a.clone()).or_default();
            cols.entry(b.clone()).or_default();
            *cells.entry((a, b)).or_default() += 1;
        }
        for (i, index) in rows.values_mut().enumerate() {
            *index = i;
        }
        for (j, index) in cols.values_mut().enumerate() {
            *index = j;
        }

        let mut counts = vec![vec![0; cols.len()]; rows.len()];
        for ((a, b), n) in cells {
            counts[rows[&a]][cols[&b]] = n;
        }
        Self {
            row_labels: rows.into_keys().collect(),
            col_labels: cols.into_keys().collect(),
            counts,
        }
    }

    #[must_use]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    #[must_use]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    #[must_use]
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    #[must_use]
    pub fn count(&self, row: usize, col: usize) -> u64 {
        self.counts[row][col]
    }

    #[must_use]
    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|r| r.iter().sum()).collect()
    }

    #[must_use]
    pub fn col_totals(&self) -> Vec<u64> {
        (0..self.col_labels.len())
            .map(|j| self.counts.iter().map(|r| r[j]).sum())
            .collect()
    }

    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Expected counts under independence: `row total × column total / grand total`.
    ///
    /// All zeros when the table is empty.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn expected(&self) -> Vec<Vec<f64>> {
        let row_totals = self.row_totals();
        let col_totals = self.col_totals();
        let grand = self.grand_total();
        row_totals
            .iter()
            .map(|&rt| {
                col_totals
                    .iter()
                    .map(|&ct| {
                        if grand == 0 {
                            0.0
                        } else {
                            rt as f64 * ct as f64 / grand as f64
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Pearson chi-square test of independence.
    ///
    /// `dof = (rows − 1)(cols − 1)`. A table with zero degrees of freedom
    /// reports statistic 0 and p-value 1.
    #[must_use]
    pub fn chi_square_test(&self) -> ChiSquareTest {
        self.chi_square_with(false)
    }

    /// Chi-square test with Yates' continuity correction applied to 2×2 tables.
    ///
    /// Each `|O − E|` is reduced by `min(0.5, |O − E|)` when `dof == 1`; other
    /// shapes are tested exactly as [`chi_square_test`](Self::chi_square_test).
    #[must_use]
    pub fn chi_square_test_corrected(&self) -> ChiSquareTest {
        self.chi_square_with(true)
    }

    #[expect(clippy::cast_precision_loss)]
    fn chi_square_with(&self, continuity_correction: bool) -> ChiSquareTest {
        let expected = self.expected();
        let dof = self.row_labels.len().saturating_sub(1) * self.col_labels.len().saturating_sub(1);
        let correct = continuity_correction && dof == 1;

        let mut statistic = 0.0;
        let mut excluded_cells = 0;
        for (observed_row, expected_row) in self.counts.iter().zip(&expected) {
            for (&o, &e) in observed_row.iter().zip(expected_row) {
                if e <= 0.0 {
                    excluded_cells += 1;
                    continue;
                }
                let mut deviation = (o as f64 - e).abs();
                if correct {
                    deviation -= deviation.min(0.5);
                }
                statistic += deviation * deviation / e;
            }
        }

        let p_value = if dof == 0 {
            statistic = 0.0;
            1.0
        } else {
            chi_square_sf(statistic, dof as f64)
        };

        ChiSquareTest {
            statistic,
            dof,
            p_value,
            observed: self.clone(),
            expected,
            low_count_warning: excluded_cells > 0,
            excluded_cells,
            continuity_corrected: correct,
        }
    }
}

/// Result of a chi-square test of independence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareTest {
    /// `Σ (O − E)² / E` over cells with `E > 0`.
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64,
    /// The observed table the test was run on.
    pub observed: ContingencyTable,
    /// Expected counts, aligned with `observed`.
    pub expected: Vec<Vec<f64>>,
    /// Set when at least one cell had an expected count of zero and was excluded.
    pub low_count_warning: bool,
    /// Number of excluded cells.
    pub excluded_cells: usize,
    /// Whether Yates' correction was applied.
    pub continuity_corrected: bool,
}

impl HypothesisTest for ChiSquareTest {
    fn statistic(&self) -> f64 {
        self.statistic
    }

    #[expect(clippy::cast_precision_loss)]
    fn degrees_of_freedom(&self) -> Option<f64> {
        Some(self.dof as f64)
    }

    fn p_value(&self) -> f64 {
        self.p_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_table_is_independent() {
        let test = ContingencyTable::from_counts(&[[50, 50], [50, 50]]).chi_square_test();
        assert!(test.statistic.abs() < 1e-12);
        assert!((test.p_value - 1.0).abs() < 1e-12);
        assert_eq!(test.dof, 1);
        assert!(!test.low_count_warning);
    }

    #[test]
    fn test_total_separation_is_significant() {
        let test = ContingencyTable::from_counts(&[[100, 0], [0, 100]]).chi_square_test();
        assert!((test.statistic - 200.0).abs() < 1e-9);
        assert!(test.p_value < 1e-40);
        assert!(test.is_significant(0.001));
        // Every expected count is 50, so nothing is excluded
        assert!(!test.low_count_warning);
    }

    #[test]
    fn test_zero_total_category_sets_warning() {
        let test = ContingencyTable::from_counts(&[[100, 0], [0, 100], [0, 0]]).chi_square_test();
        assert!(test.low_count_warning);
        assert_eq!(test.excluded_cells, 2);
        assert_eq!(test.dof, 2);
        assert!(test.statistic.is_finite());
        assert!(test.p_value.is_finite());
        assert!(test.p_value < 1e-40);
    }

    #[test]
    fn test_empty_table_does_not_produce_nan() {
        let table = ContingencyTable::from_counts(&[[0, 0], [0, 0]]);
        let test = table.chi_square_test();
        assert_eq!(test.statistic, 0.0);
        assert_eq!(test.p_value, 1.0);
        assert!(test.low_count_warning);
        assert_eq!(test.excluded_cells, 4);
    }

    #[test]
    fn test_single_row_has_zero_dof() {
        let test = ContingencyTable::from_counts(&[[10, 20, 30]]).chi_square_test();
        assert_eq!(test.dof, 0);
        assert_eq!(test.p_value, 1.0);
    }

    #[test]
    fn test_known_three_by_two_value() {
        // expected counts are [[15, 15], [20, 20], [25, 25]]
        let test = ContingencyTable::from_counts(&[[10, 20], [20, 20], [30, 20]]).chi_square_test();
        let expected_stat = 25.0 / 15.0 * 2.0 + 25.0 / 25.0 * 2.0;
        assert!((test.statistic - expected_stat).abs() < 1e-12);
        assert_eq!(test.dof, 2);
        assert!((test.p_value - (-expected_stat / 2.0).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_yates_correction_only_for_two_by_two() {
        let table = ContingencyTable::from_counts(&[[12, 5], [7, 15]]);
        let plain = table.chi_square_test();
        let corrected = table.chi_square_test_corrected();
        assert!(corrected.continuity_corrected);
        assert!(corrected.statistic < plain.statistic);
        assert!(corrected.p_value > plain.p_value);

        let wide = ContingencyTable::from_counts(&[[12, 5, 3], [7, 15, 9]]);
        assert_eq!(
            wide.chi_square_test().statistic,
            wide.chi_square_test_corrected().statistic
        );
    }

    #[test]
    fn test_from_pairs_orders_labels() {
        let table = ContingencyTable::from_pairs([("b", "y"), ("a", "x"), ("b", "x"), ("a", "x")]);
        assert_eq!(table.row_labels(), ["a", "b"]);
        assert_eq!(table.col_labels(), ["x", "y"]);
        assert_eq!(table.counts(), [vec![2, 0], vec![1, 1]]);
        assert_eq!(table.grand_total(), 4);
    }

    #[test]
    fn test_new_validates_shape() {
        let err = ContingencyTable::new(
            vec!["a".into(), "b".into()],
            vec!["x".into()],
            vec![vec![1]],
        )
        .unwrap_err();
        assert!(matches!(err, ContingencyError::RowCountMismatch { .. }));
    }
}
