//! Frame-level significance tests.

use serde::Serialize;
use trainsight_stats::{
    contingency::{ChiSquareTest, ContingencyTable},
    hypothesis::{WelchOutcome, welch_t_test as welch},
};

use crate::frame::{DatasetFrame, FrameError};

/// Welch's t-test of a numeric column between the outcome groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericComparison {
    pub column: String,
    /// Group 1 is the positive outcome, group 0 the negative one.
    pub outcome: WelchOutcome,
    /// Rows skipped because the value was missing.
    pub missing: usize,
}

/// Compares `column` between positive and negative outcome rows.
///
/// Missing values are removed first. A group with fewer than two remaining
/// values makes the result [`WelchOutcome::Indeterminate`].
pub fn welch_t_test(frame: &DatasetFrame, column: &str) -> Result<NumericComparison, FrameError> {
    let values = frame.numeric(column)?;
    let mut positive = vec![];
    let mut negative = vec![];
    let mut missing = 0;
    for (value, &y) in values.iter().zip(frame.outcome()) {
        match (value, y) {
            (None, _) => missing += 1,
            (Some(v), true) => positive.push(*v),
            (Some(v), false) => negative.push(*v),
        }
    }

    let outcome = welch(&positive, &negative);
    if let WelchOutcome::Indeterminate { n1, n0 } = outcome {
        log::warn!("t-test on '{column}' is indeterminate ({n1} positive, {n0} negative values)");
    }
    Ok(NumericComparison {
        column: column.to_owned(),
        outcome,
        missing,
    })
}

/// Cross-tabulates two categorical columns; either may be the outcome column.
pub fn contingency_table(
    frame: &DatasetFrame,
    rows: &str,
    cols: &str,
) -> Result<ContingencyTable, FrameError> {
    let a = frame.category_labels(rows)?;
    let b = frame.category_labels(cols)?;
    Ok(ContingencyTable::from_pairs(
        a.iter().map(String::as_str).zip(b.iter().map(String::as_str)),
    ))
}

/// Chi-square test of independence between two categorical columns.
pub fn chi_square_test(
    frame: &DatasetFrame,
    column_a: &str,
    column_b: &str,
) -> Result<ChiSquareTest, FrameError> {
    let test = contingency_table(frame, column_a, column_b)?.chi_square_test();
    if test.low_count_warning {
        log::warn!(
            "chi-square test of '{column_a}' × '{column_b}' excluded {} cells with zero expected count",
            test.excluded_cells
        );
    }
    Ok(test)
}

#[cfg(test)]
mod tests {
    use trainsight_stats::hypothesis::{DEFAULT_ALPHA, HypothesisTest};

    use super::*;
    use crate::frame::tests::sample_frame;

    #[test]
    fn test_groups_follow_outcome() {
        let frame = sample_frame(&[
            ("是", Some(10.0), "a"),
            ("是", Some(12.0), "a"),
            ("是", Some(11.0), "a"),
            ("否", Some(1.0), "a"),
            ("否", Some(2.0), "a"),
            ("否", None, "a"),
            ("否", Some(3.0), "a"),
        ]);
        let comparison = welch_t_test(&frame, "x").unwrap();
        assert_eq!(comparison.missing, 1);
        let test = comparison.outcome.test().unwrap();
        assert_eq!(test.group1.n, 3);
        assert_eq!(test.group0.n, 3);
        assert!(test.t > 0.0);
        assert!(test.is_significant(DEFAULT_ALPHA));
    }

    #[test]
    fn test_too_few_values_is_indeterminate() {
        let frame = sample_frame(&[
            ("是", Some(10.0), "a"),
            ("否", Some(1.0), "a"),
            ("否", Some(2.0), "a"),
            ("是", None, "a"),
        ]);
        let comparison = welch_t_test(&frame, "x").unwrap();
        assert_eq!(
            comparison.outcome,
            WelchOutcome::Indeterminate { n1: 1, n0: 2 }
        );
    }

    #[test]
    fn test_categorical_column_is_rejected() {
        let frame = sample_frame(&[("是", Some(1.0), "a")]);
        assert!(matches!(
            welch_t_test(&frame, "group"),
            Err(FrameError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_chi_square_against_outcome() {
        let mut rows = vec![];
        rows.extend(std::iter::repeat_n(("是", None, "a"), 30));
        rows.extend(std::iter::repeat_n(("否", None, "a"), 10));
        rows.extend(std::iter::repeat_n(("是", None, "b"), 10));
        rows.extend(std::iter::repeat_n(("否", None, "b"), 30));
        let frame = sample_frame(&rows);

        let table = contingency_table(&frame, "group", "outcome").unwrap();
        assert_eq!(table.row_labels(), ["a", "b"]);
        assert_eq!(table.col_labels(), ["0", "1"]);
        assert_eq!(table.counts(), [vec![10, 30], vec![30, 10]]);

        let test = chi_square_test(&frame, "group", "outcome").unwrap();
        assert!((test.statistic - 20.0).abs() < 1e-9);
        assert!(test.is_significant(0.001));
        assert!(!test.low_count_warning);
    }
}
