//! Turning frame columns into a numeric design matrix.
//!
//! The first matrix column is always the intercept [`INTERCEPT`]. Feature
//! columns follow in the order they were requested:
//!
//! - numeric columns are copied as-is and must not contain missing values;
//! - categorical columns are either expanded into indicator columns named
//!   `column[category]`, one per category except the alphabetically first
//!   (the reference), or replaced by a single integer code
//!   ([`EncodingMode::Ordinal`]).
//!
//! The same frame and feature list always produce bit-identical output.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use trainsight_stats::linalg::Matrix;

use crate::frame::{ColumnData, DatasetFrame, FrameError};

/// Name of the intercept column.
pub const INTERCEPT: &str = "const";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMode {
    /// Indicator columns with the reference category dropped.
    #[default]
    OneHot,
    /// One integer code per category. Imposes an artificial order on the
    /// categories; kept for comparison with label-encoded models.
    Ordinal(OrdinalOrder),
}

/// How ordinal codes are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdinalOrder {
    /// Codes follow the sorted category labels.
    #[default]
    Sorted,
    /// Codes follow the order in which categories first appear.
    FirstSeen,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EncodeError {
    #[display("numeric column '{column}' has a missing value at row {row}")]
    IncompleteData { column: String, row: usize },
    #[display("unknown feature column '{column}'")]
    UnknownColumn { column: String },
    #[display("the outcome column '{column}' cannot be used as a feature")]
    OutcomeAsFeature { column: String },
}

impl From<FrameError> for EncodeError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::UnknownColumn { name } | FrameError::WrongKind { name, .. } => {
                EncodeError::UnknownColumn { column: name }
            }
        }
    }
}

/// A design matrix and the name of each of its columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedDesignMatrix {
    pub column_names: Vec<String>,
    pub matrix: Matrix,
}

/// Categories of a column in the order their codes or indicators are assigned.
fn category_order<'a>(labels: &'a [String], order: OrdinalOrder) -> Vec<&'a str> {
    match order {
        OrdinalOrder::Sorted => labels
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        OrdinalOrder::FirstSeen => {
            let mut seen = BTreeSet::new();
            labels
                .iter()
                .map(String::as_str)
                .filter(|l| seen.insert(*l))
                .collect()
        }
    }
}

/// Encodes `features` of `frame` into a design matrix.
///
/// Rows of the matrix correspond one-to-one to rows of the frame.
///
/// # Examples
///
/// ```
/// # use trainsight_analysis::frame::{CoercionOptions, DatasetFrame, FieldSpec, RawTable};
/// use trainsight_analysis::encoding::{EncodingMode, encode};
///
/// let raw = RawTable::new(
///     vec!["y".into(), "site".into()],
///     vec![
///         vec!["是".into(), "B".into()],
///         vec!["否".into(), "A".into()],
///         vec!["是".into(), "C".into()],
///     ],
/// );
/// let specs = [FieldSpec::outcome("y"), FieldSpec::categorical("site")];
/// let frame = DatasetFrame::coerce(&raw, &specs, &CoercionOptions::default())?;
///
/// let design = encode(&frame, &["site"], EncodingMode::OneHot)?;
/// assert_eq!(design.column_names, ["const", "site[B]", "site[C]"]);
/// assert_eq!(design.matrix.row(0), [1.0, 1.0, 0.0]);
/// assert_eq!(design.matrix.row(1), [1.0, 0.0, 0.0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn encode(
    frame: &DatasetFrame,
    features: &[&str],
    mode: EncodingMode,
) -> Result<EncodedDesignMatrix, EncodeError> {
    let n = frame.len();
    let mut column_names = vec![INTERCEPT.to_owned()];
    let mut columns: Vec<Vec<f64>> = vec![vec![1.0; n]];

    for &feature in features {
        if feature == frame.outcome_name() {
            return Err(EncodeError::OutcomeAsFeature {
                column: feature.to_owned(),
            });
        }
        match frame.column(feature)? {
            ColumnData::Numeric(values) => {
                let column = values
                    .iter()
                    .enumerate()
                    .map(|(row, v)| {
                        v.ok_or_else(|| EncodeError::IncompleteData {
                            column: feature.to_owned(),
                            row,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                column_names.push(feature.to_owned());
                columns.push(column);
            }
            ColumnData::Categorical(labels) => match mode {
                EncodingMode::OneHot => {
                    for category in category_order(labels, OrdinalOrder::Sorted).into_iter().skip(1) {
                        column_names.push(format!("{feature}[{category}]"));
                        columns.push(
                            labels
                                .iter()
                                .map(|l| if l == category { 1.0 } else { 0.0 })
                                .collect(),
                        );
                    }
                }
                EncodingMode::Ordinal(order) => {
                    let categories = category_order(labels, order);
                    let column = labels
                        .iter()
                        .map(|l| {
                            let code = categories.iter().position(|c| *c == l.as_str());
                            code.unwrap_or_default() as f64
                        })
                        .collect();
                    column_names.push(feature.to_owned());
                    columns.push(column);
                }
            },
        }
    }

    let mut matrix = Matrix::zeros(n, column_names.len());
    for (j, column) in columns.iter().enumerate() {
        for (i, &value) in column.iter().enumerate() {
            matrix.set(i, j, value);
        }
    }
    log::debug!(
        "encoded {} features into {} columns over {n} rows",
        features.len(),
        column_names.len()
    );
    Ok(EncodedDesignMatrix {
        column_names,
        matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::sample_frame;

    fn abc_frame() -> DatasetFrame {
        sample_frame(&[
            ("是", Some(1.5), "C"),
            ("否", Some(2.5), "A"),
            ("是", Some(3.5), "B"),
            ("否", Some(4.5), "C"),
        ])
    }

    #[test]
    fn test_one_hot_drops_reference() {
        let design = encode(&abc_frame(), &["x", "group"], EncodingMode::OneHot).unwrap();
        assert_eq!(design.column_names, ["const", "x", "group[B]", "group[C]"]);
        assert_eq!(design.matrix.cols(), 4);
        assert_eq!(design.matrix.row(0), [1.0, 1.5, 0.0, 1.0]);
        assert_eq!(design.matrix.row(1), [1.0, 2.5, 0.0, 0.0]);
        assert_eq!(design.matrix.row(2), [1.0, 3.5, 1.0, 0.0]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let frame = abc_frame();
        let first = encode(&frame, &["group", "x"], EncodingMode::OneHot).unwrap();
        let second = encode(&frame, &["group", "x"], EncodingMode::OneHot).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ordinal_orders() {
        let frame = abc_frame();
        let sorted = encode(&frame, &["group"], EncodingMode::Ordinal(OrdinalOrder::Sorted)).unwrap();
        assert_eq!(sorted.column_names, ["const", "group"]);
        let codes: Vec<f64> = (0..4).map(|i| sorted.matrix.get(i, 1)).collect();
        assert_eq!(codes, [2.0, 0.0, 1.0, 2.0]);

        let first_seen =
            encode(&frame, &["group"], EncodingMode::Ordinal(OrdinalOrder::FirstSeen)).unwrap();
        let codes: Vec<f64> = (0..4).map(|i| first_seen.matrix.get(i, 1)).collect();
        assert_eq!(codes, [0.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_missing_numeric_is_rejected() {
        let frame = sample_frame(&[("是", Some(1.0), "a"), ("否", None, "b")]);
        let err = encode(&frame, &["x"], EncodingMode::OneHot).unwrap_err();
        assert_eq!(
            err,
            EncodeError::IncompleteData {
                column: "x".into(),
                row: 1
            }
        );
    }

    #[test]
    fn test_bad_feature_columns() {
        let frame = abc_frame();
        assert!(matches!(
            encode(&frame, &["outcome"], EncodingMode::OneHot),
            Err(EncodeError::OutcomeAsFeature { .. })
        ));
        assert!(matches!(
            encode(&frame, &["nope"], EncodingMode::OneHot),
            Err(EncodeError::UnknownColumn { .. })
        ));
    }
}
