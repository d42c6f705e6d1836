//! Named subpopulations defined by threshold rules.
//!
//! A [`SegmentPredicate`] is a conjunction of [`Clause`]s such as
//! `年资 >= 10 AND ordinal(资位, ZW) <= 2`. A clause reads either a numeric
//! column directly or an ordinal extracted from a categorical code with
//! [`extract_ordinal`]. A row whose clause value is missing is never a member.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::{DatasetFrame, FrameError};

/// Share of the population above which a segment deserves dedicated attention.
pub const DEFAULT_PRIORITY_THRESHOLD_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Comparator {
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Lt => value < threshold,
            Comparator::Le => value <= threshold,
            Comparator::Gt => value > threshold,
            Comparator::Ge => value >= threshold,
            Comparator::Eq => value == threshold,
            Comparator::Ne => value != threshold,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "≤",
            Comparator::Gt => ">",
            Comparator::Ge => "≥",
            Comparator::Eq => "=",
            Comparator::Ne => "≠",
        }
    }
}

/// Where a clause takes its value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ClauseSource {
    Numeric { column: String },
    /// Integer extracted from a categorical code, see [`extract_ordinal`].
    Ordinal { column: String, prefix: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    #[serde(flatten)]
    pub source: ClauseSource,
    pub comparator: Comparator,
    pub threshold: f64,
}

impl Clause {
    #[must_use]
    pub fn numeric(column: impl Into<String>, comparator: Comparator, threshold: f64) -> Self {
        Self {
            source: ClauseSource::Numeric {
                column: column.into(),
            },
            comparator,
            threshold,
        }
    }

    #[must_use]
    pub fn ordinal(
        column: impl Into<String>,
        prefix: impl Into<String>,
        comparator: Comparator,
        threshold: f64,
    ) -> Self {
        Self {
            source: ClauseSource::Ordinal {
                column: column.into(),
                prefix: prefix.into(),
            },
            comparator,
            threshold,
        }
    }

    /// Per-row values of the clause source; `None` where missing.
    fn values(&self, frame: &DatasetFrame) -> Result<Vec<Option<f64>>, FrameError> {
        Ok(match &self.source {
            ClauseSource::Numeric { column } => frame.numeric(column)?.to_vec(),
            ClauseSource::Ordinal { column, prefix } => frame
                .categorical(column)?
                .iter()
                .map(|code| extract_ordinal(code, prefix))
                .collect(),
        })
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ClauseSource::Numeric { column } => write!(f, "{column}")?,
            ClauseSource::Ordinal { column, prefix } => write!(f, "{column}({prefix}n)")?,
        }
        write!(f, " {} {}", self.comparator.symbol(), self.threshold)
    }
}

/// Extracts the integer following the first `prefix` that is directly
/// followed by ASCII digits.
///
/// # Examples
///
/// ```
/// use trainsight_analysis::segment::extract_ordinal;
///
/// assert_eq!(extract_ordinal("ZW3", "ZW"), Some(3.0));
/// assert_eq!(extract_ordinal("XZW12a", "ZW"), Some(12.0));
/// assert_eq!(extract_ordinal("ZWx ZW7", "ZW"), Some(7.0));
/// assert_eq!(extract_ordinal("未标注", "ZW"), None);
/// ```
#[must_use]
pub fn extract_ordinal(value: &str, prefix: &str) -> Option<f64> {
    value.match_indices(prefix).find_map(|(start, _)| {
        let rest = &value[start + prefix.len()..];
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .map_or(rest, |end| &rest[..end]);
        digits.parse::<f64>().ok()
    })
}

/// A named conjunction of clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPredicate {
    pub name: String,
    pub clauses: Vec<Clause>,
}

impl SegmentPredicate {
    #[must_use]
    pub fn new(name: impl Into<String>, clauses: Vec<Clause>) -> Self {
        Self {
            name: name.into(),
            clauses,
        }
    }

    /// Clauses joined with `AND`.
    #[must_use]
    pub fn description(&self) -> String {
        self.clauses
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// Size and outcome rate of the rows matching a predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub name: String,
    pub description: String,
    pub count: usize,
    pub positive: usize,
    /// `count / total rows × 100`; 0 for an empty frame.
    pub share_percent: f64,
    /// Positive rate among members; `None` for an empty segment.
    pub outcome_rate: Option<f64>,
}

impl Segment {
    /// Whether the segment covers more than `threshold_pct` percent of the population.
    #[must_use]
    pub fn is_priority(&self, threshold_pct: f64) -> bool {
        self.share_percent > threshold_pct
    }
}

/// Evaluates each predicate over `frame`, in order.
#[expect(clippy::cast_precision_loss)]
pub fn classify_segments(
    frame: &DatasetFrame,
    predicates: &[SegmentPredicate],
) -> Result<Vec<Segment>, FrameError> {
    let total = frame.len();
    predicates
        .iter()
        .map(|predicate| {
            let mut member = vec![true; total];
            for clause in &predicate.clauses {
                for (m, value) in member.iter_mut().zip(clause.values(frame)?) {
                    *m &= value.is_some_and(|v| clause.comparator.holds(v, clause.threshold));
                }
            }
            let count = member.iter().filter(|m| **m).count();
            let positive = member
                .iter()
                .zip(frame.outcome())
                .filter(|(m, y)| **m && **y)
                .count();
            let segment = Segment {
                name: predicate.name.clone(),
                description: predicate.description(),
                count,
                positive,
                share_percent: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                },
                outcome_rate: (count > 0).then(|| positive as f64 / count as f64),
            };
            log::debug!(
                "segment '{}': {} of {total} rows",
                segment.name,
                segment.count
            );
            Ok(segment)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{CoercionOptions, FieldSpec, RawTable, RawValue};

    fn workforce() -> DatasetFrame {
        let rows = [
            ("是", 12.0, "ZW1"),
            ("否", 15.0, "ZW2"),
            ("否", 11.0, "ZW2"),
            ("是", 3.0, "ZW1"),
            ("否", 20.0, "ZW5"),
            ("否", 10.0, "未标注"),
            ("是", 25.0, "ZW12"),
            ("否", 9.0, "ZW2"),
        ];
        let raw = RawTable::new(
            vec!["是否学习".into(), "年资".into(), "资位".into()],
            rows.iter()
                .map(|&(y, t, g)| vec![y.into(), RawValue::Number(t), g.into()])
                .collect(),
        );
        let specs = [
            FieldSpec::outcome("是否学习"),
            FieldSpec::numeric("年资"),
            FieldSpec::categorical("资位"),
        ];
        DatasetFrame::coerce(&raw, &specs, &CoercionOptions::default()).unwrap()
    }

    fn senior_low_grade() -> SegmentPredicate {
        SegmentPredicate::new(
            "senior, low grade",
            vec![
                Clause::numeric("年资", Comparator::Ge, 10.0),
                Clause::ordinal("资位", "ZW", Comparator::Le, 2.0),
            ],
        )
    }

    #[test]
    fn test_composite_predicate() {
        let segments = classify_segments(&workforce(), &[senior_low_grade()]).unwrap();
        let segment = &segments[0];
        // rows 0, 1, 2; the unlabeled grade is excluded
        assert_eq!(segment.count, 3);
        assert_eq!(segment.positive, 1);
        assert!((segment.share_percent - 37.5).abs() < 1e-12);
        assert!((segment.outcome_rate.unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!(segment.is_priority(DEFAULT_PRIORITY_THRESHOLD_PCT));
        assert_eq!(segment.description, "年资 ≥ 10 AND 资位(ZWn) ≤ 2");
    }

    #[test]
    fn test_empty_segment_has_undefined_rate() {
        let predicate = SegmentPredicate::new(
            "nobody",
            vec![Clause::numeric("年资", Comparator::Gt, 100.0)],
        );
        let segments = classify_segments(&workforce(), &[predicate]).unwrap();
        assert_eq!(segments[0].count, 0);
        assert_eq!(segments[0].outcome_rate, None);
        assert_eq!(segments[0].share_percent, 0.0);
        assert!(!segments[0].is_priority(DEFAULT_PRIORITY_THRESHOLD_PCT));
    }

    #[test]
    fn test_empty_predicate_matches_everyone() {
        let segments =
            classify_segments(&workforce(), &[SegmentPredicate::new("all", vec![])]).unwrap();
        assert_eq!(segments[0].count, 8);
        assert_eq!(segments[0].share_percent, 100.0);
    }

    #[test]
    fn test_unknown_column() {
        let predicate = SegmentPredicate::new(
            "bad",
            vec![Clause::numeric("资位", Comparator::Eq, 1.0)],
        );
        assert!(matches!(
            classify_segments(&workforce(), &[predicate]),
            Err(FrameError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_extract_ordinal_edge_cases() {
        assert_eq!(extract_ordinal("ZW", "ZW"), None);
        assert_eq!(extract_ordinal("zw3", "ZW"), None);
        assert_eq!(extract_ordinal("ZW03", "ZW"), Some(3.0));
    }

    #[test]
    fn test_clause_config_format() {
        let json = r#"{"source": "ordinal", "column": "资位", "prefix": "ZW", "comparator": "<=", "threshold": 2}"#;
        let clause: Clause = serde_json::from_str(json).unwrap();
        assert_eq!(clause, Clause::ordinal("资位", "ZW", Comparator::Le, 2.0));
    }
}
