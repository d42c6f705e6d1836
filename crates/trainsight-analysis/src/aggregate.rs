//! Counts and outcome rates over a [`DatasetFrame`].
//!
//! All functions are pure. Rates are fractions in `[0, 1]`; use the
//! `percent` helpers for display.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::Serialize;
use trainsight_stats::{descriptive::DescriptiveStats, percentiles::Percentiles};

use crate::frame::{DatasetFrame, FrameError};

/// Quartile points reported in numeric summaries.
pub const QUARTILES: [f64; 3] = [25.0, 50.0, 75.0];

#[expect(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

/// Positive outcomes over the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverallRate {
    pub total: usize,
    pub positive: usize,
    /// `None` for an empty frame.
    pub rate: Option<f64>,
}

impl OverallRate {
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        self.rate.map(|r| r * 100.0)
    }
}

/// Outcome counts of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRate {
    pub category: String,
    pub count: usize,
    pub positive: usize,
    pub rate: f64,
}

impl CategoryRate {
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.rate * 100.0
    }

    /// Whether the category is too small for its rate to be meaningful.
    #[must_use]
    pub fn is_small_sample(&self, min_count: usize) -> bool {
        self.count < min_count
    }

    /// Compares rates exactly by cross-multiplying counts.
    fn cmp_rate(&self, other: &Self) -> Ordering {
        let lhs = self.positive as u128 * other.count as u128;
        let rhs = other.positive as u128 * self.count as u128;
        lhs.cmp(&rhs)
    }
}

/// Total rows and positive outcomes.
///
/// # Examples
///
/// ```
/// # use trainsight_analysis::frame::{CoercionOptions, DatasetFrame, FieldSpec, RawTable};
/// use trainsight_analysis::aggregate;
///
/// let raw = RawTable::new(
///     vec!["是否学习".into()],
///     ["是", "否", "是", "是"].into_iter().map(|v| vec![v.into()]).collect(),
/// );
/// let frame = DatasetFrame::coerce(&raw, &[FieldSpec::outcome("是否学习")], &CoercionOptions::default())?;
///
/// let overall = aggregate::overall(&frame);
/// assert_eq!((overall.total, overall.positive), (4, 3));
/// assert_eq!(overall.percent(), Some(75.0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[must_use]
pub fn overall(frame: &DatasetFrame) -> OverallRate {
    let positive = frame.positive_count();
    OverallRate {
        total: frame.len(),
        positive,
        rate: ratio(positive, frame.len()),
    }
}

/// Outcome rate per category of `column`.
///
/// Ordered by descending rate; equal rates keep the sorted category order.
/// The positive counts always add up to [`overall`]'s positive count.
pub fn by_category(frame: &DatasetFrame, column: &str) -> Result<Vec<CategoryRate>, FrameError> {
    let labels = frame.categorical(column)?;
    let mut counts = BTreeMap::<&str, (usize, usize)>::new();
    for (label, &y) in labels.iter().zip(frame.outcome()) {
        let entry = counts.entry(label.as_str()).or_default();
        entry.0 += 1;
        entry.1 += usize::from(y);
    }

    let mut rates: Vec<CategoryRate> = counts
        .into_iter()
        .map(|(category, (count, positive))| CategoryRate {
            category: category.to_owned(),
            count,
            positive,
            rate: ratio(positive, count).unwrap_or_default(),
        })
        .collect();
    // stable sort keeps the label order for ties
    rates.sort_by(|a, b| b.cmp_rate(a));
    Ok(rates)
}

/// Rows whose categorical value contains a marker substring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerShare {
    pub column: String,
    pub marker: String,
    pub matching: usize,
    pub total: usize,
}

impl MarkerShare {
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        ratio(self.matching, self.total).map(|r| r * 100.0)
    }
}

/// Share of rows whose `column` contains `marker`, such as the share of women
/// in a gender column.
pub fn marker_share(
    frame: &DatasetFrame,
    column: &str,
    marker: &str,
) -> Result<MarkerShare, FrameError> {
    let labels = frame.categorical(column)?;
    Ok(MarkerShare {
        column: column.to_owned(),
        marker: marker.to_owned(),
        matching: labels.iter().filter(|l| l.contains(marker)).count(),
        total: labels.len(),
    })
}

/// Count of one `(outcome, x, hue)` combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub outcome: bool,
    pub x: String,
    pub hue: String,
    pub count: usize,
}

/// Counts `(x, hue)` pairs separately for each outcome value.
///
/// Positive outcomes come first; within an outcome the pairs are sorted.
pub fn faceted_counts(
    frame: &DatasetFrame,
    x: &str,
    hue: &str,
) -> Result<Vec<FacetCount>, FrameError> {
    let xs = frame.category_labels(x)?;
    let hues = frame.category_labels(hue)?;
    let mut counts = BTreeMap::<(bool, &str, &str), usize>::new();
    for ((&y, x), hue) in frame.outcome().iter().zip(xs.iter()).zip(hues.iter()) {
        *counts.entry((!y, x.as_str(), hue.as_str())).or_default() += 1;
    }
    Ok(counts
        .into_iter()
        .map(|((negative, x, hue), count)| FacetCount {
            outcome: !negative,
            x: x.to_owned(),
            hue: hue.to_owned(),
            count,
        })
        .collect())
}

/// Distribution of a numeric column within one outcome group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub stats: DescriptiveStats,
    pub quartiles: Percentiles,
    /// Rows of the group whose value is missing.
    pub missing: usize,
}

/// Box-plot data for a numeric column split by outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeSplitSummary {
    pub column: String,
    /// `None` when the group has no non-missing value.
    pub positive: Option<NumericSummary>,
    pub negative: Option<NumericSummary>,
}

pub fn numeric_summary_by_outcome(
    frame: &DatasetFrame,
    column: &str,
) -> Result<OutcomeSplitSummary, FrameError> {
    let values = frame.numeric(column)?;
    let summarize = |want: bool| {
        let group = values
            .iter()
            .zip(frame.outcome())
            .filter(|(_, y)| **y == want)
            .map(|(v, _)| *v);
        let mut present: Vec<f64> = group.clone().flatten().collect();
        let missing = group.filter(Option::is_none).count();
        present.sort_by(f64::total_cmp);
        let stats = DescriptiveStats::from_sorted(&present)?;
        Some(NumericSummary {
            stats,
            quartiles: Percentiles::from_sorted(&present, &QUARTILES),
            missing,
        })
    };
    Ok(OutcomeSplitSummary {
        column: column.to_owned(),
        positive: summarize(true),
        negative: summarize(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::sample_frame;

    #[test]
    fn test_rates_reconcile_with_overall() {
        let frame = sample_frame(&[
            ("是", None, "b"),
            ("否", None, "b"),
            ("是", None, "a"),
            ("是", None, "c"),
            ("否", None, "c"),
            ("否", None, "c"),
            ("是", None, "a"),
        ]);
        let rates = by_category(&frame, "group").unwrap();
        let positive: usize = rates.iter().map(|r| r.positive).sum();
        let count: usize = rates.iter().map(|r| r.count).sum();
        assert_eq!(positive, overall(&frame).positive);
        assert_eq!(count, frame.len());
    }

    #[test]
    fn test_by_category_order() {
        // a: 2/2, b: 1/2, c: 1/3, d: 1/2
        let frame = sample_frame(&[
            ("否", None, "d"),
            ("是", None, "d"),
            ("是", None, "c"),
            ("否", None, "c"),
            ("否", None, "c"),
            ("是", None, "b"),
            ("否", None, "b"),
            ("是", None, "a"),
            ("是", None, "a"),
        ]);
        let rates = by_category(&frame, "group").unwrap();
        let order: Vec<&str> = rates.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, ["a", "b", "d", "c"]);
        assert_eq!(rates[0].percent(), 100.0);
        assert!(rates[3].is_small_sample(5));
    }

    #[test]
    fn test_overall_on_empty_frame() {
        let frame = sample_frame(&[]);
        let rate = overall(&frame);
        assert_eq!(rate.total, 0);
        assert_eq!(rate.rate, None);
        assert!(by_category(&frame, "group").unwrap().is_empty());
    }

    #[test]
    fn test_marker_share() {
        let frame = sample_frame(&[
            ("是", None, "女"),
            ("否", None, "男"),
            ("否", None, "女性"),
            ("否", None, "男"),
        ]);
        let share = marker_share(&frame, "group", "女").unwrap();
        assert_eq!(share.matching, 2);
        assert_eq!(share.percent(), Some(50.0));
    }

    #[test]
    fn test_faceted_counts() {
        let frame = sample_frame(&[
            ("是", None, "a"),
            ("是", None, "a"),
            ("否", None, "b"),
        ]);
        let facets = faceted_counts(&frame, "group", "outcome").unwrap();
        assert_eq!(
            facets,
            [
                FacetCount {
                    outcome: true,
                    x: "a".into(),
                    hue: "1".into(),
                    count: 2
                },
                FacetCount {
                    outcome: false,
                    x: "b".into(),
                    hue: "0".into(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_numeric_summary_by_outcome() {
        let frame = sample_frame(&[
            ("是", Some(1.0), "a"),
            ("是", Some(3.0), "a"),
            ("是", None, "a"),
            ("否", None, "a"),
        ]);
        let summary = numeric_summary_by_outcome(&frame, "x").unwrap();
        let positive = summary.positive.unwrap();
        assert_eq!(positive.stats.count, 2);
        assert_eq!(positive.stats.mean, 2.0);
        assert_eq!(positive.quartiles.get(50.0), Some(2.0));
        assert_eq!(positive.missing, 1);
        assert!(summary.negative.is_none());
    }
}
