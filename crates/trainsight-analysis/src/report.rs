//! The complete analysis of one dataset.
//!
//! [`AnalysisReport::build`] runs every analysis an [`AnalysisConfig`] asks
//! for. Each section is computed independently: a column missing from the
//! frame or a singular regression turns only its own section into
//! [`SectionOutcome::Failed`] and leaves the others intact.

use chrono::{DateTime, Utc};
use serde::Serialize;
use trainsight_stats::contingency::ChiSquareTest;

use crate::{
    aggregate::{self, CategoryRate, MarkerShare, OutcomeSplitSummary, OverallRate},
    config::{AnalysisConfig, MarkerShareQuery},
    frame::{DatasetFrame, RawTable, SchemaError},
    regression::{self, RegressionResult},
    segment::{self, Segment},
    significance::{self, NumericComparison},
};

/// Result of one report section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome<T> {
    Ok { value: T },
    Failed { error: String },
}

impl<T> SectionOutcome<T> {
    fn from_result<E>(result: Result<T, E>) -> Self
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(value) => SectionOutcome::Ok { value },
            Err(err) => SectionOutcome::Failed {
                error: err.to_string(),
            },
        }
    }

    #[must_use]
    pub fn ok(&self) -> Option<&T> {
        match self {
            SectionOutcome::Ok { value } => Some(value),
            SectionOutcome::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            SectionOutcome::Ok { .. } => None,
            SectionOutcome::Failed { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledShare {
    pub label: String,
    pub share: SectionOutcome<MarkerShare>,
}

/// Outcome rates of one categorical dimension and its independence test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionReport {
    pub column: String,
    pub rates: SectionOutcome<Vec<CategoryRate>>,
    pub chi_square: SectionOutcome<ChiSquareTest>,
}

/// Distribution and group comparison of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericReport {
    pub column: String,
    pub summary: SectionOutcome<OutcomeSplitSummary>,
    pub t_test: SectionOutcome<NumericComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub outcome_column: String,
    /// Rows removed during coercion.
    pub dropped_rows: usize,
    pub overall: OverallRate,
    pub marker_shares: Vec<LabeledShare>,
    pub dimensions: Vec<DimensionReport>,
    pub numeric: Vec<NumericReport>,
    pub regression: SectionOutcome<RegressionResult>,
    pub segments: SectionOutcome<Vec<Segment>>,
    pub alpha: f64,
    pub small_sample_threshold: usize,
    pub priority_threshold_pct: f64,
}

impl AnalysisReport {
    /// Coerces `raw` with the configured fields, then builds the report.
    pub fn run(raw: &RawTable, config: &AnalysisConfig) -> Result<Self, SchemaError> {
        let frame = DatasetFrame::coerce(raw, &config.fields, &config.coercion)?;
        Ok(Self::build(&frame, config))
    }

    #[must_use]
    pub fn build(frame: &DatasetFrame, config: &AnalysisConfig) -> Self {
        let outcome = frame.outcome_name();

        let marker_shares = config
            .marker_shares
            .iter()
            .map(|MarkerShareQuery { label, column, marker }| LabeledShare {
                label: label.clone(),
                share: SectionOutcome::from_result(aggregate::marker_share(frame, column, marker)),
            })
            .collect();

        let dimensions = config
            .dimensions
            .iter()
            .map(|column| DimensionReport {
                column: column.clone(),
                rates: SectionOutcome::from_result(aggregate::by_category(frame, column)),
                chi_square: SectionOutcome::from_result(significance::chi_square_test(
                    frame, column, outcome,
                )),
            })
            .collect();

        let numeric = config
            .numeric_tests
            .iter()
            .map(|column| NumericReport {
                column: column.clone(),
                summary: SectionOutcome::from_result(aggregate::numeric_summary_by_outcome(
                    frame, column,
                )),
                t_test: SectionOutcome::from_result(significance::welch_t_test(frame, column)),
            })
            .collect();

        let features: Vec<&str> = config
            .regression
            .features
            .iter()
            .map(String::as_str)
            .collect();
        let regression = regression::fit_frame(
            frame,
            &features,
            config.regression.mode,
            &config.regression.irls,
        );
        if let Err(err) = &regression {
            log::error!("regression section failed: {err}");
        }

        Self {
            generated_at: Utc::now(),
            outcome_column: outcome.to_owned(),
            dropped_rows: frame.dropped_outcome_rows(),
            overall: aggregate::overall(frame),
            marker_shares,
            dimensions,
            numeric,
            regression: SectionOutcome::from_result(regression),
            segments: SectionOutcome::from_result(segment::classify_segments(
                frame,
                &config.segments,
            )),
            alpha: config.alpha,
            small_sample_threshold: config.small_sample_threshold,
            priority_threshold_pct: config.priority_threshold_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use trainsight_stats::hypothesis::HypothesisTest;

    use super::*;
    use crate::{
        config::RegressionConfig,
        encoding::EncodingMode,
        frame::{CoercionOptions, FieldSpec, RawValue},
    };

    const OUTCOMES: [&str; 10] = ["是", "否", "是", "是", "否", "否", "是", "否", "是", "否"];
    // positive and negative rows share the same ages
    const AGES: [f64; 10] = [25.0, 25.0, 30.0, 35.0, 30.0, 35.0, 40.0, 40.0, 45.0, 45.0];

    fn ten_rows() -> RawTable {
        RawTable::new(
            vec!["是否学习".into(), "年龄".into(), "厂区".into(), "性别".into()],
            OUTCOMES
                .iter()
                .enumerate()
                .map(|(i, &y)| {
                    let site = if y == "是" { "北厂" } else { "南厂" };
                    let gender = if i % 3 == 0 { "女" } else { "男" };
                    vec![y.into(), RawValue::Number(AGES[i]), site.into(), gender.into()]
                })
                .collect(),
        )
    }

    fn config(features: &[&str]) -> AnalysisConfig {
        AnalysisConfig {
            fields: vec![
                FieldSpec::outcome("是否学习"),
                FieldSpec::numeric("年龄"),
                FieldSpec::categorical("厂区"),
                FieldSpec::categorical("性别"),
            ],
            coercion: CoercionOptions::default(),
            marker_shares: vec![MarkerShareQuery {
                label: "female".into(),
                column: "性别".into(),
                marker: "女".into(),
            }],
            dimensions: vec!["厂区".into(), "不存在".into()],
            numeric_tests: vec!["年龄".into()],
            regression: RegressionConfig {
                features: features.iter().map(|&f| f.to_owned()).collect(),
                mode: EncodingMode::OneHot,
                ..RegressionConfig::default()
            },
            segments: vec![],
            ..AnalysisConfig::default_workforce()
        }
    }

    #[test]
    fn test_end_to_end_ten_rows() {
        let report = AnalysisReport::run(&ten_rows(), &config(&["厂区"])).unwrap();

        assert_eq!(report.overall.total, 10);
        assert_eq!(report.overall.positive, 5);
        assert_eq!(report.overall.percent(), Some(50.0));

        let share = report.marker_shares[0].share.ok().unwrap();
        assert_eq!(share.matching, 4);

        let numeric = &report.numeric[0];
        let test = numeric.t_test.ok().unwrap().outcome.test().unwrap();
        assert!(test.t.abs() < 1e-12);
        assert!((test.p_value() - 1.0).abs() < 1e-9);

        let site = &report.dimensions[0];
        let rates = site.rates.ok().unwrap();
        assert_eq!(rates[0].category, "北厂");
        assert_eq!(rates[0].percent(), 100.0);
        assert!(site.chi_square.ok().unwrap().is_significant(0.05));

        let regression = report.regression.ok().unwrap();
        assert!(regression.separation_suspected);
        assert!(!regression.converged);
    }

    #[test]
    fn test_failed_sections_are_isolated() {
        // the unknown feature fails the regression, the unknown dimension its own section
        let report = AnalysisReport::run(&ten_rows(), &config(&["年龄", "不存在"])).unwrap();

        assert!(report.dimensions[1].rates.error().is_some());
        assert!(report.dimensions[1].chi_square.error().is_some());
        assert!(report.regression.error().is_some());

        assert!(report.dimensions[0].rates.ok().is_some());
        assert!(report.numeric[0].t_test.ok().is_some());
        assert_eq!(report.overall.positive, 5);
    }

    #[test]
    fn test_report_serializes() {
        let report = AnalysisReport::run(&ten_rows(), &config(&["年龄"])).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overall"]["positive"], 5);
        assert_eq!(json["regression"]["status"], "ok");
        assert_eq!(json["dimensions"][1]["rates"]["status"], "failed");
    }

    #[test]
    fn test_schema_error_aborts() {
        let mut config = config(&[]);
        config.fields.push(FieldSpec::numeric("年资"));
        assert!(matches!(
            AnalysisReport::run(&ten_rows(), &config),
            Err(SchemaError::MissingField { .. })
        ));
    }
}
