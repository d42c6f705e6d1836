//! Analysis configuration.
//!
//! An [`AnalysisConfig`] declares the input fields and every analysis to run
//! over them. It is plain serde data so it can be stored as JSON next to the
//! records it describes:
//!
//! ```json
//! {
//!   "fields": [
//!     { "name": "是否学习", "kind": "outcome" },
//!     { "name": "年资", "kind": "numeric" },
//!     { "name": "资位", "kind": "categorical" }
//!   ],
//!   "coercion": { "positive_marker": "是", "sentinel": "未标注" },
//!   "dimensions": ["资位"],
//!   "numeric_tests": ["年资"],
//!   "regression": { "features": ["年资", "资位"], "mode": "one_hot" },
//!   "segments": [
//!     {
//!       "name": "高年资低资位",
//!       "clauses": [
//!         { "source": "numeric", "column": "年资", "comparator": ">=", "threshold": 10 },
//!         { "source": "ordinal", "column": "资位", "prefix": "ZW", "comparator": "<=", "threshold": 2 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Omitted sections fall back to [`AnalysisConfig::default_workforce`].

use serde::{Deserialize, Serialize};
use trainsight_stats::{hypothesis::DEFAULT_ALPHA, logistic::IrlsOptions};

use crate::{
    encoding::EncodingMode,
    frame::{CoercionOptions, FieldKind, FieldSpec},
    segment::{Clause, Comparator, DEFAULT_PRIORITY_THRESHOLD_PCT, SegmentPredicate},
};

/// Categories with fewer rows than this are marked as small samples.
pub const DEFAULT_SMALL_SAMPLE_THRESHOLD: usize = 10;

/// Share of rows whose categorical value contains `marker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerShareQuery {
    pub label: String,
    pub column: String,
    pub marker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    pub features: Vec<String>,
    pub mode: EncodingMode,
    pub irls: IrlsOptions,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        AnalysisConfig::default_workforce().regression
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub fields: Vec<FieldSpec>,
    pub coercion: CoercionOptions,
    pub marker_shares: Vec<MarkerShareQuery>,
    /// Categorical columns reported by outcome rate and tested against the outcome.
    pub dimensions: Vec<String>,
    /// Numeric columns compared between outcome groups.
    pub numeric_tests: Vec<String>,
    pub regression: RegressionConfig,
    pub segments: Vec<SegmentPredicate>,
    /// Significance level for verdicts in the report.
    pub alpha: f64,
    pub small_sample_threshold: usize,
    pub priority_threshold_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::default_workforce()
    }
}

impl AnalysisConfig {
    /// Configuration for the standard workforce training roster.
    #[must_use]
    pub fn default_workforce() -> Self {
        const DIMENSIONS: [&str; 7] = ["性别", "学历", "厂区", "管理职", "残疾类别", "事业群", "资位"];
        const NUMERIC: [&str; 2] = ["年龄", "年资"];

        let fields = std::iter::once(FieldSpec::outcome("是否学习"))
            .chain(NUMERIC.into_iter().map(FieldSpec::numeric))
            .chain(DIMENSIONS.into_iter().map(FieldSpec::categorical))
            .collect();
        let features = ["性别", "学历", "厂区", "管理职", "年龄", "年资", "残疾类别", "事业群", "资位"];

        Self {
            fields,
            coercion: CoercionOptions::default(),
            marker_shares: vec![MarkerShareQuery {
                label: "女性占比".to_owned(),
                column: "性别".to_owned(),
                marker: "女".to_owned(),
            }],
            dimensions: DIMENSIONS.map(str::to_owned).to_vec(),
            numeric_tests: NUMERIC.map(str::to_owned).to_vec(),
            regression: RegressionConfig {
                features: features.map(str::to_owned).to_vec(),
                mode: EncodingMode::OneHot,
                irls: IrlsOptions::default(),
            },
            segments: vec![SegmentPredicate::new(
                "高年资低资位",
                vec![
                    Clause::numeric("年资", Comparator::Ge, 10.0),
                    Clause::ordinal("资位", "ZW", Comparator::Le, 2.0),
                ],
            )],
            alpha: DEFAULT_ALPHA,
            small_sample_threshold: DEFAULT_SMALL_SAMPLE_THRESHOLD,
            priority_threshold_pct: DEFAULT_PRIORITY_THRESHOLD_PCT,
        }
    }

    /// Name of the declared outcome field, if any.
    #[must_use]
    pub fn outcome_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.kind == FieldKind::Outcome)
            .map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::OrdinalOrder;

    #[test]
    fn test_default_workforce_fields() {
        let config = AnalysisConfig::default_workforce();
        assert_eq!(config.outcome_field(), Some("是否学习"));
        assert_eq!(config.fields.len(), 10);
        assert_eq!(config.alpha, 0.05);
        for feature in &config.regression.features {
            assert!(config.fields.iter().any(|f| &f.name == feature));
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "fields": [
                { "name": "joined", "kind": "outcome" },
                { "name": "site", "kind": "categorical", "missing": "drop_row" }
            ],
            "coercion": { "positive_marker": "Y" },
            "dimensions": ["site"],
            "regression": { "features": ["site"], "mode": { "ordinal": "first_seen" } }
        }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.coercion.positive_marker, "Y");
        assert_eq!(config.coercion.sentinel, "未标注");
        assert_eq!(config.outcome_field(), Some("joined"));
        assert_eq!(
            config.regression.mode,
            EncodingMode::Ordinal(OrdinalOrder::FirstSeen)
        );
        assert_eq!(config.regression.irls.max_iterations, 50);
        assert_eq!(config.small_sample_threshold, DEFAULT_SMALL_SAMPLE_THRESHOLD);
    }

    #[test]
    fn test_round_trip() {
        let config = AnalysisConfig::default_workforce();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
