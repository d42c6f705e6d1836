//! Training participation analysis over workforce records
//!
//! This crate turns raw roster records into typed columns and answers one
//! question from several angles: which attributes go together with taking
//! part in training?
//!
//! # Overview
//!
//! Every analysis reads the same immutable [`frame::DatasetFrame`]:
//!
//! 1. **Coerce Records** ([`frame::DatasetFrame::coerce`]): Validate the raw
//!    table against declared [`frame::FieldSpec`]s and type every column
//! 2. **Aggregate** ([`aggregate`]): Overall and per-category participation
//!    rates, marker shares, outcome-split numeric summaries
//! 3. **Test** ([`significance`]): Welch's t-test for numeric columns and the
//!    chi-square test of independence for categorical ones
//! 4. **Encode and Fit** ([`encoding`], [`regression`]): One-hot or ordinal
//!    design matrices and a logistic regression of the outcome
//! 5. **Segment** ([`segment`]): Size and participation of rule-defined
//!    subpopulations
//!
//! [`report::AnalysisReport`] runs all of the above as configured by a
//! [`config::AnalysisConfig`], keeping each section independent so that one
//! failing analysis does not discard the others.
//!
//! Numerical routines live in the `trainsight-stats` crate.
//!
//! # Examples
//!
//! ```
//! use trainsight_analysis::{
//!     aggregate,
//!     frame::{CoercionOptions, DatasetFrame, FieldSpec, RawTable},
//!     significance,
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let raw = RawTable::new(
//!     vec!["是否学习".into(), "学历".into()],
//!     vec![
//!         vec!["是".into(), "本科".into()],
//!         vec!["是".into(), "本科".into()],
//!         vec!["否".into(), "高中".into()],
//!         vec!["否".into(), "本科".into()],
//!     ],
//! );
//! let specs = [FieldSpec::outcome("是否学习"), FieldSpec::categorical("学历")];
//! let frame = DatasetFrame::coerce(&raw, &specs, &CoercionOptions::default())?;
//!
//! let rates = aggregate::by_category(&frame, "学历")?;
//! assert_eq!(rates[0].category, "本科");
//! assert_eq!(rates[0].positive, 2);
//!
//! let test = significance::chi_square_test(&frame, "学历", "是否学习")?;
//! assert_eq!(test.dof, 1);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod encoding;
pub mod frame;
pub mod regression;
pub mod report;
pub mod segment;
pub mod significance;
