//! Participation analysis command
//!
//! Prints every section of an [`AnalysisReport`] as text tables: overall
//! participation, marker shares, per-dimension rates with independence tests,
//! numeric comparisons, the logistic regression and the configured segments.

mod table;

use std::path::PathBuf;

use clap::Args;
use trainsight_analysis::{
    encoding::{EncodingMode, OrdinalOrder},
    report::{AnalysisReport, DimensionReport, NumericReport, SectionOutcome},
};
use trainsight_stats::hypothesis::{HypothesisTest as _, WelchOutcome};

use crate::util;

#[derive(Debug, Clone, Args)]
pub(crate) struct AnalyzeArg {
    /// Path to the records JSON file
    pub records: PathBuf,

    /// Path to the analysis configuration (built-in workforce layout if omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Substring marking a positive outcome value
    #[arg(long)]
    pub outcome_marker: Option<String>,

    /// Encode categorical regression features as ordinal codes instead of indicators
    #[arg(long)]
    pub ordinal: bool,

    /// Significance level for test verdicts
    #[arg(long)]
    pub alpha: Option<f64>,
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let AnalyzeArg {
        records,
        config,
        outcome_marker,
        ordinal,
        alpha,
    } = arg;

    let mut config = util::load_config(config.as_deref())?;
    if let Some(marker) = outcome_marker {
        config.coercion.positive_marker.clone_from(marker);
    }
    if *ordinal {
        config.regression.mode = EncodingMode::Ordinal(OrdinalOrder::Sorted);
    }
    if let Some(alpha) = alpha {
        anyhow::ensure!(
            *alpha > 0.0 && *alpha < 1.0,
            "Significance level must be between 0 and 1, got {alpha}"
        );
        config.alpha = *alpha;
    }

    let report = util::build_report(records, &config)?;

    println!("Training Participation Report");
    println!("=============================");
    println!();
    println!("Records: {}", records.display());
    println!(
        "Generated: {}",
        report
            .generated_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
    );
    println!();

    print_overall(&report);
    print_marker_shares(&report);
    for dimension in &report.dimensions {
        print_dimension(dimension, &report);
    }
    for numeric in &report.numeric {
        print_numeric(numeric, report.alpha);
    }
    print_regression(&report);
    print_segments(&report);

    table::print_legend(report.small_sample_threshold, report.alpha);
    Ok(())
}

fn section_value<T>(section: &SectionOutcome<T>) -> Option<&T> {
    if let Some(error) = section.error() {
        println!("  (unavailable: {error})");
    }
    section.ok()
}

fn verdict(significant: bool) -> &'static str {
    if significant {
        "significant"
    } else {
        "not significant"
    }
}

fn print_overall(report: &AnalysisReport) {
    let overall = &report.overall;
    println!("Overall Participation:");
    println!(
        "  Employees: {} total, {} learners ({}%)",
        overall.total,
        overall.positive,
        table::fmt_opt(overall.percent(), 1)
    );
    if report.dropped_rows > 0 {
        println!(
            "  Dropped: {} rows without a '{}' value",
            report.dropped_rows, report.outcome_column
        );
    }
    println!();
}

fn print_marker_shares(report: &AnalysisReport) {
    if report.marker_shares.is_empty() {
        return;
    }
    println!("Population Shares:");
    for share in &report.marker_shares {
        println!("  {}:", share.label);
        if let Some(value) = section_value(&share.share) {
            println!(
                "    {} of {} ({}%)",
                value.matching,
                value.total,
                table::fmt_opt(value.percent(), 1)
            );
        }
    }
    println!();
}

fn print_dimension(dimension: &DimensionReport, report: &AnalysisReport) {
    println!("========================================");
    println!("Participation by {}", dimension.column);
    println!("========================================");
    println!();
    if let Some(rates) = section_value(&dimension.rates) {
        table::print_rate_table(rates, report.small_sample_threshold);
    }
    println!();
    if let Some(test) = section_value(&dimension.chi_square) {
        println!(
            "  Chi-square: χ² = {:.3}, dof = {}, p = {:.4} ({} at α = {})",
            test.statistic,
            test.dof,
            test.p_value,
            verdict(test.is_significant(report.alpha)),
            report.alpha,
        );
        if test.low_count_warning {
            println!(
                "  ⚠ {} cells with zero expected count were left out",
                test.excluded_cells
            );
        }
    }
    println!();
}

fn print_numeric(numeric: &NumericReport, alpha: f64) {
    println!("========================================");
    println!("{} by Participation", numeric.column);
    println!("========================================");
    println!();
    if let Some(summary) = section_value(&numeric.summary) {
        table::print_summary_table(summary.positive.as_ref(), summary.negative.as_ref());
    }
    println!();
    if let Some(comparison) = section_value(&numeric.t_test) {
        match &comparison.outcome {
            WelchOutcome::Determinate(test) => println!(
                "  Welch t-test: t = {:.3}, df = {:.1}, p = {:.4} ({} at α = {alpha})",
                test.t,
                test.df,
                test.p_value,
                verdict(test.is_significant(alpha)),
            ),
            WelchOutcome::Indeterminate { n1, n0 } => println!(
                "  Welch t-test: not computable ({n1} learners, {n0} others with values)"
            ),
        }
        if comparison.missing > 0 {
            println!("  {} rows without a value were skipped", comparison.missing);
        }
    }
    println!();
}

fn print_regression(report: &AnalysisReport) {
    println!("========================================");
    println!("Logistic Regression");
    println!("========================================");
    println!();
    let Some(result) = section_value(&report.regression) else {
        println!();
        return;
    };
    println!(
        "  Observations: {}, iterations: {}, log-likelihood: {:.3}",
        result.observations, result.iterations, result.log_likelihood
    );
    if result.separation_suspected {
        println!("  ⚠ Separation suspected: coefficients diverge and have no standard errors");
    } else if !result.converged {
        println!("  ⚠ Did not converge; estimates are provisional");
    }
    println!();
    let terms: Vec<_> = result
        .terms
        .iter()
        .filter(|t| t.is_intercept())
        .chain(result.ranked_terms())
        .collect();
    table::print_term_table(&terms, report.alpha);
    println!();
}

fn print_segments(report: &AnalysisReport) {
    println!("========================================");
    println!("Segments");
    println!("========================================");
    println!();
    if let Some(segments) = section_value(&report.segments) {
        if segments.is_empty() {
            println!("  (none configured)");
        } else {
            table::print_segment_table(segments, report.priority_threshold_pct);
        }
    }
    println!();
}
