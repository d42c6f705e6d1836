//! Tabular display of report sections

use trainsight_analysis::{
    aggregate::{CategoryRate, NumericSummary},
    regression::RegressionTerm,
    segment::Segment,
};

pub(super) fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or("N/A".to_string(), |v| format!("{v:.precision$}"))
}

/// Print outcome rates per category; categories below `min_count` rows get a `*`.
pub(super) fn print_rate_table(rates: &[CategoryRate], min_count: usize) {
    println!(
        "  {:<24} {:>8} {:>10} {:>8}",
        "Category", "Count", "Learners", "Rate%"
    );
    println!("  {}", "-".repeat(53));
    for rate in rates {
        let mark = if rate.is_small_sample(min_count) { "*" } else { "" };
        println!(
            "  {:<24} {:>8} {:>10} {:>7.1}%{mark}",
            rate.category,
            rate.count,
            rate.positive,
            rate.percent(),
        );
    }
}

/// Print descriptive statistics of a numeric column split by outcome.
pub(super) fn print_summary_table(
    positive: Option<&NumericSummary>,
    negative: Option<&NumericSummary>,
) {
    println!(
        "  {:<10} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "Group", "N", "Mean", "Std", "Min", "Q1", "Median", "Q3", "Max"
    );
    println!("  {}", "-".repeat(91));
    for (label, summary) in [("Learned", positive), ("Not", negative)] {
        let Some(summary) = summary else {
            println!("  {label:<10} {:>6}", 0);
            continue;
        };
        let stats = &summary.stats;
        println!(
            "  {:<10} {:>6} {:>9.2} {:>9.2} {:>9.2} {:>9} {:>9.2} {:>9} {:>9.2}",
            label,
            stats.count,
            stats.mean,
            stats.std_dev,
            stats.min,
            fmt_opt(summary.quartiles.get(25.0), 2),
            stats.median,
            fmt_opt(summary.quartiles.get(75.0), 2),
            stats.max,
        );
    }
}

/// Print regression terms with their odds ratios.
pub(super) fn print_term_table(terms: &[&RegressionTerm], alpha: f64) {
    println!(
        "  {:<28} {:>10} {:>10} {:>9} {:>8} {:>9}",
        "Term", "Coef", "OddsRatio", "StdErr", "z", "p"
    );
    println!("  {}", "-".repeat(79));
    for term in terms {
        let mark = if term.is_significant(alpha) { "*" } else { "" };
        println!(
            "  {:<28} {:>10.4} {:>10.3} {:>9} {:>8} {:>9}{mark}",
            term.name,
            term.coefficient,
            term.odds_ratio(),
            fmt_opt(term.standard_error, 4),
            fmt_opt(term.z_value, 2),
            fmt_opt(term.p_value, 4),
        );
    }
}

pub(super) fn print_segment_table(segments: &[Segment], priority_threshold_pct: f64) {
    println!(
        "  {:<20} {:>8} {:>8} {:>10} {:>8}",
        "Segment", "Count", "Share%", "Learners", "Rate%"
    );
    println!("  {}", "-".repeat(58));
    for segment in segments {
        let mark = if segment.is_priority(priority_threshold_pct) {
            "  ⚠ priority"
        } else {
            ""
        };
        println!(
            "  {:<20} {:>8} {:>7.1}% {:>10} {:>8}{mark}",
            segment.name,
            segment.count,
            segment.share_percent,
            segment.positive,
            fmt_opt(segment.outcome_rate.map(|r| r * 100.0), 1),
        );
        println!("    {}", segment.description);
    }
}

pub(super) fn print_legend(min_count: usize, alpha: f64) {
    println!("Legend:");
    println!("  *  (rates)  : fewer than {min_count} employees, rate is unreliable");
    println!("  *  (terms)  : coefficient significant at α = {alpha}");
    println!("  OddsRatio   : multiplicative change in the odds of learning per unit");
    println!("  N/A         : not estimable (separation or empty group)");
}
