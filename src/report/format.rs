//! Formatted terminal output.
//!
//! Formatting lives here so the pipeline stays free of presentation code.

use crate::app::pipeline::RunOutput;
use crate::domain::PipelineConfig;
use crate::report::ExcessSummary;

/// Format the full run summary: inputs, reference snapshot, coverage,
/// failures, and yearly excess.
pub fn format_run_summary(run: &RunOutput, config: &PipelineConfig) -> String {
    let report = &run.report;
    let mut out = String::new();

    out.push_str("=== asmr - daily age-standardized mortality ===\n");
    out.push_str(&format!(
        "Grid: {} .. {} ({} day(s))\n",
        report.grid_start,
        report.grid_end,
        (report.grid_end - report.grid_start).num_days() + 1
    ));
    out.push_str(&format!(
        "Baseline: {}-{} | span=±{}y | step={}d\n",
        config.baseline.start_year, config.baseline.end_year, config.baseline.anchor_years, config.baseline.day_step
    ));

    out.push_str(&format!(
        "\nReference population ({}): total={:.0}\n",
        report.reference_date, report.reference_total
    ));
    for (category, weight) in &report.reference_weights {
        out.push_str(&format!("  {category:<12} {weight:>14.0}\n"));
    }

    out.push_str(&format!(
        "\nRows: components={} | days aggregated={} | days with expected={}\n",
        report.component_rows, report.aggregate_days, report.expected_days
    ));

    if report.failures.is_empty() {
        out.push_str("\nFailures: none\n");
    } else {
        out.push_str("\nFailures:\n");
        for (kind, count) in &report.failure_counts {
            out.push_str(&format!("  {kind:<28} {count}\n"));
        }
        for failure in report.excluded_categories() {
            out.push_str(&format!("  (excluded) {failure}\n"));
        }
        let joins = report.missing_joins_by_category();
        if !joins.is_empty() {
            out.push_str("  missing joins by category:\n");
            for (category, count) in joins {
                out.push_str(&format!("    {category:<12} {count}\n"));
            }
        }
    }

    if !run.yearly_excess.is_empty() {
        out.push_str("\nExcess ASM by year:\n");
        out.push_str(&format_excess_table(&run.yearly_excess));
    }
    if let Some(period) = &run.period_excess {
        out.push_str("\nExcess ASM for requested period:\n");
        out.push_str(&format_excess_table(std::slice::from_ref(period)));
    }

    out
}

/// Format excess summaries as a fixed-width table.
pub fn format_excess_table(rows: &[ExcessSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:>6} {:>6} {:>14} {:>14} {:>12} {:>8}\n",
        "Period", "Days", "NoExp", "Actual", "Expected", "Excess", "Excess%"
    ));
    for s in rows {
        let pct = s.excess_pct.map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<24} {:>6} {:>6} {:>14.2} {:>14.2} {:>12.2} {:>8}\n",
            s.label, s.days, s.days_without_expected, s.actual_asm, s.expected_asm, s.excess_asm, pct
        ));
    }
    out
}
