//! Markdown compatibility report

use crate::output::{format_date, format_rate, ReportFormatter};
use crate::report::{CompatibilityReport, ProjectCompatibility};
use chrono::{DateTime, Utc};
use std::io::Write;

/// Markdown formatter for compatibility reports
pub struct MarkdownFormatter {
    generated_at: DateTime<Utc>,
}

impl MarkdownFormatter {
    /// Create a formatter stamping reports with the current time
    pub fn new() -> Self {
        Self::with_generated_at(Utc::now())
    }

    pub fn with_generated_at(generated_at: DateTime<Utc>) -> Self {
        Self { generated_at }
    }

    fn write_header(&self, report: &CompatibilityReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let core = &report.target_core_version;
        writeln!(writer, "# Drupal contrib compatibility report for core {}", core)?;
        writeln!(writer)?;
        writeln!(
            writer,
            "**Generated:** {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(writer)?;
        writeln!(
            writer,
            "This report shows when contributed projects got their first stable release compatible with Drupal core {}.",
            core
        )?;
        writeln!(writer)
    }

    fn write_summary(&self, report: &CompatibilityReport, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "## Summary")?;
        writeln!(writer)?;
        writeln!(writer, "### Overall compatibility")?;
        writeln!(writer)?;
        writeln!(writer, "| Metric | Value |")?;
        writeln!(writer, "|--------|-------|")?;
        writeln!(writer, "| Total projects analyzed | {} |", report.totals.total())?;
        writeln!(writer, "| Projects with stable releases | {} |", report.totals.compatible)?;
        writeln!(
            writer,
            "| Projects without stable releases | {} |",
            report.totals.incompatible
        )?;
        writeln!(
            writer,
            "| Overall compatibility rate | {}% |",
            format_rate(report.rate())
        )?;
        writeln!(writer)?;

        writeln!(writer, "### Compatibility by package type")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "| Package type | Compatible | Incompatible | Total | Compatibility rate |"
        )?;
        writeln!(
            writer,
            "|--------------|------------|--------------|-------|-------------------|"
        )?;
        for (project_type, stats) in &report.stats_by_type {
            writeln!(
                writer,
                "| {} | {} | {} | {} | {}% |",
                project_type,
                stats.compatible,
                stats.incompatible,
                stats.total(),
                format_rate(stats.rate())
            )?;
        }
        writeln!(writer)?;

        let Some(first) = &report.earliest_compatible else {
            return Ok(());
        };
        writeln!(writer, "### Release timeline")?;
        writeln!(writer)?;
        writeln!(writer, "| Metric | Project | Date |")?;
        writeln!(writer, "|--------|---------|------|")?;
        write_timeline_row(writer, "First project to get stable release", first)?;
        if let Some(last) = report
            .latest_compatible
            .as_ref()
            .filter(|last| last.id() != first.id())
        {
            write_timeline_row(writer, "Most recent stable release", last)?;
        }
        writeln!(writer)
    }

    fn write_details(&self, report: &CompatibilityReport, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "## Detailed compatibility status")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "| Project name | Package ID | Type | Status | Compatible stable version | Compatible stable released on | Latest tagged release | Latest tagged released on |"
        )?;
        writeln!(
            writer,
            "|--------------|------------|------|--------|---------------------------|-------------------------------|-----------------------|---------------------------|"
        )?;

        for project in &report.projects {
            let latest_version = project
                .latest()
                .map_or_else(|| "-".to_string(), |r| escape_cell(&r.version.to_string()));
            let latest_date = project
                .latest()
                .map_or_else(|| "-".to_string(), |r| format_date(&r.release_date));

            let (status, compatible_version, compatible_date) = match project.first_compatible() {
                Some(first) => (
                    "✅ Compatible",
                    escape_cell(&first.version.to_string()),
                    format_date(&first.release_date),
                ),
                None => ("❌ No stable release", "-".to_string(), "-".to_string()),
            };

            writeln!(
                writer,
                "| {} | {} | {} | {} | {} | {} | {} | {} |",
                escape_cell(project.display_name()),
                escape_cell(project.id()),
                project.project_type(),
                status,
                compatible_version,
                compatible_date,
                latest_version,
                latest_date
            )?;
        }
        writeln!(writer)
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &CompatibilityReport, writer: &mut dyn Write) -> std::io::Result<()> {
        self.write_header(report, writer)?;
        self.write_summary(report, writer)?;
        self.write_details(report, writer)
    }
}

fn write_timeline_row(
    writer: &mut dyn Write,
    label: &str,
    project: &ProjectCompatibility,
) -> std::io::Result<()> {
    let date = project
        .first_compatible()
        .map_or_else(|| "-".to_string(), |r| format_date(&r.release_date));
    writeln!(
        writer,
        "| {} | {} | {} |",
        label,
        escape_cell(project.display_name()),
        date
    )
}

/// Keep a value inside its table cell
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}
