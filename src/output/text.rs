//! Terminal summary of a compatibility report
//!
//! This module provides:
//! - Overall and per-type compatibility counts with colored rates
//! - First and most recent compatible projects
//! - One line per project with its first compatible release

use crate::output::{format_date, format_rate, ReportFormatter};
use crate::report::{CompatibilityReport, ProjectCompatibility};
use colored::Colorize;
use std::io::Write;

/// Text formatter for compatibility reports
pub struct TextFormatter {
    color: bool,
}

impl TextFormatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn rate(&self, rate: f64) -> String {
        let label = format!("{}%", format_rate(rate));
        if !self.color {
            return label;
        }
        if rate >= 75.0 {
            label.green().bold().to_string()
        } else if rate >= 25.0 {
            label.yellow().to_string()
        } else {
            label.red().to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn status(&self, project: &ProjectCompatibility) -> String {
        match (project.is_compatible(), self.color) {
            (true, true) => "✓".green().to_string(),
            (true, false) => "✓".to_string(),
            (false, true) => "✗".red().to_string(),
            (false, false) => "✗".to_string(),
        }
    }

    fn write_project(&self, project: &ProjectCompatibility, writer: &mut dyn Write) -> std::io::Result<()> {
        let detail = match project.first_compatible() {
            Some(first) => format!(
                "{} ({})",
                first.version,
                format_date(&first.release_date)
            ),
            None => match project.latest() {
                Some(latest) => format!("no stable release, latest {}", latest.version),
                None => "no stable release".to_string(),
            },
        };
        let detail = if self.color && !project.is_compatible() {
            detail.dimmed().to_string()
        } else {
            detail
        };
        writeln!(
            writer,
            "  {} {} [{}] {}",
            self.status(project),
            project.display_name(),
            project.id(),
            detail
        )
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &CompatibilityReport, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            writer,
            "{}",
            self.heading(&format!(
                "Compatibility with core {}",
                report.target_core_version
            ))
        )?;
        writeln!(writer)?;
        writeln!(
            writer,
            "{} of {} projects have a compatible stable release ({})",
            report.totals.compatible,
            report.totals.total(),
            self.rate(report.rate())
        )?;

        for (project_type, stats) in &report.stats_by_type {
            writeln!(
                writer,
                "  {:<8} {}/{} ({})",
                project_type.as_str(),
                stats.compatible,
                stats.total(),
                self.rate(stats.rate())
            )?;
        }

        if let Some(first) = report.earliest_compatible.as_ref() {
            writeln!(writer)?;
            if let Some(release) = first.first_compatible() {
                writeln!(
                    writer,
                    "First compatible:       {} ({})",
                    first.display_name(),
                    format_date(&release.release_date)
                )?;
            }
            if let Some(release) = report
                .latest_compatible
                .as_ref()
                .and_then(|p| p.first_compatible().map(|r| (p, r)))
            {
                writeln!(
                    writer,
                    "Most recent compatible: {} ({})",
                    release.0.display_name(),
                    format_date(&release.1.release_date)
                )?;
            }
        }

        if !report.projects.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{}", self.heading("Projects:"))?;
            for project in &report.projects {
                self.write_project(project, writer)?;
            }
        }

        Ok(())
    }
}
