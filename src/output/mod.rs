//! Output formatting
//!
//! This module provides:
//! - The conflict descriptor (JSON metapackage)
//! - Markdown output for the compatibility report
//! - Text output for terminal display

pub mod descriptor;
mod markdown;
mod text;

pub use descriptor::write_descriptor;
pub use markdown::MarkdownFormatter;
pub use text::TextFormatter;

use crate::report::CompatibilityReport;
use chrono::{DateTime, Utc};
use std::io::Write;

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Markdown document
    #[default]
    Markdown,
    /// Human-readable terminal summary
    Text,
}

/// Trait for report formatters
pub trait ReportFormatter {
    /// Format and write the report
    fn format(&self, report: &CompatibilityReport, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Create a formatter for the given format
pub fn create_formatter(format: ReportFormat, color: bool) -> Box<dyn ReportFormatter> {
    match format {
        ReportFormat::Markdown => Box::new(MarkdownFormatter::new()),
        ReportFormat::Text => Box::new(TextFormatter::new(color)),
    }
}

/// Percentage rounded to one decimal, without a trailing `.0`
pub(crate) fn format_rate(rate: f64) -> String {
    let rounded = (rate * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}
