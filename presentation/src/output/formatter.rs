//! Output formatter trait

use super::report::CouncilReport;
use council_domain::OutputFormat;

/// Trait for formatting council results
pub trait OutputFormatter {
    /// Results table, reviews and verdict
    fn format(&self, report: &CouncilReport) -> String;

    /// Format as JSON
    fn format_json(&self, report: &CouncilReport) -> String;

    /// Verdict only (concise output)
    fn format_verdict_only(&self, report: &CouncilReport) -> String;

    fn render(&self, report: &CouncilReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(report),
            OutputFormat::Verdict => self.format_verdict_only(report),
            OutputFormat::Json => self.format_json(report),
        }
    }
}
