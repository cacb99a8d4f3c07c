//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::azure::{StreamEnd, StreamSummary};
use crate::cleanup::CleanupOutcome;
use crate::config::{SampleSettings, ValidationResult};
use crate::sample::RunReport;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Key/value row for table display.
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl FieldRow {
    fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a run report for display.
    #[must_use]
    pub fn format_report(&self, report: &RunReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    fn format_report_text(report: &RunReport) -> String {
        let status = if report.is_success() {
            format!("{} Sample run finished", "✓".green())
        } else {
            format!("{} Sample run failed", "✗".red())
        };

        let mut output = format!("\n{status}\n\n");

        let elapsed = report.finished_at - report.started_at;
        let rows = vec![
            FieldRow::new("Resource group", report.resource_group.clone()),
            FieldRow::new("Web app", report.web_app.clone()),
            FieldRow::new(
                "Host",
                report.host_name.clone().unwrap_or_else(|| String::from("-")),
            ),
            FieldRow::new("Package", report.package_uri.clone()),
            FieldRow::new(
                "Deployment",
                if report.deployment_launched {
                    "launched"
                } else {
                    "not launched"
                },
            ),
            FieldRow::new("Log stream", Self::format_stream(report.log_stream.as_ref())),
            FieldRow::new("Cleanup", Self::format_cleanup_status(&report.cleanup)),
            FieldRow::new("Started", report.started_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            FieldRow::new("Duration", format!("{}s", elapsed.num_seconds())),
        ];

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        if let Some(error) = &report.error {
            let _ = write!(output, "\n{} {error}\n", "Error:".red());
        }

        output
    }

    fn format_stream(summary: Option<&StreamSummary>) -> String {
        summary.map_or_else(
            || String::from("not opened"),
            |s| {
                let end = match s.end {
                    StreamEnd::Exhausted => "ended",
                    StreamEnd::TimedOut => "timed out",
                };
                format!("{} lines, {end} after {}ms", s.lines_read, s.elapsed_ms)
            },
        )
    }

    fn format_cleanup_status(outcome: &CleanupOutcome) -> String {
        match outcome {
            CleanupOutcome::NothingToCleanUp => outcome.to_string().dimmed().to_string(),
            CleanupOutcome::Deleted { .. } => outcome.to_string().green().to_string(),
            CleanupOutcome::Failed { .. } => outcome.to_string().red().to_string(),
        }
    }

    /// Formats a cleanup outcome.
    #[must_use]
    pub fn format_cleanup(&self, outcome: &CleanupOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => {
                let marker = if outcome.is_clean() {
                    "✓".green()
                } else {
                    "✗".red()
                };
                format!("{marker} {outcome}\n")
            }
        }
    }

    /// Formats settings validation results.
    #[must_use]
    pub fn format_validation(&self, settings: &SampleSettings, result: &ValidationResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "valid": result.is_valid(),
                "settings": settings,
                "errors": result.errors,
                "warnings": result.warnings,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => Self::format_validation_text(settings, result),
        }
    }

    fn format_validation_text(settings: &SampleSettings, result: &ValidationResult) -> String {
        let mut output = String::new();

        if result.is_valid() {
            let _ = writeln!(output, "{} Settings are valid", "✓".green());
        } else {
            let _ = writeln!(output, "{} Settings are invalid:", "✗".red());
            for error in &result.errors {
                let _ = writeln!(output, "   - {}: {}", error.field, error.message);
            }
        }

        for warning in &result.warnings {
            let _ = writeln!(output, "{} {warning}", "⚠".yellow());
        }

        let offsets: Vec<String> = settings
            .probe_offsets_secs
            .iter()
            .map(|o| format!("{o}s"))
            .collect();
        let rows = vec![
            FieldRow::new("Region", settings.region.clone()),
            FieldRow::new("Package", settings.package_url.clone()),
            FieldRow::new("Deploy delay", format!("{}s", settings.deploy_delay_secs)),
            FieldRow::new("Probe offsets", offsets.join(", ")),
            FieldRow::new("Probe path", settings.probe_path.clone()),
            FieldRow::new("Log timeout", format!("{}s", settings.log_stream_timeout_secs)),
            FieldRow::new("Plan", format!("{} ({})", settings.plan.sku_name, settings.plan.sku_tier)),
            FieldRow::new("Playback", settings.playback.to_string()),
        ];

        output.push('\n');
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    /// Formats a probe response.
    #[must_use]
    pub fn format_probe(&self, url: &str, body: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&serde_json::json!({ "url": url, "body": body }))
                    .unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {url}\n{body}\n", "GET".cyan()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(error: Option<&str>) -> RunReport {
        let now = Utc::now();
        RunReport {
            resource_group: String::from("rg1NEMV_abc"),
            web_app: String::from("webapp1-abc"),
            host_name: Some(String::from("webapp1-abc.azurewebsites.net")),
            package_uri: String::from("https://example.com/coffeeshop.zip"),
            deployment_launched: true,
            log_stream: Some(StreamSummary {
                lines_read: 2,
                end: StreamEnd::TimedOut,
                elapsed_ms: 120_000,
            }),
            cleanup: CleanupOutcome::Deleted {
                resource_group: String::from("rg1NEMV_abc"),
            },
            started_at: now,
            finished_at: now,
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_report_json_shape() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let json: serde_json::Value =
            serde_json::from_str(&formatter.format_report(&report(None))).expect("json");

        assert_eq!(json["resource_group"], "rg1NEMV_abc");
        assert_eq!(json["log_stream"]["end"], "TimedOut");
        assert_eq!(json["cleanup"]["outcome"], "deleted");
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_report_text_mentions_error() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_report(&report(Some("Run cancelled")));

        assert!(text.contains("Sample run failed"));
        assert!(text.contains("webapp1-abc.azurewebsites.net"));
        assert!(text.contains("2 lines, timed out after 120000ms"));
        assert!(text.contains("Run cancelled"));
    }

    #[test]
    fn test_cleanup_json() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let json: serde_json::Value =
            serde_json::from_str(&formatter.format_cleanup(&CleanupOutcome::NothingToCleanUp))
                .expect("json");
        assert_eq!(json["outcome"], "nothing_to_clean_up");
    }

    #[test]
    fn test_validation_json() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let settings = SampleSettings::default();
        let json: serde_json::Value = serde_json::from_str(
            &formatter.format_validation(&settings, &ValidationResult::default()),
        )
        .expect("json");

        assert_eq!(json["valid"], true);
        assert_eq!(json["settings"]["region"], "westus");
    }
}
