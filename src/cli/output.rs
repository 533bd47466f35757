//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{ConfigHasher, ValidationResult};
use crate::error::ProviderError;
use crate::planner::{ActionType, ChangePlan};
use crate::reconciler::{DriftReport, OperationOutcome};
use crate::resource::ResourceKind;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// What happened to one resource during an export or a simulation.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource id.
    pub id: String,
    /// States the operation went through.
    pub trace: String,
    /// Warnings reported by the device.
    pub warnings: Vec<String>,
    /// Drift check run after the operation.
    pub drift: Option<DriftReport>,
    /// Error that ended the operation.
    pub error: Option<String>,
}

impl ResourceReport {
    /// Builds a report from a finished operation.
    #[must_use]
    pub fn from_outcome<O>(kind: ResourceKind, outcome: &OperationOutcome<O>) -> Self {
        Self {
            kind,
            id: outcome.id.clone(),
            trace: outcome.trace.to_string(),
            warnings: outcome.warnings.clone(),
            drift: None,
            error: None,
        }
    }

    /// Builds a report for a failed operation.
    #[must_use]
    pub fn failed(kind: ResourceKind, id: impl Into<String>, error: &ProviderError) -> Self {
        Self {
            kind,
            id: id.into(),
            trace: String::new(),
            warnings: Vec::new(),
            drift: None,
            error: Some(error.to_string()),
        }
    }

    /// Attaches a drift check.
    #[must_use]
    pub fn with_drift(mut self, drift: DriftReport) -> Self {
        self.drift = Some(drift);
        self
    }

    /// Returns true if the operation succeeded without drift.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && !self.drift.as_ref().is_some_and(DriftReport::has_drift)
    }
}

/// Plan action row for table display.
#[derive(Tabled)]
struct PlanActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Lines")]
    lines: usize,
}

/// Resource report row for table display.
#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Trace")]
    trace: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "valid": result.is_valid(),
                    "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "warnings": result.warnings,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();
                if result.is_valid() {
                    let _ = writeln!(output, "{} Configuration is valid", "✓".green());
                } else {
                    let _ = writeln!(
                        output,
                        "{} {} error(s) found:",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                }
                if show_warnings && !result.warnings.is_empty() {
                    let _ = writeln!(output, "\n{} Warnings:", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }
                output
            }
        }
    }

    /// Formats a change plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &ChangePlan) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &ChangePlan) -> String {
        if plan.is_empty() {
            return format!("{} No changes required.\n", "✓".green());
        }

        let mut output = String::new();
        let _ = write!(output, "\nChange Plan\n");
        let _ = write!(
            output,
            "   Config hash: {}\n\n",
            ConfigHasher::new().short_hash(&plan.config_hash)
        );

        let rows: Vec<PlanActionRow> = plan
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| PlanActionRow {
                index: i + 1,
                action: Self::format_action_type(a.action_type),
                resource: a.kind.to_string(),
                id: a.id.clone(),
                lines: a.commands.len(),
            })
            .collect();
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        for action in plan.actions.iter().filter(|a| !a.commands.is_empty()) {
            let _ = writeln!(output, "\n{}:", action.description().bold());
            for line in &action.commands {
                let _ = writeln!(output, "   {}", Self::format_line(line));
            }
        }

        let _ = write!(
            output,
            "\nPlan: {} to create, {} to replace, {} unchanged\n",
            plan.count(ActionType::Create).to_string().green(),
            plan.count(ActionType::Update).to_string().yellow(),
            plan.count(ActionType::Noop).to_string().dimmed()
        );

        output
    }

    /// Formats per-resource reports under a title.
    #[must_use]
    pub fn format_reports(&self, title: &str, reports: &[ResourceReport]) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "title": title, "resources": reports });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_reports_text(title, reports),
        }
    }

    fn format_reports_text(title: &str, reports: &[ResourceReport]) -> String {
        let mut output = format!("\n{title}\n\n");
        if reports.is_empty() {
            output.push_str("   No resources declared.\n");
            return output;
        }

        let rows: Vec<ReportRow> = reports
            .iter()
            .map(|r| ReportRow {
                resource: r.kind.to_string(),
                id: r.id.clone(),
                result: Self::format_result(r),
                trace: r.trace.clone(),
            })
            .collect();
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        for report in reports {
            if let Some(error) = &report.error {
                let _ = writeln!(output, "\n{} {} '{}': {error}", "✗".red(), report.kind, report.id);
            }
            for warning in &report.warnings {
                let _ = writeln!(output, "\n{} {} '{}': {warning}", "⚠".yellow(), report.kind, report.id);
            }
            if let Some(drift) = report.drift.as_ref().filter(|d| d.has_drift()) {
                let _ = write!(output, "\n{} {drift}", "⚠".yellow());
            }
        }

        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        let _ = write!(
            output,
            "\n{} ok, {} failed\n",
            (reports.len() - failed).to_string().green(),
            failed.to_string().red()
        );
        output
    }

    fn format_result(report: &ResourceReport) -> String {
        if report.error.is_some() {
            "failed".red().to_string()
        } else if report.drift.as_ref().is_some_and(DriftReport::has_drift) {
            "drift".yellow().to_string()
        } else {
            "ok".green().to_string()
        }
    }

    /// Formats an action type with color.
    fn format_action_type(action_type: ActionType) -> String {
        match action_type {
            ActionType::Create => "+create".green().to_string(),
            ActionType::Update => "~replace".yellow().to_string(),
            ActionType::Delete => "-delete".red().to_string(),
            ActionType::Noop => "noop".dimmed().to_string(),
        }
    }

    fn format_line(line: &str) -> String {
        if line.starts_with("delete ") {
            line.red().to_string()
        } else {
            line.green().to_string()
        }
    }
}
