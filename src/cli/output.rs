use chrono::{DateTime, Utc};
use console::{StyledObject, style};
use serde::Serialize;

use crate::core::{Record, Status};
use crate::error::{ErrorCode, JtError, Result};
use crate::sync::SaveReport;

#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    #[serde(rename = "error")]
    StructuredError {
        /// e.g. "RECORD_NOT_FOUND"
        code: ErrorCode,
        numeric_code: u16,
        message: String,
        suggestion: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
        recoverable: bool,
        category: String,
    },
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    robot_ok_with_warnings(data, Vec::new())
}

pub fn robot_ok_with_warnings<T: Serialize>(data: T, warnings: Vec<String>) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data,
        warnings,
    }
}

/// Robot error response carrying code, suggestion and context.
pub fn robot_error_structured(err: &JtError) -> RobotResponse<serde_json::Value> {
    RobotResponse {
        status: RobotStatus::from(err),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data: serde_json::Value::Null,
        warnings: Vec::new(),
    }
}

impl From<&JtError> for RobotStatus {
    fn from(err: &JtError) -> Self {
        let structured = err.to_structured();
        Self::StructuredError {
            code: structured.code,
            numeric_code: structured.numeric_code,
            message: structured.message,
            suggestion: structured.suggestion,
            context: structured.context,
            recoverable: structured.recoverable,
            category: structured.category,
        }
    }
}

pub fn emit_robot<T: Serialize>(response: &RobotResponse<T>) -> Result<()> {
    emit_json(response)
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 16,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.len().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        self.lines.push(format!(
            "{} {value}",
            style(format!("{key:width$}", width = self.key_width)).dim()
        ));
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) {
    println!("{}", layout.build());
}

/// Status label colored by outcome.
#[must_use]
pub fn status_styled(status: &Status) -> StyledObject<String> {
    let label = status.label().to_string();
    match status {
        Status::Selected => style(label).green(),
        Status::Rejected | Status::RejectedInRounds => style(label).red(),
        Status::InProgress => style(label).yellow(),
        Status::Applied => style(label).cyan(),
        Status::Other(_) => style(label),
    }
}

/// One table row for `list`.
#[must_use]
pub fn record_row(record: &Record) -> String {
    format!(
        "{:>14}  {}  {:<24}  {:<20}  {}",
        record.id,
        record.date_applied.format("%Y-%m-%d"),
        truncate(record.company_display(), 24),
        truncate(record.position.as_deref().unwrap_or("-"), 20),
        status_styled(&record.status)
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Print backend failures that did not stop the command.
pub fn warn_human(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {warning}", style("warning:").yellow().bold());
    }
}

/// Emit a mutation result and surface any write failure.
///
/// A failed primary write is returned as the command's error; failures on
/// other backends become warnings.
pub fn finish_save<T: Serialize>(
    robot_mode: bool,
    data: T,
    report: &SaveReport,
    human: impl FnOnce(&T) -> String,
) -> Result<()> {
    let warnings = report.warnings();
    if let Some(err) = report.primary_error() {
        if !robot_mode {
            warn_human(&warnings);
        }
        return Err(err);
    }
    if robot_mode {
        emit_robot(&robot_ok_with_warnings(data, warnings))
    } else {
        println!("{}", human(&data));
        warn_human(&warnings);
        Ok(())
    }
}
