//! Failure reports
//!
//! A report is built when a phase exhausts its retries, then optionally
//! written to disk as JSON and Markdown.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::fs::{write_atomic, write_json_atomic};
use crate::verify::utils::sanitize_file_component;

/// Which phase failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    TestExecution,
    FunctionalVerification,
    SuccessCriteria,
}

impl FailureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureType::TestExecution => "test_execution",
            FailureType::FunctionalVerification => "functional_verification",
            FailureType::SuccessCriteria => "success_criteria",
        }
    }
}

impl std::fmt::Display for FailureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named piece of evidence attached to a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEvidence {
    pub name: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub task_id: String,
    pub failure_type: FailureType,
    pub reason: String,
    pub evidence: Vec<ReportEvidence>,
    pub retry_attempts: u32,
    /// Set once the failure has been handed off (report written or task
    /// flagged for review)
    pub escalated: bool,
    pub timestamp: DateTime<Utc>,
}

impl FailureReport {
    pub fn new(
        task_id: impl Into<String>,
        failure_type: FailureType,
        reason: impl Into<String>,
        retry_attempts: u32,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            failure_type,
            reason: reason.into(),
            evidence: Vec::new(),
            retry_attempts,
            escalated: false,
            timestamp: Utc::now(),
        }
    }

    /// Attach evidence. Values that fail to serialize are skipped.
    ///
    /// Returns whether the evidence was attached.
    pub fn add_evidence<T: Serialize + ?Sized>(&mut self, name: &str, data: &T) -> bool {
        match serde_json::to_value(data) {
            Ok(data) => {
                self.evidence.push(ReportEvidence {
                    name: name.to_string(),
                    data,
                    timestamp: Utc::now(),
                });
                true
            }
            Err(e) => {
                debug!(name, "Evidence not attached to failure report: {e}");
                false
            }
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut content = String::new();
        content.push_str(&format!("# Failure Report: {}\n\n", self.task_id));
        content.push_str(&format!("**Type:** {}\n", self.failure_type));
        content.push_str(&format!("**Reason:** {}\n", self.reason));
        content.push_str(&format!("**Retry Attempts:** {}\n", self.retry_attempts));
        content.push_str(&format!("**Escalated:** {}\n", self.escalated));
        content.push_str(&format!("**Timestamp:** {}\n\n", self.timestamp.to_rfc3339()));

        content.push_str("## Evidence\n\n");
        if self.evidence.is_empty() {
            content.push_str("*No evidence attached.*\n");
            return content;
        }

        for item in &self.evidence {
            let json = serde_json::to_string_pretty(&item.data).unwrap_or_else(|_| "null".to_string());
            content.push_str(&format!("### {}\n\n", item.name));
            content.push_str("```json\n");
            content.push_str(&json);
            content.push_str("\n```\n\n");
        }
        content
    }
}

/// JSON and Markdown destinations for a task's report.
///
/// A `report_path` containing `{task_id}` is a file stem template (any
/// `.json`/`.md` extension is replaced); otherwise it is a directory.
pub fn report_paths(root: &Path, report_path: &str, task_id: &str) -> (PathBuf, PathBuf) {
    let task_id = sanitize_file_component(task_id);

    let stem = if report_path.contains("{task_id}") {
        let expanded = report_path.replace("{task_id}", &task_id);
        let trimmed = expanded
            .strip_suffix(".json")
            .or_else(|| expanded.strip_suffix(".md"))
            .unwrap_or(&expanded)
            .to_string();
        root.join(trimmed)
    } else {
        root.join(report_path).join(&task_id)
    };

    let json = append_extension(&stem, "json");
    let md = append_extension(&stem, "md");
    (json, md)
}

fn append_extension(stem: &Path, extension: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

/// Write both renderings atomically.
///
/// Either both files are written or neither is left behind: a failed
/// Markdown write removes the JSON written before it.
pub fn write_report(report: &FailureReport, json_path: &Path, md_path: &Path) -> Result<()> {
    write_json_atomic(json_path, report)?;
    if let Err(e) = write_atomic(md_path, report.to_markdown().as_bytes()) {
        if let Err(cleanup) = std::fs::remove_file(json_path) {
            debug!(path = %json_path.display(), "Could not remove partial report: {cleanup}");
        }
        return Err(e);
    }
    Ok(())
}
