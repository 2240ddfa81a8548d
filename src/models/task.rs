//! Task and check definitions supplied by the scheduler

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Task id used when the scheduler did not provide one
pub const UNKNOWN_TASK_ID: &str = "unknown";

/// A completed unit of work awaiting the quality gate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Declared success criteria checked against the filesystem
    #[serde(default)]
    pub success_criteria: Vec<CriterionDefinition>,
    /// Files (or glob patterns) the task is expected to touch
    #[serde(default)]
    pub expected_files: Vec<String>,
    /// Runtime checks specific to this task
    #[serde(default)]
    pub functional_verifications: Vec<VerificationDefinition>,
    /// How many times the scheduler has already retried this task
    #[serde(default)]
    pub retry_count: u32,
}

impl Task {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// The task id, or `"unknown"` when absent or blank
    pub fn task_id(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => id,
            _ => UNKNOWN_TASK_ID,
        }
    }

    pub fn with_criterion(mut self, criterion: CriterionDefinition) -> Self {
        self.success_criteria.push(criterion);
        self
    }

    pub fn with_expected_file(mut self, pattern: impl Into<String>) -> Self {
        self.expected_files.push(pattern.into());
        self
    }
}

/// Declarative success criterion, dispatched on `type`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionDefinition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Literal text for `string_in_file` / `string_not_in_file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Regex for `pattern_in_file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_exit_code: Option<i32>,
}

impl CriterionDefinition {
    pub fn file_exists(path: impl Into<String>) -> Self {
        Self {
            kind: "file_exists".to_string(),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn string_in_file(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: "string_in_file".to_string(),
            path: Some(path.into()),
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Declarative runtime check, dispatched on `type`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl VerificationDefinition {
    pub fn http_request(url: impl Into<String>, expected_status: u16) -> Self {
        Self {
            kind: "http_request".to_string(),
            url: Some(url.into()),
            expected_status: Some(expected_status),
            ..Self::default()
        }
    }

    pub fn port_listening(port: u16) -> Self {
        Self {
            kind: "port_listening".to_string(),
            port: Some(port),
            ..Self::default()
        }
    }
}

/// Load a task description from a YAML file
pub fn load_task(path: &Path) -> Result<Task> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read task file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse task file: {}", path.display()))
}
