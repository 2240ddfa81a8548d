//! Diff validation results

use serde::{Deserialize, Serialize};

/// A disallowed pattern found in an added line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternViolation {
    pub pattern: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub line: String,
}

/// Outcome of the diff checks.
///
/// `error` is set when git itself failed; the result then passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffValidationResult {
    pub passed: bool,
    pub issues: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub changed_files: Vec<String>,
    pub unexpected_files: Vec<String>,
    pub missing_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_lines_changed: Option<u64>,
    pub violations: Vec<PatternViolation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for DiffValidationResult {
    fn default() -> Self {
        Self {
            passed: true,
            issues: Vec::new(),
            warnings: Vec::new(),
            changed_files: Vec::new(),
            unexpected_files: Vec::new(),
            missing_files: Vec::new(),
            total_lines_changed: None,
            violations: Vec::new(),
            error: None,
        }
    }
}

impl DiffValidationResult {
    pub(crate) fn fail(&mut self, issue: String) {
        self.passed = false;
        self.issues.push(issue);
    }

    pub(crate) fn infrastructure_error(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }
}
