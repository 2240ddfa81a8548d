//! Changeset checks before commit

use anyhow::Result;
use glob::Pattern;
use regex::Regex;
use tracing::{info, warn};

use super::parse::{added_lines, parse_diff_stat};
use super::types::{DiffValidationResult, PatternViolation};
use crate::config::{DiffValidationConfig, UnexpectedFilesAction};
use crate::vcs::{path_is_under, VersionControl};
use crate::verify::utils::truncate_string;

/// Longest added line quoted in a violation
const MAX_VIOLATION_LINE: usize = 200;

/// Checks which files changed, how much, and what was added
#[derive(Debug, Clone)]
pub struct DiffValidator {
    config: DiffValidationConfig,
    excluded_dirs: Vec<String>,
}

impl DiffValidator {
    pub fn new(config: DiffValidationConfig) -> Self {
        Self {
            config,
            excluded_dirs: Vec::new(),
        }
    }

    /// Ignore changes under these repository-relative directories, such as
    /// the gate's own evidence and report output.
    pub fn with_excluded_dirs(mut self, dirs: Vec<String>) -> Self {
        self.excluded_dirs = dirs;
        self
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excluded_dirs.iter().any(|dir| path_is_under(path, dir))
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Run the configured checks against the working tree.
    ///
    /// `expected_files` are paths or glob patterns the task declared. Git
    /// failures are reported in `error` and never fail the result.
    pub fn validate(&self, vcs: &dyn VersionControl, expected_files: &[String]) -> DiffValidationResult {
        match self.run_checks(vcs, expected_files) {
            Ok(result) => {
                info!(
                    passed = result.passed,
                    issues = result.issues.len(),
                    warnings = result.warnings.len(),
                    "Diff validation complete"
                );
                result
            }
            Err(e) => {
                warn!("Diff validation skipped: {e:#}");
                DiffValidationResult::infrastructure_error(format!("{e:#}"))
            }
        }
    }

    fn run_checks(&self, vcs: &dyn VersionControl, expected_files: &[String]) -> Result<DiffValidationResult> {
        let rules = &self.config.before_commit;
        let mut changed_files = vcs.get_changed_files()?;
        changed_files.retain(|file| !self.is_excluded(file));
        let mut result = DiffValidationResult {
            changed_files,
            ..DiffValidationResult::default()
        };

        if rules.validate_files_changed.enabled && !expected_files.is_empty() {
            self.check_files(&mut result, expected_files);
        }

        if rules.max_lines_changed.is_some() || rules.warn_if_exceeds.is_some() {
            self.check_size(&mut result, &vcs.diff_stat()?);
        }

        if !rules.disallow_patterns.is_empty() {
            self.check_patterns(&mut result, &vcs.diff()?);
        }

        Ok(result)
    }

    fn check_files(&self, result: &mut DiffValidationResult, expected_files: &[String]) {
        let rules = &self.config.before_commit;
        let matchers: Vec<FileMatcher> = expected_files.iter().map(|p| FileMatcher::new(p)).collect();

        result.unexpected_files = result
            .changed_files
            .iter()
            .filter(|file| !matchers.iter().any(|m| m.matches(file)))
            .cloned()
            .collect();

        result.missing_files = matchers
            .iter()
            .filter(|m| !result.changed_files.iter().any(|file| m.matches(file)))
            .map(|m| m.raw.clone())
            .collect();

        if !result.missing_files.is_empty() {
            result.warnings.push(format!(
                "Expected files not changed: {}",
                result.missing_files.join(", ")
            ));
        }

        if result.unexpected_files.is_empty() || rules.validate_files_changed.allow_additional_files {
            return;
        }

        let message = format!(
            "Unexpected files changed: {}",
            result.unexpected_files.join(", ")
        );
        match rules.if_unexpected_files_changed.action {
            UnexpectedFilesAction::Block => result.fail(message),
            UnexpectedFilesAction::Warn => result.warnings.push(message),
        }
    }

    fn check_size(&self, result: &mut DiffValidationResult, stat_output: &str) {
        let rules = &self.config.before_commit;
        let Some(stat) = parse_diff_stat(stat_output) else {
            result
                .warnings
                .push("Could not parse diff stat summary".to_string());
            return;
        };

        let total = stat.total_lines();
        result.total_lines_changed = Some(total);

        if let Some(max) = rules.max_lines_changed {
            if total > max {
                result.fail(format!(
                    "Diff too large: {total} lines changed (max {max}; {} insertions, {} deletions)",
                    stat.insertions, stat.deletions
                ));
                return;
            }
        }
        if let Some(threshold) = rules.warn_if_exceeds {
            if total > threshold {
                result.warnings.push(format!(
                    "Large diff: {total} lines changed (warning threshold {threshold})"
                ));
            }
        }
    }

    fn check_patterns(&self, result: &mut DiffValidationResult, diff: &str) {
        let mut added = added_lines(diff);
        added.retain(|line| !line.file.is_some_and(|file| self.is_excluded(file)));

        for rule in &self.config.before_commit.disallow_patterns {
            let regex = match Regex::new(&rule.pattern) {
                Ok(regex) => regex,
                Err(e) => {
                    warn!(pattern = %rule.pattern, "Skipping invalid disallow pattern: {e}");
                    continue;
                }
            };

            // First match only per pattern
            if let Some(hit) = added.iter().find(|line| regex.is_match(line.content)) {
                let violation = PatternViolation {
                    pattern: rule.pattern.clone(),
                    reason: rule.reason.clone(),
                    file: hit.file.map(str::to_string),
                    line: truncate_string(hit.content.trim(), MAX_VIOLATION_LINE),
                };
                let location = violation.file.as_deref().unwrap_or("diff");
                let reason = if rule.reason.is_empty() {
                    "disallowed pattern"
                } else {
                    rule.reason.as_str()
                };
                result.fail(format!(
                    "Disallowed pattern '{}' in {location}: {reason}",
                    rule.pattern
                ));
                result.violations.push(violation);
            }
        }
    }
}

/// An expected-file entry: a glob, or a literal path when it is not one
struct FileMatcher {
    raw: String,
    pattern: Option<Pattern>,
}

impl FileMatcher {
    fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            pattern: Pattern::new(raw).ok(),
        }
    }

    fn matches(&self, file: &str) -> bool {
        file == self.raw || self.pattern.as_ref().is_some_and(|p| p.matches(file))
    }
}
