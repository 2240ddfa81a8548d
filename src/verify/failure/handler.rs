//! Retry and escalation decisions

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

use super::report::{report_paths, write_report, FailureReport, FailureType};
use crate::config::{EscalationAction, FailureHandlingConfig};
use crate::verify::criteria::SuccessCriterion;
use crate::verify::functional::FunctionalVerificationResult;
use crate::verify::test_execution::TestExecutionResult;
use crate::verify::utils::{extract_matching_lines, truncate_string};

/// Lines of test output worth showing to the next attempt
const FAILURE_LINE_PATTERNS: &[&str] = &[
    r"(?i)\b(fail|failed|failure|failures)\b",
    r"(?i)\berror(\[E\d+\])?\b",
    r"panicked at",
    r"(?i)assert",
    r"^\s*[✗✕×]",
];

/// Caps on how much output goes into a retry context
const MAX_CONTEXT_LINES: usize = 50;
const MAX_CONTEXT_LINE_LEN: usize = 300;

/// What the next attempt should know about the last failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryContext {
    pub failure_type: FailureType,
    /// 1-based number of the attempt about to run
    pub attempt: u32,
    pub max_retries: u32,
    pub command: String,
    pub exit_code: i32,
    pub failures: u32,
    pub errors: u32,
    pub failing_lines: Vec<String>,
}

/// Turns phase failures into retry signals or escalated reports.
///
/// Each failure type has its own retry budget. A report is only built on
/// the attempt that exhausts the budget.
#[derive(Debug, Clone)]
pub struct VerificationFailureHandler {
    config: FailureHandlingConfig,
    root: PathBuf,
}

impl VerificationFailureHandler {
    pub fn new(config: FailureHandlingConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn get_retry_count_for_failure_type(&self, failure_type: FailureType) -> u32 {
        match failure_type {
            FailureType::TestExecution => self.config.on_test_failure.max_retries,
            FailureType::FunctionalVerification => {
                self.config.on_functional_verification_failure.max_retries
            }
            FailureType::SuccessCriteria => 0,
        }
    }

    /// `(should_retry, report)` for a failed test run
    pub fn handle_test_failure(
        &self,
        task_id: &str,
        result: &TestExecutionResult,
        retry_count: u32,
    ) -> (bool, Option<FailureReport>) {
        self.handle(FailureType::TestExecution, task_id, retry_count, || {
            let mut report = FailureReport::new(
                task_id,
                FailureType::TestExecution,
                result.summary(),
                retry_count,
            );
            report.add_evidence("test_result", result);
            if let Some(context) = self.build_retry_context(result, retry_count) {
                report.add_evidence("failing_output", &context.failing_lines);
            }
            report
        })
    }

    /// `(should_retry, report)` for failed runtime checks.
    ///
    /// Configured debugging steps are attached to the report.
    pub fn handle_functional_failure(
        &self,
        task_id: &str,
        results: &[FunctionalVerificationResult],
        retry_count: u32,
    ) -> (bool, Option<FailureReport>) {
        self.handle(FailureType::FunctionalVerification, task_id, retry_count, || {
            let failed: Vec<&FunctionalVerificationResult> =
                results.iter().filter(|r| !r.verified).collect();
            let mut report = FailureReport::new(
                task_id,
                FailureType::FunctionalVerification,
                format!("{} of {} functional checks failed", failed.len(), results.len()),
                retry_count,
            );
            report.add_evidence("failed_verifications", &failed);
            let steps = &self.config.on_functional_verification_failure.enhanced_debugging;
            if !steps.is_empty() {
                report.add_evidence("enhanced_debugging", steps);
            }
            report
        })
    }

    /// Success criteria are never retried. A report is returned (and
    /// escalated) only when `create_failure_report` is set.
    pub fn handle_success_criteria_failure(
        &self,
        task_id: &str,
        criteria: &[SuccessCriterion],
    ) -> (bool, Option<FailureReport>) {
        if !self.config.enabled || !self.config.on_success_criteria_not_met.create_failure_report {
            return (false, None);
        }

        let failed: Vec<&SuccessCriterion> = criteria.iter().filter(|c| !c.verified).collect();
        let mut report = FailureReport::new(
            task_id,
            FailureType::SuccessCriteria,
            format!(
                "{} of {} success criteria not met",
                failed.len(),
                criteria.len()
            ),
            0,
        );
        report.add_evidence("unmet_criteria", &failed);
        report.add_evidence(
            "policy",
            &json!({ "action": self.config.on_success_criteria_not_met.action }),
        );
        self.escalate(&mut report);
        (false, Some(report))
    }

    fn handle(
        &self,
        failure_type: FailureType,
        task_id: &str,
        retry_count: u32,
        build: impl FnOnce() -> FailureReport,
    ) -> (bool, Option<FailureReport>) {
        if !self.config.enabled {
            return (false, None);
        }

        let max_retries = self.get_retry_count_for_failure_type(failure_type);
        if retry_count < max_retries {
            info!(
                task_id,
                %failure_type,
                attempt = retry_count + 1,
                max_retries,
                "Failure within retry budget"
            );
            return (true, None);
        }

        let mut report = build();
        self.escalate(&mut report);
        (false, Some(report))
    }

    fn escalate(&self, report: &mut FailureReport) {
        let escalation = &self.config.on_test_failure.escalate;
        if !escalation.enabled {
            return;
        }

        match escalation.action {
            EscalationAction::MarkTaskAsNeedsManualReview => {
                report.escalated = true;
                info!(task_id = %report.task_id, "Task marked as needing manual review");
            }
            EscalationAction::CreateDetailedFailureReport => {
                let (json_path, md_path) =
                    report_paths(&self.root, &escalation.report_path, &report.task_id);
                // Escalated only once both files are on disk
                let escalated = FailureReport {
                    escalated: true,
                    ..report.clone()
                };
                match write_report(&escalated, &json_path, &md_path) {
                    Ok(()) => {
                        *report = escalated;
                        info!(
                            task_id = %report.task_id,
                            path = %json_path.display(),
                            "Failure report written"
                        );
                    }
                    Err(e) => {
                        warn!(task_id = %report.task_id, "Failed to write failure report: {e:#}");
                    }
                }
            }
        }
    }

    /// Where the report for `task_id` is written
    pub fn report_paths(&self, task_id: &str) -> (PathBuf, PathBuf) {
        report_paths(
            &self.root,
            &self.config.on_test_failure.escalate.report_path,
            task_id,
        )
    }

    /// Failing lines and counts for the next attempt, when
    /// `retry_with_more_context` is set
    pub fn build_retry_context(
        &self,
        result: &TestExecutionResult,
        retry_count: u32,
    ) -> Option<RetryContext> {
        let policy = &self.config.on_test_failure;
        if !policy.retry_with_more_context {
            return None;
        }

        let patterns: Vec<String> = FAILURE_LINE_PATTERNS.iter().map(|p| p.to_string()).collect();
        let failing_lines = match extract_matching_lines(&result.output, &patterns) {
            Ok(lines) => lines
                .iter()
                .take(MAX_CONTEXT_LINES)
                .map(|l| truncate_string(l.trim_end(), MAX_CONTEXT_LINE_LEN))
                .collect(),
            Err(e) => {
                warn!("Failed to extract failing lines: {e:#}");
                Vec::new()
            }
        };

        Some(RetryContext {
            failure_type: FailureType::TestExecution,
            attempt: retry_count + 1,
            max_retries: policy.max_retries,
            command: result.command.clone(),
            exit_code: result.exit_code,
            failures: result.failures,
            errors: result.errors,
            failing_lines,
        })
    }
}
