//! Phase orchestration

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::footer::render_footer;
use super::result::QualityGateResult;
use crate::config::{validate_config, ConfigError, QualityGatesConfig};
use crate::evidence::EvidenceCollector;
use crate::models::Task;
use crate::vcs::{path_is_under, VersionControl};
use crate::verify::context::CommandContext;
use crate::verify::criteria::SuccessCriteriaVerifier;
use crate::verify::diff::DiffValidator;
use crate::verify::failure::VerificationFailureHandler;
use crate::verify::functional::FunctionalVerifier;
use crate::verify::test_execution::TestExecutionValidator;
use crate::verify::truth::TruthEnforcer;

/// Runs every gate phase for a changeset and merges the outcome.
///
/// Phase order: preflight, tests, success criteria, functional checks,
/// diff, claims. The first blocking phase ends the run. Evidence is saved
/// on every return once collection has started.
pub struct QualityGatesCoordinator {
    config: QualityGatesConfig,
    repo_root: PathBuf,
    vcs: Box<dyn VersionControl>,
    artifact_dirs: Vec<String>,
    diff_validator: DiffValidator,
    truth_enforcer: TruthEnforcer,
    failure_handler: VerificationFailureHandler,
}

impl QualityGatesCoordinator {
    /// Validate the configuration and build the phase components
    pub fn new(
        config: QualityGatesConfig,
        repo_root: impl Into<PathBuf>,
        vcs: Box<dyn VersionControl>,
    ) -> Result<Self, ConfigError> {
        validate_config(&config)?;
        let repo_root = repo_root.into();
        let artifact_dirs = config.artifact_dirs(&repo_root);

        Ok(Self {
            diff_validator: DiffValidator::new(config.git_diff_validation.clone())
                .with_excluded_dirs(artifact_dirs.clone()),
            truth_enforcer: TruthEnforcer::new(config.truth_enforcement.clone()),
            failure_handler: VerificationFailureHandler::new(
                config.verification_failure_handling.clone(),
                repo_root.clone(),
            ),
            config,
            repo_root,
            vcs,
            artifact_dirs,
        })
    }

    pub fn config(&self) -> &QualityGatesConfig {
        &self.config
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn vcs(&self) -> &dyn VersionControl {
        self.vcs.as_ref()
    }

    pub fn truth_enforcer(&self) -> &TruthEnforcer {
        &self.truth_enforcer
    }

    pub fn evidence_dir(&self) -> PathBuf {
        self.repo_root.join(&self.config.evidence_dir)
    }

    /// Decide whether the changeset for `task` may be committed.
    ///
    /// `changed_files` is the caller's list of touched paths (used for test
    /// and check auto-detection); `claims` are statements about the work
    /// that must be backed by evidence.
    pub fn validate_before_commit(
        &self,
        task: &Task,
        changed_files: &[String],
        claims: &[String],
    ) -> (bool, QualityGateResult) {
        if !self.config.enabled {
            return (true, QualityGateResult::default().passed("disabled"));
        }

        let task_id = task.task_id();
        info!(task_id, changed = changed_files.len(), claims = claims.len(), "Running quality gates");

        let context = CommandContext::new(&self.repo_root, task_id);
        let mut collector = EvidenceCollector::new(task_id, self.evidence_dir());
        let mut result = QualityGateResult::default();

        if let Some(reason) = self.run_preflight(changed_files, &mut result) {
            return self.finish(collector, result.blocked(reason));
        }

        if let Some(reason) = self.run_tests(task, changed_files, &context, &mut collector, &mut result) {
            return self.finish(collector, result.blocked(reason));
        }

        if let Some(reason) = self.run_criteria(task, &context, &mut collector, &mut result) {
            return self.finish(collector, result.blocked(reason));
        }

        if let Some(reason) = self.run_functional(task, changed_files, &context, &mut collector, &mut result) {
            return self.finish(collector, result.blocked(reason));
        }

        if let Some(reason) = self.run_diff(task, &mut result) {
            return self.finish(collector, result.blocked(reason));
        }

        if let Some(reason) = self.run_truth(claims, &collector, &mut result) {
            return self.finish(collector, result.blocked(reason));
        }

        self.finish(collector, result.passed("All quality gates passed"))
    }

    fn run_preflight(&self, changed_files: &[String], result: &mut QualityGateResult) -> Option<String> {
        let preflight = &self.config.preflight;
        if !preflight.enabled || !preflight.require_changes || !changed_files.is_empty() {
            return None;
        }

        match self.repository_has_changes() {
            Ok(true) => None,
            Ok(false) => {
                result.preflight_passed = false;
                Some("Preflight failed: no changes to commit".to_string())
            }
            Err(e) => {
                warn!("Preflight check skipped: {e:#}");
                result.warnings.push(format!("Preflight check skipped: {e:#}"));
                None
            }
        }
    }

    /// Changes other than the gate's own evidence and reports
    fn repository_has_changes(&self) -> Result<bool> {
        Ok(self.vcs.get_changed_files()?.iter().any(|file| {
            !self
                .artifact_dirs
                .iter()
                .any(|dir| path_is_under(file, dir))
        }))
    }

    fn run_tests(
        &self,
        task: &Task,
        changed_files: &[String],
        context: &CommandContext,
        collector: &mut EvidenceCollector,
        result: &mut QualityGateResult,
    ) -> Option<String> {
        let validator = TestExecutionValidator::new(
            self.config.mandatory_testing.clone(),
            self.repo_root.clone(),
            context.clone(),
        );
        if !validator.is_enabled() {
            return None;
        }

        let (can_commit, test_result, message) =
            validator.validate_tests_before_commit(task, changed_files, collector);

        let Some(test_result) = test_result else {
            result.warnings.push(message);
            return None;
        };

        result.tests_passed = test_result.passed();
        let blocked = if can_commit {
            if !test_result.passed() {
                result.warnings.push(format!("{message} (not blocking)"));
            }
            None
        } else {
            let (should_retry, report) =
                self.failure_handler
                    .handle_test_failure(task.task_id(), &test_result, task.retry_count);
            result.should_retry = should_retry;
            if should_retry {
                result.retry_context = self
                    .failure_handler
                    .build_retry_context(&test_result, task.retry_count);
            }
            result.failure_report = report;
            Some(message)
        };

        result.test_result = Some(test_result);
        blocked
    }

    fn run_criteria(
        &self,
        task: &Task,
        context: &CommandContext,
        collector: &mut EvidenceCollector,
        result: &mut QualityGateResult,
    ) -> Option<String> {
        // No declared criteria: nothing to verify, and nothing proven
        if task.success_criteria.is_empty() {
            return None;
        }

        let verifier = SuccessCriteriaVerifier::new(self.repo_root.clone(), context.clone())
            .with_command_timeout(self.config.mandatory_testing.timeout());
        let (all_verified, criteria) = verifier.verify_all_criteria(&task.success_criteria);

        for criterion in &criteria {
            collector.add_success_criteria_evidence(
                &criterion.id,
                &criterion.criterion_type,
                criterion.expected.clone(),
                criterion.actual.clone(),
            );
        }
        result.criteria_verified = all_verified;
        result.criteria = criteria;

        if all_verified {
            return None;
        }

        let failed: Vec<&str> = result
            .criteria
            .iter()
            .filter(|c| !c.verified)
            .map(|c| c.message.as_str())
            .collect();
        let reason = format!(
            "Success criteria not met ({} of {}): {}",
            failed.len(),
            result.criteria.len(),
            failed.join("; ")
        );

        let (_, report) = self
            .failure_handler
            .handle_success_criteria_failure(task.task_id(), &result.criteria);
        if report.is_some() {
            result.failure_report = report;
        }
        Some(reason)
    }

    fn run_functional(
        &self,
        task: &Task,
        changed_files: &[String],
        context: &CommandContext,
        collector: &mut EvidenceCollector,
        result: &mut QualityGateResult,
    ) -> Option<String> {
        let verifier = FunctionalVerifier::new(
            self.config.functional_verification.clone(),
            context.clone(),
        );
        if !verifier.is_enabled() {
            return None;
        }

        let mut definitions = self.config.functional_verification.verifications.clone();
        for def in &task.functional_verifications {
            if !definitions.contains(def) {
                definitions.push(def.clone());
            }
        }

        let (all_verified, results) = verifier.verify_all(&definitions, changed_files, collector);
        result.functional_verified = all_verified;
        result.functional_results = results;

        if all_verified {
            return None;
        }

        let failed = result.functional_results.iter().filter(|r| !r.verified).count();
        let summary = format!(
            "Functional verification failed ({failed} of {})",
            result.functional_results.len()
        );

        if !verifier.is_required() {
            result.warnings.push(format!("{summary} (not required)"));
            return None;
        }

        let (should_retry, report) = self.failure_handler.handle_functional_failure(
            task.task_id(),
            &result.functional_results,
            task.retry_count,
        );
        result.should_retry = should_retry;
        result.failure_report = report;
        Some(summary)
    }

    fn run_diff(&self, task: &Task, result: &mut QualityGateResult) -> Option<String> {
        if !self.diff_validator.is_enabled() {
            return None;
        }

        let diff = self.diff_validator.validate(self.vcs.as_ref(), &task.expected_files);
        result.warnings.extend(diff.warnings.iter().cloned());
        if let Some(error) = &diff.error {
            result.warnings.push(format!("Diff validation skipped: {error}"));
        }
        result.diff_validated = diff.passed;

        let blocked = (!diff.passed)
            .then(|| format!("Diff validation failed: {}", diff.issues.join("; ")));
        result.diff_result = Some(diff);
        blocked
    }

    fn run_truth(
        &self,
        claims: &[String],
        collector: &EvidenceCollector,
        result: &mut QualityGateResult,
    ) -> Option<String> {
        if claims.is_empty() || !self.truth_enforcer.is_enabled() {
            return None;
        }

        let verdict = self.truth_enforcer.evaluate(claims, collector);
        result.claims_proven = verdict.all_proven;
        result.claims = verdict.claims;

        if verdict.can_complete {
            if !verdict.all_proven {
                result.warnings.push(verdict.reason);
            }
            return None;
        }
        Some(format!("Claims not proven: {}", verdict.reason))
    }

    /// Persist evidence and hand the collector to the result
    fn finish(
        &self,
        mut collector: EvidenceCollector,
        mut result: QualityGateResult,
    ) -> (bool, QualityGateResult) {
        match collector.save_report() {
            Ok(path) => result.evidence_report_path = Some(path),
            Err(e) => {
                warn!("Failed to save evidence report: {e:#}");
                result
                    .warnings
                    .push(format!("Failed to save evidence report: {e:#}"));
            }
        }

        if result.can_complete {
            info!(task_id = %collector.task_id(), evidence = collector.len(), "Quality gates passed");
        } else {
            warn!(task_id = %collector.task_id(), reason = %result.reason, "Quality gates blocked commit");
        }

        result.evidence_collector = Some(collector);
        (result.can_complete, result)
    }

    /// Commit-message footer summarising the gate run
    pub fn get_commit_message_footer(&self, result: &QualityGateResult) -> String {
        render_footer(result, Some(&self.repo_root))
    }

    /// Commit the working tree with the footer appended.
    ///
    /// Returns false when there was nothing to commit.
    pub fn commit_with_footer(&self, message: &str, result: &QualityGateResult) -> Result<bool> {
        let footer = self.get_commit_message_footer(result);
        let full_message = if footer.is_empty() {
            message.to_string()
        } else {
            format!("{}\n\n{footer}", message.trim_end())
        };
        self.vcs.commit(&full_message)
    }
}
