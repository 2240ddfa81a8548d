//! Mandatory test execution

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::detection::{command_program, select_test_commands};
use super::parser::parse_test_output;
use super::result::TestExecutionResult;
use crate::config::MandatoryTestingConfig;
use crate::evidence::{EvidenceCollector, TestEvidence};
use crate::fs::write_atomic;
use crate::models::Task;
use crate::process::run_shell_command_with_timeout;
use crate::verify::context::CommandContext;
use crate::verify::utils::sanitize_file_component;

/// Shell builtins never looked up on PATH
const SHELL_BUILTINS: &[&str] = &[
    ":", ".", "[", "cd", "echo", "exit", "export", "false", "source", "test", "true",
];

/// Outcome of the test phase: may the commit proceed, what ran, and why
pub type TestPhaseOutcome = (bool, Option<TestExecutionResult>, String);

/// Runs the configured or detected test suite and records evidence
#[derive(Debug, Clone)]
pub struct TestExecutionValidator {
    config: MandatoryTestingConfig,
    root: PathBuf,
    context: CommandContext,
}

impl TestExecutionValidator {
    pub fn new(config: MandatoryTestingConfig, root: impl Into<PathBuf>, context: CommandContext) -> Self {
        Self {
            config,
            root: root.into(),
            context,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Run tests for a changeset.
    ///
    /// Returns `(can_commit, result, message)`. A result is present only if
    /// a command actually ran. Missing runners and spawn failures never
    /// block.
    pub fn validate_tests_before_commit(
        &self,
        task: &Task,
        changed_files: &[String],
        collector: &mut EvidenceCollector,
    ) -> TestPhaseOutcome {
        if !self.config.enabled {
            return (true, None, "disabled".to_string());
        }

        let commands: Vec<String> = select_test_commands(&self.config, changed_files)
            .iter()
            .map(|c| self.context.expand_command(c))
            .collect();

        if commands.is_empty() {
            info!(task_id = %task.task_id(), "No test command configured or detected");
            return (
                true,
                None,
                "No test command configured or detected".to_string(),
            );
        }

        for command in &commands {
            if let Some(program) = self.missing_program(command) {
                warn!(%command, "Test runner not found: {program}");
                return (
                    true,
                    None,
                    format!("Test runner '{program}' not found; tests not run"),
                );
            }
        }

        let mut aggregate = TestExecutionResult::default();
        for (index, command) in commands.iter().enumerate() {
            match self.run_one(task, command, index + 1, collector) {
                Ok(result) => aggregate.merge(result),
                Err(e) => {
                    warn!(%command, "Failed to run test command: {e:#}");
                    if aggregate.command.is_empty() {
                        return (true, None, format!("Failed to run test command: {e}"));
                    }
                    // Earlier commands ran; judge on what we have
                    break;
                }
            }
        }

        let passed = aggregate.passed();
        let can_commit = passed || !self.config.block_commits;
        let message = aggregate.summary();
        info!(task_id = %task.task_id(), passed, can_commit, "{message}");

        (can_commit, Some(aggregate), message)
    }

    fn run_one(
        &self,
        task: &Task,
        command: &str,
        sequence: usize,
        collector: &mut EvidenceCollector,
    ) -> anyhow::Result<TestExecutionResult> {
        let output = run_shell_command_with_timeout(command, Some(&self.root), self.config.timeout())?;
        let combined = output.combined_output();
        let counts = parse_test_output(&combined);

        let exit_code = if output.timed_out {
            -1
        } else {
            output.exit_code.unwrap_or(-1)
        };

        let log_path = collector.evidence_dir().join(format!(
            "{}_test_output_{sequence}.log",
            sanitize_file_component(task.task_id())
        ));
        let stdout_path = match write_atomic(&log_path, combined.as_bytes()) {
            Ok(()) => Some(log_path),
            Err(e) => {
                warn!(path = %log_path.display(), "Failed to capture test output: {e:#}");
                None
            }
        };

        collector.add_test_evidence(TestEvidence {
            command: command.to_string(),
            exit_code,
            stdout_path: stdout_path.as_ref().map(|p| p.display().to_string()),
            failures: counts.failures,
            errors: counts.errors,
            pending: counts.pending,
            examples: counts.examples,
            duration: output.duration,
            output_sha256: Some(hex::encode(Sha256::digest(combined.as_bytes()))),
        });

        Ok(TestExecutionResult {
            command: command.to_string(),
            exit_code,
            failures: counts.failures,
            errors: counts.errors,
            pending: counts.pending,
            examples: counts.examples,
            duration: output.duration,
            timed_out: output.timed_out,
            output: combined,
            output_paths: stdout_path.into_iter().collect(),
        })
    }

    /// The command's program, if it cannot be found
    fn missing_program(&self, command: &str) -> Option<String> {
        let program = command_program(command)?;
        if SHELL_BUILTINS.contains(&program) {
            return None;
        }
        let found = which::which_in(program, std::env::var_os("PATH"), &self.root).is_ok();
        (!found).then(|| program.to_string())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
