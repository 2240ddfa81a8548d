//! Normalised test-run result

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::parser::TestCounts;

/// Outcome of running the test command(s) for a changeset.
///
/// When several commands run, counts and durations are summed and
/// `exit_code` is the first non-zero exit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestExecutionResult {
    pub command: String,
    pub exit_code: i32,
    pub failures: u32,
    pub errors: u32,
    pub pending: u32,
    pub examples: u32,
    pub duration: Duration,
    #[serde(default)]
    pub timed_out: bool,
    /// Combined stdout and stderr of every command
    #[serde(default, skip_serializing)]
    pub output: String,
    /// Captured output files, one per command
    #[serde(default)]
    pub output_paths: Vec<PathBuf>,
}

impl TestExecutionResult {
    pub fn passed(&self) -> bool {
        self.exit_code == 0 && self.failures == 0 && self.errors == 0
    }

    pub(crate) fn counts(&self) -> TestCounts {
        TestCounts {
            failures: self.failures,
            errors: self.errors,
            pending: self.pending,
            examples: self.examples,
        }
    }

    pub(crate) fn merge(&mut self, other: TestExecutionResult) {
        if self.command.is_empty() {
            self.command = other.command;
        } else {
            self.command = format!("{}; {}", self.command, other.command);
        }
        if self.exit_code == 0 {
            self.exit_code = other.exit_code;
        }
        self.failures = self.failures.saturating_add(other.failures);
        self.errors = self.errors.saturating_add(other.errors);
        self.pending = self.pending.saturating_add(other.pending);
        self.examples = self.examples.saturating_add(other.examples);
        self.duration = self.duration.saturating_add(other.duration);
        self.timed_out |= other.timed_out;
        if !other.output.is_empty() {
            if !self.output.is_empty() {
                self.output.push('\n');
            }
            self.output.push_str(&other.output);
        }
        self.output_paths.extend(other.output_paths);
    }

    /// One-line summary for gate reasons and logs
    pub fn summary(&self) -> String {
        if self.timed_out {
            return format!("Tests timed out ({})", self.command);
        }
        let counts = self.counts();
        let status = if self.passed() { "passed" } else { "failed" };
        format!(
            "Tests {status}: {} examples, {} failures, {} errors, {} pending (exit code {})",
            counts.examples, counts.failures, counts.errors, counts.pending, self.exit_code
        )
    }
}
