//! Filesystem checks for declared success criteria

use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::types::{CriterionCheck, SuccessCriterion};
use crate::models::CriterionDefinition;
use crate::process::{run_shell_command_with_timeout, DEFAULT_COMMAND_TIMEOUT};
use crate::verify::context::CommandContext;

/// Checks criterion definitions against a working tree
#[derive(Debug, Clone)]
pub struct SuccessCriteriaVerifier {
    root: PathBuf,
    context: CommandContext,
    command_timeout: Duration,
}

impl SuccessCriteriaVerifier {
    pub fn new(root: impl Into<PathBuf>, context: CommandContext) -> Self {
        Self {
            root: root.into(),
            context,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Check every definition.
    ///
    /// An empty definition list is *not* "all verified"; whether the absence
    /// of criteria matters is the caller's decision.
    pub fn verify_all_criteria(
        &self,
        definitions: &[CriterionDefinition],
    ) -> (bool, Vec<SuccessCriterion>) {
        if definitions.is_empty() {
            return (false, Vec::new());
        }

        let results: Vec<SuccessCriterion> = definitions
            .iter()
            .enumerate()
            .map(|(index, def)| self.verify_criterion(def, index))
            .collect();

        let all_verified = results.iter().all(|c| c.verified);
        info!(
            total = results.len(),
            verified = results.iter().filter(|c| c.verified).count(),
            "Success criteria checked"
        );
        (all_verified, results)
    }

    /// Check one definition. `index` names criteria that carry no id.
    pub fn verify_criterion(&self, def: &CriterionDefinition, index: usize) -> SuccessCriterion {
        let id = def
            .id
            .clone()
            .unwrap_or_else(|| format!("criterion_{}", index + 1));
        let kind = def.kind.as_str();

        let result = match CriterionCheck::from_definition(def) {
            CriterionCheck::FileExists { path } => {
                let exists = self.resolve(&path).exists();
                SuccessCriterion::checked(
                    &id,
                    kind,
                    Value::Bool(true),
                    Value::Bool(exists),
                    if exists {
                        format!("File exists: {path}")
                    } else {
                        format!("File not found: {path}")
                    },
                )
            }
            CriterionCheck::FileNotExists { path } => {
                let exists = self.resolve(&path).exists();
                SuccessCriterion::checked(
                    &id,
                    kind,
                    Value::Bool(false),
                    Value::Bool(exists),
                    if exists {
                        format!("File should not exist: {path}")
                    } else {
                        format!("File absent as expected: {path}")
                    },
                )
            }
            CriterionCheck::StringInFile { path, text } => {
                self.check_contains(&id, kind, &path, &text, true)
            }
            CriterionCheck::StringNotInFile { path, text } => {
                self.check_contains(&id, kind, &path, &text, false)
            }
            CriterionCheck::PatternInFile { path, pattern } => {
                self.check_pattern(&id, kind, &path, &pattern)
            }
            CriterionCheck::CommandSucceeds {
                command,
                expected_exit_code,
            } => self.check_command(&id, kind, &command, expected_exit_code),
            CriterionCheck::Invalid { reason } => {
                SuccessCriterion::unverifiable(&id, kind, Value::Bool(true), reason)
            }
            CriterionCheck::Unsupported { kind: unknown } => SuccessCriterion::unverifiable(
                &id,
                kind,
                Value::Bool(true),
                format!("Unsupported criterion type: {unknown}"),
            ),
        };

        debug!(
            criterion = %result.id,
            criterion_type = %result.criterion_type,
            verified = result.verified,
            "{}",
            result.message
        );
        result
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(self.context.expand_text(path))
    }

    fn read(&self, path: &str) -> Result<String, String> {
        let full_path = self.resolve(path);
        if !full_path.exists() {
            return Err(format!("File not found: {path}"));
        }
        fs::read_to_string(&full_path).map_err(|e| format!("Failed to read {path}: {e}"))
    }

    fn check_contains(
        &self,
        id: &str,
        kind: &str,
        path: &str,
        text: &str,
        should_contain: bool,
    ) -> SuccessCriterion {
        match self.read(path) {
            Ok(content) => {
                let found = content.contains(text);
                let message = match (found, should_contain) {
                    (true, true) => format!("'{text}' found in {path}"),
                    (false, true) => format!("'{text}' not found in {path}"),
                    (true, false) => format!("'{text}' must not appear in {path}"),
                    (false, false) => format!("'{text}' absent from {path}"),
                };
                SuccessCriterion::checked(
                    id,
                    kind,
                    Value::Bool(should_contain),
                    Value::Bool(found),
                    message,
                )
            }
            Err(message) => {
                SuccessCriterion::unverifiable(id, kind, Value::Bool(should_contain), message)
            }
        }
    }

    fn check_pattern(&self, id: &str, kind: &str, path: &str, pattern: &str) -> SuccessCriterion {
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                return SuccessCriterion::unverifiable(
                    id,
                    kind,
                    Value::Bool(true),
                    format!("Invalid regex pattern: {e}"),
                )
            }
        };

        match self.read(path) {
            Ok(content) => {
                let found = regex.is_match(&content);
                SuccessCriterion::checked(
                    id,
                    kind,
                    Value::Bool(true),
                    Value::Bool(found),
                    if found {
                        format!("Pattern '{pattern}' found in {path}")
                    } else {
                        format!("Pattern '{pattern}' not found in {path}")
                    },
                )
            }
            Err(message) => SuccessCriterion::unverifiable(id, kind, Value::Bool(true), message),
        }
    }

    fn check_command(
        &self,
        id: &str,
        kind: &str,
        command: &str,
        expected_exit_code: i32,
    ) -> SuccessCriterion {
        let expanded = self.context.expand_command(command);
        let expected = Value::from(expected_exit_code);

        match run_shell_command_with_timeout(&expanded, Some(&self.root), self.command_timeout) {
            Ok(output) if output.timed_out => SuccessCriterion::unverifiable(
                id,
                kind,
                expected,
                format!(
                    "Command '{command}' timed out after {}s",
                    self.command_timeout.as_secs()
                ),
            ),
            Ok(output) => {
                let code = output.exit_code.unwrap_or(-1);
                SuccessCriterion::checked(
                    id,
                    kind,
                    expected,
                    Value::from(code),
                    format!("Command '{command}' exited with {code} (expected {expected_exit_code})"),
                )
            }
            Err(e) => SuccessCriterion::unverifiable(
                id,
                kind,
                expected,
                format!("Command '{command}' failed to execute: {e}"),
            ),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
