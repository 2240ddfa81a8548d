//! Test command selection

use glob::Pattern;
use tracing::{debug, warn};

use crate::config::{MandatoryTestingConfig, TestCommandPattern};

/// Commands to run for a changeset.
///
/// Explicit `test_commands` win. Otherwise every auto-detect pattern that
/// matches at least one changed file contributes its command, deduplicated
/// in configuration order.
pub fn select_test_commands(config: &MandatoryTestingConfig, changed_files: &[String]) -> Vec<String> {
    if !config.test_commands.is_empty() {
        return dedup(config.test_commands.iter().cloned());
    }
    detect_test_commands(&config.auto_detect_patterns, changed_files)
}

/// Map changed files to test commands through glob patterns
pub fn detect_test_commands(patterns: &[TestCommandPattern], changed_files: &[String]) -> Vec<String> {
    let matched = patterns.iter().filter_map(|entry| {
        let pattern = match Pattern::new(&entry.pattern) {
            Ok(p) => p,
            Err(e) => {
                // Validated at load time; only reachable for hand-built configs
                warn!(pattern = %entry.pattern, "Skipping invalid test pattern: {e}");
                return None;
            }
        };
        let hit = changed_files.iter().find(|f| pattern.matches(f))?;
        debug!(pattern = %entry.pattern, file = %hit, command = %entry.command, "Test command detected");
        Some(entry.command.clone())
    });
    dedup(matched)
}

/// The program a shell command would invoke, skipping `VAR=value` prefixes
/// and `cd dir &&` preambles
pub fn command_program(command: &str) -> Option<&str> {
    let segment = command.rsplit("&&").next().unwrap_or(command);
    segment
        .split_whitespace()
        .find(|token| !is_env_assignment(token))
}

fn is_env_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn dedup(commands: impl Iterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for command in commands {
        if !unique.contains(&command) {
            unique.push(command);
        }
    }
    unique
}
