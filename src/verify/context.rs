//! Variable expansion for gate commands and URLs.
//!
//! Test commands, `command_succeeds` criteria and functional-check URLs may
//! reference `${TASK_ID}`, `${WORKTREE}` and `${PROJECT_ROOT}`.
//!
//! ```yaml
//! mandatory_testing:
//!   test_commands:
//!     - "cd ${PROJECT_ROOT} && cargo test"
//! ```

use shell_escape::escape;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Manifest files that mark a project root
const PROJECT_MARKERS: &[&str] = &[
    "Cargo.toml",
    "package.json",
    "go.mod",
    "pyproject.toml",
    "Gemfile",
    "pom.xml",
    "build.gradle",
];

/// Values substituted into `${NAME}` placeholders
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    variables: BTreeMap<String, String>,
}

impl CommandContext {
    /// Context for a repository root and task.
    ///
    /// Populates `WORKTREE`, `TASK_ID`, and `PROJECT_ROOT` when a manifest
    /// is found.
    pub fn new(worktree: &Path, task_id: &str) -> Self {
        let mut variables = BTreeMap::new();
        variables.insert("WORKTREE".to_string(), worktree.display().to_string());
        variables.insert("TASK_ID".to_string(), task_id.to_string());
        if let Some(root) = find_project_root(worktree) {
            variables.insert("PROJECT_ROOT".to_string(), root.display().to_string());
        }
        Self { variables }
    }

    pub fn set_variable(&mut self, key: &str, value: &str) {
        self.variables.insert(key.to_string(), value.to_string());
    }

    pub fn get_variable(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Expand placeholders in a shell command, quoting each value.
    pub fn expand_command(&self, command: &str) -> String {
        self.expand_with(command, |value| escape(Cow::Borrowed(value)).into_owned())
    }

    /// Expand placeholders verbatim (URLs, paths).
    pub fn expand_text(&self, text: &str) -> String {
        self.expand_with(text, str::to_string)
    }

    fn expand_with(&self, input: &str, render: impl Fn(&str) -> String) -> String {
        let mut result = input.to_string();
        for (key, value) in &self.variables {
            let placeholder = format!("${{{key}}}");
            if result.contains(&placeholder) {
                result = result.replace(&placeholder, &render(value));
            }
        }
        result
    }

    /// Names of `${...}` placeholders that have no value
    pub fn find_unresolved(&self, input: &str) -> Vec<String> {
        let mut unresolved = Vec::new();
        let mut rest = input;
        while let Some(start) = rest.find("${") {
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else { break };
            let name = &after[..end];
            if !name.is_empty() && !self.variables.contains_key(name) {
                unresolved.push(name.to_string());
            }
            rest = &after[end + 1..];
        }
        unresolved
    }
}

/// Find the directory holding a project manifest: the worktree itself, or
/// one of its immediate subdirectories.
fn find_project_root(worktree: &Path) -> Option<PathBuf> {
    if PROJECT_MARKERS.iter().any(|m| worktree.join(m).exists()) {
        return Some(worktree.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(worktree)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| PROJECT_MARKERS.iter().any(|m| path.join(m).exists()))
        .collect();

    // read_dir order is platform-dependent
    candidates.sort();
    candidates.into_iter().next()
}
