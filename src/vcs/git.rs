//! `git` CLI implementation of [`VersionControl`]

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::runner::{run_git, run_git_bool, run_git_checked};
use super::{path_is_under, VersionControl};

/// A git working tree driven through the `git` binary
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
    excluded_dirs: Vec<String>,
}

impl GitRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded_dirs: Vec::new(),
        }
    }

    /// Keep paths under these repository-relative directories out of the
    /// changed files and out of commits.
    pub fn with_excluded_dirs(mut self, dirs: Vec<String>) -> Self {
        self.excluded_dirs = dirs;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excluded_dirs.iter().any(|dir| path_is_under(path, dir))
    }

    fn has_head(&self) -> bool {
        run_git_bool(&["rev-parse", "--verify", "--quiet", "HEAD"], &self.root)
    }

    /// Diff arguments against HEAD, or against the empty index before the
    /// first commit
    fn diff_args<'a>(&self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec!["diff"];
        if self.has_head() {
            args.push("HEAD");
        } else {
            args.push("--cached");
        }
        args.extend_from_slice(extra);
        args
    }
}

impl VersionControl for GitRepository {
    fn has_uncommitted_changes(&self) -> Result<bool> {
        let status = run_git_checked(&["status", "--porcelain"], &self.root)?;
        // ?? lines are untracked
        Ok(status
            .lines()
            .any(|line| !line.is_empty() && !line.starts_with("??")))
    }

    fn get_changed_files(&self) -> Result<Vec<String>> {
        // -z leaves paths unquoted
        let output = run_git(
            &["status", "--porcelain", "-z", "--untracked-files=all"],
            &self.root,
        )?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git status failed: {}", stderr.trim());
        }
        // Not trimmed: the leading status column is significant
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut paths = parse_porcelain_paths(&stdout);
        paths.retain(|path| !self.is_excluded(path));
        Ok(paths)
    }

    fn diff_stat(&self) -> Result<String> {
        run_git_checked(&self.diff_args(&["--stat"]), &self.root)
    }

    fn diff(&self) -> Result<String> {
        run_git_checked(&self.diff_args(&[]), &self.root)
    }

    fn commit(&self, message: &str) -> Result<bool> {
        let excludes: Vec<String> = self
            .excluded_dirs
            .iter()
            .map(|dir| format!(":(exclude){dir}"))
            .collect();
        let mut args = vec!["add", "-A", "--", "."];
        args.extend(excludes.iter().map(String::as_str));
        run_git_checked(&args, &self.root)?;

        // exit 0 means the index matches HEAD
        if self.has_head() && run_git_bool(&["diff", "--cached", "--quiet"], &self.root) {
            info!("Nothing to commit");
            return Ok(false);
        }

        run_git_checked(&["commit", "-m", message], &self.root)?;
        Ok(true)
    }

    fn latest_commit_sha(&self) -> Result<String> {
        run_git_checked(&["rev-parse", "HEAD"], &self.root)
    }

    fn push(&self, branch: &str) -> Result<bool> {
        let output = run_git(&["push", "origin", branch], &self.root)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(branch, "git push failed: {}", stderr.trim());
            return Ok(false);
        }
        Ok(true)
    }
}

/// Extract paths from `git status --porcelain -z` output.
///
/// Entries are NUL-terminated `XY path` records. A rename or copy is
/// followed by a second record holding the source path, which is skipped so
/// only the new path is reported.
pub fn parse_porcelain_paths(output: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    let mut records = output.split('\0');
    while let Some(record) = records.next() {
        let (Some(status), Some(path)) = (record.get(..2), record.get(3..)) else {
            continue;
        };
        if status.contains(|c: char| c == 'R' || c == 'C') {
            records.next();
        }
        if !path.is_empty() && !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    }
    paths
}
