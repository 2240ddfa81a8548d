//! Version control collaborator
//!
//! The gate never talks to git directly. It goes through [`VersionControl`],
//! which lets callers substitute a fake repository in tests or drive a
//! different backend entirely.

mod git;
mod runner;

#[cfg(test)]
pub(crate) mod testing;


use anyhow::Result;

pub use git::{parse_porcelain_paths, GitRepository};
pub use runner::{run_git, run_git_bool, run_git_checked};

/// Operations the quality gate needs from a repository
pub trait VersionControl {
    /// Staged or unstaged modifications to tracked files
    fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Changed paths relative to the repository root: staged, unstaged and
    /// untracked
    fn get_changed_files(&self) -> Result<Vec<String>>;

    /// `git diff --stat` output against HEAD
    fn diff_stat(&self) -> Result<String>;

    /// Unified diff against HEAD
    fn diff(&self) -> Result<String>;

    /// Stage everything and commit. Returns false when there was nothing to
    /// commit.
    fn commit(&self, message: &str) -> Result<bool>;

    fn latest_commit_sha(&self) -> Result<String>;

    fn push(&self, branch: &str) -> Result<bool>;
}

/// Whether a repository-relative `path` is `dir` or lies beneath it.
///
/// `dir` may carry a leading `./` or a trailing `/`. An empty `dir` matches
/// nothing.
pub fn path_is_under(path: &str, dir: &str) -> bool {
    let dir = dir.trim_start_matches("./").trim_end_matches('/');
    if dir.is_empty() {
        return false;
    }
    match path.strip_prefix(dir) {
        Some("") => true,
        Some(rest) => rest.starts_with('/'),
        None => false,
    }
}
