//! In-memory repository for unit tests

use anyhow::{bail, Result};
use std::cell::RefCell;
use std::rc::Rc;

use super::VersionControl;

/// Canned responses for each [`VersionControl`] call.
///
/// `fail` makes every call return an error. `commits` is shared so a test
/// can keep a handle after boxing the repository.
#[derive(Debug, Default)]
pub struct FakeRepository {
    pub uncommitted: bool,
    pub changed_files: Vec<String>,
    pub diff_stat: String,
    pub diff: String,
    pub fail: bool,
    pub commits: Rc<RefCell<Vec<String>>>,
}

impl FakeRepository {
    pub fn with_changes(files: &[&str]) -> Self {
        Self {
            uncommitted: !files.is_empty(),
            changed_files: files.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            bail!("git status failed: fatal: not a git repository");
        }
        Ok(())
    }
}

impl VersionControl for FakeRepository {
    fn has_uncommitted_changes(&self) -> Result<bool> {
        self.check()?;
        Ok(self.uncommitted)
    }

    fn get_changed_files(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(self.changed_files.clone())
    }

    fn diff_stat(&self) -> Result<String> {
        self.check()?;
        Ok(self.diff_stat.clone())
    }

    fn diff(&self) -> Result<String> {
        self.check()?;
        Ok(self.diff.clone())
    }

    fn commit(&self, message: &str) -> Result<bool> {
        self.check()?;
        self.commits.borrow_mut().push(message.to_string());
        Ok(true)
    }

    fn latest_commit_sha(&self) -> Result<String> {
        self.check()?;
        Ok("0000000000000000000000000000000000000000".to_string())
    }

    fn push(&self, _branch: &str) -> Result<bool> {
        self.check()?;
        Ok(true)
    }
}
