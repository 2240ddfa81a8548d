//! Shared helpers for gate integration tests

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use quality_gate::config::{parse_yaml_config, validate_config, QualityGatesConfig};
use quality_gate::gates::QualityGatesCoordinator;
use quality_gate::vcs::GitRepository;

/// Run git in `dir`, panicking if it cannot be spawned
pub fn git(args: &[&str], dir: &Path) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Create a temporary git repository with an initial commit.
///
/// `.work/` is ignored so evidence and failure reports never show up as
/// changes.
pub fn init_test_repo() -> TempDir {
    let temp_dir = init_repo_without_ignore();
    let repo_root = temp_dir.path();

    fs::write(repo_root.join(".gitignore"), ".work/\n").expect("Failed to write .gitignore");
    git(&["add", ".gitignore"], repo_root);
    git(&["commit", "-m", "Ignore gate output"], repo_root);

    temp_dir
}

/// Create a temporary git repository with an initial commit and no ignore
/// rules, so gate output lands in the working tree as untracked files.
pub fn init_repo_without_ignore() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let repo_root = temp_dir.path();

    git(&["init"], repo_root);
    git(&["config", "user.email", "test@test.com"], repo_root);
    git(&["config", "user.name", "Test User"], repo_root);
    git(&["config", "commit.gpgsign", "false"], repo_root);

    fs::write(repo_root.join("README.md"), "# Test Repository\n")
        .expect("Failed to write README.md");

    git(&["add", "."], repo_root);
    git(&["commit", "-m", "Initial commit"], repo_root);

    temp_dir
}

/// Write `content` to `relative` under `root`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(path, content).expect("Failed to write file");
}

/// Parse and validate a YAML configuration
pub fn config_from_yaml(yaml: &str) -> QualityGatesConfig {
    let config = parse_yaml_config(yaml).expect("Failed to parse config");
    validate_config(&config).expect("Invalid config");
    config
}

/// Coordinator over a real git repository, keeping gate output out of
/// commits the way `qgate validate` does
pub fn coordinator(config: QualityGatesConfig, repo_root: &Path) -> QualityGatesCoordinator {
    let vcs = GitRepository::new(repo_root).with_excluded_dirs(config.artifact_dirs(repo_root));
    QualityGatesCoordinator::new(config, repo_root, Box::new(vcs))
        .expect("Failed to build coordinator")
}
