//! Configuration files as the CLI reads them

use tempfile::TempDir;

use quality_gate::config::{load_config, EnforcementMode, UnexpectedFilesAction};

use super::helpers::write_file;

#[test]
fn test_load_wrapped_yaml() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "gates.yaml",
        r#"
quality_gates:
  evidence_dir: .work/proof
  truth_enforcement:
    mode: permissive
  git_diff_validation:
    enabled: true
    before_commit:
      if_unexpected_files_changed:
        action: warn
"#,
    );

    let config = load_config(&temp_dir.path().join("gates.yaml")).unwrap();
    assert_eq!(config.evidence_dir, ".work/proof");
    assert_eq!(config.truth_enforcement.mode, EnforcementMode::Permissive);
    assert_eq!(
        config
            .git_diff_validation
            .before_commit
            .if_unexpected_files_changed
            .action,
        UnexpectedFilesAction::Warn
    );
    // Untouched sections keep their defaults
    assert!(config.mandatory_testing.enabled);
}

#[test]
fn test_load_bare_toml() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "gates.toml",
        r#"
enabled = true

[mandatory_testing]
test_commands = ["cargo test"]
timeout_seconds = 60
"#,
    );

    let config = load_config(&temp_dir.path().join("gates.toml")).unwrap();
    assert_eq!(config.mandatory_testing.test_commands, vec!["cargo test"]);
    assert_eq!(config.mandatory_testing.timeout_seconds, 60);
}

#[test]
fn test_invalid_files_rejected() {
    let temp_dir = TempDir::new().unwrap();
    write_file(
        temp_dir.path(),
        "bad_regex.yaml",
        "git_diff_validation:\n  before_commit:\n    disallow_patterns:\n      - pattern: \"(\"\n",
    );
    write_file(
        temp_dir.path(),
        "bad_mode.yaml",
        "truth_enforcement:\n  mode: lenient\n",
    );

    assert!(load_config(&temp_dir.path().join("bad_regex.yaml")).is_err());
    assert!(load_config(&temp_dir.path().join("bad_mode.yaml")).is_err());
    assert!(load_config(&temp_dir.path().join("missing.yaml")).is_err());
}
