//! Tests for configuration parsing and validation

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use super::*;

const FULL_CONFIG: &str = r#"
quality_gates:
  enabled: true
  mandatory_testing:
    enabled: true
    block_commits: true
    test_commands:
      - cargo test
  functional_verification:
    enabled: true
    required: false
    methods:
      http_requests:
        timeout: 5
    auto_detect:
      enabled: true
      patterns:
        - pattern: "src/api/**"
          verification: http_request
          test_urls: ["http://localhost:8080/health"]
          expected_status: 200
  git_diff_validation:
    enabled: true
    before_commit:
      validate_files_changed:
        enabled: true
        allow_additional_files: false
      max_lines_changed: 500
      warn_if_exceeds: 300
      disallow_patterns:
        - pattern: "console\\.log"
          reason: "Remove debug logging"
      if_unexpected_files_changed:
        action: warn
  truth_enforcement:
    enabled: true
    mode: strict
    block_unproven_success: true
    rules:
      - claim: "all tests pass"
        proof_required: test_execution_evidence
        must_show:
          failures: 0
          errors: 0
  verification_failure_handling:
    enabled: true
    on_test_failure:
      max_retries: 3
      retry_with_more_context: true
      escalate:
        enabled: true
        action: create_detailed_failure_report
        report_path: ".work/failures/{task_id}"
    on_functional_verification_failure:
      max_retries: 1
      enhanced_debugging: ["capture_response_body"]
    on_success_criteria_not_met:
      action: fail_task
      create_failure_report: true
"#;

#[test]
fn test_parse_full_yaml_config() {
    let config = parse_yaml_config(FULL_CONFIG).unwrap();

    assert!(config.enabled);
    assert_eq!(config.mandatory_testing.test_commands, vec!["cargo test"]);
    assert_eq!(config.functional_verification.methods.http_requests.timeout, 5);
    assert_eq!(config.functional_verification.auto_detect.patterns.len(), 1);

    let diff = &config.git_diff_validation.before_commit;
    assert_eq!(diff.max_lines_changed, Some(500));
    assert_eq!(diff.warn_if_exceeds, Some(300));
    assert_eq!(
        diff.if_unexpected_files_changed.action,
        UnexpectedFilesAction::Warn
    );

    let truth = &config.truth_enforcement;
    assert_eq!(truth.mode, EnforcementMode::Strict);
    assert_eq!(truth.rules[0].must_show["failures"], serde_json::json!(0));

    let handling = &config.verification_failure_handling;
    assert_eq!(handling.on_test_failure.max_retries, 3);
    assert_eq!(
        handling.on_test_failure.escalate.report_path,
        ".work/failures/{task_id}"
    );

    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_bare_block_without_root_key() {
    let config = parse_yaml_config("enabled: false\n").unwrap();
    assert!(!config.enabled);
}

#[test]
fn test_empty_document_uses_defaults() {
    let config = parse_yaml_config("").unwrap();
    assert_eq!(config, QualityGatesConfig::default());
}

#[test]
fn test_defaults() {
    let config = QualityGatesConfig::default();

    assert!(config.enabled);
    assert!(config.mandatory_testing.enabled);
    assert!(config.mandatory_testing.block_commits);
    assert!(!config.functional_verification.enabled);
    assert!(!config.git_diff_validation.enabled);
    assert!(config.truth_enforcement.enabled);
    assert_eq!(config.truth_enforcement.mode, EnforcementMode::Strict);
    assert!(config.truth_enforcement.block_unproven_success);
    assert_eq!(
        config.verification_failure_handling.on_test_failure.escalate.action,
        EscalationAction::CreateDetailedFailureReport
    );
}

#[test]
fn test_unknown_mode_is_rejected() {
    let yaml = "truth_enforcement:\n  mode: lenient\n";
    assert!(parse_yaml_config(yaml).is_err());
}

#[test]
fn test_parse_toml_config() {
    let toml = r#"
[quality_gates]
enabled = true

[quality_gates.mandatory_testing]
block_commits = false
test_commands = ["pytest"]

[[quality_gates.truth_enforcement.rules]]
claim = "tests pass"
proof_required = "test_execution_evidence"
must_show = { failures = 0 }
"#;
    let config = parse_toml_config(toml).unwrap();

    assert!(!config.mandatory_testing.block_commits);
    assert_eq!(config.mandatory_testing.test_commands, vec!["pytest"]);
    assert_eq!(config.truth_enforcement.rules[0].claim, "tests pass");
    assert_eq!(
        config.truth_enforcement.rules[0].must_show["failures"],
        serde_json::json!(0)
    );
}

#[test]
fn test_load_config_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("gates.yaml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.truth_enforcement.rules.len(), 1);
}

#[test]
fn test_load_config_rejects_invalid_regex() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("gates.yaml");
    fs::write(
        &path,
        "git_diff_validation:\n  before_commit:\n    disallow_patterns:\n      - pattern: \"([unclosed\"\n",
    )
    .unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("invalid disallow pattern"));
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let mut config = QualityGatesConfig::default();
    config.mandatory_testing.timeout_seconds = 0;

    assert!(matches!(
        validate_config(&config),
        Err(ConfigError::ZeroTimeout { .. })
    ));
}

#[test]
fn test_validate_rejects_warn_above_max() {
    let mut config = QualityGatesConfig::default();
    config.git_diff_validation.before_commit.max_lines_changed = Some(100);
    config.git_diff_validation.before_commit.warn_if_exceeds = Some(200);

    assert!(matches!(
        validate_config(&config),
        Err(ConfigError::WarnThresholdAboveMax {
            warn: 200,
            max: 100
        })
    ));
}

#[test]
fn test_validate_rejects_bad_glob() {
    let mut config = QualityGatesConfig::default();
    config
        .mandatory_testing
        .auto_detect_patterns
        .push(TestCommandPattern {
            pattern: "src/[".to_string(),
            command: "cargo test".to_string(),
        });

    assert!(matches!(
        validate_config(&config),
        Err(ConfigError::InvalidGlob { .. })
    ));
}

#[test]
fn test_validate_rejects_empty_claim() {
    let mut config = QualityGatesConfig::default();
    config.truth_enforcement.rules.push(TruthRule {
        claim: "   ".to_string(),
        proof_required: "test_execution_evidence".to_string(),
        must_show: Default::default(),
    });

    assert!(matches!(
        validate_config(&config),
        Err(ConfigError::EmptyRuleClaim { index: 0 })
    ));
}

#[test]
fn test_artifact_dirs_defaults() {
    let config = QualityGatesConfig::default();
    assert_eq!(
        config.artifact_dirs(Path::new("/repo")),
        vec![".work/evidence", ".work/failure_reports"]
    );
}

#[test]
fn test_artifact_dirs_template_and_absolute_paths() {
    let mut config = QualityGatesConfig {
        evidence_dir: "/repo/./out/evidence/".to_string(),
        ..QualityGatesConfig::default()
    };
    config.verification_failure_handling.on_test_failure.escalate.report_path =
        "./out/reports/{task_id}/failure".to_string();
    assert_eq!(
        config.artifact_dirs(Path::new("/repo")),
        vec!["out/evidence", "out/reports"]
    );

    // Outside the repository, or the repository root itself
    config.evidence_dir = "/elsewhere/evidence".to_string();
    config.verification_failure_handling.on_test_failure.escalate.report_path =
        "{task_id}-failure".to_string();
    assert!(config.artifact_dirs(Path::new("/repo")).is_empty());

    config.evidence_dir = "../shared/evidence".to_string();
    assert!(config.artifact_dirs(Path::new("/repo")).is_empty());
}
