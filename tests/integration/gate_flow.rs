//! End-to-end gate runs over real repositories

use std::fs;

use quality_gate::config::QualityGatesConfig;
use quality_gate::evidence::load_report;
use quality_gate::models::{load_task, CriterionDefinition, Task};

use super::helpers::*;

const NO_TESTS: &str = r#"
quality_gates:
  mandatory_testing:
    enabled: false
"#;

fn claims(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_criteria_pass_and_commit_with_footer() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    write_file(repo_root, "src/login.rs", "pub fn login() {}\n");

    let gates = coordinator(config_from_yaml(NO_TESTS), repo_root);
    let task = Task::new("task-1")
        .with_criterion(CriterionDefinition::file_exists("src/login.rs"))
        .with_criterion(CriterionDefinition::string_in_file("src/login.rs", "fn login"));

    let (ok, result) =
        gates.validate_before_commit(&task, &["src/login.rs".to_string()], &[]);
    assert!(ok, "gate should pass: {}", result.reason);
    assert!(result.criteria_verified);

    assert!(gates.commit_with_footer("Add login", &result).unwrap());
    let message = git(&["log", "-1", "--format=%B"], repo_root);
    assert!(message.starts_with("Add login"));
    assert!(message.contains("✅ Quality Gates Passed"));
    assert!(message.contains("Success Criteria: ✅ VERIFIED"));

    // Evidence lives under the ignored .work/ directory
    assert!(git(&["status", "--porcelain"], repo_root).trim().is_empty());
}

#[test]
fn test_missing_file_blocks_with_report() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();

    let gates = coordinator(config_from_yaml(NO_TESTS), repo_root);
    let task = Task::new("task-2").with_criterion(CriterionDefinition::file_exists("src/missing.rs"));

    let (ok, result) = gates.validate_before_commit(&task, &[], &[]);
    assert!(!ok);
    assert!(result.reason.contains("criteria"));
    assert!(!result.criteria_verified);

    let report = repo_root.join(".work/failure_reports/task-2.md");
    let markdown = fs::read_to_string(report).unwrap();
    assert!(markdown.starts_with("# Failure Report: task-2"));
}

#[test]
fn test_evidence_report_round_trips() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    write_file(repo_root, "a.txt", "alpha");

    let gates = coordinator(config_from_yaml(NO_TESTS), repo_root);
    let task = Task::new("task-3").with_criterion(CriterionDefinition::file_exists("a.txt"));

    let (_, result) = gates.validate_before_commit(&task, &[], &[]);
    let saved = load_report(result.evidence_report_path.as_ref().unwrap()).unwrap();

    assert_eq!(saved.task_id, "task-3");
    assert_eq!(saved.evidence.len(), 1);
    assert_eq!(saved.summary.verified, 1);
}

#[test]
fn test_task_loaded_from_yaml() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    write_file(repo_root, "docs/guide.md", "Install with cargo\n");
    write_file(
        repo_root,
        "task.yaml",
        r#"
id: docs-1
description: Write the install guide
success_criteria:
  - type: string_in_file
    path: docs/guide.md
    text: cargo
  - type: file_not_exists
    path: docs/TODO.md
expected_files:
  - "docs/**"
"#,
    );

    let task = load_task(&repo_root.join("task.yaml")).unwrap();
    assert_eq!(task.task_id(), "docs-1");

    let gates = coordinator(config_from_yaml(NO_TESTS), repo_root);
    let (ok, result) = gates.validate_before_commit(&task, &[], &[]);
    assert!(ok, "{}", result.reason);
    assert_eq!(result.criteria.len(), 2);
}

#[cfg(unix)]
#[test]
fn test_test_failure_escalates_after_retries() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let config = config_from_yaml(
        r#"
quality_gates:
  mandatory_testing:
    test_commands: ["false"]
  verification_failure_handling:
    on_test_failure:
      max_retries: 1
      escalate:
        report_path: ".work/reports/{task_id}-failure"
"#,
    );
    let gates = coordinator(config, repo_root);

    let first = Task::new("task-4");
    let (ok, result) = gates.validate_before_commit(&first, &[], &[]);
    assert!(!ok);
    assert!(result.should_retry);
    assert!(result.retry_context.is_some());

    let last = Task {
        retry_count: 1,
        ..Task::new("task-4")
    };
    let (ok, result) = gates.validate_before_commit(&last, &[], &[]);
    assert!(!ok);
    assert!(!result.should_retry);
    assert!(result.failure_report.as_ref().unwrap().escalated);
    assert!(repo_root.join(".work/reports/task-4-failure.json").exists());
    assert!(repo_root.join(".work/reports/task-4-failure.md").exists());

    // Captured output sits beside the evidence report
    assert!(repo_root
        .join(".work/evidence/task-4_test_output_1.log")
        .exists());
}

#[test]
fn test_diff_over_max_lines_blocks() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let body: String = (0..600).map(|i| format!("line {i}\n")).collect();
    write_file(repo_root, "big.txt", &body);
    git(&["add", "big.txt"], repo_root);

    let config = config_from_yaml(
        r#"
quality_gates:
  mandatory_testing:
    enabled: false
  git_diff_validation:
    enabled: true
    before_commit:
      max_lines_changed: 500
"#,
    );
    let gates = coordinator(config, repo_root);

    let (ok, result) = gates.validate_before_commit(&Task::new("task-5"), &[], &[]);
    assert!(!ok);
    assert!(!result.diff_validated);
    assert_eq!(
        result.diff_result.unwrap().total_lines_changed,
        Some(600)
    );
}

#[test]
fn test_unexpected_files_and_disallowed_patterns() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    write_file(repo_root, "src/app.js", "console.log('debug');\n");
    write_file(repo_root, "notes.txt", "scratch\n");
    git(&["add", "."], repo_root);

    let config = config_from_yaml(
        r#"
quality_gates:
  mandatory_testing:
    enabled: false
  git_diff_validation:
    enabled: true
    before_commit:
      disallow_patterns:
        - pattern: "console\\.log"
          reason: "Remove debug logging"
"#,
    );
    let gates = coordinator(config, repo_root);
    let task = Task::new("task-6").with_expected_file("src/**");

    let (ok, result) = gates.validate_before_commit(&task, &[], &[]);
    assert!(!ok);
    let diff = result.diff_result.unwrap();
    assert_eq!(diff.unexpected_files, vec!["notes.txt"]);
    assert_eq!(diff.violations.len(), 1);
    assert_eq!(diff.violations[0].file.as_deref(), Some("src/app.js"));
}

#[cfg(unix)]
#[test]
fn test_claim_proven_by_test_run() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let config = config_from_yaml(
        r#"
quality_gates:
  mandatory_testing:
    test_commands: ["true"]
  truth_enforcement:
    rules:
      - claim: "all tests pass"
        proof_required: test_execution_evidence
        must_show:
          failures: 0
          errors: 0
"#,
    );
    let gates = coordinator(config, repo_root);

    let (ok, result) = gates.validate_before_commit(
        &Task::new("task-7"),
        &[],
        &claims(&["All tests pass now"]),
    );
    assert!(ok, "{}", result.reason);
    assert!(result.tests_passed);
    assert!(result.claims_proven);

    let footer = gates.get_commit_message_footer(&result);
    assert!(footer.contains("Tests: ✅ PASSED"));
    assert!(footer.contains("Claims Proven: ✅ YES"));
}

#[test]
fn test_unproven_claims_strict_and_permissive() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let rules = r#"
    rules:
      - claim: "endpoint works"
        proof_required: functional_verification_evidence
"#;

    let strict = config_from_yaml(&format!(
        "quality_gates:\n  mandatory_testing:\n    enabled: false\n  truth_enforcement:\n    mode: strict{rules}"
    ));
    let (ok, result) = coordinator(strict, repo_root).validate_before_commit(
        &Task::new("task-8"),
        &[],
        &claims(&["The endpoint works", "Refactored everything"]),
    );
    assert!(!ok);
    assert_eq!(result.claims.len(), 2);
    assert!(result.claims.iter().all(|c| !c.has_proof));
    assert_eq!(result.claims[1].proof_required, "unknown");

    let permissive = config_from_yaml(&format!(
        "quality_gates:\n  mandatory_testing:\n    enabled: false\n  truth_enforcement:\n    mode: permissive{rules}"
    ));
    let (ok, result) = coordinator(permissive, repo_root).validate_before_commit(
        &Task::new("task-8"),
        &[],
        &claims(&["The endpoint works"]),
    );
    assert!(ok);
    assert!(!result.claims_proven);
    assert!(result.warnings.iter().any(|w| w.contains("permissive")));
}

#[test]
fn test_disabled_gate_passes_untouched_repo() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();

    let gates = coordinator(QualityGatesConfig::disabled(), repo_root);
    let (ok, result) = gates.validate_before_commit(&Task::default(), &[], &[]);

    assert!(ok);
    assert!(result.evidence_report_path.is_none());
    assert!(!repo_root.join(".work").exists());
}

#[cfg(unix)]
#[test]
fn test_gate_output_without_ignore_rules() {
    let temp_dir = init_repo_without_ignore();
    let repo_root = temp_dir.path();
    write_file(repo_root, "src/a.rs", "pub fn a() {}\n");

    let config = config_from_yaml(
        r#"
quality_gates:
  mandatory_testing:
    test_commands: ["echo '3 passed'"]
  git_diff_validation:
    enabled: true
"#,
    );
    let gates = coordinator(config, repo_root);
    let task = Task::new("task-9").with_expected_file("src/a.rs");

    let (ok, result) = gates.validate_before_commit(&task, &[], &[]);
    assert!(ok, "{}", result.reason);
    assert!(result.tests_passed);
    let diff = result.diff_result.as_ref().unwrap();
    assert_eq!(diff.changed_files, vec!["src/a.rs"]);
    assert!(diff.unexpected_files.is_empty());
    assert!(repo_root.join(".work/evidence/task-9_test_output_1.log").exists());

    assert!(gates.commit_with_footer("Add a", &result).unwrap());
    let tracked = git(&["ls-files"], repo_root);
    assert!(tracked.contains("src/a.rs"));
    assert!(!tracked.contains(".work"));

    // Only gate output is left, so there is nothing to commit
    let config = config_from_yaml(
        r#"
quality_gates:
  preflight:
    enabled: true
  mandatory_testing:
    enabled: false
"#,
    );
    let (ok, result) =
        coordinator(config, repo_root).validate_before_commit(&Task::new("task-10"), &[], &[]);
    assert!(!ok);
    assert!(!result.preflight_passed);
}
