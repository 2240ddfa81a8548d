//! Tests for success criteria verification

use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use super::*;
use crate::models::CriterionDefinition;
use crate::verify::context::CommandContext;

fn verifier(root: &Path) -> SuccessCriteriaVerifier {
    SuccessCriteriaVerifier::new(root, CommandContext::new(root, "task-1"))
}

fn def(kind: &str) -> CriterionDefinition {
    CriterionDefinition {
        kind: kind.to_string(),
        ..CriterionDefinition::default()
    }
}

#[test]
fn test_empty_definitions_not_verified() {
    let temp = TempDir::new().unwrap();
    let (all_verified, results) = verifier(temp.path()).verify_all_criteria(&[]);

    assert!(!all_verified);
    assert!(results.is_empty());
}

#[test]
fn test_file_exists() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("present.txt"), "x").unwrap();
    let v = verifier(temp.path());

    let ok = v.verify_criterion(&CriterionDefinition::file_exists("present.txt"), 0);
    assert!(ok.verified);
    assert_eq!(ok.id, "criterion_1");
    assert_eq!(ok.expected, json!(true));
    assert_eq!(ok.actual, json!(true));

    let missing = v.verify_criterion(&CriterionDefinition::file_exists("absent.txt"), 1);
    assert!(!missing.verified);
    assert_eq!(missing.actual, json!(false));
    assert!(missing.message.contains("absent.txt"));
}

#[test]
fn test_file_not_exists() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("debug.log"), "x").unwrap();
    let v = verifier(temp.path());

    let present = CriterionDefinition {
        path: Some("debug.log".to_string()),
        ..def("file_not_exists")
    };
    assert!(!v.verify_criterion(&present, 0).verified);

    let absent = CriterionDefinition {
        path: Some("gone.log".to_string()),
        ..def("file_not_exists")
    };
    assert!(v.verify_criterion(&absent, 0).verified);
}

#[test]
fn test_string_in_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("lib.rs"), "pub mod login;\n").unwrap();
    let v = verifier(temp.path());

    assert!(
        v.verify_criterion(&CriterionDefinition::string_in_file("lib.rs", "mod login;"), 0)
            .verified
    );
    assert!(
        !v.verify_criterion(&CriterionDefinition::string_in_file("lib.rs", "mod logout;"), 0)
            .verified
    );
}

#[test]
fn test_string_in_missing_file_is_unverifiable() {
    let temp = TempDir::new().unwrap();
    let result = verifier(temp.path())
        .verify_criterion(&CriterionDefinition::string_in_file("nope.rs", "x"), 0);

    assert!(!result.verified);
    assert_eq!(result.actual, serde_json::Value::Null);
    assert!(result.message.contains("File not found"));
}

#[test]
fn test_string_not_in_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("app.js"), "console.log('x')").unwrap();
    let v = verifier(temp.path());

    let forbidden = CriterionDefinition {
        path: Some("app.js".to_string()),
        text: Some("console.log".to_string()),
        ..def("string_not_in_file")
    };
    assert!(!v.verify_criterion(&forbidden, 0).verified);

    let absent = CriterionDefinition {
        path: Some("app.js".to_string()),
        text: Some("debugger".to_string()),
        ..def("string_not_in_file")
    };
    assert!(v.verify_criterion(&absent, 0).verified);
}

#[test]
fn test_pattern_in_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("main.rs"), "fn handle_login() {}").unwrap();
    let v = verifier(temp.path());

    let matching = CriterionDefinition {
        path: Some("main.rs".to_string()),
        pattern: Some(r"fn\s+handle_\w+".to_string()),
        ..def("pattern_in_file")
    };
    assert!(v.verify_criterion(&matching, 0).verified);

    let invalid = CriterionDefinition {
        path: Some("main.rs".to_string()),
        pattern: Some("(".to_string()),
        ..def("pattern_in_file")
    };
    let result = v.verify_criterion(&invalid, 0);
    assert!(!result.verified);
    assert!(result.message.contains("Invalid regex"));
}

#[cfg(unix)]
#[test]
fn test_command_succeeds() {
    let temp = TempDir::new().unwrap();
    let v = verifier(temp.path());

    let ok = CriterionDefinition {
        command: Some("true".to_string()),
        ..def("command_succeeds")
    };
    assert!(v.verify_criterion(&ok, 0).verified);

    let failing = CriterionDefinition {
        command: Some("exit 2".to_string()),
        ..def("command_succeeds")
    };
    let result = v.verify_criterion(&failing, 0);
    assert!(!result.verified);
    assert_eq!(result.actual, json!(2));

    let expected_two = CriterionDefinition {
        command: Some("exit 2".to_string()),
        expected_exit_code: Some(2),
        ..def("command_succeeds")
    };
    assert!(v.verify_criterion(&expected_two, 0).verified);
}

#[cfg(unix)]
#[test]
fn test_command_expands_task_id() {
    let temp = TempDir::new().unwrap();
    let v = verifier(temp.path());

    let check = CriterionDefinition {
        command: Some("test ${TASK_ID} = task-1".to_string()),
        ..def("command_succeeds")
    };
    assert!(v.verify_criterion(&check, 0).verified);
}

#[test]
fn test_unsupported_type_fails_closed() {
    let temp = TempDir::new().unwrap();
    let result = verifier(temp.path()).verify_criterion(&def("database_row_exists"), 0);

    assert!(!result.verified);
    assert!(result.message.contains("Unsupported criterion type"));
}

#[test]
fn test_missing_field_fails_closed() {
    let temp = TempDir::new().unwrap();
    let result = verifier(temp.path()).verify_criterion(&def("file_exists"), 0);

    assert!(!result.verified);
    assert!(result.message.contains("requires 'path'"));
}

#[test]
fn test_verify_all_criteria_mixed() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "alpha").unwrap();

    let defs = vec![
        CriterionDefinition {
            id: Some("a-exists".to_string()),
            ..CriterionDefinition::file_exists("a.txt")
        },
        CriterionDefinition::file_exists("b.txt"),
    ];

    let (all_verified, results) = verifier(temp.path()).verify_all_criteria(&defs);
    assert!(!all_verified);
    assert_eq!(results[0].id, "a-exists");
    assert!(results[0].verified);
    assert_eq!(results[1].id, "criterion_2");
    assert!(!results[1].verified);
}

#[test]
fn test_criterion_check_resolution() {
    assert_eq!(
        CriterionCheck::from_definition(&CriterionDefinition::file_exists("x")),
        CriterionCheck::FileExists {
            path: "x".to_string()
        }
    );
    assert_eq!(
        CriterionCheck::from_definition(&def("mystery")),
        CriterionCheck::Unsupported {
            kind: "mystery".to_string()
        }
    );
}
