use serde_json::{json, Map, Value};
use std::time::Duration;
use tempfile::TempDir;

use super::*;
use crate::config::{EnforcementMode, TruthEnforcementConfig, TruthRule};
use crate::evidence::{EvidenceCollector, TestEvidence};

fn rule(claim: &str, proof: &str, must_show: Value) -> TruthRule {
    TruthRule {
        claim: claim.to_string(),
        proof_required: proof.to_string(),
        must_show: match must_show {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    }
}

fn standard_rules() -> Vec<TruthRule> {
    vec![
        rule(
            "all tests pass",
            "test_execution_evidence",
            json!({"failures": 0, "errors": 0}),
        ),
        rule(
            "endpoint works",
            "functional_verification_evidence",
            json!({"http_request_results": true}),
        ),
        rule(
            "requirements met",
            "success_criteria_verification",
            json!({"all_criteria_verified": true}),
        ),
        rule("refactored", "none", json!({})),
    ]
}

fn enforcer(mode: EnforcementMode, block: bool) -> TruthEnforcer {
    TruthEnforcer::new(TruthEnforcementConfig {
        enabled: true,
        mode,
        block_unproven_success: block,
        rules: standard_rules(),
    })
}

fn collector() -> (TempDir, EvidenceCollector) {
    let temp = TempDir::new().unwrap();
    let collector = EvidenceCollector::new("t-1", temp.path());
    (temp, collector)
}

fn test_run(failures: u32) -> TestEvidence {
    TestEvidence {
        command: "cargo test".to_string(),
        exit_code: if failures == 0 { 0 } else { 101 },
        failures,
        examples: 10,
        duration: Duration::from_secs(1),
        ..TestEvidence::default()
    }
}

fn claims(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_empty_claims_vacuously_proven() {
    let (_temp, c) = collector();
    let (all, checked) = enforcer(EnforcementMode::Strict, true).verify_claims(&[], &c);
    assert!(all);
    assert!(checked.is_empty());
}

#[test]
fn test_rule_matching_is_case_insensitive_first_wins() {
    let e = TruthEnforcer::new(TruthEnforcementConfig {
        rules: vec![
            rule("tests pass", "none", json!({})),
            rule("all tests pass", "test_execution_evidence", json!({})),
        ],
        ..TruthEnforcementConfig::default()
    });

    let matched = e.find_matching_rule("ALL TESTS PASS now").unwrap();
    assert_eq!(matched.claim, "tests pass");
    assert!(e.find_matching_rule("deployed to prod").is_none());
}

#[test]
fn test_unmatched_claim_is_unknown_and_unproven() {
    let (_temp, c) = collector();
    let claim = enforcer(EnforcementMode::Permissive, true).verify_claim("it is fast", &c);
    assert_eq!(claim.proof_required, UNKNOWN_PROOF);
    assert!(!claim.has_proof);
}

#[test]
fn test_test_claim_uses_latest_evidence() {
    let (_temp, mut c) = collector();
    let e = enforcer(EnforcementMode::Strict, true);

    assert!(!e.verify_claim("All tests pass", &c).has_proof);

    c.add_test_evidence(test_run(0));
    assert!(e.verify_claim("All tests pass", &c).has_proof);

    c.add_test_evidence(test_run(2));
    let claim = e.verify_claim("All tests pass", &c);
    assert!(!claim.has_proof);
    assert_eq!(
        claim.proof_details.get("failures"),
        Some(&json!({"expected": 0, "actual": 2}))
    );
}

#[test]
fn test_functional_claim_requires_http_results() {
    let (_temp, mut c) = collector();
    let e = enforcer(EnforcementMode::Strict, true);

    assert!(!e.verify_claim("the endpoint works", &c).has_proof);

    c.add_functional_verification_evidence("port_listening", json!(true), json!(true), Map::new());
    let claim = e.verify_claim("the endpoint works", &c);
    assert!(!claim.has_proof, "port checks are not HTTP results");

    c.add_functional_verification_evidence("http_request", json!(200), json!(200), Map::new());
    assert!(e.verify_claim("the endpoint works", &c).has_proof);

    c.add_functional_verification_evidence("http_status_code", json!(200), json!(404), Map::new());
    assert!(!e.verify_claim("the endpoint works", &c).has_proof);
}

#[test]
fn test_functional_claim_screenshot_requirement() {
    let (temp, mut c) = collector();
    let e = TruthEnforcer::new(TruthEnforcementConfig {
        rules: vec![rule(
            "looks right",
            "functional_verification_evidence",
            json!({"screenshot_evidence": true}),
        )],
        ..TruthEnforcementConfig::default()
    });

    c.add_functional_verification_evidence("http_request", json!(200), json!(200), Map::new());
    assert!(!e.verify_claim("UI looks right", &c).has_proof);

    let shot = temp.path().join("home.png");
    std::fs::write(&shot, b"png").unwrap();
    c.add_screenshot_evidence(&shot, "home page");
    assert!(e.verify_claim("UI looks right", &c).has_proof);
}

#[test]
fn test_criteria_claim_variants() {
    let (_temp, mut c) = collector();
    let strict = enforcer(EnforcementMode::Strict, true);

    c.add_success_criteria_evidence("a", "file_exists", json!(true), json!(true));
    c.add_success_criteria_evidence("b", "file_exists", json!(true), json!(false));
    assert!(!strict.verify_claim("requirements met", &c).has_proof);

    let lenient = TruthEnforcer::new(TruthEnforcementConfig {
        rules: vec![
            rule("two done", "success_criteria_verification", json!({"min_verified": 2})),
            rule("some done", "success_criteria_verification", json!({})),
        ],
        ..TruthEnforcementConfig::default()
    });
    assert!(!lenient.verify_claim("two done", &c).has_proof);
    assert!(lenient.verify_claim("some done", &c).has_proof);
}

#[test]
fn test_none_and_unsupported_proof_types() {
    let (_temp, c) = collector();
    let e = TruthEnforcer::new(TruthEnforcementConfig {
        rules: vec![
            rule("refactored", "none", json!({})),
            rule("secure", "pentest_report", json!({})),
        ],
        ..TruthEnforcementConfig::default()
    });

    assert!(e.verify_claim("Refactored the parser", &c).has_proof);
    let claim = e.verify_claim("it is secure", &c);
    assert!(!claim.has_proof);
    assert!(claim.proof_details["error"]
        .as_str()
        .unwrap()
        .contains("pentest_report"));
}

#[test]
fn test_can_complete_strict_blocks() {
    let (_temp, c) = collector();
    let (ok, reason) =
        enforcer(EnforcementMode::Strict, true).can_complete_task(&claims(&["All tests pass"]), &c);
    assert!(!ok);
    assert!(reason.contains("1 of 1 claims unproven"));
}

#[test]
fn test_can_complete_strict_without_blocking() {
    let (_temp, c) = collector();
    let (ok, _) =
        enforcer(EnforcementMode::Strict, false).can_complete_task(&claims(&["All tests pass"]), &c);
    assert!(ok);
}

#[test]
fn test_can_complete_permissive_never_blocks() {
    let (_temp, c) = collector();
    let verdict = enforcer(EnforcementMode::Permissive, true)
        .evaluate(&claims(&["All tests pass", "unknown thing"]), &c);
    assert!(verdict.can_complete);
    assert!(!verdict.all_proven);
    assert!(verdict.reason.contains("permissive"));
}

#[test]
fn test_disabled_always_completes() {
    let (_temp, c) = collector();
    let e = TruthEnforcer::new(TruthEnforcementConfig {
        enabled: false,
        ..TruthEnforcementConfig::default()
    });
    assert!(e.can_complete_task(&claims(&["anything"]), &c).0);
}

#[test]
fn test_unproven_report_lists_details() {
    let (_temp, mut c) = collector();
    c.add_test_evidence(test_run(3));
    let e = enforcer(EnforcementMode::Strict, true);

    let (_, checked) = e.verify_claims(&claims(&["All tests pass", "Refactored it"]), &c);
    let report = e.get_unproven_claims_report(&checked);

    assert!(report.contains("Claims: 2 total, 1 proven, 1 unproven"));
    assert!(report.contains("\"All tests pass\""));
    assert!(report.contains("Proof required: test_execution_evidence"));
    assert!(report.contains("failures: expected 0, actual 3"));
}

#[test]
fn test_extract_claims() {
    let output = "Implemented login.\n  All tests pass!\nThe endpoint works.\nall tests pass!\n";
    assert_eq!(
        extract_claims(output, &standard_rules()),
        vec!["All tests pass!", "The endpoint works.", "all tests pass!"]
    );
}
