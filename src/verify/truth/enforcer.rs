//! Rule matching and proof checks

use serde_json::{json, Map, Value};
use std::fmt::Write;
use tracing::{debug, info};

use super::claims::{Claim, ProofRequirement};
use crate::config::{EnforcementMode, TruthEnforcementConfig, TruthRule};
use crate::evidence::{values_match, Evidence, EvidenceCollector, EvidenceType};

/// Functional verification types that count as HTTP results
const HTTP_VERIFICATION_TYPES: &[&str] = &["http_request", "http_status_code"];

/// Result of judging a set of claims
#[derive(Debug, Clone, PartialEq)]
pub struct TruthVerdict {
    pub can_complete: bool,
    pub reason: String,
    pub all_proven: bool,
    pub claims: Vec<Claim>,
}

/// Checks claims about completed work against collected evidence
#[derive(Debug, Clone)]
pub struct TruthEnforcer {
    config: TruthEnforcementConfig,
}

impl TruthEnforcer {
    pub fn new(config: TruthEnforcementConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn mode(&self) -> EnforcementMode {
        self.config.mode
    }

    /// First rule whose claim text appears in `claim_text`, ignoring case.
    ///
    /// Rules are never reordered: a broad rule listed before a narrower one
    /// shadows it.
    pub fn find_matching_rule(&self, claim_text: &str) -> Option<&TruthRule> {
        let lowered = claim_text.to_lowercase();
        self.config.rules.iter().find(|rule| {
            let phrase = rule.claim.trim().to_lowercase();
            !phrase.is_empty() && lowered.contains(&phrase)
        })
    }

    /// Resolve a claim's rule and check its proof
    pub fn verify_claim(&self, claim_text: &str, collector: &EvidenceCollector) -> Claim {
        let Some(rule) = self.find_matching_rule(claim_text) else {
            debug!(claim = claim_text, "No rule matches claim");
            return Claim::unmatched(claim_text);
        };

        let mut claim = Claim::for_rule(claim_text, rule);
        let (has_proof, details) = match ProofRequirement::parse(&rule.proof_required) {
            ProofRequirement::TestExecution => verify_test_evidence(&rule.must_show, collector),
            ProofRequirement::FunctionalVerification => {
                verify_functional_evidence(&rule.must_show, collector)
            }
            ProofRequirement::SuccessCriteria => {
                verify_criteria_evidence(&rule.must_show, collector)
            }
            ProofRequirement::NoProof => (true, details_note("No proof required by rule")),
            ProofRequirement::Unsupported(tag) => (
                false,
                details_error(format!("Unsupported proof type: {tag}")),
            ),
        };
        claim.has_proof = has_proof;
        claim.proof_details = details;

        debug!(
            claim = claim_text,
            proof_required = %claim.proof_required,
            has_proof,
            "Claim checked"
        );
        claim
    }

    /// Check every claim; an empty list is vacuously proven
    pub fn verify_claims(&self, claims: &[String], collector: &EvidenceCollector) -> (bool, Vec<Claim>) {
        let checked: Vec<Claim> = claims
            .iter()
            .map(|c| self.verify_claim(c, collector))
            .collect();
        let all_proven = checked.iter().all(|c| c.has_proof);
        (all_proven, checked)
    }

    /// Decide whether the task may complete given its claims
    pub fn evaluate(&self, claims: &[String], collector: &EvidenceCollector) -> TruthVerdict {
        if !self.config.enabled {
            return TruthVerdict {
                can_complete: true,
                reason: "Truth enforcement disabled".to_string(),
                all_proven: true,
                claims: Vec::new(),
            };
        }

        let (all_proven, checked) = self.verify_claims(claims, collector);
        let unproven: Vec<&Claim> = checked.iter().filter(|c| !c.has_proof).collect();

        let blocks = !unproven.is_empty()
            && self.config.mode == EnforcementMode::Strict
            && self.config.block_unproven_success;

        let reason = if checked.is_empty() {
            "No claims to verify".to_string()
        } else if unproven.is_empty() {
            format!("All {} claims proven", checked.len())
        } else {
            let listed: Vec<&str> = unproven.iter().map(|c| c.claim_text.as_str()).collect();
            let suffix = if blocks {
                String::new()
            } else {
                format!(" (not blocking: {} mode)", self.config.mode)
            };
            format!(
                "{} of {} claims unproven: {}{suffix}",
                unproven.len(),
                checked.len(),
                listed.join("; ")
            )
        };

        info!(
            claims = checked.len(),
            unproven = unproven.len(),
            mode = %self.config.mode,
            can_complete = !blocks,
            "Truth enforcement complete"
        );

        TruthVerdict {
            can_complete: !blocks,
            reason,
            all_proven,
            claims: checked,
        }
    }

    /// `(can_complete, reason)` for a set of claims.
    ///
    /// Strict mode blocks on any unproven claim when `block_unproven_success`
    /// is set. Permissive mode never blocks.
    pub fn can_complete_task(&self, claims: &[String], collector: &EvidenceCollector) -> (bool, String) {
        let verdict = self.evaluate(claims, collector);
        (verdict.can_complete, verdict.reason)
    }

    /// Operator-facing summary of proven and unproven claims
    pub fn get_unproven_claims_report(&self, claims: &[Claim]) -> String {
        let proven = claims.iter().filter(|c| c.has_proof).count();
        let unproven: Vec<&Claim> = claims.iter().filter(|c| !c.has_proof).collect();

        let mut report = String::new();
        let _ = writeln!(
            report,
            "Claims: {} total, {proven} proven, {} unproven",
            claims.len(),
            unproven.len()
        );
        if unproven.is_empty() {
            return report;
        }

        let _ = writeln!(report, "\nUnproven claims:");
        for claim in unproven {
            let _ = writeln!(report, "  - \"{}\"", claim.claim_text);
            let _ = writeln!(report, "    Proof required: {}", claim.proof_required);
            for (key, value) in &claim.proof_details {
                let _ = writeln!(report, "    {key}: {}", render_detail(value));
            }
        }
        report
    }
}

fn render_detail(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) if map.contains_key("expected") => format!(
            "expected {}, actual {}",
            map.get("expected").unwrap_or(&Value::Null),
            map.get("actual").unwrap_or(&Value::Null)
        ),
        other => other.to_string(),
    }
}

fn details_note(note: impl Into<String>) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("note".into(), Value::from(note.into()));
    details
}

fn details_error(error: impl Into<String>) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("error".into(), Value::from(error.into()));
    details
}

/// `must_show` flags: `true`, non-zero numbers, and non-empty strings count
fn is_set(must_show: &Map<String, Value>, key: &str) -> bool {
    match must_show.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Compare `must_show` against the most recent test run.
///
/// With no keys to compare, the run itself must be verified.
fn verify_test_evidence(
    must_show: &Map<String, Value>,
    collector: &EvidenceCollector,
) -> (bool, Map<String, Value>) {
    let Some(evidence) = collector.latest(EvidenceType::TestExecution) else {
        return (false, details_error("No test execution evidence"));
    };

    let mut details = Map::new();
    if let Some(command) = evidence.get("command") {
        details.insert("command".into(), command.clone());
    }

    if must_show.is_empty() {
        if !evidence.verified() {
            details.insert("error".into(), Value::from("Latest test run did not pass"));
        }
        return (evidence.verified(), details);
    }

    let mut proven = true;
    for (key, expected) in must_show {
        let actual = evidence.get(key).cloned().unwrap_or(Value::Null);
        if !values_match(expected, &actual) {
            proven = false;
            details.insert(key.clone(), json!({ "expected": expected, "actual": actual }));
        }
    }
    (proven, details)
}

/// Functional proof: at least one item, plus the `must_show` requirements.
///
/// Without `http_request_results` or `screenshot_evidence`, every
/// functional item must be verified.
fn verify_functional_evidence(
    must_show: &Map<String, Value>,
    collector: &EvidenceCollector,
) -> (bool, Map<String, Value>) {
    let items: Vec<&Evidence> = collector
        .of_type(EvidenceType::FunctionalVerification)
        .collect();
    if items.is_empty() {
        return (false, details_error("No functional verification evidence"));
    }

    let mut details = Map::new();
    details.insert("functional_items".into(), Value::from(items.len()));
    let mut proven = true;
    let mut checked_specific = false;

    if is_set(must_show, "http_request_results") {
        checked_specific = true;
        let http: Vec<&&Evidence> = items
            .iter()
            .filter(|e| {
                e.get("verification_type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| HTTP_VERIFICATION_TYPES.contains(&t))
            })
            .collect();
        let failed = http.iter().filter(|e| !e.verified()).count();
        if http.is_empty() {
            proven = false;
            details.insert("http_request_results".into(), Value::from("No HTTP request evidence"));
        } else if failed > 0 {
            proven = false;
            details.insert(
                "http_request_results".into(),
                json!({ "expected": http.len(), "actual": http.len() - failed }),
            );
        }
    }

    if is_set(must_show, "screenshot_evidence") {
        checked_specific = true;
        if collector.of_type(EvidenceType::Screenshot).next().is_none() {
            proven = false;
            details.insert("screenshot_evidence".into(), Value::from("No screenshot evidence"));
        }
    }

    if !checked_specific {
        let failed = items.iter().filter(|e| !e.verified()).count();
        if failed > 0 {
            proven = false;
            details.insert(
                "verified".into(),
                json!({ "expected": items.len(), "actual": items.len() - failed }),
            );
        }
    }

    (proven, details)
}

/// Criteria proof: `all_criteria_verified`, else `min_verified`, else any
/// verified item.
fn verify_criteria_evidence(
    must_show: &Map<String, Value>,
    collector: &EvidenceCollector,
) -> (bool, Map<String, Value>) {
    let items: Vec<&Evidence> = collector.of_type(EvidenceType::SuccessCriteria).collect();
    if items.is_empty() {
        return (false, details_error("No success criteria evidence"));
    }

    let verified = items.iter().filter(|e| e.verified()).count();
    let mut details = Map::new();
    details.insert("criteria_total".into(), Value::from(items.len()));
    details.insert("criteria_verified".into(), Value::from(verified));

    let (proven, key, required) = if is_set(must_show, "all_criteria_verified") {
        (verified == items.len(), "all_criteria_verified", items.len())
    } else if let Some(min) = must_show.get("min_verified").and_then(Value::as_u64) {
        let min = usize::try_from(min).unwrap_or(usize::MAX);
        (verified >= min, "min_verified", min)
    } else {
        (verified > 0, "any_verified", 1)
    };

    if !proven {
        details.insert(key.into(), json!({ "expected": required, "actual": verified }));
    }
    (proven, details)
}
