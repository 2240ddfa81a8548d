//! Claims and proof requirements

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::TruthRule;

/// `proof_required` recorded for claims no rule matches
pub const UNKNOWN_PROOF: &str = "unknown";

/// What a rule demands as proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofRequirement {
    TestExecution,
    FunctionalVerification,
    SuccessCriteria,
    /// Operator-declared exemption: proven without evidence
    NoProof,
    Unsupported(String),
}

impl ProofRequirement {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "test_execution_evidence" => Self::TestExecution,
            "functional_verification_evidence" => Self::FunctionalVerification,
            "success_criteria_verification" => Self::SuccessCriteria,
            "none" => Self::NoProof,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

/// A statement about completed work and whether the evidence backs it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_text: String,
    pub proof_required: String,
    #[serde(default)]
    pub must_show: Map<String, Value>,
    pub has_proof: bool,
    #[serde(default)]
    pub proof_details: Map<String, Value>,
}

impl Claim {
    /// A claim no rule covers; never proven
    pub fn unmatched(claim_text: &str) -> Self {
        let mut proof_details = Map::new();
        proof_details.insert(
            "error".into(),
            Value::from("No truth rule matches this claim"),
        );
        Self {
            claim_text: claim_text.to_string(),
            proof_required: UNKNOWN_PROOF.to_string(),
            must_show: Map::new(),
            has_proof: false,
            proof_details,
        }
    }

    pub(crate) fn for_rule(claim_text: &str, rule: &TruthRule) -> Self {
        Self {
            claim_text: claim_text.to_string(),
            proof_required: rule.proof_required.clone(),
            must_show: rule.must_show.clone(),
            has_proof: false,
            proof_details: Map::new(),
        }
    }
}

/// Lines of agent output that state something a rule covers.
///
/// Matching is case-insensitive containment; lines are trimmed and
/// returned once each, in order.
pub fn extract_claims(agent_output: &str, rules: &[TruthRule]) -> Vec<String> {
    let phrases: Vec<String> = rules
        .iter()
        .map(|r| r.claim.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();

    let mut claims: Vec<String> = Vec::new();
    for line in agent_output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lowered = line.to_lowercase();
        if phrases.iter().any(|p| lowered.contains(p.as_str()))
            && !claims.iter().any(|c| c == line)
        {
            claims.push(line.to_string());
        }
    }
    claims
}
