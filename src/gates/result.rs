//! The gate's single output

use serde::Serialize;
use std::path::PathBuf;

use crate::evidence::EvidenceCollector;
use crate::verify::criteria::SuccessCriterion;
use crate::verify::diff::DiffValidationResult;
use crate::verify::failure::{FailureReport, RetryContext};
use crate::verify::functional::FunctionalVerificationResult;
use crate::verify::test_execution::TestExecutionResult;
use crate::verify::truth::Claim;

/// Everything decided about one changeset.
///
/// Phases that did not run keep their defaults: "proven" flags stay false,
/// "not blocking" flags (`preflight_passed`, `functional_verified`,
/// `diff_validated`) stay true.
#[derive(Debug, Clone, Serialize)]
pub struct QualityGateResult {
    pub can_complete: bool,
    pub reason: String,
    pub tests_passed: bool,
    pub criteria_verified: bool,
    pub claims_proven: bool,
    pub preflight_passed: bool,
    pub functional_verified: bool,
    pub diff_validated: bool,
    #[serde(skip)]
    pub evidence_collector: Option<EvidenceCollector>,
    pub failure_report: Option<FailureReport>,
    /// Non-blocking notes: diff warnings, infrastructure errors
    pub warnings: Vec<String>,
    /// The failure is within its retry budget
    pub should_retry: bool,
    pub retry_context: Option<RetryContext>,
    pub evidence_report_path: Option<PathBuf>,
    pub test_result: Option<TestExecutionResult>,
    pub criteria: Vec<SuccessCriterion>,
    pub claims: Vec<Claim>,
    pub functional_results: Vec<FunctionalVerificationResult>,
    pub diff_result: Option<DiffValidationResult>,
}

impl Default for QualityGateResult {
    fn default() -> Self {
        Self {
            can_complete: false,
            reason: String::new(),
            tests_passed: false,
            criteria_verified: false,
            claims_proven: false,
            preflight_passed: true,
            functional_verified: true,
            diff_validated: true,
            evidence_collector: None,
            failure_report: None,
            warnings: Vec::new(),
            should_retry: false,
            retry_context: None,
            evidence_report_path: None,
            test_result: None,
            criteria: Vec::new(),
            claims: Vec::new(),
            functional_results: Vec::new(),
            diff_result: None,
        }
    }
}

impl QualityGateResult {
    pub(crate) fn blocked(mut self, reason: impl Into<String>) -> Self {
        self.can_complete = false;
        self.reason = reason.into();
        self
    }

    pub(crate) fn passed(mut self, reason: impl Into<String>) -> Self {
        self.can_complete = true;
        self.reason = reason.into();
        self
    }

    pub fn evidence_count(&self) -> usize {
        self.evidence_collector
            .as_ref()
            .map(EvidenceCollector::len)
            .unwrap_or(0)
    }
}
