//! Evidence records
//!
//! An [`Evidence`] item is immutable once built. Its `verified` flag is
//! computed from the data at construction and cannot be set by callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Kind of proof an evidence item carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    TestExecution,
    FunctionalVerification,
    SuccessCriteria,
    Screenshot,
}

impl EvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::TestExecution => "test_execution",
            EvidenceType::FunctionalVerification => "functional_verification",
            EvidenceType::SuccessCriteria => "success_criteria",
            EvidenceType::Screenshot => "screenshot",
        }
    }
}

impl std::fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for a test-execution evidence item
#[derive(Debug, Clone, Default)]
pub struct TestEvidence {
    pub command: String,
    pub exit_code: i32,
    pub stdout_path: Option<String>,
    pub failures: u32,
    pub errors: u32,
    pub pending: u32,
    pub examples: u32,
    pub duration: Duration,
    /// SHA-256 of the captured output file
    pub output_sha256: Option<String>,
}

/// A single typed proof artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    evidence_type: EvidenceType,
    data: Map<String, Value>,
    verified: bool,
    timestamp: DateTime<Utc>,
}

impl Evidence {
    /// Verified iff the run exited 0 with no failures and no errors
    pub fn test_execution(input: TestEvidence) -> Self {
        let verified = input.exit_code == 0 && input.failures == 0 && input.errors == 0;

        let mut data = Map::new();
        data.insert("command".into(), Value::from(input.command));
        data.insert("exit_code".into(), Value::from(input.exit_code));
        data.insert(
            "stdout_path".into(),
            input.stdout_path.map(Value::from).unwrap_or(Value::Null),
        );
        data.insert("failures".into(), Value::from(input.failures));
        data.insert("errors".into(), Value::from(input.errors));
        data.insert("pending".into(), Value::from(input.pending));
        data.insert("examples".into(), Value::from(input.examples));
        data.insert(
            "duration".into(),
            Value::from(input.duration.as_secs_f64()),
        );
        if let Some(digest) = input.output_sha256 {
            data.insert("output_sha256".into(), Value::from(digest));
        }

        Self::build(EvidenceType::TestExecution, data, verified)
    }

    /// Verified iff `actual` is present and equals `expected`.
    ///
    /// Metadata keys never override the core `verification_type`,
    /// `expected` and `actual` fields.
    pub fn functional_verification(
        verification_type: &str,
        expected: Value,
        actual: Value,
        metadata: Map<String, Value>,
    ) -> Self {
        let verified = !actual.is_null() && values_match(&expected, &actual);

        let mut data = metadata;
        data.insert("verification_type".into(), Value::from(verification_type));
        data.insert("expected".into(), expected);
        data.insert("actual".into(), actual);

        Self::build(EvidenceType::FunctionalVerification, data, verified)
    }

    /// Verified iff `expected == actual`
    pub fn success_criteria(
        criterion_id: &str,
        criterion_type: &str,
        expected: Value,
        actual: Value,
    ) -> Self {
        let verified = values_match(&expected, &actual);

        let mut data = Map::new();
        data.insert("criterion_id".into(), Value::from(criterion_id));
        data.insert("criterion_type".into(), Value::from(criterion_type));
        data.insert("expected".into(), expected);
        data.insert("actual".into(), actual);

        Self::build(EvidenceType::SuccessCriteria, data, verified)
    }

    /// Verified iff the screenshot file exists
    pub fn screenshot(path: &Path, description: &str) -> Self {
        let verified = path.is_file();

        let mut data = Map::new();
        data.insert("path".into(), Value::from(path.display().to_string()));
        data.insert("description".into(), Value::from(description));

        Self::build(EvidenceType::Screenshot, data, verified)
    }

    fn build(evidence_type: EvidenceType, data: Map<String, Value>, verified: bool) -> Self {
        Self {
            evidence_type,
            data,
            verified,
            timestamp: Utc::now(),
        }
    }

    pub fn evidence_type(&self) -> EvidenceType {
        self.evidence_type
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Field lookup into the evidence data
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn verified(&self) -> bool {
        self.verified
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Compare two JSON values, treating numbers by numeric value.
///
/// `0`, `0u32` and `0.0` all match; everything else is structural equality.
pub fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        _ => expected == actual,
    }
}

/// Aggregate counts over a collector's evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub total: usize,
    pub verified: usize,
    pub unverified: usize,
    pub by_type: BTreeMap<String, usize>,
}

/// On-disk shape of a task's evidence report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceReport {
    pub task_id: String,
    pub timestamp: DateTime<Utc>,
    pub summary: EvidenceSummary,
    pub evidence: Vec<Evidence>,
}
