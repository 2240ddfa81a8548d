//! Per-task evidence accumulator

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::{Evidence, EvidenceReport, EvidenceSummary, EvidenceType, TestEvidence};
use crate::fs::write_json_atomic;
use crate::verify::utils::sanitize_file_component;

/// Append-only proof store for exactly one task.
///
/// Created at the start of a gate run, filled by each phase, flushed to
/// `{evidence_dir}/{task_id}_evidence.json`, then dropped.
#[derive(Debug, Clone)]
pub struct EvidenceCollector {
    task_id: String,
    evidence_dir: PathBuf,
    evidence: Vec<Evidence>,
    artifact_paths: Vec<PathBuf>,
    report_path: Option<PathBuf>,
}

impl EvidenceCollector {
    pub fn new(task_id: impl Into<String>, evidence_dir: impl Into<PathBuf>) -> Self {
        Self {
            task_id: task_id.into(),
            evidence_dir: evidence_dir.into(),
            evidence: Vec::new(),
            artifact_paths: Vec::new(),
            report_path: None,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn evidence_dir(&self) -> &Path {
        &self.evidence_dir
    }

    /// Record a test run. The captured stdout file, if any, becomes an
    /// evidence artifact.
    pub fn add_test_evidence(&mut self, input: TestEvidence) -> &Evidence {
        if let Some(path) = &input.stdout_path {
            self.artifact_paths.push(PathBuf::from(path));
        }
        self.push(Evidence::test_execution(input))
    }

    pub fn add_functional_verification_evidence(
        &mut self,
        verification_type: &str,
        expected: Value,
        actual: Value,
        metadata: Map<String, Value>,
    ) -> &Evidence {
        self.push(Evidence::functional_verification(
            verification_type,
            expected,
            actual,
            metadata,
        ))
    }

    pub fn add_success_criteria_evidence(
        &mut self,
        criterion_id: &str,
        criterion_type: &str,
        expected: Value,
        actual: Value,
    ) -> &Evidence {
        self.push(Evidence::success_criteria(
            criterion_id,
            criterion_type,
            expected,
            actual,
        ))
    }

    pub fn add_screenshot_evidence(&mut self, path: &Path, description: &str) -> &Evidence {
        self.artifact_paths.push(path.to_path_buf());
        self.push(Evidence::screenshot(path, description))
    }

    fn push(&mut self, evidence: Evidence) -> &Evidence {
        debug!(
            task_id = %self.task_id,
            evidence_type = %evidence.evidence_type(),
            verified = evidence.verified(),
            "Recorded evidence"
        );
        self.evidence.push(evidence);
        &self.evidence[self.evidence.len() - 1]
    }

    /// All evidence in insertion order
    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    pub fn len(&self) -> usize {
        self.evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }

    /// Evidence of one type, in insertion order
    pub fn of_type(&self, evidence_type: EvidenceType) -> impl Iterator<Item = &Evidence> {
        self.evidence
            .iter()
            .filter(move |e| e.evidence_type() == evidence_type)
    }

    /// The most recently added item of a type
    pub fn latest(&self, evidence_type: EvidenceType) -> Option<&Evidence> {
        self.evidence
            .iter()
            .rev()
            .find(|e| e.evidence_type() == evidence_type)
    }

    /// True only if there is at least one item and every item is verified.
    ///
    /// An empty collector is not verified: no evidence is not proof.
    pub fn has_all_evidence_verified(&self) -> bool {
        !self.evidence.is_empty() && self.evidence.iter().all(Evidence::verified)
    }

    pub fn summary(&self) -> EvidenceSummary {
        let mut summary = EvidenceSummary {
            total: self.evidence.len(),
            ..EvidenceSummary::default()
        };
        for item in &self.evidence {
            if item.verified() {
                summary.verified += 1;
            } else {
                summary.unverified += 1;
            }
            *summary
                .by_type
                .entry(item.evidence_type().as_str().to_string())
                .or_insert(0) += 1;
        }
        summary
    }

    /// Path the JSON report is written to
    pub fn report_file_path(&self) -> PathBuf {
        self.evidence_dir.join(format!(
            "{}_evidence.json",
            sanitize_file_component(&self.task_id)
        ))
    }

    /// Write the evidence report atomically and return its path.
    ///
    /// Write failures are returned to the caller.
    pub fn save_report(&mut self) -> Result<PathBuf> {
        let path = self.report_file_path();
        let report = EvidenceReport {
            task_id: self.task_id.clone(),
            timestamp: Utc::now(),
            summary: self.summary(),
            evidence: self.evidence.clone(),
        };

        write_json_atomic(&path, &report)
            .with_context(|| format!("Failed to save evidence report for {}", self.task_id))?;

        self.report_path = Some(path.clone());
        Ok(path)
    }

    /// Output artifacts followed by the saved report, for commit messages
    pub fn get_evidence_file_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.artifact_paths.clone();
        if let Some(report) = &self.report_path {
            paths.push(report.clone());
        }
        paths
    }
}

/// Read a previously saved evidence report
pub fn load_report(path: &Path) -> Result<EvidenceReport> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read evidence report: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse evidence report: {}", path.display()))
}
