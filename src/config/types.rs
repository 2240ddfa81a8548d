//! Quality gate configuration types
//!
//! Every struct is `#[serde(default)]` so a partial document only needs to
//! name the settings it changes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Component, Path};
use std::time::Duration;

use crate::models::VerificationDefinition;

/// Root of the `quality_gates` configuration block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGatesConfig {
    pub enabled: bool,
    /// Directory for evidence reports and captured output, relative to the repo root
    pub evidence_dir: String,
    pub preflight: PreflightConfig,
    pub mandatory_testing: MandatoryTestingConfig,
    pub functional_verification: FunctionalVerificationConfig,
    pub git_diff_validation: DiffValidationConfig,
    pub truth_enforcement: TruthEnforcementConfig,
    pub verification_failure_handling: FailureHandlingConfig,
}

impl Default for QualityGatesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            evidence_dir: ".work/evidence".to_string(),
            preflight: PreflightConfig::default(),
            mandatory_testing: MandatoryTestingConfig::default(),
            functional_verification: FunctionalVerificationConfig::default(),
            git_diff_validation: DiffValidationConfig::default(),
            truth_enforcement: TruthEnforcementConfig::default(),
            verification_failure_handling: FailureHandlingConfig::default(),
        }
    }
}

impl QualityGatesConfig {
    /// A configuration with every phase switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Repository-relative directories the gate writes into: the evidence
    /// directory and the failure report directory.
    ///
    /// A templated report path contributes the directory above its first
    /// `{task_id}` component. Paths outside `repo_root` are left out.
    pub fn artifact_dirs(&self, repo_root: &Path) -> Vec<String> {
        let report_path = &self.verification_failure_handling.on_test_failure.escalate.report_path;
        let report_dir: String = if report_path.contains("{task_id}") {
            Path::new(report_path)
                .components()
                .take_while(|c| !c.as_os_str().to_string_lossy().contains("{task_id}"))
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        } else {
            report_path.clone()
        };

        let mut dirs = Vec::new();
        for dir in [self.evidence_dir.as_str(), report_dir.as_str()] {
            if let Some(dir) = relative_dir(repo_root, dir) {
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }
        dirs
    }
}

/// `dir` as a `/`-separated path relative to `repo_root`, if it lies inside it
fn relative_dir(repo_root: &Path, dir: &str) -> Option<String> {
    let path = Path::new(dir);
    let path = if path.is_absolute() {
        path.strip_prefix(repo_root).ok()?
    } else {
        path
    };

    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    pub enabled: bool,
    /// Fail when there is nothing to commit
    pub require_changes: bool,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            require_changes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MandatoryTestingConfig {
    pub enabled: bool,
    pub block_commits: bool,
    pub timeout_seconds: u64,
    /// Explicit commands; when non-empty, auto-detection is skipped
    pub test_commands: Vec<String>,
    pub auto_detect_patterns: Vec<TestCommandPattern>,
}

impl Default for MandatoryTestingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_commits: true,
            timeout_seconds: 300,
            test_commands: Vec::new(),
            auto_detect_patterns: Vec::new(),
        }
    }
}

impl MandatoryTestingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Maps changed files matching `pattern` (glob) to a test command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCommandPattern {
    pub pattern: String,
    pub command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionalVerificationConfig {
    pub enabled: bool,
    /// Whether a failed verification blocks the commit
    pub required: bool,
    pub methods: VerificationMethods,
    /// Verifications run for every task
    pub verifications: Vec<VerificationDefinition>,
    pub auto_detect: FunctionalAutoDetectConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationMethods {
    pub http_requests: HttpRequestSettings,
    pub port_checks: PortCheckSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpRequestSettings {
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for HttpRequestSettings {
    fn default() -> Self {
        Self { timeout: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortCheckSettings {
    pub host: String,
    /// Connect timeout in seconds
    pub timeout: u64,
}

impl Default for PortCheckSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            timeout: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionalAutoDetectConfig {
    pub enabled: bool,
    pub patterns: Vec<FunctionalAutoDetectPattern>,
}

/// Appends one verification per `test_urls` entry when `pattern` matches a changed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalAutoDetectPattern {
    pub pattern: String,
    #[serde(default = "default_auto_verification")]
    pub verification: String,
    #[serde(default)]
    pub test_urls: Vec<String>,
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

fn default_auto_verification() -> String {
    "http_request".to_string()
}

fn default_expected_status() -> u16 {
    200
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffValidationConfig {
    pub enabled: bool,
    pub before_commit: BeforeCommitDiffConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeforeCommitDiffConfig {
    pub validate_files_changed: FilesChangedConfig,
    pub max_lines_changed: Option<u64>,
    pub warn_if_exceeds: Option<u64>,
    pub disallow_patterns: Vec<DisallowPattern>,
    pub if_unexpected_files_changed: UnexpectedFilesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesChangedConfig {
    pub enabled: bool,
    pub allow_additional_files: bool,
}

impl Default for FilesChangedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_additional_files: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisallowPattern {
    pub pattern: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnexpectedFilesConfig {
    pub action: UnexpectedFilesAction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnexpectedFilesAction {
    /// Unexpected files fail the diff check
    #[default]
    Block,
    /// Unexpected files are reported as warnings only
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruthEnforcementConfig {
    pub enabled: bool,
    pub mode: EnforcementMode,
    pub block_unproven_success: bool,
    /// Ordered rule list; the first rule whose claim text matches wins
    pub rules: Vec<TruthRule>,
}

impl Default for TruthEnforcementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: EnforcementMode::Strict,
            block_unproven_success: true,
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    #[default]
    Strict,
    Permissive,
}

impl std::fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnforcementMode::Strict => write!(f, "strict"),
            EnforcementMode::Permissive => write!(f, "permissive"),
        }
    }
}

/// Maps a claim phrase to the evidence that proves it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthRule {
    pub claim: String,
    pub proof_required: String,
    #[serde(default)]
    pub must_show: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureHandlingConfig {
    pub enabled: bool,
    pub on_test_failure: TestFailurePolicy,
    pub on_functional_verification_failure: FunctionalFailurePolicy,
    pub on_success_criteria_not_met: CriteriaFailurePolicy,
}

impl Default for FailureHandlingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            on_test_failure: TestFailurePolicy::default(),
            on_functional_verification_failure: FunctionalFailurePolicy::default(),
            on_success_criteria_not_met: CriteriaFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestFailurePolicy {
    pub max_retries: u32,
    pub retry_with_more_context: bool,
    pub escalate: EscalationConfig,
}

impl Default for TestFailurePolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_with_more_context: true,
            escalate: EscalationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub enabled: bool,
    pub action: EscalationAction,
    /// Directory, or a path template containing `{task_id}`
    pub report_path: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            action: EscalationAction::CreateDetailedFailureReport,
            report_path: ".work/failure_reports".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationAction {
    #[default]
    CreateDetailedFailureReport,
    MarkTaskAsNeedsManualReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionalFailurePolicy {
    pub max_retries: u32,
    /// Debugging steps recorded on the failure report
    pub enhanced_debugging: Vec<String>,
}

impl Default for FunctionalFailurePolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            enhanced_debugging: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaFailurePolicy {
    pub action: String,
    pub create_failure_report: bool,
}

impl Default for CriteriaFailurePolicy {
    fn default() -> Self {
        Self {
            action: "fail_task".to_string(),
            create_failure_report: true,
        }
    }
}
