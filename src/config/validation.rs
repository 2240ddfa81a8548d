//! Configuration validation
//!
//! Runs once when a coordinator is built. Anything that would otherwise
//! surface mid-gate as an unparseable pattern is rejected here.

use thiserror::Error;

use super::types::QualityGatesConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid disallow pattern '{pattern}': {source}")]
    InvalidDisallowPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid glob pattern '{pattern}' in {section}: {source}")]
    InvalidGlob {
        section: &'static str,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("truth enforcement rule #{index} has an empty claim")]
    EmptyRuleClaim { index: usize },

    #[error("warn_if_exceeds ({warn}) must be lower than max_lines_changed ({max})")]
    WarnThresholdAboveMax { warn: u64, max: u64 },

    #[error("escalation report_path cannot be empty")]
    EmptyReportPath,
}

/// Validate a parsed configuration, returning the first problem found
pub fn validate_config(config: &QualityGatesConfig) -> Result<(), ConfigError> {
    let testing = &config.mandatory_testing;
    if testing.timeout_seconds == 0 {
        return Err(ConfigError::ZeroTimeout {
            field: "mandatory_testing.timeout_seconds",
        });
    }
    for entry in &testing.auto_detect_patterns {
        check_glob("mandatory_testing.auto_detect_patterns", &entry.pattern)?;
    }

    let functional = &config.functional_verification;
    if functional.methods.http_requests.timeout == 0 {
        return Err(ConfigError::ZeroTimeout {
            field: "functional_verification.methods.http_requests.timeout",
        });
    }
    if functional.methods.port_checks.timeout == 0 {
        return Err(ConfigError::ZeroTimeout {
            field: "functional_verification.methods.port_checks.timeout",
        });
    }
    for entry in &functional.auto_detect.patterns {
        check_glob("functional_verification.auto_detect.patterns", &entry.pattern)?;
    }

    let diff = &config.git_diff_validation.before_commit;
    if let (Some(warn), Some(max)) = (diff.warn_if_exceeds, diff.max_lines_changed) {
        if warn >= max {
            return Err(ConfigError::WarnThresholdAboveMax { warn, max });
        }
    }
    for entry in &diff.disallow_patterns {
        regex::Regex::new(&entry.pattern).map_err(|source| {
            ConfigError::InvalidDisallowPattern {
                pattern: entry.pattern.clone(),
                source,
            }
        })?;
    }

    for (index, rule) in config.truth_enforcement.rules.iter().enumerate() {
        if rule.claim.trim().is_empty() {
            return Err(ConfigError::EmptyRuleClaim { index });
        }
    }

    let escalate = &config.verification_failure_handling.on_test_failure.escalate;
    if escalate.report_path.trim().is_empty() {
        return Err(ConfigError::EmptyReportPath);
    }

    Ok(())
}

fn check_glob(section: &'static str, pattern: &str) -> Result<(), ConfigError> {
    glob::Pattern::new(pattern)
        .map(|_| ())
        .map_err(|source| ConfigError::InvalidGlob {
            section,
            pattern: pattern.to_string(),
            source,
        })
}
