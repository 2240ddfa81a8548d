//! Success criterion types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::evidence::values_match;
use crate::models::CriterionDefinition;

/// A criterion definition resolved into a closed set of checks.
///
/// Definitions with an unknown `type` or missing fields resolve to
/// `Unsupported` / `Invalid`, which always fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriterionCheck {
    FileExists { path: String },
    FileNotExists { path: String },
    StringInFile { path: String, text: String },
    StringNotInFile { path: String, text: String },
    PatternInFile { path: String, pattern: String },
    CommandSucceeds { command: String, expected_exit_code: i32 },
    Invalid { reason: String },
    Unsupported { kind: String },
}

impl CriterionCheck {
    pub fn from_definition(def: &CriterionDefinition) -> Self {
        let require = |field: &Option<String>, name: &str| -> Result<String, CriterionCheck> {
            field.clone().ok_or_else(|| CriterionCheck::Invalid {
                reason: format!("criterion type '{}' requires '{name}'", def.kind),
            })
        };

        let resolved = match def.kind.as_str() {
            "file_exists" => require(&def.path, "path").map(|path| Self::FileExists { path }),
            "file_not_exists" => {
                require(&def.path, "path").map(|path| Self::FileNotExists { path })
            }
            "string_in_file" => require(&def.path, "path").and_then(|path| {
                require(&def.text, "text").map(|text| Self::StringInFile { path, text })
            }),
            "string_not_in_file" => require(&def.path, "path").and_then(|path| {
                require(&def.text, "text").map(|text| Self::StringNotInFile { path, text })
            }),
            "pattern_in_file" => require(&def.path, "path").and_then(|path| {
                require(&def.pattern, "pattern").map(|pattern| Self::PatternInFile { path, pattern })
            }),
            "command_succeeds" => require(&def.command, "command").map(|command| {
                Self::CommandSucceeds {
                    command,
                    expected_exit_code: def.expected_exit_code.unwrap_or(0),
                }
            }),
            other => Ok(Self::Unsupported {
                kind: other.to_string(),
            }),
        };

        resolved.unwrap_or_else(|invalid| invalid)
    }
}

/// Outcome of checking one criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriterion {
    pub id: String,
    pub criterion_type: String,
    pub expected: Value,
    pub actual: Value,
    pub verified: bool,
    pub message: String,
}

impl SuccessCriterion {
    /// A criterion whose check ran; verified iff `actual == expected`
    pub fn checked(
        id: &str,
        criterion_type: &str,
        expected: Value,
        actual: Value,
        message: impl Into<String>,
    ) -> Self {
        let verified = values_match(&expected, &actual);
        Self {
            id: id.to_string(),
            criterion_type: criterion_type.to_string(),
            expected,
            actual,
            verified,
            message: message.into(),
        }
    }

    /// A criterion that could not be checked; never verified
    pub fn unverifiable(
        id: &str,
        criterion_type: &str,
        expected: Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            criterion_type: criterion_type.to_string(),
            expected,
            actual: Value::Null,
            verified: false,
            message: message.into(),
        }
    }
}
