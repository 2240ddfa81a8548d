//! Functional verification types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::evidence::values_match;
use crate::models::VerificationDefinition;

/// Status expected from an HTTP check that does not name one
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

/// A verification definition resolved into a closed set of checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationKind {
    /// `http_request` and `http_status_code`
    Http {
        url: String,
        method: String,
        headers: BTreeMap<String, String>,
        body: Option<String>,
        expected_status: u16,
    },
    PortListening {
        host: Option<String>,
        port: u16,
    },
    /// Needs tooling this crate does not drive (browsers, databases)
    Unavailable { kind: String },
    Invalid { reason: String },
    Unsupported { kind: String },
}

impl VerificationKind {
    pub fn from_definition(def: &VerificationDefinition) -> Self {
        match def.kind.as_str() {
            "http_request" | "http_status_code" => match &def.url {
                Some(url) => Self::Http {
                    url: url.clone(),
                    method: def
                        .method
                        .as_deref()
                        .unwrap_or("GET")
                        .to_ascii_uppercase(),
                    headers: def.headers.clone(),
                    body: def.body.clone(),
                    expected_status: def.expected_status.unwrap_or(DEFAULT_EXPECTED_STATUS),
                },
                None => Self::Invalid {
                    reason: format!("verification type '{}' requires 'url'", def.kind),
                },
            },
            "port_listening" => match def.port {
                Some(port) => Self::PortListening {
                    host: def.host.clone(),
                    port,
                },
                None => Self::Invalid {
                    reason: "verification type 'port_listening' requires 'port'".to_string(),
                },
            },
            "browser_element" | "browser_screenshot" | "database_query" => Self::Unavailable {
                kind: def.kind.clone(),
            },
            other => Self::Unsupported {
                kind: other.to_string(),
            },
        }
    }
}

/// Outcome of one runtime check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalVerificationResult {
    pub verification_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub verified: bool,
    pub expected: Value,
    pub actual: Value,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl FunctionalVerificationResult {
    /// Verified iff `actual` is present and matches `expected`
    pub fn new(
        verification_type: &str,
        name: Option<String>,
        expected: Value,
        actual: Value,
        metadata: Map<String, Value>,
    ) -> Self {
        let verified = !actual.is_null() && values_match(&expected, &actual);
        Self {
            verification_type: verification_type.to_string(),
            name,
            verified,
            expected,
            actual,
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// A check that could not run; never verified
    pub fn not_run(
        verification_type: &str,
        name: Option<String>,
        expected: Value,
        note: impl Into<String>,
    ) -> Self {
        let mut metadata = Map::new();
        metadata.insert("note".into(), Value::from(note.into()));
        Self::new(verification_type, name, expected, Value::Null, metadata)
    }

    /// `note` or `error` metadata, if any
    pub fn note(&self) -> Option<&str> {
        self.metadata
            .get("error")
            .or_else(|| self.metadata.get("note"))
            .and_then(Value::as_str)
    }
}
