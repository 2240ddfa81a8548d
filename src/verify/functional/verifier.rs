//! Runtime checks against running services

use glob::Pattern;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::http::{create_http_client, probe_http, probe_port};
use super::types::{FunctionalVerificationResult, VerificationKind};
use crate::config::FunctionalVerificationConfig;
use crate::evidence::EvidenceCollector;
use crate::models::VerificationDefinition;
use crate::verify::context::CommandContext;

/// Runs HTTP and port checks and records each as evidence
#[derive(Debug, Clone)]
pub struct FunctionalVerifier {
    config: FunctionalVerificationConfig,
    context: CommandContext,
}

impl FunctionalVerifier {
    pub fn new(config: FunctionalVerificationConfig, context: CommandContext) -> Self {
        Self { config, context }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether a failed check blocks the commit
    pub fn is_required(&self) -> bool {
        self.config.required
    }

    /// Definitions auto-detected from changed files, excluding any already
    /// present in `existing`
    pub fn detect_verifications(
        &self,
        existing: &[VerificationDefinition],
        changed_files: &[String],
    ) -> Vec<VerificationDefinition> {
        if !self.config.auto_detect.enabled {
            return Vec::new();
        }

        let mut detected: Vec<VerificationDefinition> = Vec::new();
        for entry in &self.config.auto_detect.patterns {
            let pattern = match Pattern::new(&entry.pattern) {
                Ok(p) => p,
                Err(e) => {
                    warn!(pattern = %entry.pattern, "Skipping invalid verification pattern: {e}");
                    continue;
                }
            };
            if !changed_files.iter().any(|f| pattern.matches(f)) {
                continue;
            }
            for url in &entry.test_urls {
                let def = VerificationDefinition {
                    kind: entry.verification.clone(),
                    url: Some(url.clone()),
                    expected_status: Some(entry.expected_status),
                    ..VerificationDefinition::default()
                };
                if !existing.contains(&def) && !detected.contains(&def) {
                    debug!(pattern = %entry.pattern, %url, "Verification detected");
                    detected.push(def);
                }
            }
        }
        detected
    }

    /// Run every definition plus any auto-detected ones.
    ///
    /// With nothing to check the result is `(true, [])`.
    pub fn verify_all(
        &self,
        definitions: &[VerificationDefinition],
        changed_files: &[String],
        collector: &mut EvidenceCollector,
    ) -> (bool, Vec<FunctionalVerificationResult>) {
        let mut all = definitions.to_vec();
        all.extend(self.detect_verifications(definitions, changed_files));

        if all.is_empty() {
            return (true, Vec::new());
        }

        let results: Vec<FunctionalVerificationResult> = all
            .iter()
            .map(|def| {
                let result = self.verify(def);
                collector.add_functional_verification_evidence(
                    &result.verification_type,
                    result.expected.clone(),
                    result.actual.clone(),
                    result.metadata.clone(),
                );
                result
            })
            .collect();

        let all_verified = results.iter().all(|r| r.verified);
        info!(
            total = results.len(),
            verified = results.iter().filter(|r| r.verified).count(),
            "Functional verification complete"
        );
        (all_verified, results)
    }

    /// Run a single definition
    pub fn verify(&self, def: &VerificationDefinition) -> FunctionalVerificationResult {
        let name = def.name.clone();
        let result = match VerificationKind::from_definition(def) {
            VerificationKind::Http {
                url,
                method,
                headers,
                body,
                expected_status,
            } => self.check_http(def, &url, &method, &headers, body.as_deref(), expected_status),
            VerificationKind::PortListening { host, port } => {
                self.check_port(def, host.as_deref(), port)
            }
            VerificationKind::Unavailable { kind } => FunctionalVerificationResult::not_run(
                &kind,
                name,
                Value::Bool(true),
                format!("'{kind}' checks need external automation tooling and are not performed here"),
            ),
            VerificationKind::Invalid { reason } => {
                FunctionalVerificationResult::not_run(&def.kind, name, Value::Bool(true), reason)
            }
            VerificationKind::Unsupported { kind } => FunctionalVerificationResult::not_run(
                &kind,
                name,
                Value::Bool(true),
                format!("Unsupported verification type: {kind}"),
            ),
        };

        debug!(
            verification_type = %result.verification_type,
            verified = result.verified,
            "Functional check finished"
        );
        result
    }

    fn check_http(
        &self,
        def: &VerificationDefinition,
        url: &str,
        method: &str,
        headers: &std::collections::BTreeMap<String, String>,
        body: Option<&str>,
        expected_status: u16,
    ) -> FunctionalVerificationResult {
        let url = self.context.expand_text(url);
        let timeout = Duration::from_secs(self.config.methods.http_requests.timeout);

        let mut metadata = Map::new();
        metadata.insert("url".into(), Value::from(url.clone()));
        metadata.insert("method".into(), Value::from(method));

        let probe = create_http_client(timeout)
            .and_then(|client| probe_http(&client, method, &url, headers, body));

        let actual = match probe {
            Ok(probe) => {
                metadata.insert(
                    "response_time_ms".into(),
                    Value::from(probe.elapsed.as_millis() as u64),
                );
                Value::from(probe.status)
            }
            Err(e) => {
                warn!(%url, "HTTP verification failed: {e:#}");
                metadata.insert("error".into(), Value::from(format!("{e:#}")));
                Value::Null
            }
        };

        FunctionalVerificationResult::new(
            &def.kind,
            def.name.clone(),
            Value::from(expected_status),
            actual,
            metadata,
        )
    }

    fn check_port(
        &self,
        def: &VerificationDefinition,
        host: Option<&str>,
        port: u16,
    ) -> FunctionalVerificationResult {
        let settings = &self.config.methods.port_checks;
        let host = host.unwrap_or(&settings.host);
        let timeout = Duration::from_secs(settings.timeout);

        let mut metadata = Map::new();
        metadata.insert("host".into(), Value::from(host));
        metadata.insert("port".into(), Value::from(port));

        let actual = match probe_port(host, port, timeout) {
            Ok(listening) => Value::Bool(listening),
            Err(e) => {
                warn!(host, port, "Port check failed: {e:#}");
                metadata.insert("error".into(), Value::from(format!("{e:#}")));
                Value::Null
            }
        };

        FunctionalVerificationResult::new(
            &def.kind,
            def.name.clone(),
            Value::Bool(true),
            actual,
            metadata,
        )
    }
}
