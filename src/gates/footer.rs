//! Commit-message footer

use std::path::Path;

use super::result::QualityGateResult;

/// Evidence files listed in a footer
const MAX_FOOTER_FILES: usize = 3;

/// Render the footer for `result`; empty when no evidence was collected.
///
/// Evidence paths under `base` are shown relative to it.
pub fn render_footer(result: &QualityGateResult, base: Option<&Path>) -> String {
    let Some(collector) = &result.evidence_collector else {
        return String::new();
    };

    let marker = if result.can_complete {
        "✅ Quality Gates Passed"
    } else {
        "❌ Quality Gates Blocked"
    };
    let tests = if result.tests_passed {
        "✅ PASSED"
    } else {
        "❌ SKIPPED"
    };
    let criteria = if result.criteria_verified {
        "✅ VERIFIED"
    } else {
        "⏭️ NONE"
    };
    let claims = if result.claims_proven {
        "✅ YES"
    } else {
        "⏭️ NONE"
    };

    let mut lines = vec![
        marker.to_string(),
        format!("Tests: {tests}"),
        format!("Success Criteria: {criteria}"),
        format!("Claims Proven: {claims}"),
        format!("Total Evidence: {} items", collector.len()),
    ];

    let files = collector.get_evidence_file_paths();
    if !files.is_empty() {
        lines.push("Evidence Files:".to_string());
        for file in files.iter().take(MAX_FOOTER_FILES) {
            let shown = base
                .and_then(|b| file.strip_prefix(b).ok())
                .unwrap_or(file.as_path());
            lines.push(format!("  - {}", shown.display()));
        }
    }

    lines.join("\n")
}
