//! Shared utility functions for verification operations

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;

/// Extract lines from output that match any of the given regex patterns.
///
/// Lines are deduplicated while preserving order of first occurrence.
pub fn extract_matching_lines(output: &str, patterns: &[String]) -> Result<Vec<String>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let regexes: Vec<Regex> = patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("Invalid pattern: {p}")))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    let matching_lines = output
        .lines()
        .filter(|line| regexes.iter().any(|re| re.is_match(line)))
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect();

    Ok(matching_lines)
}

/// Truncate a string to at most `max_len` bytes, adding ellipsis if needed.
///
/// Never splits a UTF-8 character.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Make a task id safe to embed in a file name.
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`; an empty result becomes
/// `unknown`.
pub fn sanitize_file_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        cleaned
    }
}
