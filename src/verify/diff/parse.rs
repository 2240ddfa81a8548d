//! Parsing `git diff` output

use regex::Regex;
use std::sync::LazyLock;

/// ` 5 files changed, 600 insertions(+), 10 deletions(-)`
static STAT_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+) files? changed(?:, (\d+) insertions?\(\+\))?(?:, (\d+) deletions?\(-\))?",
    )
    .expect("Invalid regex pattern")
});

/// Totals from a `git diff --stat` summary line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub files_changed: u64,
    pub insertions: u64,
    pub deletions: u64,
}

impl DiffStat {
    pub fn total_lines(&self) -> u64 {
        self.insertions + self.deletions
    }
}

/// Parse the summary line of `git diff --stat`.
///
/// Empty output (no changes) is an all-zero stat; output without a summary
/// line is `None`.
pub fn parse_diff_stat(output: &str) -> Option<DiffStat> {
    if output.trim().is_empty() {
        return Some(DiffStat::default());
    }
    let caps = STAT_SUMMARY.captures_iter(output).last()?;
    let number = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(DiffStat {
        files_changed: number(1),
        insertions: number(2),
        deletions: number(3),
    })
}

/// A line added by the diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedLine<'a> {
    /// Path from the most recent `+++ b/` header
    pub file: Option<&'a str>,
    pub content: &'a str,
}

/// Added lines of a unified diff, without the `+` marker.
///
/// `+++` file headers are not content.
pub fn added_lines(diff: &str) -> Vec<AddedLine<'_>> {
    let mut file = None;
    let mut lines = Vec::new();
    for line in diff.lines() {
        if let Some(header) = line.strip_prefix("+++ ") {
            file = match header.trim() {
                "/dev/null" => None,
                path => Some(path.strip_prefix("b/").unwrap_or(path)),
            };
            continue;
        }
        if let Some(content) = line.strip_prefix('+') {
            lines.push(AddedLine { file, content });
        }
    }
    lines
}
