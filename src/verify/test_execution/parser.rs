//! Test-runner output parsing
//!
//! Runners report their totals in incompatible formats. Each recognised
//! format is tried in turn, most distinctive first; output that matches none
//! of them parses to all-zero counts.

use regex::Regex;
use std::sync::LazyLock;

/// Counts normalised across runners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestCounts {
    pub failures: u32,
    pub errors: u32,
    pub pending: u32,
    pub examples: u32,
}

impl TestCounts {
    fn add(&mut self, other: TestCounts) {
        self.failures = self.failures.saturating_add(other.failures);
        self.errors = self.errors.saturating_add(other.errors);
        self.pending = self.pending.saturating_add(other.pending);
        self.examples = self.examples.saturating_add(other.examples);
    }
}

/// Jest / Vitest: `Tests:  1 failed, 2 skipped, 3 passed, 6 total`
static JEST_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Tests:\s+(.*\d+ total.*)$").expect("Invalid regex pattern")
});

/// RSpec: `10 examples, 2 failures, 1 pending`
static RSPEC_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) examples?, (\d+) failures?(?:, (\d+) pending)?")
        .expect("Invalid regex pattern")
});

/// RSpec load errors: `1 error occurred outside of examples`
static RSPEC_ERRORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) errors? occurred outside of examples").expect("Invalid regex pattern")
});

/// cargo test, once per test binary: `test result: ok. 3 passed; 0 failed; 1 ignored`
static CARGO_RESULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"test result: \w+\. (\d+) passed; (\d+) failed; (\d+) ignored")
        .expect("Invalid regex pattern")
});

/// `N <word>` pairs inside a summary line
static COUNT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) ([a-z]+)").expect("Invalid regex pattern"));

/// Generic / pytest summary line: anything with `N passed` or `N failed`
static GENERIC_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^.*\b\d+ (?:passed|failed)\b.*$").expect("Invalid regex pattern")
});

/// Parse runner output into normalised counts.
pub fn parse_test_output(output: &str) -> TestCounts {
    parse_jest(output)
        .or_else(|| parse_rspec(output))
        .or_else(|| parse_cargo(output))
        .or_else(|| parse_generic(output))
        .unwrap_or_default()
}

fn parse_jest(output: &str) -> Option<TestCounts> {
    // Jest prints "Test Suites:" before "Tests:"; the last match is the total
    let line = JEST_SUMMARY.captures_iter(output).last()?;
    let words = count_words(&line[1]);

    Some(TestCounts {
        failures: words.get("failed"),
        errors: 0,
        pending: words.sum(&["skipped", "todo", "pending"]),
        examples: words.get("total"),
    })
}

fn parse_rspec(output: &str) -> Option<TestCounts> {
    let caps = RSPEC_SUMMARY.captures_iter(output).last()?;
    let errors = RSPEC_ERRORS
        .captures(output)
        .map(|c| parse_u32(&c[1]))
        .unwrap_or(0);

    Some(TestCounts {
        failures: parse_u32(&caps[2]),
        errors,
        pending: caps.get(3).map(|m| parse_u32(m.as_str())).unwrap_or(0),
        examples: parse_u32(&caps[1]),
    })
}

fn parse_cargo(output: &str) -> Option<TestCounts> {
    let mut total: Option<TestCounts> = None;
    for caps in CARGO_RESULT.captures_iter(output) {
        let passed = parse_u32(&caps[1]);
        let failed = parse_u32(&caps[2]);
        let ignored = parse_u32(&caps[3]);
        total.get_or_insert_with(TestCounts::default).add(TestCounts {
            failures: failed,
            errors: 0,
            pending: ignored,
            examples: passed.saturating_add(failed).saturating_add(ignored),
        });
    }
    total
}

fn parse_generic(output: &str) -> Option<TestCounts> {
    let line = GENERIC_SUMMARY.find_iter(output).last()?;
    let words = count_words(line.as_str());

    let passed = words.get("passed");
    let failures = words.get("failed");
    let errors = words.sum(&["error", "errors"]);
    let pending = words.get("skipped");

    Some(TestCounts {
        failures,
        errors,
        pending,
        examples: [failures, errors, pending]
            .into_iter()
            .fold(passed, u32::saturating_add),
    })
}

struct CountWords(Vec<(String, u32)>);

impl CountWords {
    fn get(&self, word: &str) -> u32 {
        self.0
            .iter()
            .filter(|(w, _)| w == word)
            .fold(0u32, |acc, (_, n)| acc.saturating_add(*n))
    }

    fn sum(&self, words: &[&str]) -> u32 {
        words
            .iter()
            .fold(0u32, |acc, word| acc.saturating_add(self.get(word)))
    }
}

fn count_words(line: &str) -> CountWords {
    CountWords(
        COUNT_WORD
            .captures_iter(line)
            .map(|c| (c[2].to_string(), parse_u32(&c[1])))
            .collect(),
    )
}

/// Digit runs too long for a u32 clamp to `u32::MAX`
fn parse_u32(digits: &str) -> u32 {
    match digits.parse() {
        Ok(n) => n,
        Err(_) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => u32::MAX,
        Err(_) => 0,
    }
}
