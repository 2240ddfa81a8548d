//! `qgate validate`: run the gate over a working tree

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::config::{load_config, QualityGatesConfig};
use crate::gates::{QualityGateResult, QualityGatesCoordinator};
use crate::models::{load_task, Task};
use crate::vcs::{GitRepository, VersionControl};
use crate::verify::truth::extract_claims;

/// Inputs for one `validate` run
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub config: Option<PathBuf>,
    pub task: Option<PathBuf>,
    pub repo: PathBuf,
    pub changed_files: Vec<String>,
    pub claims: Vec<String>,
    pub agent_output: Option<PathBuf>,
    pub commit: Option<String>,
    pub push: Option<String>,
}

/// Run the gate and print the outcome. Returns whether the change may be
/// committed.
pub fn execute(options: ValidateOptions) -> Result<bool> {
    let repo = options
        .repo
        .canonicalize()
        .with_context(|| format!("Repository not found: {}", options.repo.display()))?;

    let config = match &options.config {
        Some(path) => load_config(path)?,
        None => QualityGatesConfig::default(),
    };
    let task = match &options.task {
        Some(path) => load_task(path)?,
        None => Task::default(),
    };

    let claims = collect_claims(&options, &config)?;
    let vcs = GitRepository::new(&repo).with_excluded_dirs(config.artifact_dirs(&repo));

    let changed_files = if options.changed_files.is_empty() {
        vcs.get_changed_files().unwrap_or_else(|e| {
            warn!("Could not list changed files: {e:#}");
            Vec::new()
        })
    } else {
        options.changed_files.clone()
    };

    let coordinator = QualityGatesCoordinator::new(config, &repo, Box::new(vcs))
        .context("Invalid quality gate configuration")?;

    println!(
        "{} Running quality gates for '{}'...\n",
        "→".cyan().bold(),
        task.task_id()
    );

    let (can_complete, result) = coordinator.validate_before_commit(&task, &changed_files, &claims);
    print_result(&result);

    if !result.claims.is_empty() && !result.claims_proven {
        println!("\n{}", "Unproven Claims:".bold());
        let report = coordinator
            .truth_enforcer()
            .get_unproven_claims_report(&result.claims);
        for line in report.lines() {
            println!("  {line}");
        }
    }

    let footer = coordinator.get_commit_message_footer(&result);
    if !footer.is_empty() {
        println!("\n{}", "Commit Footer:".bold());
        println!("{footer}");
    }

    if !can_complete {
        println!("\n{} {}", "✗".red().bold(), result.reason);
        return Ok(false);
    }
    println!("\n{} {}", "✓".green().bold(), result.reason);

    if let Some(message) = &options.commit {
        if coordinator.commit_with_footer(message, &result)? {
            let sha = coordinator.vcs().latest_commit_sha()?;
            println!("{} Committed {}", "✓".green(), sha.chars().take(12).collect::<String>());
        } else {
            println!("{} Nothing to commit", "−".dimmed());
        }

        if let Some(branch) = &options.push {
            if coordinator.vcs().push(branch)? {
                println!("{} Pushed to origin/{branch}", "✓".green());
            } else {
                println!("{} Push to origin/{branch} failed", "✗".red());
            }
        }
    } else if options.push.is_some() {
        bail!("--push requires --commit");
    }

    Ok(true)
}

/// Explicit claims followed by any extracted from the agent output file
fn collect_claims(options: &ValidateOptions, config: &QualityGatesConfig) -> Result<Vec<String>> {
    let mut claims = options.claims.clone();

    if let Some(path) = &options.agent_output {
        let output = fs::read_to_string(path)
            .with_context(|| format!("Failed to read agent output: {}", path.display()))?;
        for claim in extract_claims(&output, &config.truth_enforcement.rules) {
            if !claims.contains(&claim) {
                claims.push(claim);
            }
        }
    }

    Ok(claims)
}

fn print_result(result: &QualityGateResult) {
    let mark = |ok: bool| if ok { "✓".green() } else { "✗".red() };

    if let Some(tests) = &result.test_result {
        println!("  {} {}", mark(tests.passed()), tests.summary());
    }
    for criterion in &result.criteria {
        println!("  {} {}", mark(criterion.verified), criterion.message);
    }
    for check in &result.functional_results {
        println!(
            "  {} {} {}",
            mark(check.verified),
            check.verification_type,
            check.name.as_deref().unwrap_or_default()
        );
    }
    if let Some(diff) = &result.diff_result {
        println!("  {} Diff validation", mark(diff.passed));
        for issue in &diff.issues {
            println!("      {}", issue.red());
        }
    }
    for claim in &result.claims {
        println!("  {} {}", mark(claim.has_proof), claim.claim_text);
    }
    for warning in &result.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
    if let Some(path) = &result.evidence_report_path {
        println!("  {} Evidence: {}", "−".dimmed(), path.display());
    }
    if let Some(report) = &result.failure_report {
        println!(
            "  {} Failure report ({}, escalated: {})",
            "−".dimmed(),
            report.failure_type,
            report.escalated
        );
    }
}
