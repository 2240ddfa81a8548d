//! `qgate claims`: list claims found in agent output

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use crate::config::{load_config, QualityGatesConfig};
use crate::verify::truth::extract_claims;

pub fn execute(config: Option<&Path>, agent_output: &Path) -> Result<()> {
    let config = match config {
        Some(path) => load_config(path)?,
        None => QualityGatesConfig::default(),
    };
    let output = fs::read_to_string(agent_output)
        .with_context(|| format!("Failed to read agent output: {}", agent_output.display()))?;

    let claims = extract_claims(&output, &config.truth_enforcement.rules);
    if claims.is_empty() {
        println!("{} No claims found", "−".dimmed());
        return Ok(());
    }

    println!("{}", "Claims:".bold());
    for claim in claims {
        println!("  {} {}", "•".cyan(), claim);
    }
    Ok(())
}
