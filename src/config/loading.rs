//! Configuration file loading

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::QualityGatesConfig;
use super::validation::validate_config;

/// Top-level key that may wrap the configuration block
const ROOT_KEY: &str = "quality_gates";

/// Load and validate a configuration file.
///
/// `.toml` files are parsed as TOML, everything else as YAML. The document
/// may be the bare gate configuration or nest it under `quality_gates`.
pub fn load_config(path: &Path) -> Result<QualityGatesConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config = if is_toml {
        parse_toml_config(&content)
    } else {
        parse_yaml_config(&content)
    }
    .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    validate_config(&config)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    Ok(config)
}

/// Parse a YAML configuration document (not validated)
pub fn parse_yaml_config(content: &str) -> Result<QualityGatesConfig> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(content).context("Invalid YAML document")?;

    let block = match document.get(ROOT_KEY) {
        Some(inner) => inner.clone(),
        None if document.is_null() => serde_yaml::Value::Mapping(Default::default()),
        None => document,
    };

    serde_yaml::from_value(block).context("Invalid quality_gates configuration")
}

/// Parse a TOML configuration document (not validated)
pub fn parse_toml_config(content: &str) -> Result<QualityGatesConfig> {
    let mut table: toml::Table = toml::from_str(content).context("Invalid TOML document")?;

    let block = match table.remove(ROOT_KEY) {
        Some(inner) => inner,
        None => toml::Value::Table(table),
    };

    block
        .try_into()
        .context("Invalid quality_gates configuration")
}
