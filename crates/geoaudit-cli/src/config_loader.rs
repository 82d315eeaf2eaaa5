//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use geoaudit_core::config::{CliConfigOverrides, LayeredConfig, DEFAULT_CONFIG_FILE};
use std::path::Path;

/// Load layered configuration: defaults, then the config file, then
/// environment variables.
///
/// An explicit `config_path` must exist; the default file is optional.
pub fn load_config(config_path: Option<&Path>) -> Result<LayeredConfig> {
    let config = match config_path {
        Some(path) => LayeredConfig::with_defaults()
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?,
        None => LayeredConfig::with_defaults()
            .load_from_optional_file(DEFAULT_CONFIG_FILE)
            .context("Failed to load configuration file")?,
    };

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides
pub fn load_config_with_overrides(
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(config_path)?;
    config.update_from_cli(overrides)?;
    Ok(config)
}
