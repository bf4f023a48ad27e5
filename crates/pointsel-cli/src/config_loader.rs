//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use pointsel_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "pointsel.toml";

/// Load layered configuration: defaults, then file, then environment
///
/// An explicit path must exist; the default file is optional.
pub fn load_config(config_path: Option<&Path>) -> Result<LayeredConfig> {
    let config = LayeredConfig::with_defaults();

    let config = match config_path {
        Some(path) => config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.is_file() {
                config
                    .load_from_file(&default_path)
                    .context("Failed to load configuration file")?
            } else {
                config
            }
        }
    };

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides on top
pub fn load_config_with_overrides(
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(config_path)?;
    config.update_from_cli(overrides);
    Ok(config)
}
