//! Configuration loading for the CLI

use anyhow::{Context, Result};
use keystone_core::KeystoneConfig;
use std::path::Path;

/// Load the config file if present, then apply environment overrides
pub fn load_config(path: &Path) -> Result<KeystoneConfig> {
    let config = KeystoneConfig::load(path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    tracing::debug!(path = %path.display(), storage = %config.storage_path.display(), "configuration loaded");
    Ok(config)
}
