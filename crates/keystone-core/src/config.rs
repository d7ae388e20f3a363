//! Broker configuration
//!
//! Loaded from a TOML file, then overlaid with `KEYSTONE_*` environment
//! variables, then validated. Every field has a default so an empty file (or
//! no file) is a valid configuration.

use crate::errors::{KeystoneError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default challenge time-to-live
pub const DEFAULT_CHALLENGE_TTL_MS: u64 = 60_000;
/// Default agent credential lifetime
pub const DEFAULT_AGENT_TOKEN_TTL_SECS: u64 = 3600;
/// Default authz credential lifetime
pub const DEFAULT_AUTHZ_TOKEN_TTL_SECS: u64 = 3600;
/// Key-type marker required on enrolled public keys
pub const DEFAULT_PUBLIC_KEY_PREFIX: &str = "ssh-ed25519 ";

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "KEYSTONE_";

/// Top-level broker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoneConfig {
    /// `iss` claim of issued credentials
    pub issuer: String,
    /// Root directory of the filesystem store
    pub storage_path: PathBuf,
    /// Identities with admin standing
    pub admins: Vec<String>,
    /// Challenge time-to-live in milliseconds
    pub challenge_ttl_ms: u64,
    /// Agent credential lifetime in seconds
    pub agent_token_ttl_secs: u64,
    /// Authz credential lifetime in seconds for `once` and `always` grants
    pub authz_token_ttl_secs: u64,
    /// Key-type marker required on enrolled public keys
    pub public_key_prefix: String,
}

impl Default for KeystoneConfig {
    fn default() -> Self {
        Self {
            issuer: "keystone".to_string(),
            storage_path: PathBuf::from("./.keystone"),
            admins: Vec::new(),
            challenge_ttl_ms: DEFAULT_CHALLENGE_TTL_MS,
            agent_token_ttl_secs: DEFAULT_AGENT_TOKEN_TTL_SECS,
            authz_token_ttl_secs: DEFAULT_AUTHZ_TOKEN_TTL_SECS,
            public_key_prefix: DEFAULT_PUBLIC_KEY_PREFIX.to_string(),
        }
    }
}

impl KeystoneConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| KeystoneError::config(format!("invalid TOML: {e}")))
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeystoneError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the file if it exists (defaults otherwise), merge the process
    /// environment, and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            Self::default()
        };
        config.merge_with_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from an environment lookup
    pub fn merge_with_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(issuer) = var("ISSUER") {
            self.issuer = issuer;
        }
        if let Some(path) = var("STORAGE_PATH") {
            self.storage_path = PathBuf::from(path);
        }
        if let Some(admins) = var("ADMINS") {
            self.admins = admins
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(ttl) = var("CHALLENGE_TTL_MS") {
            self.challenge_ttl_ms = parse_u64("CHALLENGE_TTL_MS", &ttl)?;
        }
        if let Some(ttl) = var("AGENT_TOKEN_TTL_SECS") {
            self.agent_token_ttl_secs = parse_u64("AGENT_TOKEN_TTL_SECS", &ttl)?;
        }
        if let Some(ttl) = var("AUTHZ_TOKEN_TTL_SECS") {
            self.authz_token_ttl_secs = parse_u64("AUTHZ_TOKEN_TTL_SECS", &ttl)?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.issuer.trim().is_empty() {
            return Err(KeystoneError::config("issuer must not be empty"));
        }
        if self.challenge_ttl_ms == 0 {
            return Err(KeystoneError::config("challenge_ttl_ms must be positive"));
        }
        if self.agent_token_ttl_secs == 0 || self.authz_token_ttl_secs == 0 {
            return Err(KeystoneError::config("token lifetimes must be positive"));
        }
        if self.public_key_prefix.is_empty() {
            return Err(KeystoneError::config("public_key_prefix must not be empty"));
        }
        Ok(())
    }
}

fn parse_u64(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| KeystoneError::config(format!("{ENV_PREFIX}{name} is not a number: {value}")))
}
