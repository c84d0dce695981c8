//! Enforcer configuration
//!
//! Environment variables:
//! - `POLICY_FILE` - path to the operator override file (YAML or JSON)
//! - `POLICY_ENFORCE_NEW_DEFAULTS` - ignore overrides of deprecated rules (default: false)

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_POLICY_FILE: &str = "POLICY_FILE";
pub const ENV_ENFORCE_NEW_DEFAULTS: &str = "POLICY_ENFORCE_NEW_DEFAULTS";

/// Enforcer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcerConfig {
    /// Evaluate only the new defaults of deprecated rules; legacy overrides are not merged
    #[serde(default)]
    pub enforce_new_defaults: bool,

    /// Operator override file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_file: Option<PathBuf>,
}

impl EnforcerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enforce_new_defaults = match lookup(ENV_ENFORCE_NEW_DEFAULTS) {
            Some(value) => parse_bool(ENV_ENFORCE_NEW_DEFAULTS, &value)?,
            None => false,
        };

        let policy_file = lookup(ENV_POLICY_FILE)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            enforce_new_defaults,
            policy_file,
        })
    }

    pub fn with_enforce_new_defaults(mut self, enabled: bool) -> Self {
        self.enforce_new_defaults = enabled;
        self
    }

    pub fn with_policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_file = Some(path.into());
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PolicyError::Config(format!(
            "{} must be a boolean, got `{}`",
            key, other
        ))),
    }
}
