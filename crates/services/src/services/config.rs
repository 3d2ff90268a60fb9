//! Kernel settings: tax rate, project number prefix and delete policy.
//!
//! Values come from an optional TOML file and are then overridden by
//! `KERNEL_*` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

pub const ENV_TAX_RATE_BP: &str = "KERNEL_TAX_RATE_BP";
pub const ENV_PROJECT_NUMBER_PREFIX: &str = "KERNEL_PROJECT_NUMBER_PREFIX";
pub const ENV_DELETE_POLICY: &str = "KERNEL_DELETE_POLICY";

/// What happens to child records when a project is deleted
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeletePolicy {
    /// Refuse while any child record points at the project
    #[default]
    Restrict,
    /// Delete the children first, then the project
    Cascade,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
pub struct KernelConfig {
    /// Consumption tax in basis points (1000 = 10%)
    pub tax_rate_bp: u32,
    pub project_number_prefix: String,
    pub delete_policy: DeletePolicy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tax_rate_bp: 1000,
            project_number_prefix: "YS".to_string(),
            delete_policy: DeletePolicy::Restrict,
        }
    }
}

impl KernelConfig {
    pub const MAX_TAX_RATE_BP: u32 = 10_000;

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        info!(path = %path.display(), "Loaded kernel configuration");
        Ok(config)
    }

    /// Build from an optional file plus the process environment
    pub fn from_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        base.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `KERNEL_*` overrides looked up through `lookup`
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_TAX_RATE_BP) {
            self.tax_rate_bp = raw.trim().parse().map_err(|_| invalid(ENV_TAX_RATE_BP, &raw))?;
            warn!(tax_rate_bp = self.tax_rate_bp, "Tax rate overridden from environment");
        }
        if let Some(raw) = lookup(ENV_PROJECT_NUMBER_PREFIX) {
            self.project_number_prefix = raw.trim().to_string();
            warn!(
                prefix = %self.project_number_prefix,
                "Project number prefix overridden from environment"
            );
        }
        if let Some(raw) = lookup(ENV_DELETE_POLICY) {
            self.delete_policy = raw
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_DELETE_POLICY, &raw))?;
            warn!(policy = %self.delete_policy, "Delete policy overridden from environment");
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tax_rate_bp > Self::MAX_TAX_RATE_BP {
            return Err(invalid("tax_rate_bp", &self.tax_rate_bp.to_string()));
        }
        let prefix = &self.project_number_prefix;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(invalid("project_number_prefix", prefix));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}
