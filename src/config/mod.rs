//! Configuration loading and management
//!
//! Options recognised by the form layer. They are installed process-wide
//! with [`configure`]. Only `debug` changes behaviour today: it raises the
//! per-request pipeline diagnostic from `debug` to `info` level. The other
//! options are recorded for integrations that implement flash messages and
//! view-layer field persistence.

use crate::core::error::FormError;
use serde::{Deserialize, Serialize};
use std::sync::{OnceLock, PoisonError, RwLock};

/// Options of the form layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Expose validation errors as flash messages
    pub flash_errors: bool,

    /// Expose submitted fields to the view layer
    pub persist_fields_as_locals: bool,

    /// Log every pipeline run at `info` level
    pub debug: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            flash_errors: false,
            persist_fields_as_locals: true,
            debug: false,
        }
    }
}

impl FormConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, FormError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, FormError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

fn global() -> &'static RwLock<FormConfig> {
    static CONFIG: OnceLock<RwLock<FormConfig>> = OnceLock::new();
    CONFIG.get_or_init(|| RwLock::new(FormConfig::default()))
}

/// Install the process-wide configuration, returning the previous one
pub fn configure(options: FormConfig) -> FormConfig {
    let mut guard = global().write().unwrap_or_else(PoisonError::into_inner);
    tracing::debug!(?options, "Form configuration updated");
    std::mem::replace(&mut *guard, options)
}

/// The process-wide configuration
pub fn current_config() -> FormConfig {
    *global().read().unwrap_or_else(PoisonError::into_inner)
}
