//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{FormError, Result};

/// Settings shared by every form the engine mounts.
///
/// # Example JSON
///
/// ```text
/// {
///   "columns": 3,
///   "baseUrl": "https://erp.example/api/",
///   "optionRequestFlag": "optionsOnly",
///   "requestTimeoutSecs": 10
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormConfig {
    /// Fields per row when the schema does not say otherwise
    pub columns: usize,

    /// Body key sent as `true` with option list requests
    pub option_request_flag: String,

    /// Base URL relative `dataUrl`s are joined onto
    pub base_url: Option<String>,

    /// Per-request timeout; 0 disables it
    pub request_timeout_secs: u64,

    /// Whether fetched option lists are reused across mounts and sibling forms
    pub share_option_cache: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        FormConfig {
            columns: 2,
            option_request_flag: "optionsOnly".to_string(),
            base_url: None,
            request_timeout_secs: 30,
            share_option_cache: true,
        }
    }
}

impl FormConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FormConfig =
            serde_json::from_str(json).map_err(|e| FormError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FormError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.columns == 0 {
            return Err(FormError::Config("columns must be at least 1".to_string()));
        }
        if self.option_request_flag.trim().is_empty() {
            return Err(FormError::Config(
                "optionRequestFlag must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
