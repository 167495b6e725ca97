//! Engine and logging configuration
//!
//! `EngineConfig` is loaded from an optional YAML file; every field has a
//! default so an empty file (or no file) yields the stock policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunable policy of the transfer engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Opening balance of an account auto-provisioned for a sender
    pub starter_balance: Decimal,

    /// Transfers strictly above this amount are held for review
    pub fraud_threshold: Decimal,

    /// Category recorded when a transfer names none
    pub default_category: String,

    /// Institution name on auto-provisioned accounts
    pub bank_name: String,

    /// Prefix of generated account numbers
    pub account_number_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starter_balance: Decimal::new(10_000, 0),
            fraud_threshold: Decimal::new(5_000, 0),
            default_category: "Transfer".to_string(),
            bank_name: "NeoBank".to_string(),
            account_number_prefix: "NB".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML file
    ///
    /// # Returns
    ///
    /// * `Ok(EngineConfig)` with missing fields defaulted
    /// * `Err(String)` if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
        Self::from_yaml(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Logging output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}
