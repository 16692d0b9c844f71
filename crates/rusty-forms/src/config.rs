// File: src/config.rs
// Purpose: Validator configuration, loadable from TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration shared by every form validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Class toggled on fields and forms in the error state
    #[serde(default = "default_error_class")]
    pub error_class: String,

    /// Delay between a native reset and re-reading the reset values
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u32,

    /// Erase rule attributes/data from a field once they have been read,
    /// so native validation does not act on them too
    #[serde(default = "default_true")]
    pub strip_declarative_attributes: bool,
}

fn default_error_class() -> String {
    "error".to_string()
}

fn default_reset_delay_ms() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            error_class: default_error_class(),
            reset_delay_ms: default_reset_delay_ms(),
            strip_declarative_attributes: true,
        }
    }
}

impl FormsConfig {
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.reset_delay_ms))
    }

    /// Parse configuration from a TOML document; empty input yields defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(content).context("Failed to parse forms config")
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file: {:?}", path))
    }
}
