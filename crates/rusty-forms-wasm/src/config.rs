// File: src/config.rs
// Purpose: Browser-side configuration passed in from JavaScript

use rusty_forms::FormsConfig;
use serde::{Deserialize, Serialize};

/// Configuration accepted by `new FormsRuntime(config)`
///
/// Validator settings (`error_class`, `reset_delay_ms`,
/// `strip_declarative_attributes`) sit at the top level next to the
/// browser-only ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(flatten)]
    pub forms: FormsConfig,

    /// Elements validated as fields
    #[serde(default = "default_field_selector")]
    pub field_selector: String,

    /// Controls disabled while the form is invalid
    #[serde(default = "default_submit_selector")]
    pub submit_selector: String,

    /// Prefix of the custom events dispatched on fields and forms
    #[serde(default = "default_event_prefix")]
    pub event_prefix: String,

    /// Also register `minlength`, `maxlength` and `email`
    #[serde(default)]
    pub extended_rules: bool,
}

fn default_field_selector() -> String {
    "input:not([type=submit]):not([type=reset]):not([type=button]),select,textarea".to_string()
}

fn default_submit_selector() -> String {
    "button,input[type=submit]".to_string()
}

fn default_event_prefix() -> String {
    "rustyforms".to_string()
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            forms: FormsConfig::default(),
            field_selector: default_field_selector(),
            submit_selector: default_submit_selector(),
            event_prefix: default_event_prefix(),
            extended_rules: false,
        }
    }
}

impl BrowserConfig {
    /// Name of a dispatched custom event, e.g. `rustyforms:validated`
    pub fn event_name(&self, kind: &str) -> String {
        format!("{}:{}", self.event_prefix, kind)
    }
}
