//! rusty-forms Validation Rules
//!
//! Named validation predicates applied to a field's raw string value and the
//! per-field argument configured for that rule. Used by the `rusty-forms`
//! form validator on the client and usable on its own on the server.
//!
//! ```rust
//! use rusty_forms_validation::RuleRegistry;
//!
//! let registry = RuleRegistry::new();
//! assert!(!registry.evaluate("required", "", "true"));
//! assert!(registry.evaluate("required", "", "false"));
//! assert!(registry.evaluate("pattern", "123", r"^\d+$"));
//! ```

pub mod error;
pub mod registry;
pub mod rules;

pub use error::RuleError;
pub use registry::{CompiledRule, Predicate, RuleFactory, RuleRegistry, RuleSet};
pub use rules::*;
