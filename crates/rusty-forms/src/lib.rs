//! # rusty-forms
//!
//! Live form validation for interactive documents. Each form gets a
//! [`FormValidator`] that caches one [`FieldRecord`] per field, re-reads a
//! field's value only when an event could have changed it, re-runs rules only
//! for fields whose value actually changed, and touches the document only
//! when a field's or the form's validity flips.
//!
//! The crate does not know about browsers. The host document is reached
//! through the [`Dom`] trait; `rusty-forms-wasm` implements it over `web-sys`
//! and [`MemoryDom`] implements it in memory.
//!
//! ## Quick Start
//!
//! ```rust
//! use rusty_forms::{FieldEvent, FormRegistry, MemoryDom};
//!
//! let mut dom = MemoryDom::new();
//! let root = dom.root();
//! let form = dom.add_form(root);
//! let name = dom.add_field(form);
//! dom.set_attribute(name, "required", "");
//! let submit = dom.add_submit(form);
//!
//! let mut forms = FormRegistry::new();
//! assert_eq!(forms.initialize(&mut dom, &root), vec![form]);
//! assert!(dom.node_disabled(submit));
//!
//! dom.type_value(name, "Ada");
//! forms.dispatch(&mut dom, &name, FieldEvent::Change);
//! assert!(!dom.node_disabled(submit));
//! ```
//!
//! ## Architecture
//!
//! - **`field`** - Field State Cache: lazy [`FieldRecord`] creation and rule extraction
//! - **`change`** - Change Detector: event relevance, value comparison, touched tracking
//! - **`form`** - Form Validator: memoized passes, markers, aggregate validity
//! - **`forms`** - Form Registry: discovery under a root and event dispatch
//! - **`events`** - notifications delivered to subscribers
//!
//! Rules themselves live in [`rusty_forms_validation`], re-exported here as
//! [`validation`].

#![doc(html_root_url = "https://docs.rs/rusty-forms/0.1.0")]

pub mod change;
pub mod config;
pub mod dom;
pub mod events;
pub mod field;
pub mod form;
pub mod forms;
pub mod memory;

pub use rusty_forms_validation as validation;
pub use rusty_forms_validation::{RuleError, RuleRegistry, RuleSet};

pub use change::{is_non_updating_key, Detection, FieldEvent};
pub use config::FormsConfig;
pub use dom::Dom;
pub use events::{Notification, SubscriptionId};
pub use field::{FieldCache, FieldRecord};
pub use form::{FormValidator, Pass, Submission};
pub use forms::FormRegistry;
pub use memory::{MemoryDom, NodeId};
