//! rusty-forms WASM
//!
//! Browser host for rusty-forms live validation. Implements the validator's
//! document abstraction over `web-sys`, wires field, submit and reset events
//! of every attached form, and re-publishes validator notifications as
//! bubbling custom events (`rustyforms:change`, `rustyforms:validated`).
//!
//! # Example (JavaScript)
//! ```javascript
//! import init, { FormsRuntime } from './rusty_forms_wasm.js';
//!
//! await init();
//! const forms = new FormsRuntime({ error_class: 'is-invalid' });
//! forms.initialize(document.body);
//! document.addEventListener('rustyforms:validated', (e) => console.log(e.target, e.detail.valid));
//! ```

mod browser;
mod config;
mod runtime;

pub use browser::{element_value, BrowserDom, ElementId};
pub use config::BrowserConfig;

use runtime::{Outbox, Runtime, Shared};
use rusty_forms::{FormRegistry, RuleRegistry};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::Element;

/// Set panic hook and log subscriber for better messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    tracing_wasm::set_as_global_default();
}

/// Parse a JavaScript config object; `undefined` and `null` yield defaults
pub fn parse_config(config: JsValue) -> Result<BrowserConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(BrowserConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))
}

fn rules_for(config: &BrowserConfig) -> RuleRegistry {
    if config.extended_rules {
        RuleRegistry::extended()
    } else {
        RuleRegistry::new()
    }
}

/// Live validation for the forms of a document
#[wasm_bindgen]
pub struct FormsRuntime {
    shared: Shared,
    outbox: Outbox,
}

#[wasm_bindgen]
impl FormsRuntime {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<FormsRuntime, JsValue> {
        let config = parse_config(config)?;
        let forms = FormRegistry::with_rules(rules_for(&config), config.forms.clone());

        Ok(Self {
            shared: Rc::new(RefCell::new(Runtime {
                dom: BrowserDom::new(config),
                forms,
                attachments: HashMap::new(),
            })),
            outbox: Rc::new(RefCell::new(Vec::new())),
        })
    }

    /// Attach to every form under `root` with a field declaring a rule.
    /// Safe to call repeatedly; returns the attached forms under `root`.
    pub fn initialize(&self, root: &Element) -> Result<js_sys::Array, JsValue> {
        let (forms, fresh) = {
            let mut runtime = self.shared.borrow_mut();
            let rt = &mut *runtime;
            let root = rt.dom.intern(root);
            let forms = rt.forms.initialize(&mut rt.dom, &root);

            let mut fresh = Vec::new();
            for id in &forms {
                if rt.attachments.contains_key(id) {
                    continue;
                }
                if let Some(validator) = rt.forms.get_mut(id) {
                    let outbox = Rc::clone(&self.outbox);
                    validator.subscribe(move |n| outbox.borrow_mut().push(n.clone()));
                }
                if let Some(element) = rt.dom.element(*id) {
                    fresh.push((*id, element));
                }
            }

            let elements: Vec<Element> = forms.iter().filter_map(|id| rt.dom.element(*id)).collect();
            runtime::compact(rt);
            (elements, fresh)
        };

        for (id, element) in fresh {
            let attachment = runtime::attach(&self.shared, &self.outbox, id, &element)?;
            self.shared.borrow_mut().attachments.insert(id, attachment);
            tracing::debug!(form = ?id, "form listeners attached");
        }

        runtime::flush(&self.shared, &self.outbox);
        Ok(forms.into_iter().map(JsValue::from).collect())
    }

    /// Aggregate validity of an attached form
    #[wasm_bindgen(js_name = isValid)]
    pub fn is_valid(&self, form: &Element) -> Option<bool> {
        let runtime = self.shared.borrow();
        let id = runtime.dom.find(form)?;
        runtime.forms.get(&id).map(|validator| validator.is_valid())
    }

    /// Detach from a form: remove its listeners and forget its state
    pub fn teardown(&self, form: &Element) -> bool {
        // Drop the attachment outside the borrow; its listeners hold the runtime
        let attachment = {
            let mut runtime = self.shared.borrow_mut();
            let Some(id) = runtime.dom.find(form) else {
                return false;
            };
            runtime.forms.teardown(&id);
            runtime::compact(&runtime);
            runtime.attachments.remove(&id)
        };
        attachment.is_some()
    }

    #[wasm_bindgen(js_name = formCount)]
    pub fn form_count(&self) -> usize {
        self.shared.borrow().forms.len()
    }
}

/// Quick single-rule check, e.g. `evaluateRule('pattern', '123', '\\d+')`
#[wasm_bindgen(js_name = evaluateRule)]
pub fn evaluate_rule(name: &str, value: &str, arg: &str) -> bool {
    RuleRegistry::extended().evaluate(name, value, arg)
}
