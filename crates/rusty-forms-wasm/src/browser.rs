//! `Dom` implementation over the browser document
//!
//! DOM elements cannot be hashed, so every element the validator sees is
//! interned and referred to by an [`ElementId`] afterwards. Ids live in a
//! `WeakMap` keyed by the element, so an element keeps its id for its whole
//! lifetime while only the elements still in use are held strongly.

use crate::config::BrowserConfig;
use js_sys::{Object, WeakMap};
use rusty_forms::Dom;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, NodeList};

/// Handle of an interned element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u32);

pub struct BrowserDom {
    config: BrowserConfig,
    ids: WeakMap,
    next_id: Cell<u32>,
    elements: RefCell<HashMap<ElementId, Element>>,
}

impl BrowserDom {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            ids: WeakMap::new(),
            next_id: Cell::new(0),
            elements: RefCell::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Id of `element`, assigning one on first sight
    pub fn intern(&self, element: &Element) -> ElementId {
        let id = self.find(element).unwrap_or_else(|| {
            let id = ElementId(self.next_id.get());
            self.next_id.set(id.0 + 1);
            self.ids.set(element.unchecked_ref::<Object>(), &JsValue::from(id.0));
            id
        });
        self.elements
            .borrow_mut()
            .entry(id)
            .or_insert_with(|| element.clone());
        id
    }

    /// Id of `element` if it was ever interned
    pub fn find(&self, element: &Element) -> Option<ElementId> {
        self.ids
            .get(element.unchecked_ref::<Object>())
            .as_f64()
            .map(|id| ElementId(id as u32))
    }

    /// Element behind `id`, unless it was released
    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.elements.borrow().get(&id).cloned()
    }

    /// Release every element not in `live`. A released element gets its old
    /// id back if it is interned again.
    pub fn retain(&self, live: &HashSet<ElementId>) -> usize {
        let mut elements = self.elements.borrow_mut();
        let before = elements.len();
        elements.retain(|id, _| live.contains(id));
        before - elements.len()
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    fn query_all(&self, scope: &ElementId, selector: &str) -> Vec<ElementId> {
        let Some(scope) = self.element(*scope) else {
            return Vec::new();
        };
        match scope.query_selector_all(selector) {
            Ok(list) => self.intern_list(&list),
            Err(err) => {
                tracing::warn!(selector, error = ?err, "selector rejected by the document");
                Vec::new()
            }
        }
    }

    fn intern_list(&self, list: &NodeList) -> Vec<ElementId> {
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.intern(&element))
            .collect()
    }

    fn closest(&self, node: &ElementId, selector: &str) -> Option<ElementId> {
        let element = self.element(*node)?;
        match element.closest(selector) {
            Ok(found) => found.map(|found| self.intern(&found)),
            Err(err) => {
                tracing::warn!(selector, error = ?err, "selector rejected by the document");
                None
            }
        }
    }
}

/// Live value of a form control; `value` attribute for anything else
pub fn element_value(element: &Element) -> String {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.value()
    } else if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
        textarea.value()
    } else {
        element.get_attribute("value").unwrap_or_default()
    }
}

impl Dom for BrowserDom {
    type Node = ElementId;

    fn value(&self, field: &ElementId) -> String {
        self.element(*field)
            .map(|element| element_value(&element))
            .unwrap_or_default()
    }

    fn attribute(&self, node: &ElementId, name: &str) -> Option<String> {
        self.element(*node)?.get_attribute(name)
    }

    fn remove_attribute(&mut self, node: &ElementId, name: &str) {
        if let Some(element) = self.element(*node) {
            if let Err(err) = element.remove_attribute(name) {
                tracing::warn!(name, error = ?err, "failed to remove attribute");
            }
        }
    }

    fn is_disabled(&self, node: &ElementId) -> bool {
        self.element(*node)
            .and_then(|element| element.matches(":disabled").ok())
            .unwrap_or(false)
    }

    fn set_disabled(&mut self, node: &ElementId, disabled: bool) {
        if let Some(element) = self.element(*node) {
            if let Err(err) = element.toggle_attribute_with_force("disabled", disabled) {
                tracing::warn!(error = ?err, "failed to toggle disabled");
            }
        }
    }

    fn add_class(&mut self, node: &ElementId, class: &str) {
        if let Some(element) = self.element(*node) {
            if let Err(err) = element.class_list().add_1(class) {
                tracing::warn!(class, error = ?err, "failed to add class");
            }
        }
    }

    fn remove_class(&mut self, node: &ElementId, class: &str) {
        if let Some(element) = self.element(*node) {
            if let Err(err) = element.class_list().remove_1(class) {
                tracing::warn!(class, error = ?err, "failed to remove class");
            }
        }
    }

    fn fields_within(&self, scope: &ElementId) -> Vec<ElementId> {
        self.query_all(scope, &self.config.field_selector)
    }

    fn submit_controls(&self, form: &ElementId) -> Vec<ElementId> {
        self.query_all(form, &self.config.submit_selector)
    }

    fn closest_field(&self, target: &ElementId) -> Option<ElementId> {
        self.closest(target, &self.config.field_selector)
    }

    fn form_of(&self, node: &ElementId) -> Option<ElementId> {
        self.closest(node, "form")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn element(tag: &str) -> Element {
        web_sys::window()
            .and_then(|window| window.document())
            .unwrap()
            .create_element(tag)
            .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_released_element_keeps_its_id() {
        let dom = BrowserDom::new(BrowserConfig::default());
        let (form, field) = (element("form"), element("input"));
        let form_id = dom.intern(&form);
        let field_id = dom.intern(&field);
        assert_ne!(form_id, field_id);
        assert_eq!(dom.intern(&form), form_id);
        assert_eq!(dom.len(), 2);

        assert_eq!(dom.retain(&HashSet::from([form_id])), 1);
        assert!(dom.element(field_id).is_none());
        assert_eq!(dom.find(&field), Some(field_id));

        assert_eq!(dom.intern(&field), field_id);
        assert!(dom.element(field_id).is_some());
    }

    #[wasm_bindgen_test]
    fn test_button_inputs_are_not_fields() {
        let dom = BrowserDom::new(BrowserConfig::default());
        let form = element("form");
        for kind in ["text", "button", "submit", "reset"] {
            let input = element("input");
            input.set_attribute("type", kind).unwrap();
            form.append_child(&input).unwrap();
        }
        form.append_child(&element("textarea")).unwrap();

        let form_id = dom.intern(&form);
        let kinds: Vec<Option<String>> = dom
            .fields_within(&form_id)
            .iter()
            .map(|id| dom.attribute(id, "type"))
            .collect();
        assert_eq!(kinds, vec![Some("text".to_string()), None]);
    }
}
