// File: src/dom.rs
// Purpose: Host document abstraction used by the validator

use std::fmt::Debug;
use std::hash::Hash;

/// The host document as seen by the validator
///
/// `Node` is an opaque identity for an element. Reads take `&self`; writes
/// that change what the user sees take `&mut self`. [`Dom::value`] is treated
/// as the expensive call: the change detector avoids it for keystrokes that
/// cannot alter a value.
pub trait Dom {
    type Node: Clone + Eq + Hash + Debug;

    /// Live value of a field
    fn value(&self, field: &Self::Node) -> String;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// Auxiliary data stored under `key`, by default the `data-<key>` attribute
    fn data(&self, node: &Self::Node, key: &str) -> Option<String> {
        self.attribute(node, &format!("data-{}", key))
    }

    fn remove_data(&mut self, node: &Self::Node, key: &str) {
        self.remove_attribute(node, &format!("data-{}", key));
    }

    fn is_disabled(&self, node: &Self::Node) -> bool;

    fn set_disabled(&mut self, node: &Self::Node, disabled: bool);

    fn add_class(&mut self, node: &Self::Node, class: &str);

    fn remove_class(&mut self, node: &Self::Node, class: &str);

    /// Validatable fields under `scope`, in document order
    fn fields_within(&self, scope: &Self::Node) -> Vec<Self::Node>;

    /// Controls whose disabled state mirrors the form's validity
    fn submit_controls(&self, form: &Self::Node) -> Vec<Self::Node>;

    /// Nearest validatable field at or above an event target
    fn closest_field(&self, target: &Self::Node) -> Option<Self::Node>;

    /// Form owning a field
    fn form_of(&self, node: &Self::Node) -> Option<Self::Node>;
}
