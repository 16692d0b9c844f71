//! In-memory host document
//!
//! A small element tree implementing [`Dom`] without a browser. It keeps a
//! live value and a default value per field, counts value reads and visible
//! writes, and is what the crate's own tests drive. Headless callers can use
//! it to run the same validation protocol server-side.

use crate::dom::Dom;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

/// Handle of a node in a [`MemoryDom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Container,
    Form,
    Field,
    Submit,
}

#[derive(Debug, Clone)]
struct Node {
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    value: String,
    default_value: String,
    disabled: bool,
}

impl Node {
    fn new(kind: Kind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            classes: BTreeSet::new(),
            value: String::new(),
            default_value: String::new(),
            disabled: false,
        }
    }
}

/// In-memory element tree
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    value_reads: Cell<usize>,
    writes: usize,
}

impl MemoryDom {
    /// Empty document with a single root container
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Kind::Container, None)],
            value_reads: Cell::new(0),
            writes: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn insert(&mut self, kind: Kind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn add_form(&mut self, parent: NodeId) -> NodeId {
        self.insert(Kind::Form, parent)
    }

    pub fn add_field(&mut self, parent: NodeId) -> NodeId {
        self.insert(Kind::Field, parent)
    }

    /// A submit button
    pub fn add_submit(&mut self, parent: NodeId) -> NodeId {
        self.insert(Kind::Submit, parent)
    }

    /// A plain element, e.g. a wrapper or a part of a composite field
    pub fn add_element(&mut self, parent: NodeId) -> NodeId {
        self.insert(Kind::Container, parent)
    }

    /// Detach a node (and its subtree) from its parent
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|child| *child != id);
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        self.node_mut(id)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    /// Change a field's live value the way a user would, without events
    pub fn type_value(&mut self, id: NodeId, value: &str) {
        self.node_mut(id).value = value.to_string();
    }

    /// Set both the default and the live value of a field
    pub fn set_default_value(&mut self, id: NodeId, value: &str) {
        let node = self.node_mut(id);
        node.default_value = value.to_string();
        node.value = value.to_string();
    }

    /// What the host does on a native form reset: restore default values
    pub fn native_reset(&mut self, form: NodeId) {
        for field in self.fields_within(&form) {
            let node = self.node_mut(field);
            node.value = node.default_value.clone();
        }
    }

    pub fn set_node_disabled(&mut self, id: NodeId, disabled: bool) {
        self.node_mut(id).disabled = disabled;
    }

    pub fn node_disabled(&self, id: NodeId) -> bool {
        self.node(id).disabled
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.node(id).classes.contains(class)
    }

    /// Number of live value reads so far
    pub fn value_reads(&self) -> usize {
        self.value_reads.get()
    }

    /// Number of class and disabled-state writes so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn descendants(&self, scope: NodeId, kind: Kind, out: &mut Vec<NodeId>) {
        for &child in &self.node(scope).children {
            if self.node(child).kind == kind {
                out.push(child);
            }
            self.descendants(child, kind, out);
        }
    }

    fn ancestor_or_self(&self, id: NodeId, kind: Kind) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.node(node).kind == kind {
                return Some(node);
            }
            current = self.node(node).parent;
        }
        None
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn value(&self, field: &NodeId) -> String {
        self.value_reads.set(self.value_reads.get() + 1);
        self.node(*field).value.clone()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.node(*node).attributes.get(name).cloned()
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        self.node_mut(*node).attributes.remove(name);
    }

    fn is_disabled(&self, node: &NodeId) -> bool {
        self.node(*node).disabled
    }

    fn set_disabled(&mut self, node: &NodeId, disabled: bool) {
        self.writes += 1;
        self.node_mut(*node).disabled = disabled;
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        self.writes += 1;
        self.node_mut(*node).classes.insert(class.to_string());
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        self.writes += 1;
        self.node_mut(*node).classes.remove(class);
    }

    fn fields_within(&self, scope: &NodeId) -> Vec<NodeId> {
        let mut fields = Vec::new();
        self.descendants(*scope, Kind::Field, &mut fields);
        fields
    }

    fn submit_controls(&self, form: &NodeId) -> Vec<NodeId> {
        let mut controls = Vec::new();
        self.descendants(*form, Kind::Submit, &mut controls);
        controls
    }

    fn closest_field(&self, target: &NodeId) -> Option<NodeId> {
        self.ancestor_or_self(*target, Kind::Field)
    }

    fn form_of(&self, node: &NodeId) -> Option<NodeId> {
        self.ancestor_or_self(*node, Kind::Form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_queries() {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let form = dom.add_form(root);
        let wrapper = dom.add_element(form);
        let a = dom.add_field(wrapper);
        let part = dom.add_element(a);
        let b = dom.add_field(form);
        let submit = dom.add_submit(form);

        assert_eq!(dom.fields_within(&form), vec![a, b]);
        assert_eq!(dom.fields_within(&root), vec![a, b]);
        assert_eq!(dom.submit_controls(&form), vec![submit]);
        assert_eq!(dom.closest_field(&part), Some(a));
        assert_eq!(dom.closest_field(&wrapper), None);
        assert_eq!(dom.form_of(&a), Some(form));

        dom.remove(wrapper);
        assert_eq!(dom.fields_within(&form), vec![b]);
    }

    #[test]
    fn test_counters_and_reset() {
        let mut dom = MemoryDom::new();
        let form = dom.add_form(dom.root());
        let field = dom.add_field(form);
        dom.set_default_value(field, "seed");
        dom.type_value(field, "typed");

        assert_eq!(dom.value(&field), "typed");
        assert_eq!(dom.value_reads(), 1);

        dom.native_reset(form);
        assert_eq!(dom.value(&field), "seed");

        dom.add_class(&field, "error");
        assert!(dom.has_class(field, "error"));
        assert_eq!(dom.writes(), 1);
    }

    #[test]
    fn test_data_maps_to_data_attribute() {
        let mut dom = MemoryDom::new();
        let field = dom.add_field(dom.root());
        dom.set_attribute(field, "data-required", "false");
        assert_eq!(dom.data(&field, "required").as_deref(), Some("false"));
        dom.remove_data(&field, "required");
        assert_eq!(dom.attribute(&field, "data-required"), None);
    }
}
