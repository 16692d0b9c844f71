// File: src/field.rs
// Purpose: Per-field state cache with one-time rule extraction

use crate::config::FormsConfig;
use crate::dom::Dom;
use rusty_forms_validation::{RuleRegistry, RuleSet};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Cached state of one validatable field
///
/// `valid` is only meaningful while `validated` is set: any write of a
/// different value clears `validated` before validity is read again.
#[derive(Debug, Clone)]
pub struct FieldRecord {
    value: String,
    rules: RuleSet,
    processed: bool,
    touched: bool,
    validated: bool,
    valid: Option<bool>,
    error_marked: bool,
}

/// Outcome of asking a record for its validity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Validity {
    /// Cached result reused, no rule ran
    Cached(bool),
    /// Rules evaluated against the current value
    Fresh { valid: bool, previous: Option<bool> },
}

impl Validity {
    pub(crate) fn valid(self) -> bool {
        match self {
            Validity::Cached(valid) | Validity::Fresh { valid, .. } => valid,
        }
    }
}

impl FieldRecord {
    fn new(value: String) -> Self {
        Self {
            value,
            rules: RuleSet::default(),
            processed: false,
            touched: false,
            validated: false,
            valid: None,
            error_marked: false,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Rule configuration has been extracted from the field
    pub fn processed(&self) -> bool {
        self.processed
    }

    pub fn touched(&self) -> bool {
        self.touched
    }

    pub fn validated(&self) -> bool {
        self.validated
    }

    /// Result of the last validation, `None` before the first one
    pub fn valid(&self) -> Option<bool> {
        self.valid
    }

    pub fn error_marked(&self) -> bool {
        self.error_marked
    }

    /// Store a freshly read value. Returns the previous value when it
    /// differs, marking the cached validity stale.
    pub(crate) fn store_value(&mut self, value: String) -> Option<String> {
        if self.value == value {
            return None;
        }
        self.validated = false;
        Some(std::mem::replace(&mut self.value, value))
    }

    /// Returns true the first time the field is touched
    pub(crate) fn touch(&mut self) -> bool {
        !std::mem::replace(&mut self.touched, true)
    }

    pub(crate) fn validate(&mut self) -> Validity {
        if self.validated {
            if let Some(valid) = self.valid {
                return Validity::Cached(valid);
            }
        }

        let valid = self.rules.evaluate(&self.value);
        let previous = self.valid.replace(valid);
        self.validated = true;
        Validity::Fresh { valid, previous }
    }

    /// Flip the error marker when the state calls for it. Untouched fields
    /// are never marked; returns the new marker state when it changed.
    pub(crate) fn marker_transition(&mut self, valid: bool) -> Option<bool> {
        let mark = if self.touched && !valid && !self.error_marked {
            true
        } else if valid && self.error_marked {
            false
        } else {
            return None;
        };
        self.error_marked = mark;
        Some(mark)
    }

    /// Forget interaction and validation state, keeping the rules
    pub(crate) fn clear(&mut self, value: String) {
        self.value = value;
        self.touched = false;
        self.validated = false;
        self.valid = None;
        self.error_marked = false;
    }
}

/// Field records of one form, keyed by field identity
#[derive(Debug, Clone)]
pub struct FieldCache<N> {
    records: HashMap<N, FieldRecord>,
}

impl<N: Clone + Eq + Hash + Debug> FieldCache<N> {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    pub fn get(&self, field: &N) -> Option<&FieldRecord> {
        self.records.get(field)
    }

    /// Record for `field`, created on first observation.
    ///
    /// Creation reads the live value and extracts the rule configuration,
    /// preferring attributes over auxiliary data. Extraction happens once
    /// per record; the `processed` flag, not the absence of attributes,
    /// marks it as done. Returns whether the record was just created.
    pub fn ensure<D>(
        &mut self,
        dom: &mut D,
        registry: &RuleRegistry,
        config: &FormsConfig,
        field: &N,
    ) -> (&mut FieldRecord, bool)
    where
        D: Dom<Node = N>,
    {
        let created = !self.records.contains_key(field);
        let record = self
            .records
            .entry(field.clone())
            .or_insert_with(|| FieldRecord::new(dom.value(field)));

        if !record.processed {
            record.rules = extract_rules(dom, registry, config, field);
            record.processed = true;
            tracing::trace!(field = ?field, rules = record.rules.len(), "field rules extracted");
        }

        (record, created)
    }

    /// Drop records whose field is not in `present`
    pub fn retain_present(&mut self, present: &[N]) -> usize {
        let before = self.records.len();
        self.records.retain(|field, _| present.contains(field));
        before - self.records.len()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&N, &mut FieldRecord)> {
        self.records.iter_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&N, &FieldRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<N: Clone + Eq + Hash + Debug> Default for FieldCache<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read every registered rule's argument off a field
fn extract_rules<D: Dom>(
    dom: &mut D,
    registry: &RuleRegistry,
    config: &FormsConfig,
    field: &D::Node,
) -> RuleSet {
    let mut found: Vec<(&str, String)> = Vec::new();

    for name in registry.names() {
        let attribute = dom.attribute(field, name);
        let data = dom.data(field, name);

        if config.strip_declarative_attributes {
            if attribute.is_some() {
                dom.remove_attribute(field, name);
            }
            if data.is_some() {
                dom.remove_data(field, name);
            }
        }

        if let Some(arg) = attribute.or(data) {
            found.push((name, arg));
        }
    }

    registry.compile_set(found.iter().map(|(name, arg)| (*name, arg.as_str())))
}

/// True when a field declares any registered rule
pub(crate) fn declares_rules<D: Dom>(dom: &D, registry: &RuleRegistry, field: &D::Node) -> bool {
    registry
        .names()
        .any(|name| dom.attribute(field, name).is_some() || dom.data(field, name).is_some())
}
