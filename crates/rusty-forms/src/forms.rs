// File: src/forms.rs
// Purpose: Discovery of validatable forms and event routing to their validators

use crate::change::{Detection, FieldEvent};
use crate::config::FormsConfig;
use crate::dom::Dom;
use crate::field::{declares_rules, FieldCache};
use crate::form::{FormValidator, Pass, Submission};
use rusty_forms_validation::RuleRegistry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// One [`FormValidator`] per form, keyed by form identity
///
/// Field records of torn down forms are kept: their declarations may have
/// been stripped from the document, so a later `initialize` reuses them.
#[derive(Debug)]
pub struct FormRegistry<N> {
    rules: Arc<RuleRegistry>,
    config: Arc<FormsConfig>,
    forms: HashMap<N, FormValidator<N>>,
    detached: HashMap<N, FieldCache<N>>,
}

impl<N: Clone + Eq + Hash + Debug> FormRegistry<N> {
    /// Registry with the default rules and configuration
    pub fn new() -> Self {
        Self::with_rules(RuleRegistry::new(), FormsConfig::default())
    }

    pub fn with_rules(rules: RuleRegistry, config: FormsConfig) -> Self {
        Self {
            rules: Arc::new(rules),
            config: Arc::new(config),
            forms: HashMap::new(),
            detached: HashMap::new(),
        }
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn config(&self) -> &FormsConfig {
        &self.config
    }

    /// Attach a validator to every form under `root` that has a field
    /// declaring a registered rule.
    ///
    /// Forms that already have a validator are left alone, so calling this
    /// again is a no-op for them. Returns every form under `root` that has
    /// a validator after the call, in document order.
    pub fn initialize<D>(&mut self, dom: &mut D, root: &N) -> Vec<N>
    where
        D: Dom<Node = N>,
    {
        let mut found: Vec<N> = Vec::new();

        for field in dom.fields_within(root) {
            let Some(form) = dom.form_of(&field) else {
                continue;
            };
            if found.contains(&form) {
                continue;
            }
            if self.forms.contains_key(&form)
                || self.detached.contains_key(&form)
                || declares_rules(&*dom, &self.rules, &field)
            {
                found.push(form);
            }
        }

        for form in &found {
            if self.forms.contains_key(form) {
                continue;
            }
            let (rules, config) = (Arc::clone(&self.rules), Arc::clone(&self.config));
            let validator = match self.detached.remove(form) {
                Some(fields) => FormValidator::reattach(dom, form.clone(), rules, config, fields),
                None => FormValidator::attach(dom, form.clone(), rules, config),
            };
            self.forms.insert(form.clone(), validator);
        }

        tracing::debug!(forms = found.len(), attached = self.forms.len(), "forms initialized");
        found
    }

    /// Route a field event to the validator of the field's form.
    ///
    /// `target` may be the field itself or any element inside a composite
    /// field. Events that resolve to no tracked form are ignored.
    pub fn dispatch<D>(&mut self, dom: &mut D, target: &N, event: FieldEvent) -> Option<Detection>
    where
        D: Dom<Node = N>,
    {
        let Some(field) = dom.closest_field(target) else {
            tracing::trace!(node = ?target, "event target is not a field");
            return None;
        };
        let validator = dom.form_of(&field).and_then(|form| self.forms.get_mut(&form))?;
        Some(validator.handle_event(dom, &field, event))
    }

    pub fn submit<D>(&mut self, dom: &mut D, form: &N) -> Option<Submission>
    where
        D: Dom<Node = N>,
    {
        self.forms.get_mut(form).map(|validator| validator.submit(dom))
    }

    pub fn reset<D>(&mut self, dom: &mut D, form: &N) -> Option<Pass>
    where
        D: Dom<Node = N>,
    {
        self.forms.get_mut(form).map(|validator| validator.reset(dom))
    }

    pub fn structure_changed<D>(&mut self, dom: &mut D, form: &N) -> Option<Pass>
    where
        D: Dom<Node = N>,
    {
        self.forms
            .get_mut(form)
            .map(|validator| validator.structure_changed(dom))
    }

    /// Drop the validator of a form. Its extracted rules are kept in case
    /// the form is initialized again.
    pub fn teardown(&mut self, form: &N) -> Option<FormValidator<N>> {
        let removed = self.forms.remove(form)?;
        self.detached.insert(form.clone(), removed.fields().clone());
        tracing::debug!(form = ?form, "form validator torn down");
        Some(removed)
    }

    /// Forget a torn down form for good, e.g. once it left the document
    pub fn forget(&mut self, form: &N) -> bool {
        self.detached.remove(form).is_some()
    }

    /// Every form and field a live validator holds state for
    pub fn tracked_nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.forms.iter().flat_map(|(form, validator)| {
            std::iter::once(form).chain(validator.fields().iter().map(|(field, _)| field))
        })
    }

    pub fn get(&self, form: &N) -> Option<&FormValidator<N>> {
        self.forms.get(form)
    }

    pub fn get_mut(&mut self, form: &N) -> Option<&mut FormValidator<N>> {
        self.forms.get_mut(form)
    }

    pub fn forms(&self) -> impl Iterator<Item = &N> {
        self.forms.keys()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl<N: Clone + Eq + Hash + Debug> Default for FormRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}
