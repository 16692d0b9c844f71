// File: src/form.rs
// Purpose: Form-level validity aggregation, submission veto and reset

use crate::config::FormsConfig;
use crate::dom::Dom;
use crate::events::{Listeners, Notification, SubscriptionId};
use crate::field::{FieldCache, FieldRecord, Validity};
use rusty_forms_validation::RuleRegistry;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Summary of one revalidation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
    /// Aggregate validity after the pass
    pub valid: bool,
    /// The aggregate flipped during this pass
    pub changed: bool,
    /// Enabled fields taken into account
    pub fields: usize,
    /// Fields whose rules had to be evaluated (cache misses)
    pub evaluated: usize,
}

/// Decision for a submit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Proceed(Pass),
    /// The form is invalid; the host cancels its default action
    Veto(Pass),
}

impl Submission {
    pub fn is_veto(&self) -> bool {
        matches!(self, Submission::Veto(_))
    }

    pub fn pass(&self) -> Pass {
        match self {
            Submission::Proceed(pass) | Submission::Veto(pass) => *pass,
        }
    }
}

/// Validator bound to one form
///
/// Owns the form's [`FieldRecord`]s. Every pass reuses cached validity for
/// fields whose value did not change, and writes to the document only when
/// a marker or the aggregate actually flips.
pub struct FormValidator<N> {
    form: N,
    registry: Arc<RuleRegistry>,
    config: Arc<FormsConfig>,
    fields: FieldCache<N>,
    valid: bool,
    error_marked: bool,
    pub(crate) listeners: Listeners<N>,
}

impl<N: Clone + Eq + Hash + Debug> FormValidator<N> {
    /// Attach to `form`: disable its submit controls, observe every field
    /// and run the first pass.
    pub fn attach<D>(dom: &mut D, form: N, registry: Arc<RuleRegistry>, config: Arc<FormsConfig>) -> Self
    where
        D: Dom<Node = N>,
    {
        Self::attach_with(dom, form, registry, config, FieldCache::new())
    }

    /// Attach again with the records of an earlier validator of this form.
    /// Their extracted rules are kept; interaction state, cached validity
    /// and markers are dropped, as are fields no longer in the form.
    pub(crate) fn reattach<D>(
        dom: &mut D,
        form: N,
        registry: Arc<RuleRegistry>,
        config: Arc<FormsConfig>,
        mut fields: FieldCache<N>,
    ) -> Self
    where
        D: Dom<Node = N>,
    {
        fields.retain_present(&dom.fields_within(&form));
        dom.remove_class(&form, &config.error_class);
        for (field, record) in fields.iter_mut() {
            if record.error_marked() {
                dom.remove_class(field, &config.error_class);
            }
            record.clear(dom.value(field));
        }

        tracing::debug!(form = ?form, kept = fields.len(), "reattaching with extracted rules");
        Self::attach_with(dom, form, registry, config, fields)
    }

    fn attach_with<D>(
        dom: &mut D,
        form: N,
        registry: Arc<RuleRegistry>,
        config: Arc<FormsConfig>,
        fields: FieldCache<N>,
    ) -> Self
    where
        D: Dom<Node = N>,
    {
        for control in dom.submit_controls(&form) {
            dom.set_disabled(&control, true);
        }

        let mut validator = Self {
            form,
            registry,
            config,
            fields,
            valid: false,
            error_marked: false,
            listeners: Listeners::new(),
        };

        for field in dom.fields_within(&validator.form) {
            validator.record(dom, &field);
        }

        let pass = validator.revalidate(dom);
        tracing::debug!(form = ?validator.form, fields = validator.fields.len(), valid = pass.valid, "form attached");
        validator
    }

    pub fn form(&self) -> &N {
        &self.form
    }

    /// Aggregate validity from the last pass
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn config(&self) -> &FormsConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn field(&self, field: &N) -> Option<&FieldRecord> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &FieldCache<N> {
        &self.fields
    }

    /// Call `listener` for every notification this validator publishes
    pub fn subscribe(&mut self, listener: impl FnMut(&Notification<N>) + 'static) -> SubscriptionId {
        self.listeners.add(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    pub(crate) fn record<D>(&mut self, dom: &mut D, field: &N) -> (&mut FieldRecord, bool)
    where
        D: Dom<Node = N>,
    {
        self.fields.ensure(dom, &self.registry, &self.config, field)
    }

    /// Recompute the form's validity from its enabled fields
    pub fn revalidate<D>(&mut self, dom: &mut D) -> Pass
    where
        D: Dom<Node = N>,
    {
        let enabled: Vec<N> = dom
            .fields_within(&self.form)
            .into_iter()
            .filter(|field| !dom.is_disabled(field))
            .collect();

        let mut valid = true;
        let mut evaluated = 0;
        let mut pending = Vec::new();

        for field in &enabled {
            let (record, _) = self.fields.ensure(dom, &self.registry, &self.config, field);
            let validity = record.validate();
            let field_valid = validity.valid();

            if let Validity::Fresh { valid, previous } = validity {
                evaluated += 1;
                if previous != Some(valid) {
                    pending.push(Notification::FieldValidity {
                        field: field.clone(),
                        valid,
                    });
                }
            }

            match record.marker_transition(field_valid) {
                Some(true) => dom.add_class(field, &self.config.error_class),
                Some(false) => dom.remove_class(field, &self.config.error_class),
                None => {}
            }

            valid &= field_valid;
        }

        let changed = valid != self.valid;
        if changed {
            self.valid = valid;
            self.publish_validity(dom);
            pending.push(Notification::FormValidity {
                form: self.form.clone(),
                valid,
            });
            tracing::debug!(form = ?self.form, valid, "form validity changed");
        }

        for notification in &pending {
            self.listeners.emit(notification);
        }

        tracing::trace!(form = ?self.form, fields = enabled.len(), evaluated, valid, "revalidation pass");
        Pass {
            valid,
            changed,
            fields: enabled.len(),
            evaluated,
        }
    }

    fn publish_validity<D>(&mut self, dom: &mut D)
    where
        D: Dom<Node = N>,
    {
        if !self.valid && !self.error_marked {
            dom.add_class(&self.form, &self.config.error_class);
            self.error_marked = true;
        } else if self.valid && self.error_marked {
            dom.remove_class(&self.form, &self.config.error_class);
            self.error_marked = false;
        }

        for control in dom.submit_controls(&self.form) {
            dom.set_disabled(&control, !self.valid);
        }
    }

    /// Validate before a submit. Live values are re-read first so values set
    /// without an event are not missed.
    pub fn submit<D>(&mut self, dom: &mut D) -> Submission
    where
        D: Dom<Node = N>,
    {
        for field in dom.fields_within(&self.form) {
            if !dom.is_disabled(&field) {
                self.refresh_value(dom, &field);
            }
        }

        let pass = self.revalidate(dom);
        if pass.valid {
            Submission::Proceed(pass)
        } else {
            tracing::debug!(form = ?self.form, "submission vetoed");
            Submission::Veto(pass)
        }
    }

    /// Second half of a form reset, run once the host has restored default
    /// values: forget touched state, markers and cached validity, then
    /// validate the restored values.
    pub fn reset<D>(&mut self, dom: &mut D) -> Pass
    where
        D: Dom<Node = N>,
    {
        for (field, record) in self.fields.iter_mut() {
            if record.error_marked() {
                dom.remove_class(field, &self.config.error_class);
            }
            record.clear(dom.value(field));
        }

        tracing::debug!(form = ?self.form, fields = self.fields.len(), "form reset");
        self.revalidate(dom)
    }

    /// Fields were inserted or removed: forget the removed ones and
    /// validate everything again.
    pub fn structure_changed<D>(&mut self, dom: &mut D) -> Pass
    where
        D: Dom<Node = N>,
    {
        let present = dom.fields_within(&self.form);
        let dropped = self.fields.retain_present(&present);
        if dropped > 0 {
            tracing::debug!(form = ?self.form, dropped, "removed fields forgotten");
        }
        self.revalidate(dom)
    }
}

impl<N: Debug> Debug for FormValidator<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormValidator")
            .field("form", &self.form)
            .field("registry", &self.registry)
            .field("valid", &self.valid)
            .field("error_marked", &self.error_marked)
            .field("fields", &self.fields)
            .field("listeners", &self.listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDom, NodeId};

    fn attach(dom: &mut MemoryDom, form: NodeId) -> FormValidator<NodeId> {
        FormValidator::attach(dom, form, Arc::new(RuleRegistry::new()), Arc::new(FormsConfig::default()))
    }

    #[test]
    fn test_empty_form_is_valid() {
        let mut dom = MemoryDom::new();
        let form = dom.add_form(dom.root());
        let submit = dom.add_submit(form);

        let validator = attach(&mut dom, form);
        assert!(validator.is_valid());
        assert!(!dom.node_disabled(submit));
    }

    #[test]
    fn test_disabled_fields_are_ignored() {
        let mut dom = MemoryDom::new();
        let form = dom.add_form(dom.root());
        let field = dom.add_field(form);
        dom.set_attribute(field, "required", "");
        dom.set_node_disabled(field, true);

        let mut validator = attach(&mut dom, form);
        assert!(validator.is_valid());

        dom.set_node_disabled(field, false);
        let pass = validator.revalidate(&mut dom);
        assert!(!pass.valid);
        assert!(pass.changed);
        assert_eq!(pass.fields, 1);
    }

    #[test]
    fn test_noop_pass_evaluates_nothing_and_writes_nothing() {
        let mut dom = MemoryDom::new();
        let form = dom.add_form(dom.root());
        for _ in 0..3 {
            let field = dom.add_field(form);
            dom.set_attribute(field, "pattern", "[a-z]*");
        }
        dom.add_submit(form);

        let mut validator = attach(&mut dom, form);
        let writes = dom.writes();

        let pass = validator.revalidate(&mut dom);
        assert_eq!(pass.evaluated, 0);
        assert!(!pass.changed);
        assert_eq!(dom.writes(), writes);
    }

    #[test]
    fn test_form_error_class_follows_transitions() {
        let mut dom = MemoryDom::new();
        let form = dom.add_form(dom.root());
        let field = dom.add_field(form);
        dom.set_attribute(field, "pattern", r"\d+");
        dom.type_value(field, "1");

        let mut validator = attach(&mut dom, form);
        assert!(validator.is_valid());
        assert!(!dom.has_class(form, "error"));

        dom.type_value(field, "x");
        validator.refresh_value(&mut dom, &field);
        validator.revalidate(&mut dom);
        assert!(dom.has_class(form, "error"));

        dom.type_value(field, "2");
        validator.refresh_value(&mut dom, &field);
        validator.revalidate(&mut dom);
        assert!(!dom.has_class(form, "error"));
    }
}
