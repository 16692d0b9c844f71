//! Integration tests for rusty-forms
//!
//! Drives the registry and validators through an in-memory document and
//! checks what a user of the page would observe: error classes, submit
//! controls, submission vetoes and published notifications.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rusty_forms::*;
use std::cell::RefCell;
use std::rc::Rc;

const ARROW_LEFT: u32 = 37;
const KEY_A: u32 = 65;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A form with one field carrying `attr=value` and one submit button
fn single_field_form(attr: &str, value: &str) -> (MemoryDom, NodeId, NodeId, NodeId) {
    init_tracing();
    let mut dom = MemoryDom::new();
    let root = dom.root();
    let form = dom.add_form(root);
    let field = dom.add_field(form);
    dom.set_attribute(field, attr, value);
    let submit = dom.add_submit(form);
    (dom, form, field, submit)
}

fn collect(forms: &mut FormRegistry<NodeId>, form: NodeId) -> Rc<RefCell<Vec<Notification<NodeId>>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    forms
        .get_mut(&form)
        .unwrap()
        .subscribe(move |n| sink.borrow_mut().push(n.clone()));
    seen
}

#[test]
fn test_required_field_enables_submit_after_typing_and_blur() {
    let (mut dom, form, field, submit) = single_field_form("required", "");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    assert!(dom.node_disabled(submit));
    assert!(!dom.has_class(field, "error"));

    assert_eq!(forms.dispatch(&mut dom, &field, FieldEvent::Focus), Some(Detection::Unchanged));
    let blur = forms.dispatch(&mut dom, &field, FieldEvent::Blur).unwrap();
    assert!(matches!(blur, Detection::Refreshed(pass) if !pass.valid && !pass.changed));
    assert!(dom.has_class(field, "error"));
    assert!(dom.node_disabled(submit));

    dom.type_value(field, "Ada");
    let typed = forms.dispatch(&mut dom, &field, FieldEvent::Key(KEY_A)).unwrap();
    assert!(matches!(typed, Detection::Changed(pass) if pass.valid && pass.changed));
    forms.dispatch(&mut dom, &field, FieldEvent::Blur);

    assert!(!dom.node_disabled(submit));
    assert!(!dom.has_class(field, "error"));
    assert!(forms.get(&form).unwrap().is_valid());
}

#[test]
fn test_navigation_keys_do_not_read_the_document() {
    let (mut dom, _form, field, _submit) = single_field_form("required", "");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    let reads = dom.value_reads();
    let writes = dom.writes();
    dom.type_value(field, "changed behind our back");

    assert_eq!(
        forms.dispatch(&mut dom, &field, FieldEvent::Key(ARROW_LEFT)),
        Some(Detection::Skipped)
    );
    assert_eq!(dom.value_reads(), reads);
    assert_eq!(dom.writes(), writes);
}

#[test]
fn test_unchanged_value_causes_no_revalidation() {
    let (mut dom, form, field, _submit) = single_field_form("pattern", r"\d+");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);
    let seen = collect(&mut forms, form);

    assert_eq!(
        forms.dispatch(&mut dom, &field, FieldEvent::Key(KEY_A)),
        Some(Detection::Unchanged)
    );
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_memoized_pass_evaluates_no_rules() {
    let (mut dom, form, field, _submit) = single_field_form("pattern", r"\d+");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    let validator = forms.get_mut(&form).unwrap();
    let first = validator.revalidate(&mut dom);
    let second = validator.revalidate(&mut dom);
    assert_eq!(first.evaluated, 0);
    assert_eq!(second, first);
    assert_eq!(validator.field(&field).unwrap().valid(), Some(false));

    dom.type_value(field, "42");
    let detection = forms.dispatch(&mut dom, &field, FieldEvent::Change).unwrap();
    assert_eq!(detection.pass().unwrap().evaluated, 1);
}

#[rstest]
#[case("abc", false)]
#[case("123", true)]
#[case("12a", false)]
#[case("", false)]
fn test_pattern_field_validity(#[case] value: &str, #[case] expected: bool) {
    let (mut dom, form, field, _submit) = single_field_form("pattern", r"^\d+$");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    dom.type_value(field, value);
    forms.dispatch(&mut dom, &field, FieldEvent::Input);
    assert_eq!(forms.get(&form).unwrap().field(&field).unwrap().valid(), Some(expected));
}

#[test]
fn test_required_false_is_always_valid() {
    let (mut dom, form, _field, submit) = single_field_form("required", "false");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    assert!(forms.get(&form).unwrap().is_valid());
    assert!(!dom.node_disabled(submit));
}

#[rstest]
#[case(&["1", "2", "3"], true)]
#[case(&["1", "", "3"], false)]
#[case(&["", "", ""], false)]
#[case(&[], true)]
fn test_aggregate_is_and_of_enabled_fields(#[case] values: &[&str], #[case] expected: bool) {
    init_tracing();
    let mut dom = MemoryDom::new();
    let root = dom.root();
    let form = dom.add_form(root);
    let anchor = dom.add_field(form);
    dom.set_attribute(anchor, "required", "false");
    for value in values {
        let field = dom.add_field(form);
        dom.set_attribute(field, "required", "");
        dom.set_default_value(field, value);
    }
    let disabled = dom.add_field(form);
    dom.set_attribute(disabled, "required", "");
    dom.set_node_disabled(disabled, true);

    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);
    assert_eq!(forms.get(&form).unwrap().is_valid(), expected);
}

#[test]
fn test_untouched_fields_are_never_marked() {
    let (mut dom, _form, field, _submit) = single_field_form("pattern", r"\d+");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    dom.type_value(field, "abc");
    forms.dispatch(&mut dom, &field, FieldEvent::Change);
    forms.dispatch(&mut dom, &field, FieldEvent::Blur);
    assert!(!dom.has_class(field, "error"));

    forms.dispatch(&mut dom, &field, FieldEvent::Focus);
    forms.dispatch(&mut dom, &field, FieldEvent::Blur);
    assert!(dom.has_class(field, "error"));
}

#[test]
fn test_notifications_are_published_in_order() {
    let (mut dom, form, field, _submit) = single_field_form("required", "");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);
    let seen = collect(&mut forms, form);

    dom.type_value(field, "x");
    forms.dispatch(&mut dom, &field, FieldEvent::Input);
    // Same validity again: only the value change is published
    dom.type_value(field, "xy");
    forms.dispatch(&mut dom, &field, FieldEvent::Input);

    assert_eq!(
        *seen.borrow(),
        vec![
            Notification::ValueChanged {
                field,
                previous: String::new(),
                current: "x".to_string(),
            },
            Notification::FieldValidity { field, valid: true },
            Notification::FormValidity { form, valid: true },
            Notification::ValueChanged {
                field,
                previous: "x".to_string(),
                current: "xy".to_string(),
            },
        ]
    );
}

#[test]
fn test_submit_is_vetoed_while_invalid() {
    let (mut dom, form, field, _submit) = single_field_form("required", "");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    assert!(forms.submit(&mut dom, &form).unwrap().is_veto());

    // Set by a script, no event fired
    dom.type_value(field, "filled");
    let submission = forms.submit(&mut dom, &form).unwrap();
    assert!(matches!(submission, Submission::Proceed(pass) if pass.valid));
}

#[test]
fn test_reset_restores_defaults_and_clears_state() {
    let (mut dom, form, field, submit) = single_field_form("required", "");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    forms.dispatch(&mut dom, &field, FieldEvent::Focus);
    dom.type_value(field, "Ada");
    forms.dispatch(&mut dom, &field, FieldEvent::Change);
    assert!(!dom.node_disabled(submit));

    dom.native_reset(form);
    let pass = forms.reset(&mut dom, &form).unwrap();
    assert!(!pass.valid);
    assert!(pass.changed);
    assert!(dom.node_disabled(submit));

    let record = forms.get(&form).unwrap().field(&field).unwrap();
    assert_eq!(record.value(), "");
    assert!(!record.touched());
    assert!(!record.error_marked());
    assert!(!dom.has_class(field, "error"));
}

#[test]
fn test_reset_removes_field_markers() {
    let (mut dom, form, field, submit) = single_field_form("pattern", r"\d+");
    dom.set_default_value(field, "1");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);
    assert!(!dom.node_disabled(submit));

    forms.dispatch(&mut dom, &field, FieldEvent::Focus);
    dom.type_value(field, "x");
    forms.dispatch(&mut dom, &field, FieldEvent::Blur);
    assert!(dom.has_class(field, "error"));
    assert!(dom.has_class(form, "error"));

    dom.native_reset(form);
    let pass = forms.reset(&mut dom, &form).unwrap();
    assert!(pass.valid);
    assert!(!dom.has_class(field, "error"));
    assert!(!dom.has_class(form, "error"));
    assert!(!dom.node_disabled(submit));
}

#[test]
fn test_structure_changes_trigger_full_pass() {
    let (mut dom, form, _field, submit) = single_field_form("required", "false");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);
    assert!(!dom.node_disabled(submit));

    let added = dom.add_field(form);
    dom.set_attribute(added, "required", "");
    let pass = forms.structure_changed(&mut dom, &form).unwrap();
    assert!(!pass.valid);
    assert_eq!(pass.fields, 2);
    assert!(dom.node_disabled(submit));

    dom.remove(added);
    let pass = forms.structure_changed(&mut dom, &form).unwrap();
    assert!(pass.valid);
    assert!(forms.get(&form).unwrap().field(&added).is_none());
    assert!(!dom.node_disabled(submit));
}

#[test]
fn test_malformed_pattern_fails_closed() {
    let (mut dom, form, field, submit) = single_field_form("pattern", "(unclosed");
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    dom.type_value(field, "(unclosed");
    forms.dispatch(&mut dom, &field, FieldEvent::Change);
    assert!(!forms.get(&form).unwrap().is_valid());
    assert!(dom.node_disabled(submit));
}

#[test]
fn test_events_inside_composite_fields_resolve_to_the_field() {
    let (mut dom, form, field, _submit) = single_field_form("required", "");
    let inner = dom.add_element(field);
    let root = dom.root();
    let mut forms = FormRegistry::new();
    forms.initialize(&mut dom, &root);

    dom.type_value(field, "x");
    let detection = forms.dispatch(&mut dom, &inner, FieldEvent::Paste);
    assert!(matches!(detection, Some(Detection::Changed(_))));
    assert!(forms.get(&form).unwrap().is_valid());
}

#[test]
fn test_extended_rules_and_custom_config() {
    init_tracing();
    let mut dom = MemoryDom::new();
    let root = dom.root();
    let form = dom.add_form(root);
    let field = dom.add_field(form);
    dom.set_attribute(field, "data-minlength", "3");

    let config = FormsConfig {
        error_class: "is-invalid".to_string(),
        strip_declarative_attributes: false,
        ..FormsConfig::default()
    };
    let mut forms = FormRegistry::with_rules(RuleRegistry::extended(), config);
    forms.initialize(&mut dom, &root);
    assert_eq!(dom.attribute(&field, "data-minlength").as_deref(), Some("3"));

    forms.dispatch(&mut dom, &field, FieldEvent::Focus);
    dom.type_value(field, "ab");
    forms.dispatch(&mut dom, &field, FieldEvent::Blur);
    assert!(dom.has_class(field, "is-invalid"));
    assert!(!dom.has_class(field, "error"));
}
