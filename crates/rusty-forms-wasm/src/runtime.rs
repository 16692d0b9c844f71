// File: src/runtime.rs
// Purpose: Event wiring between the browser and the form registry

use crate::browser::{BrowserDom, ElementId};
use rusty_forms::{FieldEvent, FormRegistry, Notification};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CustomEvent, CustomEventInit, Element, Event, KeyboardEvent, MutationObserver, MutationObserverInit};

/// Events listened to on each attached form; focus events are observed
/// through their bubbling `focusin`/`focusout` variants.
const FIELD_EVENTS: &[&str] = &[
    "keyup", "keydown", "keypress", "input", "paste", "change", "focusin", "focusout",
];

pub(crate) type Shared = Rc<RefCell<Runtime>>;
pub(crate) type Outbox = Rc<RefCell<Vec<Notification<ElementId>>>>;

pub(crate) struct Runtime {
    pub(crate) dom: BrowserDom,
    pub(crate) forms: FormRegistry<ElementId>,
    pub(crate) attachments: HashMap<ElementId, Attachment>,
}

/// Run `f` against the runtime unless it is already borrowed further up the
/// stack (a page script reacting to one of our events synchronously).
pub(crate) fn with_runtime<R>(shared: &Shared, f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
    match shared.try_borrow_mut() {
        Ok(mut runtime) => Some(f(&mut runtime)),
        Err(_) => {
            tracing::warn!("re-entrant form event ignored");
            None
        }
    }
}

/// Release interned elements that no validator refers to any more
pub(crate) fn compact(rt: &Runtime) {
    let live: HashSet<ElementId> = rt.forms.tracked_nodes().copied().collect();
    let released = rt.dom.retain(&live);
    if released > 0 {
        tracing::trace!(released, retained = rt.dom.len(), "element handles released");
    }
}

/// Listeners and observer installed on one form; removed on drop
pub(crate) struct Attachment {
    form: Element,
    listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
    observer: MutationObserver,
    _on_mutation: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl Drop for Attachment {
    fn drop(&mut self) {
        for (event_type, listener) in &self.listeners {
            if let Err(err) = self
                .form
                .remove_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())
            {
                tracing::warn!(event = *event_type, error = ?err, "failed to remove listener");
            }
        }
        self.observer.disconnect();
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Detail<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid: Option<bool>,
}

/// Dispatch queued notifications as custom events. Runs with the runtime
/// released so page listeners may call back into it.
pub(crate) fn flush(shared: &Shared, outbox: &Outbox) {
    let pending = std::mem::take(&mut *outbox.borrow_mut());
    for notification in pending {
        let (id, kind, detail) = match &notification {
            Notification::ValueChanged {
                field,
                previous,
                current,
            } => (
                *field,
                "change",
                Detail {
                    previous: Some(previous.as_str()),
                    current: Some(current.as_str()),
                    valid: None,
                },
            ),
            Notification::FieldValidity { field, valid } => (
                *field,
                "validated",
                Detail {
                    previous: None,
                    current: None,
                    valid: Some(*valid),
                },
            ),
            Notification::FormValidity { form, valid } => (
                *form,
                "validated",
                Detail {
                    previous: None,
                    current: None,
                    valid: Some(*valid),
                },
            ),
        };

        let Some((element, name)) = with_runtime(shared, |rt| {
            rt.dom
                .element(id)
                .map(|element| (element, rt.dom.config().event_name(kind)))
        })
        .flatten() else {
            continue;
        };

        if let Err(err) = dispatch_custom(&element, &name, &detail) {
            tracing::warn!(event = %name, error = ?err, "failed to dispatch notification");
        }
    }
}

fn dispatch_custom(element: &Element, name: &str, detail: &Detail<'_>) -> Result<(), JsValue> {
    let init = CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(&serde_wasm_bindgen::to_value(detail)?);
    let event = CustomEvent::new_with_event_init_dict(name, &init)?;
    element.dispatch_event(&event)?;
    Ok(())
}

fn listen(
    form: &Element,
    listeners: &mut Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
    event_type: &'static str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    form.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())?;
    listeners.push((event_type, closure));
    Ok(())
}

/// Wire the field, submit and reset events of `form` and observe its
/// subtree for inserted or removed fields
pub(crate) fn attach(shared: &Shared, outbox: &Outbox, id: ElementId, form: &Element) -> Result<Attachment, JsValue> {
    let mut listeners = Vec::new();

    for &event_type in FIELD_EVENTS {
        let (shared, outbox) = (Rc::clone(shared), Rc::clone(outbox));
        listen(form, &mut listeners, event_type, move |event: Event| {
            on_field_event(&shared, &event);
            flush(&shared, &outbox);
        })?;
    }

    {
        let (shared, outbox) = (Rc::clone(shared), Rc::clone(outbox));
        listen(form, &mut listeners, "submit", move |event: Event| {
            let vetoed = with_runtime(&shared, |rt| {
                rt.forms
                    .submit(&mut rt.dom, &id)
                    .map(|submission| submission.is_veto())
            })
            .flatten()
            .unwrap_or(false);
            if vetoed {
                event.prevent_default();
            }
            flush(&shared, &outbox);
        })?;
    }

    {
        let (shared, outbox) = (Rc::clone(shared), Rc::clone(outbox));
        listen(form, &mut listeners, "reset", move |_event: Event| {
            schedule_reset(&shared, &outbox, id);
        })?;
    }

    let on_mutation = {
        let (shared, outbox) = (Rc::clone(shared), Rc::clone(outbox));
        Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: MutationObserver| {
                with_runtime(&shared, |rt| {
                    rt.forms.structure_changed(&mut rt.dom, &id);
                    compact(rt);
                });
                flush(&shared, &outbox);
            },
        )
    };
    let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer.observe_with_options(form, &options)?;

    Ok(Attachment {
        form: form.clone(),
        listeners,
        observer,
        _on_mutation: on_mutation,
    })
}

fn on_field_event(shared: &Shared, event: &Event) {
    let key_code = event
        .dyn_ref::<KeyboardEvent>()
        .map(|keyboard| keyboard.key_code());
    let Some(field_event) = FieldEvent::from_dom(&event.type_(), key_code) else {
        return;
    };
    let Some(target) = event.target().and_then(|target| target.dyn_into::<Element>().ok()) else {
        return;
    };

    with_runtime(shared, |rt| {
        // Resolve before interning so wrapper elements are never held
        let selector = rt.dom.config().field_selector.clone();
        let Ok(Some(field)) = target.closest(&selector) else {
            return;
        };
        let field = rt.dom.intern(&field);
        rt.forms.dispatch(&mut rt.dom, &field, field_event);
    });
}

/// Run the validator's reset once the native reset has restored defaults
fn schedule_reset(shared: &Shared, outbox: &Outbox, id: ElementId) {
    let Some(delay) = with_runtime(shared, |rt| rt.dom.config().forms.reset_delay_ms) else {
        return;
    };
    let Some(window) = web_sys::window() else {
        return;
    };

    let (shared, outbox) = (Rc::clone(shared), Rc::clone(outbox));
    let callback = Closure::once_into_js(move || {
        with_runtime(&shared, |rt| rt.forms.reset(&mut rt.dom, &id));
        flush(&shared, &outbox);
    });

    if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        i32::try_from(delay).unwrap_or(i32::MAX),
    ) {
        tracing::warn!(error = ?err, "failed to schedule form reset");
    }
}
