// File: src/change.rs
// Purpose: Decide which field events can change a value and react to real changes

use crate::dom::Dom;
use crate::events::Notification;
use crate::form::{FormValidator, Pass};
use std::fmt::Debug;
use std::hash::Hash;

/// Field-affecting events the detector understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    /// keyup / keydown / keypress with the key code
    Key(u32),
    Input,
    Paste,
    Change,
    Focus,
    Blur,
}

impl FieldEvent {
    /// Map a DOM event type to a field event. Key events need a key code.
    pub fn from_dom(event_type: &str, key_code: Option<u32>) -> Option<Self> {
        match event_type {
            "keyup" | "keydown" | "keypress" => key_code.map(FieldEvent::Key),
            "input" => Some(FieldEvent::Input),
            "paste" => Some(FieldEvent::Paste),
            "change" => Some(FieldEvent::Change),
            "focus" | "focusin" => Some(FieldEvent::Focus),
            "blur" | "focusout" => Some(FieldEvent::Blur),
            _ => None,
        }
    }
}

/// Keys that never alter a value: tab, enter, modifiers, pause, caps lock,
/// escape, page up/down, end, home, arrows, F1-F12, num lock, scroll lock
pub fn is_non_updating_key(key_code: u32) -> bool {
    matches!(
        key_code,
        9 | 13 | 16..=20 | 27 | 33..=40 | 112..=123 | 144 | 145
    )
}

/// What the detector did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Non-updating key; the document was not read
    Skipped,
    /// Value read and found identical to the cached one
    Unchanged,
    /// Value changed and the form was revalidated
    Changed(Pass),
    /// Value unchanged but the event (blur) still asked for a pass
    Refreshed(Pass),
}

impl Detection {
    pub fn pass(&self) -> Option<Pass> {
        match self {
            Detection::Changed(pass) | Detection::Refreshed(pass) => Some(*pass),
            Detection::Skipped | Detection::Unchanged => None,
        }
    }
}

impl<N: Clone + Eq + Hash + Debug> FormValidator<N> {
    /// React to an event on one of this form's fields
    pub fn handle_event<D>(&mut self, dom: &mut D, field: &N, event: FieldEvent) -> Detection
    where
        D: Dom<Node = N>,
    {
        if let FieldEvent::Key(code) = event {
            if is_non_updating_key(code) {
                tracing::trace!(field = ?field, code, "non-updating key ignored");
                return Detection::Skipped;
            }
        }

        if event == FieldEvent::Focus {
            self.touch(dom, field);
        }

        if self.refresh_value(dom, field) {
            Detection::Changed(self.revalidate(dom))
        } else if event == FieldEvent::Blur {
            Detection::Refreshed(self.revalidate(dom))
        } else {
            Detection::Unchanged
        }
    }

    /// Mark a field as interacted with. Returns true the first time.
    pub fn touch<D>(&mut self, dom: &mut D, field: &N) -> bool
    where
        D: Dom<Node = N>,
    {
        let (record, _) = self.record(dom, field);
        let first = record.touch();
        if first {
            tracing::trace!(field = ?field, "field touched");
        }
        first
    }

    /// Re-read a field's live value into its record. Returns true when it
    /// differed from the cached value, which marks the record stale.
    pub fn refresh_value<D>(&mut self, dom: &mut D, field: &N) -> bool
    where
        D: Dom<Node = N>,
    {
        let (record, created) = self.record(dom, field);
        if created {
            return false;
        }

        let current = dom.value(field);
        let Some(previous) = record.store_value(current.clone()) else {
            return false;
        };

        self.listeners.emit(&Notification::ValueChanged {
            field: field.clone(),
            previous,
            current,
        });
        true
    }
}
