//! Notifications published by form validators

use std::fmt;

/// Something a subscriber may want to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<N> {
    /// A field's cached value differs from the value just read
    ValueChanged {
        field: N,
        previous: String,
        current: String,
    },
    /// A field's freshly computed validity differs from its previous one
    FieldValidity { field: N, valid: bool },
    /// The form's aggregate validity flipped
    FormValidity { form: N, valid: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<N> = Box<dyn FnMut(&Notification<N>)>;

/// Subscribers of one validator, called in subscription order
pub(crate) struct Listeners<N> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener<N>)>,
}

impl<N> Listeners<N> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, listener: Listener<N>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn emit(&mut self, notification: &Notification<N>) {
        for (_, listener) in self.entries.iter_mut() {
            listener(notification);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<N> fmt::Debug for Listeners<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("count", &self.len()).finish()
    }
}
