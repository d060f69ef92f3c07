// History change notifications.
// Subscribers are plain callbacks; the UI layer either subscribes or polls `version()`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::modules::breadcrumbs::Breadcrumbs;

type Listener = Rc<dyn Fn(&Breadcrumbs)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct HistoryEvents {
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_id: Cell<u64>,
    version: Cell<u64>,
}

impl HistoryEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&Breadcrumbs) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Bumps the version and calls every subscriber with `snapshot`.
    ///
    /// The listener list is copied first, so a callback may subscribe or
    /// unsubscribe; such changes apply from the next emit on.
    pub fn emit(&self, snapshot: &Breadcrumbs) {
        self.version.set(self.version.get() + 1);
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in listeners {
            listener(snapshot);
        }
    }
}
