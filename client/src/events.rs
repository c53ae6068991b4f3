use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use common::protocol::EventKind;

/// Registry of which inbound event kinds currently have a listener.
///
/// The client runs on one thread, so the registry is shared with the
/// outstanding [`Subscription`] guards through an `Rc`.
#[derive(Clone, Default)]
pub struct Subscriptions {
    counts: Rc<RefCell<HashMap<EventKind, usize>>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `kinds` until the returned guard is dropped.
    pub fn subscribe(&self, kinds: &[EventKind]) -> Subscription {
        let mut counts = self.counts.borrow_mut();
        for kind in kinds {
            *counts.entry(*kind).or_insert(0) += 1;
        }

        Subscription {
            kinds: kinds.to_vec(),
            counts: Rc::clone(&self.counts),
        }
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.counts.borrow().get(&kind).is_some_and(|count| *count > 0)
    }
}

/// Keeps its kinds registered for as long as it lives.
#[must_use = "dropping a subscription unregisters it immediately"]
pub struct Subscription {
    kinds: Vec<EventKind>,
    counts: Rc<RefCell<HashMap<EventKind, usize>>>,
}

impl Subscription {
    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut counts = self.counts.borrow_mut();
        for kind in &self.kinds {
            if let Some(count) = counts.get_mut(kind) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    counts.remove(kind);
                }
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kinds", &self.kinds)
            .finish()
    }
}
