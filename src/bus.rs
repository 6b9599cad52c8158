//! Keyed publish/subscribe.
//!
//! Subscribers are boxed closures. A subscriber registered for a key only sees
//! events published under that key; `subscribe_all` sees everything. Both
//! return a [`SubscriptionId`] that removes the subscriber again.

use std::fmt;

/// Handle returned by a subscription; pass it to [`EventBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E) + Send>;

struct Subscriber<E> {
    id: u64,
    key: Option<String>,
    handler: Handler<E>,
}

/// A synchronous event bus.
pub struct EventBus<E> {
    next_id: u64,
    subscribers: Vec<Subscriber<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            next_id: 1,
            subscribers: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<E> EventBus<E> {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, key: Option<String>, handler: Handler<E>) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push(Subscriber { id, key, handler });
        SubscriptionId(id)
    }

    /// Subscribes to events published under `key`.
    pub fn subscribe<F>(&mut self, key: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + 'static,
    {
        self.add(Some(key.to_string()), Box::new(handler))
    }

    /// Subscribes to every event.
    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + 'static,
    {
        self.add(None, Box::new(handler))
    }

    /// Removes a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id.0);
        before != self.subscribers.len()
    }

    /// Delivers `event` to key subscribers first, then to global ones.
    pub fn publish(&mut self, key: &str, event: &E) {
        for sub in &mut self.subscribers {
            if sub.key.as_deref() == Some(key) {
                (sub.handler)(event);
            }
        }
        for sub in &mut self.subscribers {
            if sub.key.is_none() {
                (sub.handler)(event);
            }
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// True when nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
