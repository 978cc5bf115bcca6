//! Subscription management and synchronous dispatch.

use crate::event::{EventName, StoreEvent};
use larder_core::{LarderError, LarderResult};

/// Handle returned by `on`/`once`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Whether gated events are delivered.
///
/// An explicit mode rather than a swapped dispatch function: the publisher
/// checks it on every publish, and lifecycle signals bypass it via
/// [`Publisher::publish_always`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    Enabled,
    Suppressed,
}

type Callback = Box<dyn Fn(&StoreEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    event: EventName,
    once: bool,
    callback: Callback,
}

/// Ordered, synchronous event publisher.
///
/// Subscribers for an event are invoked in subscription order on the
/// publishing thread. The five built-in names are registered from the
/// start; custom names must be registered with [`Publisher::add_event`]
/// before they can be subscribed to or published.
pub struct Publisher {
    subscriptions: Vec<Subscription>,
    registered: Vec<EventName>,
    publication: Publication,
    next_id: u64,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            registered: EventName::BUILT_IN.to_vec(),
            publication: Publication::Enabled,
            next_id: 0,
        }
    }

    /// Current gating mode.
    pub fn publication(&self) -> Publication {
        self.publication
    }

    /// Switch gating on or off for subsequent publishes.
    pub fn set_publication(&mut self, publication: Publication) {
        self.publication = publication;
    }

    /// Register a custom event name. Registering an already-known name
    /// (built-in or custom) is a no-op.
    pub fn add_event(&mut self, name: impl Into<String>) {
        let event = EventName::parse(&name.into());
        if !self.registered.contains(&event) {
            self.registered.push(event);
        }
    }

    /// Whether an event name is known to this publisher.
    pub fn is_registered(&self, event: &EventName) -> bool {
        self.registered.contains(event)
    }

    /// Subscribe to an event. Fails for unregistered names.
    pub fn on(
        &mut self,
        event: EventName,
        callback: impl Fn(&StoreEvent) + Send + Sync + 'static,
    ) -> LarderResult<SubscriptionId> {
        self.subscribe(event, Box::new(callback), false)
    }

    /// Subscribe to the next occurrence of an event only.
    pub fn once(
        &mut self,
        event: EventName,
        callback: impl Fn(&StoreEvent) + Send + Sync + 'static,
    ) -> LarderResult<SubscriptionId> {
        self.subscribe(event, Box::new(callback), true)
    }

    /// Remove a subscription. Returns whether it was present.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Publish an event, honoring the gating mode.
    ///
    /// Lifecycle signals (`ready`, `cleared`) are delivered even when
    /// suppressed; everything else is dropped silently.
    pub fn publish(&mut self, event: &StoreEvent) -> LarderResult<()> {
        if self.publication == Publication::Suppressed && !event.always_fires() {
            return Ok(());
        }
        self.dispatch(event)
    }

    /// Publish an event regardless of the gating mode.
    pub fn publish_always(&mut self, event: &StoreEvent) -> LarderResult<()> {
        self.dispatch(event)
    }

    fn subscribe(
        &mut self,
        event: EventName,
        callback: Callback,
        once: bool,
    ) -> LarderResult<SubscriptionId> {
        if !self.is_registered(&event) {
            return Err(LarderError::UnknownEvent {
                name: event.as_str().to_string(),
            });
        }
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            event,
            once,
            callback,
        });
        Ok(id)
    }

    fn dispatch(&mut self, event: &StoreEvent) -> LarderResult<()> {
        let name = event.name();
        if !self.is_registered(&name) {
            return Err(LarderError::UnknownEvent {
                name: name.as_str().to_string(),
            });
        }
        let mut spent = Vec::new();
        for subscription in &self.subscriptions {
            if subscription.event == name {
                (subscription.callback)(event);
                if subscription.once {
                    spent.push(subscription.id);
                }
            }
        }
        if !spent.is_empty() {
            self.subscriptions.retain(|s| !spent.contains(&s.id));
        }
        Ok(())
    }
}
