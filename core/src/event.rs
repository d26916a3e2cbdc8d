//! Synchronous event dispatch with scoped subscriptions.
//!
//! Every notification in the toolkit flows through the [`EventBus`]: the
//! lifecycle events each host emits, widget-specific events, and "window"
//! level input an embedding shell feeds in. Delivery is synchronous and in
//! registration order — there is no deferral, matching the single-threaded
//! cooperative model the toolkit assumes.
//!
//! Subscriptions are scoped: [`EventBus::subscribe`] returns a
//! [`Subscription`] guard and dropping it removes the listener. Hosts hold
//! their widgets' guards and drop them on disconnect, so no listener can
//! outlive the widget that registered it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde_json::Value;

/// Lifecycle event kind emitted when a widget connects.
pub const CONNECTED: &str = "connected";
/// Lifecycle event kind emitted immediately after `connected`, with an
/// identical payload. The duplication is intentional and kept for API
/// compatibility across widget versions.
pub const READY: &str = "ready";
/// Lifecycle event kind emitted when a widget disconnects.
pub const DISCONNECTED: &str = "disconnected";
/// Event kind emitted when an observed attribute changes while connected.
pub const ATTRIB_CHANGED: &str = "attribChanged";
/// Widget event: an interactive value changed.
pub const VALUE_CHANGE: &str = "value-change";
/// Widget event: a segment or cell was activated.
pub const SEGMENT_CLICK: &str = "segment-click";
/// Widget event: remote content finished loading.
pub const CONTENT_LOADED: &str = "content-loaded";
/// Widget event: bound data was reassigned or mutated.
pub const DATA_CHANGED: &str = "dataChanged";

/// Builds the `{tag}:{kind}` event name every widget event uses.
#[must_use]
pub fn event_name(tag: &str, kind: &str) -> String {
    format!("{tag}:{kind}")
}

/// The payload carried by every widget event: `{id, name, data?}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Payload {
    /// The emitting widget's stable identifier.
    pub id: String,
    /// The widget's `name` attribute, if it had one.
    pub name: Option<String>,
    /// Event-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Payload {
    /// Creates a payload without event-specific data.
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
            data: None,
        }
    }

    /// Attaches event-specific data.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A named event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Full event name, `{tag}:{kind}` for widget events.
    pub name: String,
    /// The `{id, name, data?}` payload.
    pub payload: Payload,
}

impl Event {
    /// Creates an event.
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

type Listener = Rc<dyn Fn(&Event)>;

#[derive(Default)]
struct Listeners {
    by_name: HashMap<String, Vec<(u64, Listener)>>,
    next: u64,
}

/// The process-local event dispatcher. Cloning shares the listener table.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Listeners>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("events", &inner.by_name.len())
            .finish()
    }
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for `name`.
    ///
    /// The listener stays registered for exactly as long as the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn subscribe(&self, name: impl Into<String>, listener: impl Fn(&Event) + 'static) -> Subscription {
        let name = name.into();
        let mut inner = self.inner.borrow_mut();
        let id = inner.next;
        inner.next += 1;
        inner
            .by_name
            .entry(name.clone())
            .or_default()
            .push((id, Rc::new(listener)));
        Subscription {
            bus: Rc::downgrade(&self.inner),
            name,
            id,
        }
    }

    /// Delivers `event` to every listener registered for its name,
    /// synchronously and in registration order.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe
    /// or unsubscribe while the event is being delivered.
    pub fn emit(&self, event: &Event) {
        let snapshot: Vec<Listener> = {
            let inner = self.inner.borrow();
            inner
                .by_name
                .get(&event.name)
                .map(|listeners| listeners.iter().map(|(_, l)| l.clone()).collect())
                .unwrap_or_default()
        };
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of listeners currently registered for `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner
            .borrow()
            .by_name
            .get(name)
            .map_or(0, Vec::len)
    }
}

/// RAII registration guard returned by [`EventBus::subscribe`].
#[must_use = "dropping the subscription removes the listener"]
pub struct Subscription {
    bus: Weak<RefCell<Listeners>>,
    name: String,
    id: u64,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            let mut inner = inner.borrow_mut();
            if let Some(listeners) = inner.by_name.get_mut(&self.name) {
                listeners.retain(|(id, _)| *id != self.id);
                if listeners.is_empty() {
                    inner.by_name.remove(&self.name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn delivery_is_synchronous_and_ordered() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = {
            let log = log.clone();
            bus.subscribe("tick", move |_| log.borrow_mut().push(1))
        };
        let second = {
            let log = log.clone();
            bus.subscribe("tick", move |_| log.borrow_mut().push(2))
        };
        bus.emit(&Event::new("tick", Payload::default()));
        assert_eq!(*log.borrow(), vec![1, 2]);
        drop((first, second));
    }

    #[test]
    fn dropping_a_subscription_removes_the_listener() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let sub = {
            let hits = hits.clone();
            bus.subscribe("tick", move |_| hits.set(hits.get() + 1))
        };
        bus.emit(&Event::new("tick", Payload::default()));
        drop(sub);
        bus.emit(&Event::new("tick", Payload::default()));
        assert_eq!(hits.get(), 1);
        assert_eq!(bus.listener_count("tick"), 0);
    }

    #[test]
    fn listeners_may_unsubscribe_during_delivery() {
        let bus = EventBus::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let sub = {
            let slot = slot.clone();
            bus.subscribe("once", move |_| {
                slot.borrow_mut().take();
            })
        };
        *slot.borrow_mut() = Some(sub);
        bus.emit(&Event::new("once", Payload::default()));
        assert_eq!(bus.listener_count("once"), 0);
    }
}
