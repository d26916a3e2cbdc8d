//! The widget contract.
//!
//! A widget is a value implementing [`Widget`]: a fixed kebab-case tag, an
//! enumerated attribute setter table, two lifecycle hooks, and a render
//! function producing an element subtree. The setter table replaces
//! dynamic attribute-to-property mirroring with an explicit, statically
//! checkable mapping: every observed attribute names the function that
//! applies it, and nothing else on the widget can be clobbered by markup.

use std::fmt;

use serde_json::Value;

use crate::dom::Element;
use crate::env::Environment;
use crate::error::ValidationError;
use crate::event::{self, Event, EventBus, Payload, Subscription};

/// One row of a widget's attribute dispatch table.
pub struct AttributeSetter<W> {
    /// The observed attribute name.
    pub name: &'static str,
    /// Applies a new string value to the widget.
    pub apply: fn(&mut W, &str) -> Result<(), ValidationError>,
}

impl<W> fmt::Debug for AttributeSetter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSetter")
            .field("name", &self.name)
            .finish()
    }
}

/// A connected widget's stable identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The widget's registered tag name.
    pub tag: &'static str,
    /// Stable identifier: slugified `name` attribute or `{tag}-{n}`.
    pub id: String,
    /// The raw `name` attribute, when present in markup.
    pub name: Option<String>,
}

impl Identity {
    /// The `{id, name}` payload used by lifecycle events.
    #[must_use]
    pub fn payload(&self) -> Payload {
        Payload::new(self.id.clone(), self.name.clone())
    }
}

/// A behavior shared by every element in the toolkit.
pub trait Widget: Sized + 'static {
    /// The fixed tag name this widget registers under.
    const TAG: &'static str;

    /// The observed attributes and their setters, in declaration order.
    const ATTRIBUTES: &'static [AttributeSetter<Self>];

    /// Called once per connection, after identity assignment and before
    /// the `connected`/`ready` notifications. Wire external listeners
    /// here; everything registered through the context is dropped at
    /// disconnect.
    fn connected(&mut self, ctx: &mut WidgetContext<'_>) {
        let _ = ctx;
    }

    /// Called when the host detaches. Release anything the widget holds
    /// outside the context-managed subscriptions (drag guards, cached
    /// emitters).
    fn disconnected(&mut self, ctx: &mut WidgetContext<'_>) {
        let _ = ctx;
    }

    /// Builds the widget's subtree. Must be pure: no I/O, no emission.
    fn render(&self, env: &Environment) -> Element;
}

/// Looks up a setter-table row by attribute name.
#[must_use]
pub fn setter_for<'t, W>(
    table: &'t [AttributeSetter<W>],
    name: &str,
) -> Option<&'t AttributeSetter<W>> {
    table.iter().find(|setter| setter.name == name)
}

/// An identity-bound handle for emitting widget events after connect.
///
/// Cheap to clone; widgets capture it in observer callbacks and listener
/// closures so notifications keep flowing without borrowing the host.
#[derive(Clone)]
pub struct Emitter {
    events: EventBus,
    identity: Identity,
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.identity.id)
            .finish()
    }
}

impl Emitter {
    pub(crate) fn new(events: EventBus, identity: Identity) -> Self {
        Self { events, identity }
    }

    /// The bound widget's identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Emits `{tag}:{kind}` with the standard payload plus `data`.
    pub fn emit(&self, kind: &str, data: Option<Value>) {
        let mut payload = self.identity.payload();
        payload.data = data;
        self.events.emit(&Event::new(
            event::event_name(self.identity.tag, kind),
            payload,
        ));
    }
}

/// What a widget can reach during its lifecycle hooks.
pub struct WidgetContext<'a> {
    identity: &'a Identity,
    env: &'a Environment,
    subscriptions: &'a mut Vec<Subscription>,
}

impl fmt::Debug for WidgetContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetContext")
            .field("id", &self.identity.id)
            .finish()
    }
}

impl<'a> WidgetContext<'a> {
    pub(crate) fn new(
        identity: &'a Identity,
        env: &'a Environment,
        subscriptions: &'a mut Vec<Subscription>,
    ) -> Self {
        Self {
            identity,
            env,
            subscriptions,
        }
    }

    /// The widget's identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        self.identity
    }

    /// The shared environment.
    #[must_use]
    pub const fn env(&self) -> &Environment {
        self.env
    }

    /// An [`Emitter`] bound to this widget, for use in callbacks.
    #[must_use]
    pub fn emitter(&self) -> Emitter {
        Emitter::new(self.env.events().clone(), self.identity.clone())
    }

    /// Subscribes to a bus event for the duration of the connection. The
    /// guard is held by the host and dropped at disconnect.
    pub fn listen(&mut self, name: impl Into<String>, listener: impl Fn(&Event) + 'static) {
        let subscription = self.env.events().subscribe(name, listener);
        self.subscriptions.push(subscription);
    }
}
