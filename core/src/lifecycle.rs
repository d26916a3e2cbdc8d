//! The host driver: one lifecycle state machine for every widget.
//!
//! A [`Host`] owns a widget and walks it through the phases every element
//! in the toolkit shares:
//!
//! ```text
//! Unattached -> AttributesInitializing -> Connected -> Disconnected
//!                                             ^              |
//!                                             +-- reattach --+
//! ```
//!
//! Attribute events fire during `AttributesInitializing`, before the first
//! connection, in markup order — not in setter-table order. Connecting
//! assigns a stable identity, wires listeners, and emits `connected` then
//! `ready` with identical payloads. Disconnecting drops every
//! subscription guard and never gives an instance number back.

use indexmap::IndexMap;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::bus::update_event_name;
use crate::dom::Element;
use crate::env::Environment;
use crate::event::{self, Event, Subscription};
use crate::id::slugify;
use crate::widget::{Identity, Widget, WidgetContext, setter_for};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Where a host currently is in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, never attached.
    Unattached,
    /// Markup attributes are being applied, before the first connection.
    AttributesInitializing,
    /// Live: listeners wired, identity assigned, rendered.
    Connected,
    /// Detached. May be re-attached later.
    Disconnected,
}

/// Drives one widget instance through the shared lifecycle.
pub struct Host<W: Widget> {
    widget: W,
    env: Environment,
    phase: Phase,
    identity: Option<Identity>,
    attributes: IndexMap<String, String>,
    subscriptions: Vec<Subscription>,
    pending_updates: Rc<RefCell<Vec<Value>>>,
    root: Element,
}

impl<W: Widget> fmt::Debug for Host<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("tag", &W::TAG)
            .field("phase", &self.phase)
            .field("id", &self.identity.as_ref().map(|i| i.id.as_str()))
            .finish()
    }
}

impl<W: Widget> Host<W> {
    /// Creates an unattached host around `widget`.
    pub fn new(widget: W, env: &Environment) -> Self {
        Self {
            widget,
            env: env.clone(),
            phase: Phase::Unattached,
            identity: None,
            attributes: IndexMap::new(),
            subscriptions: Vec::new(),
            pending_updates: Rc::new(RefCell::new(Vec::new())),
            root: Element::new(W::TAG),
        }
    }

    /// The current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The widget's stable identifier, once connected.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.id.as_str())
    }

    /// Borrows the hosted widget.
    #[must_use]
    pub const fn widget(&self) -> &W {
        &self.widget
    }

    /// Mutably borrows the hosted widget, for property-style access that
    /// bypasses the attribute surface. Call [`Host::refresh`] afterwards
    /// if the mutation affects rendering.
    pub const fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// The most recently rendered tree.
    #[must_use]
    pub const fn root(&self) -> &Element {
        &self.root
    }

    /// The current value of a markup attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attaches the host: applies `markup` attributes in the given order
    /// (the markup/DOM order), then connects.
    pub fn attach(&mut self, markup: &[(&str, &str)]) {
        if self.phase == Phase::Connected {
            warn!(tag = W::TAG, "attach ignored: host is already connected");
            return;
        }
        self.phase = Phase::AttributesInitializing;
        for (name, value) in markup {
            self.attributes.insert((*name).to_owned(), (*value).to_owned());
            Self::apply_setter(&mut self.widget, name, value);
        }
        self.connect();
    }

    fn connect(&mut self) {
        let identity = match self.identity.take() {
            // Re-attachment keeps the identity assigned on first connect.
            Some(existing) => existing,
            None => {
                let name = self.attributes.get("name").cloned();
                let slug = name.as_deref().map(slugify).unwrap_or_default();
                let id = if slug.is_empty() {
                    self.env.registry().next_id(W::TAG)
                } else {
                    slug
                };
                Identity {
                    tag: W::TAG,
                    id,
                    name,
                }
            }
        };

        // The inbound update contract is only wired when the external
        // collaborator is actually present.
        if self.env.bus().is_some() {
            let pending = self.pending_updates.clone();
            let subscription = self
                .env
                .events()
                .subscribe(update_event_name(&identity.id), move |event: &Event| {
                    if let Some(data) = &event.payload.data {
                        pending.borrow_mut().push(data.clone());
                    }
                });
            self.subscriptions.push(subscription);
        }

        {
            let mut ctx =
                WidgetContext::new(&identity, &self.env, &mut self.subscriptions);
            self.widget.connected(&mut ctx);
        }

        self.phase = Phase::Connected;
        debug!(tag = W::TAG, id = %identity.id, "connected");

        let payload = identity.payload();
        for kind in [event::CONNECTED, event::READY] {
            self.env.events().emit(&Event::new(
                event::event_name(W::TAG, kind),
                payload.clone(),
            ));
        }

        self.identity = Some(identity);
        self.refresh();
    }

    /// Changes one attribute.
    ///
    /// While connected: an exact string match is a no-op; otherwise the
    /// setter-table entry runs, `attribChanged` is emitted with
    /// `{attribute, oldVal, newVal}`, and the host re-renders. Before
    /// connection the value is staged silently, as if it had been markup.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if self.phase != Phase::Connected {
            self.attributes.insert(name.to_owned(), value.to_owned());
            Self::apply_setter(&mut self.widget, name, value);
            return;
        }

        let old = self.attributes.get(name).cloned();
        if old.as_deref() == Some(value) {
            return;
        }
        self.attributes.insert(name.to_owned(), value.to_owned());
        Self::apply_setter(&mut self.widget, name, value);
        self.emit(
            event::ATTRIB_CHANGED,
            Some(json!({
                "attribute": name,
                "oldVal": old,
                "newVal": value,
            })),
        );
        self.refresh();
    }

    /// Detaches the host: the widget unwires, every subscription guard is
    /// dropped, `disconnected` is emitted. Instance numbers are never
    /// returned to the registry.
    pub fn detach(&mut self) {
        if self.phase != Phase::Connected {
            return;
        }
        if let Some(identity) = self.identity.clone() {
            {
                let mut ctx =
                    WidgetContext::new(&identity, &self.env, &mut self.subscriptions);
                self.widget.disconnected(&mut ctx);
            }
            self.subscriptions.clear();
            self.phase = Phase::Disconnected;
            self.env.events().emit(&Event::new(
                event::event_name(W::TAG, event::DISCONNECTED),
                identity.payload(),
            ));
        }
    }

    /// Applies external updates received over the message-bus contract.
    ///
    /// Each queued payload may carry an `attributes` object; every entry
    /// goes through the normal [`Host::set_attribute`] path, so the usual
    /// comparison, mirroring, and notification rules apply.
    pub fn pump_external(&mut self) {
        let updates: Vec<Value> = self.pending_updates.borrow_mut().drain(..).collect();
        for update in updates {
            let Some(attributes) = update.get("attributes").and_then(Value::as_object) else {
                debug!(tag = W::TAG, "external update without attributes ignored");
                continue;
            };
            let pairs: Vec<(String, String)> = attributes
                .iter()
                .filter_map(|(name, value)| {
                    value.as_str().map(|v| (name.clone(), v.to_owned()))
                })
                .collect();
            for (name, value) in pairs {
                self.set_attribute(&name, &value);
            }
        }
    }

    /// Re-renders the widget into the host's root element.
    pub fn refresh(&mut self) {
        let mut root = self.widget.render(&self.env);
        if let Some(identity) = &self.identity {
            root.set_attribute("id", identity.id.clone());
        }
        self.root = root;
    }

    fn emit(&self, kind: &str, data: Option<Value>) {
        if let Some(identity) = &self.identity {
            let mut payload = identity.payload();
            payload.data = data;
            self.env
                .events()
                .emit(&Event::new(event::event_name(W::TAG, kind), payload));
        }
    }

    fn apply_setter(widget: &mut W, name: &str, value: &str) {
        if let Some(setter) = setter_for(W::ATTRIBUTES, name) {
            if let Err(err) = (setter.apply)(widget, value) {
                // Degrade, don't crash: keep the previous/default value.
                warn!(tag = W::TAG, %err, "attribute value rejected");
            }
        }
    }
}
