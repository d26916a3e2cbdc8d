//! The optional message-bus collaborator.
//!
//! When an external publish/subscribe object is present, widgets publish a
//! structured message on user interaction and receive external updates
//! through a bus-named event. The toolkit's only obligation is the exact
//! message shape and event name; when no collaborator is installed, every
//! helper is a silent no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

/// Metadata attached to every outbound message under the `_ui` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiMeta {
    /// Stable identifier of the originating widget.
    pub id: String,
    /// The widget's `name` attribute, if any.
    pub name: Option<String>,
    /// The originating widget's tag name.
    pub tag: String,
}

/// The message widgets publish: serializes to `{topic, payload, _ui}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusMessage {
    /// Routing topic.
    pub topic: String,
    /// Interaction payload.
    pub payload: Value,
    /// Originating-widget metadata.
    #[serde(rename = "_ui")]
    pub ui: UiMeta,
}

/// The external collaborator's narrow publish contract.
pub trait MessageBus {
    /// Publishes one message.
    fn send(&self, message: &BusMessage);
}

/// Name of the inbound update event for widget `id`.
///
/// The exact shape is part of the wire contract with the collaborating
/// ecosystem and must not change.
#[must_use]
pub fn update_event_name(id: &str) -> String {
    format!("uibuilder:msg:_ui:update:{id}")
}

pub(crate) struct BusHandle(pub(crate) Rc<dyn MessageBus>);

impl fmt::Debug for BusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BusHandle")
    }
}

/// A [`MessageBus`] that records every message, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingBus {
    sent: RefCell<Vec<BusMessage>>,
}

impl RecordingBus {
    /// Creates an empty recording bus. Install it behind an `Rc` to keep a
    /// handle for later inspection.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// The messages sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<BusMessage> {
        self.sent.borrow().clone()
    }
}

impl MessageBus for RecordingBus {
    fn send(&self, message: &BusMessage) {
        self.sent.borrow_mut().push(message.clone());
    }
}

impl MessageBus for Rc<RecordingBus> {
    fn send(&self, message: &BusMessage) {
        self.as_ref().send(message);
    }
}
