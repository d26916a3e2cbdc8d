//! A button that publishes a structured message when pressed.

use std::rc::Rc;

use serde_json::Value;

use trellis_core::bus::{BusMessage, MessageBus, UiMeta};
use trellis_core::dom::Element;
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::event;
use trellis_core::widget::{AttributeSetter, Emitter, Widget, WidgetContext};

/// A push button assembling `{topic, payload, _ui}` on press.
///
/// When the message-bus collaborator is present the message is published
/// there; either way the widget emits `value-change` carrying the same
/// message, so embedders without a bus can still react.
pub struct ActionButton {
    label: String,
    topic: String,
    payload: Value,
    emitter: Option<Emitter>,
    bus: Option<Rc<dyn MessageBus>>,
}

impl std::fmt::Debug for ActionButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionButton")
            .field("label", &self.label)
            .field("topic", &self.topic)
            .finish()
    }
}

impl Default for ActionButton {
    fn default() -> Self {
        Self {
            label: String::new(),
            topic: String::new(),
            payload: Value::Null,
            emitter: None,
            bus: None,
        }
    }
}

impl ActionButton {
    /// Creates a button with the given label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    fn set_label(&mut self, value: &str) -> Result<(), ValidationError> {
        self.label = value.to_owned();
        Ok(())
    }

    fn set_topic(&mut self, value: &str) -> Result<(), ValidationError> {
        self.topic = value.to_owned();
        Ok(())
    }

    fn set_payload(&mut self, value: &str) -> Result<(), ValidationError> {
        self.payload = serde_json::from_str(value)
            .map_err(|err| ValidationError::new("payload", value, err.to_string()))?;
        Ok(())
    }

    /// Handles a press: assembles the message, publishes it when a bus is
    /// present, and emits `value-change`.
    pub fn press(&self) {
        let Some(emitter) = &self.emitter else {
            // Pressing a disconnected button does nothing observable.
            return;
        };
        let identity = emitter.identity();
        let message = BusMessage {
            topic: self.topic.clone(),
            payload: self.payload.clone(),
            ui: UiMeta {
                id: identity.id.clone(),
                name: identity.name.clone(),
                tag: identity.tag.to_owned(),
            },
        };
        if let Some(bus) = &self.bus {
            bus.send(&message);
        }
        emitter.emit(event::VALUE_CHANGE, serde_json::to_value(&message).ok());
    }
}

impl Widget for ActionButton {
    const TAG: &'static str = "action-button";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[
        AttributeSetter {
            name: "label",
            apply: ActionButton::set_label,
        },
        AttributeSetter {
            name: "topic",
            apply: ActionButton::set_topic,
        },
        AttributeSetter {
            name: "payload",
            apply: ActionButton::set_payload,
        },
    ];

    fn connected(&mut self, ctx: &mut WidgetContext<'_>) {
        self.emitter = Some(ctx.emitter());
        self.bus = ctx.env().bus();
    }

    fn disconnected(&mut self, _ctx: &mut WidgetContext<'_>) {
        self.emitter = None;
        self.bus = None;
    }

    fn render(&self, _env: &Environment) -> Element {
        Element::new(Self::TAG).with_child(
            Element::new("button")
                .with_attr("type", "button")
                .with_attr("data-topic", self.topic.clone())
                .with_text(self.label.clone()),
        )
    }
}

/// Convenience constructor.
#[must_use]
pub fn action_button(label: impl Into<String>) -> ActionButton {
    ActionButton::new(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use trellis_core::bus::RecordingBus;
    use trellis_core::lifecycle::Host;

    #[test]
    fn press_publishes_topic_payload_and_ui_meta() {
        let env = Environment::new();
        let bus = RecordingBus::new();
        env.install_bus(bus.clone());

        let mut host = Host::new(ActionButton::new("Go"), &env);
        host.attach(&[
            ("name", "Launch"),
            ("topic", "actions/launch"),
            ("payload", r#"{"count": 3}"#),
        ]);
        host.widget().press();

        let sent = bus.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].topic, "actions/launch");
        assert_eq!(sent[0].payload, json!({"count": 3}));
        assert_eq!(sent[0].ui.id, "launch");
        assert_eq!(sent[0].ui.tag, "action-button");
    }

    #[test]
    fn press_without_a_bus_is_a_quiet_success() {
        let env = Environment::new();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let changes = changes.clone();
            env.events()
                .subscribe("action-button:value-change", move |event| {
                    changes.borrow_mut().push(event.payload.clone());
                })
        };

        let mut host = Host::new(ActionButton::new("Go"), &env);
        host.attach(&[("topic", "t")]);
        host.widget().press();

        let changes = changes.borrow();
        assert_eq!(changes.len(), 1);
        let data = changes[0].data.as_ref().unwrap();
        assert_eq!(data["topic"], "t");
        assert!(data.get("_ui").is_some());
    }

    #[test]
    fn malformed_payload_markup_keeps_the_default() {
        let env = Environment::new();
        let mut host = Host::new(ActionButton::new("Go"), &env);
        host.attach(&[("payload", "{not json")]);
        host.widget().press(); // no emitter assertions needed; must not panic
        assert_eq!(host.widget().payload, Value::Null);
    }
}
