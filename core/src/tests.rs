//! Lifecycle behavior tests, driven through a minimal probe widget.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::bus::{RecordingBus, update_event_name};
use crate::dom::Element;
use crate::env::Environment;
use crate::error::ValidationError;
use crate::event::{self, Event, Payload};
use crate::lifecycle::{Host, Phase};
use crate::widget::{AttributeSetter, Widget, WidgetContext};

#[derive(Default)]
struct Probe {
    label: String,
    level: u8,
    applied: Rc<RefCell<Vec<(String, String)>>>,
    pokes: Rc<std::cell::Cell<u32>>,
    connects: u32,
    disconnects: u32,
}

impl Probe {
    fn with_trace(applied: Rc<RefCell<Vec<(String, String)>>>) -> Self {
        Self {
            applied,
            ..Self::default()
        }
    }

    fn set_label(&mut self, value: &str) -> Result<(), ValidationError> {
        self.applied
            .borrow_mut()
            .push(("label".into(), value.into()));
        self.label = value.to_owned();
        Ok(())
    }

    fn set_level(&mut self, value: &str) -> Result<(), ValidationError> {
        self.applied
            .borrow_mut()
            .push(("level".into(), value.into()));
        let parsed = value
            .parse::<u8>()
            .map_err(|err| ValidationError::new("level", value, err.to_string()))?;
        self.level = parsed;
        Ok(())
    }
}

impl Widget for Probe {
    const TAG: &'static str = "probe-widget";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[
        AttributeSetter {
            name: "label",
            apply: Probe::set_label,
        },
        AttributeSetter {
            name: "level",
            apply: Probe::set_level,
        },
    ];

    fn connected(&mut self, ctx: &mut WidgetContext<'_>) {
        self.connects += 1;
        let pokes = self.pokes.clone();
        ctx.listen("probe-poke", move |_| pokes.set(pokes.get() + 1));
    }

    fn disconnected(&mut self, _ctx: &mut WidgetContext<'_>) {
        self.disconnects += 1;
    }

    fn render(&self, _env: &Environment) -> Element {
        Element::new(Self::TAG)
            .with_attr("data-level", self.level.to_string())
            .with_text(self.label.clone())
    }
}

fn record_events(env: &Environment, name: &str) -> (Rc<RefCell<Vec<Payload>>>, crate::Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sub = {
        let seen = seen.clone();
        env.events().subscribe(name.to_owned(), move |event: &Event| {
            seen.borrow_mut().push(event.payload.clone());
        })
    };
    (seen, sub)
}

#[test]
fn markup_attributes_apply_in_markup_order_before_connect() {
    let env = Environment::new();
    let applied = Rc::new(RefCell::new(Vec::new()));
    let mut host = Host::new(Probe::with_trace(applied.clone()), &env);

    // Markup order is level-then-label, the reverse of the setter table.
    host.attach(&[("level", "3"), ("label", "Fuel")]);

    assert_eq!(host.phase(), Phase::Connected);
    assert_eq!(
        *applied.borrow(),
        vec![
            ("level".to_owned(), "3".to_owned()),
            ("label".to_owned(), "Fuel".to_owned()),
        ]
    );
    assert_eq!(host.widget().connects, 1);
}

#[test]
fn connected_and_ready_fire_with_identical_payloads() {
    let env = Environment::new();
    let (connected, _s1) = record_events(&env, "probe-widget:connected");
    let (ready, _s2) = record_events(&env, "probe-widget:ready");

    let mut host = Host::new(Probe::default(), &env);
    host.attach(&[]);

    assert_eq!(connected.borrow().len(), 1);
    assert_eq!(ready.borrow().len(), 1);
    assert_eq!(connected.borrow()[0], ready.borrow()[0]);
    assert_eq!(connected.borrow()[0].id, "probe-widget-1");
}

#[test]
fn name_attribute_is_slugified_into_the_id() {
    let env = Environment::new();
    let mut host = Host::new(Probe::default(), &env);
    host.attach(&[("name", "Main Fuel Gauge")]);
    assert_eq!(host.id(), Some("main-fuel-gauge"));
}

#[test]
fn instance_numbers_survive_detach_and_never_repeat() {
    let env = Environment::new();
    let mut first = Host::new(Probe::default(), &env);
    first.attach(&[]);
    assert_eq!(first.id(), Some("probe-widget-1"));

    first.detach();
    assert_eq!(first.phase(), Phase::Disconnected);
    // Re-attachment keeps the assigned identity.
    first.attach(&[]);
    assert_eq!(first.id(), Some("probe-widget-1"));

    let mut second = Host::new(Probe::default(), &env);
    second.attach(&[]);
    assert_eq!(second.id(), Some("probe-widget-2"));
    assert_eq!(env.registry().issued("probe-widget"), 2);
}

#[test]
fn attribute_change_no_ops_on_identical_value() {
    let env = Environment::new();
    let (changes, _sub) = record_events(&env, "probe-widget:attribChanged");

    let mut host = Host::new(Probe::default(), &env);
    host.attach(&[("label", "A")]);

    host.set_attribute("label", "A");
    assert!(changes.borrow().is_empty());

    host.set_attribute("label", "B");
    let events = changes.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].data,
        Some(json!({"attribute": "label", "oldVal": "A", "newVal": "B"}))
    );
}

#[test]
fn attribute_change_updates_the_rendered_tree() {
    let env = Environment::new();
    let mut host = Host::new(Probe::default(), &env);
    host.attach(&[("level", "1")]);
    assert_eq!(host.root().attribute("data-level"), Some("1"));

    host.set_attribute("level", "7");
    assert_eq!(host.root().attribute("data-level"), Some("7"));
}

#[test]
fn invalid_attribute_values_degrade_to_the_previous_value() {
    let env = Environment::new();
    let mut host = Host::new(Probe::default(), &env);
    host.attach(&[("level", "5")]);

    host.set_attribute("level", "not-a-number");
    // The setter rejected the value; the widget keeps its last good state.
    assert_eq!(host.widget().level, 5);
    assert_eq!(host.phase(), Phase::Connected);
}

#[test]
fn detach_unwires_listeners_and_emits_disconnected() {
    let env = Environment::new();
    env.install_bus(RecordingBus::new());
    let (disconnects, _sub) = record_events(&env, "probe-widget:disconnected");

    let mut host = Host::new(Probe::default(), &env);
    host.attach(&[]);
    let update_event = update_event_name("probe-widget-1");
    assert_eq!(env.events().listener_count(&update_event), 1);

    host.detach();
    assert_eq!(env.events().listener_count(&update_event), 0);
    assert_eq!(disconnects.borrow().len(), 1);
    assert_eq!(host.widget().disconnects, 1);
}

#[test]
fn external_updates_flow_through_the_attribute_path() {
    let env = Environment::new();
    env.install_bus(RecordingBus::new());

    let mut host = Host::new(Probe::default(), &env);
    host.attach(&[("label", "old")]);

    env.events().emit(&Event::new(
        update_event_name("probe-widget-1"),
        Payload::new("external", None)
            .with_data(json!({"attributes": {"label": "fresh"}})),
    ));
    host.pump_external();

    assert_eq!(host.attribute("label"), Some("fresh"));
    assert_eq!(host.widget().label, "fresh");
}

#[test]
fn context_listeners_live_exactly_as_long_as_the_connection() {
    let env = Environment::new();
    let mut host = Host::new(Probe::default(), &env);
    host.attach(&[]);
    assert_eq!(env.events().listener_count("probe-poke"), 1);

    env.events()
        .emit(&Event::new("probe-poke", Payload::default()));
    assert_eq!(host.widget().pokes.get(), 1);

    host.detach();
    assert_eq!(env.events().listener_count("probe-poke"), 0);
    env.events()
        .emit(&Event::new("probe-poke", Payload::default()));
    assert_eq!(host.widget().pokes.get(), 1);
}

#[test]
fn without_a_bus_no_update_listener_is_wired() {
    let env = Environment::new();
    let mut host = Host::new(Probe::default(), &env);
    host.attach(&[]);
    assert_eq!(
        env.events()
            .listener_count(&update_event_name("probe-widget-1")),
        0
    );
}

#[test]
fn lifecycle_event_names_use_the_tag_prefix() {
    assert_eq!(event::event_name("probe-widget", event::READY), "probe-widget:ready");
}
