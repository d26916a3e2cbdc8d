//! A horizontal navigation bar.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use trellis_core::bus::{BusMessage, MessageBus, UiMeta};
use trellis_core::dom::Element;
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::event;
use trellis_core::widget::{AttributeSetter, Emitter, Widget, WidgetContext};

/// One navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    /// The visible label.
    pub label: String,
    /// The destination.
    pub href: String,
}

/// A `nav` element listing entries, with one selectable at a time.
///
/// Selection emits `value-change` with the chosen entry and forwards it
/// to the message bus when the collaborator is present.
pub struct NavBar {
    entries: Vec<NavEntry>,
    selected: Option<String>,
    emitter: Option<Emitter>,
    bus: Option<Rc<dyn MessageBus>>,
}

impl std::fmt::Debug for NavBar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavBar")
            .field("entries", &self.entries.len())
            .field("selected", &self.selected)
            .finish()
    }
}

impl Default for NavBar {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            selected: None,
            emitter: None,
            bus: None,
        }
    }
}

impl NavBar {
    /// Creates a bar with the given entries.
    #[must_use]
    pub fn new(entries: Vec<NavEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    fn set_entries(&mut self, value: &str) -> Result<(), ValidationError> {
        self.entries = serde_json::from_str(value)
            .map_err(|err| ValidationError::new("entries", value, err.to_string()))?;
        Ok(())
    }

    fn set_selected(&mut self, value: &str) -> Result<(), ValidationError> {
        self.selected = Some(value.to_owned());
        Ok(())
    }

    /// The entry currently marked selected.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Selects the entry with the given `href`, announcing the change.
    ///
    /// Unknown destinations are recovered locally with a warning.
    pub fn select(&mut self, href: &str) {
        let Some(entry) = self.entries.iter().find(|entry| entry.href == href) else {
            warn!(href, "ignoring selection of an unknown destination");
            return;
        };
        let entry = entry.clone();
        self.selected = Some(entry.href.clone());
        if let Some(emitter) = &self.emitter {
            let data = json!({"label": entry.label, "href": entry.href});
            if let Some(bus) = &self.bus {
                let identity = emitter.identity();
                bus.send(&BusMessage {
                    topic: format!("navigate/{}", identity.id),
                    payload: data.clone(),
                    ui: UiMeta {
                        id: identity.id.clone(),
                        name: identity.name.clone(),
                        tag: identity.tag.to_owned(),
                    },
                });
            }
            emitter.emit(event::VALUE_CHANGE, Some(data));
        }
    }
}

impl Widget for NavBar {
    const TAG: &'static str = "nav-bar";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[
        AttributeSetter {
            name: "entries",
            apply: NavBar::set_entries,
        },
        AttributeSetter {
            name: "selected",
            apply: NavBar::set_selected,
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
        let mut list = Element::new("ul");
        for entry in &self.entries {
            let mut anchor = Element::new("a")
                .with_attr("href", entry.href.clone())
                .with_text(entry.label.clone());
            if self.selected.as_deref() == Some(entry.href.as_str()) {
                anchor.set_attribute("aria-current", "page");
            }
            list.append(Element::new("li").with_child(anchor));
        }
        Element::new(Self::TAG).with_child(Element::new("nav").with_child(list))
    }
}

/// Convenience constructor.
#[must_use]
pub fn nav_bar(entries: Vec<NavEntry>) -> NavBar {
    NavBar::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use trellis_core::bus::RecordingBus;
    use trellis_core::lifecycle::Host;

    fn entries_markup() -> &'static str {
        r#"[{"label": "Home", "href": "/"}, {"label": "Gauges", "href": "/gauges"}]"#
    }

    #[test]
    fn entries_render_with_the_selected_marker() {
        let env = Environment::new();
        let mut host = Host::new(NavBar::default(), &env);
        host.attach(&[("entries", entries_markup()), ("selected", "/gauges")]);

        let root = host.root();
        let current = root.find_by_attr("aria-current", "page").unwrap();
        assert_eq!(current.text_content(), "Gauges");
        assert_eq!(root.count(&|e| e.tag() == "li"), 2);
    }

    #[test]
    fn selection_emits_and_publishes() {
        let env = Environment::new();
        let bus = RecordingBus::new();
        env.install_bus(bus.clone());
        let changes = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let changes = changes.clone();
            env.events().subscribe("nav-bar:value-change", move |event| {
                changes.borrow_mut().push(event.payload.clone());
            })
        };

        let mut host = Host::new(NavBar::default(), &env);
        host.attach(&[("entries", entries_markup())]);
        host.widget_mut().select("/gauges");
        host.refresh();

        assert_eq!(host.widget().selected(), Some("/gauges"));
        assert_eq!(changes.borrow().len(), 1);
        let sent = bus.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload["href"], "/gauges");
    }

    #[test]
    fn unknown_destinations_are_ignored() {
        let env = Environment::new();
        let mut host = Host::new(NavBar::default(), &env);
        host.attach(&[("entries", entries_markup())]);
        host.widget_mut().select("/missing");
        assert_eq!(host.widget().selected(), None);
    }

    #[test]
    fn malformed_entries_markup_keeps_the_bar_empty() {
        let env = Environment::new();
        let mut host = Host::new(NavBar::default(), &env);
        host.attach(&[("entries", "not json")]);
        assert_eq!(host.root().count(&|e| e.tag() == "li"), 0);
    }
}
