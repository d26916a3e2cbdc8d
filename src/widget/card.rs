//! A card: a styled container grouping related content.

use trellis_core::dom::{Element, Node};
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::widget::{AttributeSetter, Widget, WidgetContext};

/// A container with an optional header, rendered elevated from the
/// surface behind it.
#[derive(Debug, Default)]
pub struct Card {
    title: String,
    content: Vec<Node>,
}

impl Card {
    /// Creates a card with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: Vec::new(),
        }
    }

    fn set_title(&mut self, value: &str) -> Result<(), ValidationError> {
        self.title = value.to_owned();
        Ok(())
    }

    /// Replaces the card's body content.
    pub fn set_content(&mut self, content: Vec<Node>) {
        self.content = content;
    }
}

impl Widget for Card {
    const TAG: &'static str = "content-card";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[AttributeSetter {
        name: "title",
        apply: Card::set_title,
    }];

    fn connected(&mut self, _ctx: &mut WidgetContext<'_>) {}

    fn render(&self, _env: &Environment) -> Element {
        let mut root = Element::new(Self::TAG).with_attr("role", "group");
        if !self.title.is_empty() {
            root.append(Element::new("header").with_child(Element::new("h3").with_text(self.title.clone())));
        }
        let mut body = Element::new("div").with_attr("data-slot", "body");
        for node in &self.content {
            body.append(node.clone());
        }
        root.append(body);
        root
    }
}

/// Convenience constructor.
#[must_use]
pub fn card(title: impl Into<String>) -> Card {
    Card::new(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::lifecycle::Host;

    #[test]
    fn renders_header_and_body_slot() {
        let env = Environment::new();
        let mut host = Host::new(Card::new("Stats"), &env);
        host.attach(&[]);
        host.widget_mut()
            .set_content(vec![Node::text("hello")]);
        host.refresh();

        let root = host.root();
        assert_eq!(root.find(&|e| e.tag() == "h3").unwrap().text_content(), "Stats");
        assert_eq!(
            root.find_by_attr("data-slot", "body").unwrap().text_content(),
            "hello"
        );
    }

    #[test]
    fn untitled_cards_skip_the_header() {
        let env = Environment::new();
        let mut host = Host::new(Card::default(), &env);
        host.attach(&[]);
        assert!(host.root().find(&|e| e.tag() == "header").is_none());
    }
}
