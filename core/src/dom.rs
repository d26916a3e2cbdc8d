//! A light, owned element tree for widgets to render into.
//!
//! Trellis widgets do not talk to a real document. They build [`Element`]
//! values, and an embedding shell decides what to do with them — diff them
//! into a browser DOM, print them, or assert on them in tests. The tree is
//! deliberately small: tags, string attributes in insertion order, and
//! children.

use indexmap::IndexMap;

/// One item in an element's child list.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// A run of plain text.
    Text(String),
}

impl Node {
    /// Creates a text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Returns the contained element, if this node is one.
    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An element: a tag, ordered string attributes, and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an empty element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute assignment.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style child append.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.append(child);
        self
    }

    /// Builder-style text child append.
    #[must_use]
    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.with_child(Node::text(content))
    }

    /// The element's tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Looks up an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Sets an attribute, keeping first-set ordering for existing names.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// The attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// The element's children.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Appends a child node.
    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Replaces the children of this element — and only this element.
    /// Siblings and ancestors are untouched.
    pub fn replace_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    /// Removes all children.
    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Concatenates all descendant text, depth first.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Depth-first search over this element and its descendants.
    pub fn find(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if predicate(self) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| child.find(predicate))
    }

    /// Finds the first descendant (or self) carrying `name="value"`.
    #[must_use]
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<&Element> {
        self.find(&|element| element.attribute(name) == Some(value))
    }

    /// Counts descendants (or self) matching a predicate.
    pub fn count(&self, predicate: &dyn Fn(&Element) -> bool) -> usize {
        let mut total = usize::from(predicate(self));
        for child in self.children.iter().filter_map(Node::as_element) {
            total += child.count(predicate);
        }
        total
    }
}
