//! Building element trees from nested input data.
//!
//! The renderer walks an input value and produces two things in lockstep:
//! a flat arena of [`RenderNode`]s (stable address, display string, kind,
//! parent back-reference) and the element subtree that displays them.
//! Rendering into a container replaces the children of exactly that
//! container; nothing outside it is touched.
//!
//! Recursion is bounded: 2 levels for table semantics (rows and cells), 10
//! for list semantics. A collection sitting at the cap is serialized to
//! its JSON text with a logged warning instead of being descended into —
//! the guard trades fidelity for predictability and never raises.
//!
//! `update` is deliberately coarse: any reported mutation rebuilds the
//! whole visible structure. The changed path selects what gets logged,
//! not what gets rebuilt. Scoping the rebuild to the changed subtree is a
//! possible enhancement, not part of the contract.

use serde_json::Value;
use tracing::{debug, warn};

use trellis_core::dom::{Element, Node};

use crate::address::{PathSegment, cell_address, list_address};
use crate::schema::{ColumnSchema, SchemaError};

/// Depth cap for table semantics: rows, then cells.
pub const TABLE_DEPTH_CAP: usize = 2;
/// Depth cap for list semantics.
pub const LIST_DEPTH_CAP: usize = 10;

/// What a rendered node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A scalar leaf (or a capped collection rendered as text).
    Leaf,
    /// A collection entry with rendered children.
    Collection,
}

/// One rendered unit: a scalar leaf or a collection entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    /// Stable identifier for this node's position.
    pub address: String,
    /// The text shown for this node.
    pub display_value: String,
    /// Leaf or collection.
    pub kind: NodeKind,
    /// Address of the parent entry; `None` at the top level.
    pub parent: Option<String>,
}

/// The list container flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStyle {
    /// `ul` containers.
    #[default]
    Unordered,
    /// `ol` containers.
    Ordered,
    /// `dl` containers with `dt`/`dd` entries.
    Definition,
}

impl ListStyle {
    const fn container_tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
            Self::Definition => "dl",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Table { schema: Option<ColumnSchema> },
    List { style: ListStyle },
}

/// Builds [`RenderedTree`]s from input data.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRenderer {
    mode: Mode,
}

/// The output of a build: the node arena plus its element subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTree {
    nodes: Vec<RenderNode>,
    root: Element,
}

impl RenderedTree {
    /// The node arena, in document order.
    #[must_use]
    pub fn nodes(&self) -> &[RenderNode] {
        &self.nodes
    }

    /// Looks a node up by its address.
    #[must_use]
    pub fn node_at(&self, address: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.address == address)
    }

    /// The root of the generated element subtree.
    #[must_use]
    pub const fn root(&self) -> &Element {
        &self.root
    }
}

impl TreeRenderer {
    /// A table renderer that derives its schema from the data.
    #[must_use]
    pub const fn table() -> Self {
        Self {
            mode: Mode::Table { schema: None },
        }
    }

    /// A table renderer with an explicit, pinned schema.
    #[must_use]
    pub const fn table_with_schema(schema: ColumnSchema) -> Self {
        Self {
            mode: Mode::Table {
                schema: Some(schema),
            },
        }
    }

    /// A list renderer.
    #[must_use]
    pub const fn list(style: ListStyle) -> Self {
        Self {
            mode: Mode::List { style },
        }
    }

    /// Builds the node arena and element subtree for `data`.
    ///
    /// Synchronous and free of I/O. Table mode derives a schema from the
    /// first record when none was pinned; empty or non-tabular data is a
    /// [`SchemaError`]. List mode always succeeds.
    pub fn build(&self, data: &Value) -> Result<RenderedTree, SchemaError> {
        match &self.mode {
            Mode::Table { schema } => {
                let derived;
                let schema = match schema {
                    Some(pinned) => pinned,
                    None => {
                        derived = ColumnSchema::derive(data)?;
                        &derived
                    }
                };
                Ok(build_table(data, schema))
            }
            Mode::List { style } => Ok(build_list(data, *style)),
        }
    }

    /// Rebuilds after a mutation at `changed_path`.
    ///
    /// Baseline behavior: the entire structure downstream of the changed
    /// path's root ancestor is regenerated — which, at the depths this
    /// renderer supports, is the whole tree.
    pub fn update(
        &self,
        data: &Value,
        changed_path: &[PathSegment],
    ) -> Result<RenderedTree, SchemaError> {
        debug!(address = %list_address(changed_path), "rebuilding after change");
        self.build(data)
    }

    /// Inserts the generated subtree into `target`, replacing the prior
    /// children of that exact container only.
    pub fn render(tree: &RenderedTree, target: &mut Element) {
        target.replace_children(vec![Node::Element(tree.root.clone())]);
    }
}

fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| "…".into())
        }
    }
}

fn is_collection(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

fn build_table(data: &Value, schema: &ColumnSchema) -> RenderedTree {
    let rows = data.as_array().map_or(&[][..], Vec::as_slice);
    let mut nodes = Vec::new();

    let mut thead_row = Element::new("tr");
    for column in schema.columns() {
        thead_row.append(
            Element::new("th")
                .with_attr("data-col", column.id.clone())
                .with_text(column.display_name.clone()),
        );
    }

    let mut tbody = Element::new("tbody");
    for (row_index, record) in rows.iter().enumerate() {
        let row_number = row_index + 1;
        let row_address = format!("R{row_number}");
        nodes.push(RenderNode {
            address: row_address.clone(),
            display_value: String::new(),
            kind: NodeKind::Collection,
            parent: None,
        });

        let mut tr = Element::new("tr").with_attr("data-address", row_address.clone());
        for (col_index, _column) in schema.columns().iter().enumerate() {
            let address = cell_address(row_number, col_index + 1);
            let cell = schema.cell(record, col_index);
            let display = match cell {
                Some(value) if is_collection(value) => {
                    // Two-dimensional data is the table's limit; deeper
                    // values are carried as their JSON text.
                    warn!(%address, "cell value nested beyond table depth, stringifying");
                    display_string(value)
                }
                Some(value) => display_string(value),
                None => String::new(),
            };
            nodes.push(RenderNode {
                address: address.clone(),
                display_value: display.clone(),
                kind: NodeKind::Leaf,
                parent: Some(row_address.clone()),
            });
            tr.append(
                Element::new("td")
                    .with_attr("data-address", address)
                    .with_text(display),
            );
        }
        tbody.append(tr);
    }

    let root = Element::new("table")
        .with_child(Element::new("thead").with_child(thead_row))
        .with_child(tbody);
    RenderedTree { nodes, root }
}

fn build_list(data: &Value, style: ListStyle) -> RenderedTree {
    let mut nodes = Vec::new();
    let mut path = Vec::new();
    let root = list_container(data, style, &mut path, None, &mut nodes);
    RenderedTree { nodes, root }
}

fn list_container(
    value: &Value,
    style: ListStyle,
    path: &mut Vec<PathSegment>,
    parent: Option<&str>,
    nodes: &mut Vec<RenderNode>,
) -> Element {
    let mut container = Element::new(style.container_tag());
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                list_entry(&index.to_string(), item, style, path, parent, nodes, &mut container);
                path.pop();
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                path.push(PathSegment::Key(key.clone()));
                list_entry(key, item, style, path, parent, nodes, &mut container);
                path.pop();
            }
        }
        scalar => {
            let address = list_address(path);
            let display = display_string(scalar);
            nodes.push(RenderNode {
                address: address.clone(),
                display_value: display.clone(),
                kind: NodeKind::Leaf,
                parent: parent.map(str::to_owned),
            });
            match style {
                ListStyle::Definition => container.append(
                    Element::new("dd")
                        .with_attr("data-address", address)
                        .with_text(display),
                ),
                ListStyle::Unordered | ListStyle::Ordered => container.append(
                    Element::new("li")
                        .with_attr("data-address", address)
                        .with_text(display),
                ),
            }
        }
    }
    container
}

#[allow(clippy::too_many_arguments)]
fn list_entry(
    label: &str,
    value: &Value,
    style: ListStyle,
    path: &mut Vec<PathSegment>,
    parent: Option<&str>,
    nodes: &mut Vec<RenderNode>,
    container: &mut Element,
) {
    let address = list_address(path);
    let depth = path.len();

    if is_collection(value) {
        if depth >= LIST_DEPTH_CAP {
            // Structural recursion ends here; the subtree is carried as
            // its JSON text.
            warn!(%address, depth, "nesting beyond depth cap, stringifying");
            let display = display_string(value);
            nodes.push(RenderNode {
                address: address.clone(),
                display_value: display.clone(),
                kind: NodeKind::Leaf,
                parent: parent.map(str::to_owned),
            });
            append_leaf_entry(container, style, label, &display, &address);
            return;
        }

        nodes.push(RenderNode {
            address: address.clone(),
            display_value: label.to_owned(),
            kind: NodeKind::Collection,
            parent: parent.map(str::to_owned),
        });
        let nested = list_container(value, style, path, Some(&address), nodes);
        match style {
            ListStyle::Definition => {
                container.append(
                    Element::new("dt")
                        .with_attr("data-address", address.clone())
                        .with_text(label),
                );
                container.append(Element::new("dd").with_child(nested));
            }
            ListStyle::Unordered | ListStyle::Ordered => {
                container.append(
                    Element::new("li")
                        .with_attr("data-address", address)
                        .with_text(label)
                        .with_child(nested),
                );
            }
        }
        return;
    }

    let display = display_string(value);
    nodes.push(RenderNode {
        address: address.clone(),
        display_value: display.clone(),
        kind: NodeKind::Leaf,
        parent: parent.map(str::to_owned),
    });
    append_leaf_entry(container, style, label, &display, &address);
}

fn append_leaf_entry(
    container: &mut Element,
    style: ListStyle,
    label: &str,
    display: &str,
    address: &str,
) {
    match style {
        ListStyle::Definition => {
            container.append(
                Element::new("dt")
                    .with_attr("data-address", address)
                    .with_text(label),
            );
            container.append(Element::new("dd").with_text(display));
        }
        ListStyle::Unordered | ListStyle::Ordered => {
            container.append(
                Element::new("li")
                    .with_attr("data-address", address)
                    .with_text(format!("{label}: {display}")),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn building_twice_yields_identical_trees() {
        let data = json!({"a": [1, 2], "b": "x"});
        let renderer = TreeRenderer::list(ListStyle::Unordered);
        let first = renderer.build(&data).unwrap();
        let second = renderer.build(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn array_of_objects_renders_with_declared_keys_and_cell_addresses() {
        // Object keys become the column names; addresses stay positional.
        let data = json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}]);
        let tree = TreeRenderer::table().build(&data).unwrap();

        let headers: Vec<String> = tree
            .root()
            .find(&|e| e.tag() == "thead")
            .map(|thead| {
                thead.children()[0]
                    .as_element()
                    .unwrap()
                    .children()
                    .iter()
                    .filter_map(Node::as_element)
                    .map(Element::text_content)
                    .collect()
            })
            .unwrap();
        assert_eq!(headers, ["a", "b"]);

        for (address, expected) in [("R1C1", "1"), ("R1C2", "2"), ("R2C1", "3"), ("R2C2", "4")] {
            assert_eq!(
                tree.node_at(address).map(|n| n.display_value.as_str()),
                Some(expected),
                "node {address}"
            );
            let td = tree.root().find_by_attr("data-address", address).unwrap();
            assert_eq!(td.text_content(), expected);
        }
        assert_eq!(tree.node_at("R1C1").unwrap().parent.as_deref(), Some("R1"));
    }

    #[test]
    fn nested_map_renders_as_nested_list_within_cap() {
        let data = json!({"x": {"y": 1}});
        let tree = TreeRenderer::list(ListStyle::Unordered).build(&data).unwrap();

        let outer = tree.node_at("x").unwrap();
        assert_eq!(outer.kind, NodeKind::Collection);
        let inner = tree.node_at("x.y").unwrap();
        assert_eq!(inner.kind, NodeKind::Leaf);
        assert_eq!(inner.display_value, "1");
        assert_eq!(inner.parent.as_deref(), Some("x"));

        // Depth counter is two segments — comfortably inside the cap.
        assert!(tree.nodes().iter().all(|node| {
            node.address.split(crate::address::SEPARATOR).count() <= LIST_DEPTH_CAP
        }));
    }

    #[test]
    fn depth_guard_stringifies_instead_of_recursing() {
        // Build a chain nested well past the cap.
        let mut value = Value::String("bottom".into());
        for level in (0..15).rev() {
            let mut map = serde_json::Map::new();
            map.insert(format!("k{level}"), value);
            value = Value::Object(map);
        }
        let tree = TreeRenderer::list(ListStyle::Unordered).build(&value).unwrap();

        let max_depth = tree
            .nodes()
            .iter()
            .map(|node| node.address.split(crate::address::SEPARATOR).count())
            .max()
            .unwrap();
        assert_eq!(max_depth, LIST_DEPTH_CAP);

        let capped = tree
            .nodes()
            .iter()
            .find(|node| node.address.split(crate::address::SEPARATOR).count() == LIST_DEPTH_CAP)
            .unwrap();
        assert_eq!(capped.kind, NodeKind::Leaf);
        assert!(capped.display_value.contains("bottom"));
    }

    #[test]
    fn table_cells_nested_beyond_two_levels_are_stringified() {
        let data = json!([{"a": {"deep": true}}]);
        let tree = TreeRenderer::table().build(&data).unwrap();
        let cell = tree.node_at("R1C1").unwrap();
        assert_eq!(cell.kind, NodeKind::Leaf);
        assert_eq!(cell.display_value, "{\"deep\":true}");
    }

    #[test]
    fn sparse_records_render_blank_cells_under_the_first_schema() {
        let data = json!([{"a": 1, "b": 2}, {"a": 3}]);
        let tree = TreeRenderer::table().build(&data).unwrap();
        assert_eq!(tree.node_at("R2C2").unwrap().display_value, "");
    }

    #[test]
    fn render_replaces_only_the_target_container() {
        let data = json!(["one"]);
        let tree = TreeRenderer::list(ListStyle::Unordered).build(&data).unwrap();

        let mut target = Element::new("div")
            .with_attr("data-slot", "body")
            .with_text("stale");
        TreeRenderer::render(&tree, &mut target);
        assert_eq!(target.children().len(), 1);
        assert_eq!(target.children()[0].as_element().unwrap().tag(), "ul");
        // The container itself — tag and attributes — is untouched.
        assert_eq!(target.attribute("data-slot"), Some("body"));
    }

    #[test]
    fn update_rebuilds_the_whole_tree() {
        let renderer = TreeRenderer::list(ListStyle::Unordered);
        let before = renderer.build(&json!({"k": 1})).unwrap();
        let after = renderer
            .update(&json!({"k": 2}), &[PathSegment::from("k")])
            .unwrap();
        assert_ne!(before, after);
        assert_eq!(after.node_at("k").unwrap().display_value, "2");
    }

    #[test]
    fn definition_lists_split_terms_and_values() {
        let data = json!({"speed": 88});
        let tree = TreeRenderer::list(ListStyle::Definition).build(&data).unwrap();
        assert_eq!(tree.root().tag(), "dl");
        let dt = tree.root().find(&|e| e.tag() == "dt").unwrap();
        assert_eq!(dt.text_content(), "speed");
        let dd = tree.root().find(&|e| e.tag() == "dd").unwrap();
        assert_eq!(dd.text_content(), "88");
    }
}
