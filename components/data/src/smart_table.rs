//! A table over an array of records.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};
use tracing::warn;

use trellis_core::dom::Element;
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::event;
use trellis_core::widget::{AttributeSetter, Emitter, Widget, WidgetContext};
use trellis_render::address::{list_address, parse_cell_address};
use trellis_render::observe::Observable;
use trellis_render::schema::{ColumnSchema, SchemaError};
use trellis_render::tree::TreeRenderer;

use crate::kind_str;

/// Renders an array of records as a table with stable cell addresses.
///
/// The column schema comes from the `columns` attribute when supplied,
/// otherwise it is derived from the first record at assignment time and
/// pinned — later records introducing new keys do not reshape it.
/// Assigning empty or non-tabular data surfaces a [`SchemaError`] to the
/// caller; there is no sensible default rendering for it.
pub struct SmartTable {
    data: Rc<RefCell<Value>>,
    schema: Rc<RefCell<Option<ColumnSchema>>>,
    pinned: bool,
    body: Rc<RefCell<Element>>,
    emitter: Rc<RefCell<Option<Emitter>>>,
}

impl std::fmt::Debug for SmartTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartTable")
            .field("pinned", &self.pinned)
            .finish()
    }
}

impl Default for SmartTable {
    fn default() -> Self {
        Self {
            data: Rc::new(RefCell::new(Value::Null)),
            schema: Rc::new(RefCell::new(None)),
            pinned: false,
            body: Rc::new(RefCell::new(Element::new("div"))),
            emitter: Rc::new(RefCell::new(None)),
        }
    }
}

impl SmartTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set_columns(&mut self, value: &str) -> Result<(), ValidationError> {
        let schema: ColumnSchema = serde_json::from_str(&format!("{{\"columns\":{value}}}"))
            .map_err(|err| ValidationError::new("columns", value, err.to_string()))?;
        *self.schema.borrow_mut() = Some(schema);
        self.pinned = true;
        rebuild(&self.schema, &self.data, &self.body);
        Ok(())
    }

    /// Assigns the record array wholesale.
    ///
    /// Unless columns were pinned, the schema is (re)derived from the
    /// first record. Empty or non-tabular data is an error the caller
    /// must handle.
    pub fn set_data(&mut self, value: Value) -> Result<(), SchemaError> {
        if !self.pinned {
            *self.schema.borrow_mut() = Some(ColumnSchema::derive(&value)?);
        }
        *self.data.borrow_mut() = value;
        rebuild(&self.schema, &self.data, &self.body);
        if let Some(emitter) = self.emitter.borrow().as_ref() {
            emitter.emit(event::DATA_CHANGED, Some(json!({"action": "replaced"})));
        }
        Ok(())
    }

    /// The schema currently in effect.
    #[must_use]
    pub fn schema(&self) -> Option<ColumnSchema> {
        self.schema.borrow().clone()
    }

    /// The live table container, re-rendered on every data change.
    #[must_use]
    pub fn body(&self) -> Element {
        self.body.borrow().clone()
    }

    /// Reports a click on the cell at `address`.
    ///
    /// Malformed addresses are recovered locally: a warning, no event.
    pub fn click_cell(&self, address: &str) {
        let Some(cell) = parse_cell_address(address) else {
            warn!(address, "ignoring click with malformed cell address");
            return;
        };
        let value = {
            let data = self.data.borrow();
            let schema = self.schema.borrow();
            data.as_array()
                .and_then(|rows| rows.get(cell.row - 1))
                .and_then(|record| {
                    schema
                        .as_ref()
                        .and_then(|s| s.cell(record, cell.col - 1))
                        .cloned()
                })
        };
        if let Some(emitter) = self.emitter.borrow().as_ref() {
            emitter.emit(
                event::SEGMENT_CLICK,
                Some(json!({
                    "address": address,
                    "row": cell.row,
                    "col": cell.col,
                    "value": value,
                })),
            );
        }
    }

    /// Wraps the table's data in a change observer.
    ///
    /// Mutations rebuild the whole table under the schema pinned at
    /// assignment time — observed changes never rederive columns.
    #[must_use]
    pub fn observe(&self) -> Observable {
        let data = self.data.clone();
        let schema = self.schema.clone();
        let body = self.body.clone();
        let emitter = self.emitter.clone();
        Observable::from_shared(self.data.clone(), move |path, _new_value, kind| {
            rebuild_shared(&schema, &data, &body, path);
            if let Some(emitter) = emitter.borrow().as_ref() {
                emitter.emit(
                    event::DATA_CHANGED,
                    Some(json!({
                        "address": list_address(path),
                        "kind": kind_str(kind),
                    })),
                );
            }
        })
    }
}

fn renderer(schema: &Rc<RefCell<Option<ColumnSchema>>>) -> Option<TreeRenderer> {
    schema
        .borrow()
        .clone()
        .map(TreeRenderer::table_with_schema)
}

fn rebuild(
    schema: &Rc<RefCell<Option<ColumnSchema>>>,
    data: &Rc<RefCell<Value>>,
    body: &Rc<RefCell<Element>>,
) {
    let Some(renderer) = renderer(schema) else {
        return;
    };
    if let Ok(tree) = renderer.build(&data.borrow()) {
        TreeRenderer::render(&tree, &mut body.borrow_mut());
    }
}

fn rebuild_shared(
    schema: &Rc<RefCell<Option<ColumnSchema>>>,
    data: &Rc<RefCell<Value>>,
    body: &Rc<RefCell<Element>>,
    path: &[trellis_render::address::PathSegment],
) {
    let Some(renderer) = renderer(schema) else {
        return;
    };
    if let Ok(tree) = renderer.update(&data.borrow(), path) {
        TreeRenderer::render(&tree, &mut body.borrow_mut());
    }
}

impl Widget for SmartTable {
    const TAG: &'static str = "smart-table";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[AttributeSetter {
        name: "columns",
        apply: SmartTable::set_columns,
    }];

    fn connected(&mut self, ctx: &mut WidgetContext<'_>) {
        *self.emitter.borrow_mut() = Some(ctx.emitter());
        rebuild(&self.schema, &self.data, &self.body);
    }

    fn disconnected(&mut self, _ctx: &mut WidgetContext<'_>) {
        self.emitter.borrow_mut().take();
    }

    fn render(&self, _env: &Environment) -> Element {
        Element::new(Self::TAG).with_child(self.body.borrow().clone())
    }
}

/// Convenience constructor.
#[must_use]
pub fn smart_table() -> SmartTable {
    SmartTable::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::lifecycle::Host;

    fn attached(env: &Environment) -> Host<SmartTable> {
        let mut host = Host::new(SmartTable::new(), env);
        host.attach(&[]);
        host
    }

    #[test]
    fn records_render_with_declared_keys_and_positional_addresses() {
        let env = Environment::new();
        let mut host = attached(&env);
        host.widget_mut()
            .set_data(json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}]))
            .unwrap();

        let body = host.widget().body();
        for (address, expected) in [("R1C1", "1"), ("R1C2", "2"), ("R2C1", "3"), ("R2C2", "4")] {
            assert_eq!(
                body.find_by_attr("data-address", address)
                    .map(|e| e.text_content()),
                Some(expected.to_owned()),
                "cell {address}"
            );
        }
        let ids: Vec<String> = host
            .widget()
            .schema()
            .unwrap()
            .columns()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn empty_data_surfaces_a_schema_error() {
        let env = Environment::new();
        let mut host = attached(&env);
        assert_eq!(
            host.widget_mut().set_data(json!([])),
            Err(SchemaError::Empty)
        );
        assert_eq!(
            host.widget_mut().set_data(json!("scalar")),
            Err(SchemaError::NotTabular)
        );
    }

    #[test]
    fn observed_row_mutation_rerenders_under_the_pinned_schema() {
        let env = Environment::new();
        let mut host = attached(&env);
        host.widget_mut()
            .set_data(json!([{"a": 1}, {"a": 2}]))
            .unwrap();

        let observer = host.widget().observe();
        // The replacement record carries an extra key; the pinned schema
        // keeps ignoring it.
        observer.set(1usize, json!({"a": 20, "zz": true}));

        let body = host.widget().body();
        assert_eq!(
            body.find_by_attr("data-address", "R2C1").unwrap().text_content(),
            "20"
        );
        assert_eq!(host.widget().schema().unwrap().len(), 1);
        assert!(body.find_by_attr("data-address", "R2C2").is_none());
    }

    #[test]
    fn cell_clicks_emit_with_the_parsed_reference() {
        let env = Environment::new();
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let clicks = clicks.clone();
            env.events()
                .subscribe("smart-table:segment-click", move |event| {
                    clicks.borrow_mut().push(event.payload.clone());
                })
        };

        let mut host = attached(&env);
        host.widget_mut()
            .set_data(json!([{"a": "hit"}]))
            .unwrap();

        host.widget().click_cell("R1C1");
        host.widget().click_cell("bogus");

        let clicks = clicks.borrow();
        assert_eq!(clicks.len(), 1);
        let data = clicks[0].data.as_ref().unwrap();
        assert_eq!(data["row"], 1);
        assert_eq!(data["col"], 1);
        assert_eq!(data["value"], "hit");
    }

    #[test]
    fn explicit_columns_override_derivation() {
        let env = Environment::new();
        let mut host = Host::new(SmartTable::new(), &env);
        host.attach(&[(
            "columns",
            r#"[{"id": "a", "display_name": "Alpha", "type": "number"}]"#,
        )]);
        host.widget_mut()
            .set_data(json!([{"a": 1, "b": 2}]))
            .unwrap();

        let schema = host.widget().schema().unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.columns()[0].display_name, "Alpha");
        assert!(host.widget().body().find_by_attr("data-address", "R1C2").is_none());
    }
}
