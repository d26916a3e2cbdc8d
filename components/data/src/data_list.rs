//! A list rendering arbitrary nested data.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};

use trellis_core::dom::Element;
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::event;
use trellis_core::widget::{AttributeSetter, Emitter, Widget, WidgetContext};
use trellis_render::address::list_address;
use trellis_render::observe::Observable;
use trellis_render::tree::{ListStyle, TreeRenderer};

use crate::kind_str;

/// Renders a scalar, sequence, or keyed map as a nested list.
///
/// The `mode` attribute picks the container flavor (`ul`, `ol`, `dl`);
/// the `data` property takes any JSON value. Reassigning data rebuilds the
/// whole list and emits `dataChanged`; so does every mutation reported by
/// the observer returned from [`DataList::observe`].
pub struct DataList {
    style: ListStyle,
    data: Rc<RefCell<Value>>,
    body: Rc<RefCell<Element>>,
    emitter: Rc<RefCell<Option<Emitter>>>,
}

impl std::fmt::Debug for DataList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataList")
            .field("style", &self.style)
            .finish()
    }
}

impl Default for DataList {
    fn default() -> Self {
        Self {
            style: ListStyle::Unordered,
            data: Rc::new(RefCell::new(Value::Null)),
            body: Rc::new(RefCell::new(Element::new("div"))),
            emitter: Rc::new(RefCell::new(None)),
        }
    }
}

impl DataList {
    /// Creates a list with the given container flavor.
    #[must_use]
    pub fn new(style: ListStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    fn set_mode(&mut self, value: &str) -> Result<(), ValidationError> {
        self.style = match value {
            "ul" => ListStyle::Unordered,
            "ol" => ListStyle::Ordered,
            "dl" => ListStyle::Definition,
            other => {
                return Err(ValidationError::new(
                    "mode",
                    other,
                    "expected one of ul, ol, dl",
                ));
            }
        };
        rebuild(self.style, &self.data, &self.body);
        Ok(())
    }

    /// Assigns the data wholesale and rebuilds the visible structure.
    pub fn set_data(&mut self, value: Value) {
        *self.data.borrow_mut() = value;
        rebuild(self.style, &self.data, &self.body);
        if let Some(emitter) = self.emitter.borrow().as_ref() {
            emitter.emit(event::DATA_CHANGED, Some(json!({"action": "replaced"})));
        }
    }

    /// A clone of the current data.
    #[must_use]
    pub fn data(&self) -> Value {
        self.data.borrow().clone()
    }

    /// The live list container, re-rendered on every data change.
    #[must_use]
    pub fn body(&self) -> Element {
        self.body.borrow().clone()
    }

    /// Wraps the list's data in a change observer.
    ///
    /// Every mutation reported by the wrapper re-renders the list through
    /// the full-rebuild path and emits `dataChanged` with the changed
    /// address and mutation kind.
    #[must_use]
    pub fn observe(&self) -> Observable {
        let style = self.style;
        let data = self.data.clone();
        let body = self.body.clone();
        let emitter = self.emitter.clone();
        Observable::from_shared(self.data.clone(), move |path, _new_value, kind| {
            let renderer = TreeRenderer::list(style);
            if let Ok(tree) = renderer.update(&data.borrow(), path) {
                TreeRenderer::render(&tree, &mut body.borrow_mut());
            }
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

fn rebuild(style: ListStyle, data: &Rc<RefCell<Value>>, body: &Rc<RefCell<Element>>) {
    let renderer = TreeRenderer::list(style);
    if let Ok(tree) = renderer.build(&data.borrow()) {
        TreeRenderer::render(&tree, &mut body.borrow_mut());
    }
}

impl Widget for DataList {
    const TAG: &'static str = "data-list";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[AttributeSetter {
        name: "mode",
        apply: DataList::set_mode,
    }];

    fn connected(&mut self, ctx: &mut WidgetContext<'_>) {
        *self.emitter.borrow_mut() = Some(ctx.emitter());
        rebuild(self.style, &self.data, &self.body);
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
pub fn data_list(style: ListStyle) -> DataList {
    DataList::new(style)
}
