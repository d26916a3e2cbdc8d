//! A drag-adjustable value dial.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{Value, json};
use tracing::warn;

use trellis_core::dom::Element;
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::event::{self, EventBus, Subscription};
use trellis_core::widget::{AttributeSetter, Emitter, Widget, WidgetContext};

use crate::parse_number;

/// Window-level event carrying pointer movement during a drag, with a
/// `dy` field in its data.
pub const POINTER_MOVE: &str = "window:pointermove";
/// Window-level event ending a drag.
pub const POINTER_UP: &str = "window:pointerup";

/// Holds the window-scoped listener pair for the duration of one drag.
///
/// Dropping the guard — on pointer up, or on host disconnect mid-drag —
/// removes both listeners. There is no code path that releases one
/// without the other.
#[derive(Debug)]
struct DragGuard {
    _movement: Subscription,
    _release: Subscription,
}

/// A rotary-style control adjusted by dragging.
///
/// A drag starts with [`ValueDial::pointer_down`], which acquires
/// window-scoped `pointermove`/`pointerup` listeners through a guard the
/// widget owns. Every movement clamps the value into `min..=max` and
/// emits `value-change`.
pub struct ValueDial {
    min: f64,
    max: f64,
    step: f64,
    value: Rc<Cell<f64>>,
    drag: Rc<RefCell<Option<DragGuard>>>,
    emitter: Rc<RefCell<Option<Emitter>>>,
    events: Option<EventBus>,
}

impl std::fmt::Debug for ValueDial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueDial")
            .field("value", &self.value.get())
            .field("dragging", &self.is_dragging())
            .finish()
    }
}

impl Default for ValueDial {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            step: 1.0,
            value: Rc::new(Cell::new(0.0)),
            drag: Rc::new(RefCell::new(None)),
            emitter: Rc::new(RefCell::new(None)),
            events: None,
        }
    }
}

impl ValueDial {
    /// Creates a dial over the default 0–100 range.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set_min(&mut self, value: &str) -> Result<(), ValidationError> {
        self.min = parse_number("min", value)?;
        Ok(())
    }

    fn set_max(&mut self, value: &str) -> Result<(), ValidationError> {
        self.max = parse_number("max", value)?;
        Ok(())
    }

    fn set_step(&mut self, value: &str) -> Result<(), ValidationError> {
        let step = parse_number("step", value)?;
        if step > 0.0 {
            self.step = step;
            Ok(())
        } else {
            Err(ValidationError::new("step", value, "expected a positive step"))
        }
    }

    fn set_value(&mut self, value: &str) -> Result<(), ValidationError> {
        self.value.set(parse_number("value", value)?);
        Ok(())
    }

    /// The current value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value.get()
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.borrow().is_some()
    }

    /// Begins a drag: acquires the window-scoped listener pair.
    ///
    /// Movement events adjust the value by `dy * step`, clamped into the
    /// dial's range; the pointer-up event releases the guard from inside
    /// its own listener.
    pub fn pointer_down(&self) {
        if self.is_dragging() {
            return;
        }
        let Some(events) = &self.events else {
            warn!("dial is not connected; ignoring pointer down");
            return;
        };

        let movement = {
            let value = self.value.clone();
            let emitter = self.emitter.clone();
            let (min, max, step) = (self.min, self.max, self.step);
            events.subscribe(POINTER_MOVE, move |event| {
                let Some(dy) = event
                    .payload
                    .data
                    .as_ref()
                    .and_then(|data| data.get("dy"))
                    .and_then(Value::as_f64)
                else {
                    return;
                };
                let next = (dy.mul_add(step, value.get())).clamp(min, max);
                if (next - value.get()).abs() > f64::EPSILON {
                    value.set(next);
                    if let Some(emitter) = emitter.borrow().as_ref() {
                        emitter.emit(event::VALUE_CHANGE, Some(json!({"value": next})));
                    }
                }
            })
        };
        let release = {
            let drag = self.drag.clone();
            events.subscribe(POINTER_UP, move |_| {
                drag.borrow_mut().take();
            })
        };
        *self.drag.borrow_mut() = Some(DragGuard {
            _movement: movement,
            _release: release,
        });
    }

    /// Ends a drag directly (the programmatic twin of the pointer-up
    /// event).
    pub fn pointer_up(&self) {
        self.drag.borrow_mut().take();
    }
}

impl Widget for ValueDial {
    const TAG: &'static str = "value-dial";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[
        AttributeSetter {
            name: "min",
            apply: ValueDial::set_min,
        },
        AttributeSetter {
            name: "max",
            apply: ValueDial::set_max,
        },
        AttributeSetter {
            name: "step",
            apply: ValueDial::set_step,
        },
        AttributeSetter {
            name: "value",
            apply: ValueDial::set_value,
        },
    ];

    fn connected(&mut self, ctx: &mut WidgetContext<'_>) {
        *self.emitter.borrow_mut() = Some(ctx.emitter());
        self.events = Some(ctx.env().events().clone());
    }

    fn disconnected(&mut self, _ctx: &mut WidgetContext<'_>) {
        // A drag in flight must not leak its window-level listeners past
        // the widget's lifetime.
        self.drag.borrow_mut().take();
        self.emitter.borrow_mut().take();
        self.events = None;
    }

    fn render(&self, _env: &Environment) -> Element {
        Element::new(Self::TAG).with_child(
            Element::new("div")
                .with_attr("role", "slider")
                .with_attr("aria-valuemin", self.min.to_string())
                .with_attr("aria-valuemax", self.max.to_string())
                .with_attr("aria-valuenow", self.value.get().to_string()),
        )
    }
}

/// Convenience constructor.
#[must_use]
pub fn value_dial() -> ValueDial {
    ValueDial::new()
}
