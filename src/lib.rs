//! # Trellis
//!
//! A data-driven widget toolkit: self-contained visual widgets reacting
//! to attribute changes and lifecycle transitions, built over a shared
//! host runtime and a data-to-tree rendering core.
//!
//! The toolkit is split into focused crates, re-exported here:
//!
//! - [`trellis_core`] — the widget host runtime: light DOM, environment,
//!   events, identity, the lifecycle driver, message-bus and settings
//!   contracts;
//! - [`trellis_render`] — addressing, schema derivation, tree building,
//!   and change observation;
//! - [`trellis_controls`], [`trellis_data`], [`trellis_navigation`],
//!   [`trellis_embed`] — the widgets themselves;
//! - [`widget`] — widgets composed at this level: the content card and
//!   the console view.
//!
//! # Example
//!
//! ```
//! use trellis::prelude::*;
//! use serde_json::json;
//!
//! let env = Environment::new();
//! let mut table = Host::new(SmartTable::new(), &env);
//! table.attach(&[("name", "Readings")]);
//! table
//!     .widget_mut()
//!     .set_data(json!([{"sensor": "cabin", "value": 21.5}]))
//!     .expect("tabular data");
//! // `widget_mut` bypasses the attribute surface, so refresh the rendered
//! // root before inspecting it (see `Host::widget_mut`).
//! table.refresh();
//! assert!(table.root().find_by_attr("data-address", "R1C1").is_some());
//! ```

pub mod widget;

pub use trellis_controls as controls;
pub use trellis_core as core;
pub use trellis_data as data;
pub use trellis_embed as embed;
pub use trellis_navigation as navigation;
pub use trellis_render as render;

pub use tracing as log;

pub mod prelude {
    //! The commonly used surface, importable in one line.

    pub use trellis_core::bus::{BusMessage, MessageBus, UiMeta};
    pub use trellis_core::dom::{Element, Node};
    pub use trellis_core::env::{Environment, Page};
    pub use trellis_core::error::ValidationError;
    pub use trellis_core::event::{Event, EventBus, Payload, Subscription};
    pub use trellis_core::lifecycle::{Host, Phase};
    pub use trellis_core::settings::{FileStore, MemoryStore, Settings, SettingsStore};
    pub use trellis_core::widget::{AttributeSetter, Emitter, Identity, Widget, WidgetContext};

    pub use trellis_render::address::{cell_address, list_address, parse_cell_address};
    pub use trellis_render::observe::{ChangeKind, Observable};
    pub use trellis_render::schema::{ColumnSchema, SchemaError};
    pub use trellis_render::tree::{ListStyle, RenderedTree, TreeRenderer};

    pub use trellis_controls::{ActionButton, LedGauge, ThemeSwitch, ValueDial};
    pub use trellis_data::{DataList, SmartTable};
    pub use trellis_embed::{ContentInclude, Fetch, FetchError, HttpFetcher};
    pub use trellis_navigation::{NavBar, NavEntry};

    pub use crate::widget::{Card, ConsoleBuffer, ConsoleLayer, ConsoleView, card, console_view};
}
