//! The data-driven rendering core of the Trellis toolkit.
//!
//! Three pieces, layered bottom-up:
//!
//! - [`address`] — pure mapping between positions in nested input data and
//!   stable external identifier strings (`R{row}C{col}` for tables, dotted
//!   paths for lists), plus the inverse for the table convention.
//! - [`tree`] — walks an input value (scalar, sequence, or keyed map) into
//!   a flat node arena with stable addresses and an element subtree, with
//!   hard depth guards; re-rendering replaces the children of exactly one
//!   target container.
//! - [`observe`] — an explicit observable wrapper over a shared value:
//!   named `get`/`set`/`remove` methods, mutate-then-notify, one child
//!   scope level.
//!
//! Input data is `serde_json::Value` with insertion-ordered maps; display
//! order follows key order.

pub mod address;
pub mod observe;
pub mod schema;
pub mod tree;

pub use address::{CellRef, PathSegment, cell_address, list_address, parse_cell_address};
pub use observe::{ChangeKind, Fetched, Observable};
pub use schema::{Column, ColumnSchema, ColumnType, SchemaError};
pub use tree::{ListStyle, NodeKind, RenderNode, RenderedTree, TreeRenderer};
