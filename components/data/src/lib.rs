//! Data-driven widgets: the list and the table.
//!
//! Both widgets are thin hosts over the rendering core. Data is assigned
//! wholesale through a setter — which rederives the table schema and
//! rebuilds the whole node tree — or mutated incrementally through the
//! change observer, which feeds the same full-rebuild path. There is no
//! incremental diffing; every mutation regenerates the visible structure.

pub mod data_list;
pub mod smart_table;

pub use data_list::{DataList, data_list};
pub use smart_table::{SmartTable, smart_table};

use trellis_render::ChangeKind;

pub(crate) fn kind_str(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Added => "added",
        ChangeKind::Modified => "modified",
        ChangeKind::Deleted => "deleted",
    }
}
