//! Navigation widgets.

pub mod nav_bar;

pub use nav_bar::{NavBar, NavEntry, nav_bar};
