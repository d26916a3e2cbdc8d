//! Core runtime for the Trellis widget toolkit.
//!
//! This crate provides everything a widget needs to exist without saying
//! anything about what the widget looks like: a light element tree to render
//! into, an [`Environment`] carrying shared services, a synchronous event
//! bus with scoped subscriptions, a per-tag identity registry, and the
//! [`Host`] driver that walks every widget through the same lifecycle state
//! machine.
//!
//! Widgets implement the [`Widget`] trait: a fixed tag name, an enumerated
//! attribute setter table, lifecycle hooks, and a render function. The host
//! owns the rest — identity assignment, attribute bookkeeping, event
//! emission, and subscription cleanup on disconnect.

pub mod bus;
pub mod dom;
pub mod env;
pub mod error;
pub mod event;
pub mod id;
pub mod lifecycle;
pub mod settings;
pub mod widget;

pub use dom::{Element, Node};
pub use env::{Environment, Page};
pub use error::ValidationError;
pub use event::{Event, EventBus, Payload, Subscription};
pub use lifecycle::{Host, Phase};
pub use widget::{AttributeSetter, Emitter, Identity, Widget, WidgetContext};

#[cfg(test)]
mod tests;
