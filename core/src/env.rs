//! The environment: explicit, injected context for widgets.
//!
//! Instead of ambient globals, every host carries an [`Environment`] —
//! cheap to clone, shared by reference counting. It always provides the
//! event bus and the identity registry; optional collaborators (message
//! bus, settings store, fetchers, page descriptor) are installed into a
//! typed extension map and looked up by capability. A missing collaborator
//! is an `Option::None`, never an error.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::bus::{BusHandle, MessageBus};
use crate::event::EventBus;
use crate::id::Registry;
use crate::settings::{SettingsHandle, SettingsStore};

/// Describes the page a widget tree is mounted on. Settings persistence is
/// keyed by `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The page path, e.g. `/dashboard`.
    pub path: String,
}

impl Page {
    /// Creates a page descriptor.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Shared services and optional collaborators for a widget tree.
#[derive(Clone, Default)]
pub struct Environment {
    events: EventBus,
    registry: Rc<Registry>,
    extensions: Rc<RefCell<HashMap<TypeId, Rc<dyn Any>>>>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("events", &self.events)
            .field("extensions", &self.extensions.borrow().len())
            .finish()
    }
}

impl Environment {
    /// Creates an environment with a fresh event bus and identity registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The event bus all hosts in this environment emit on.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// The identity registry issuing per-tag instance numbers.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Installs a typed extension, replacing any previous value of the
    /// same type.
    pub fn insert<T: 'static>(&self, value: T) {
        self.extensions
            .borrow_mut()
            .insert(TypeId::of::<T>(), Rc::new(value));
    }

    /// Looks up a typed extension.
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<Rc<T>> {
        self.extensions
            .borrow()
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|any| any.downcast::<T>().ok())
    }

    /// Builder-style [`Environment::insert`].
    #[must_use]
    pub fn with<T: 'static>(self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Installs the optional message-bus collaborator.
    pub fn install_bus(&self, bus: impl MessageBus + 'static) {
        self.insert(BusHandle(Rc::new(bus)));
    }

    /// The message-bus collaborator, when one is present.
    #[must_use]
    pub fn bus(&self) -> Option<Rc<dyn MessageBus>> {
        self.get::<BusHandle>().map(|handle| handle.0.clone())
    }

    /// Installs the settings store.
    pub fn install_settings(&self, store: impl SettingsStore + 'static) {
        self.insert(SettingsHandle(Rc::new(store)));
    }

    /// The settings store, when one is present.
    #[must_use]
    pub fn settings(&self) -> Option<Rc<dyn SettingsStore>> {
        self.get::<SettingsHandle>().map(|handle| handle.0.clone())
    }

    /// The page descriptor, defaulting to `/` when none was installed.
    #[must_use]
    pub fn page(&self) -> Page {
        self.get::<Page>()
            .map(|page| (*page).clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_typed_and_replaceable() {
        #[derive(Debug, PartialEq)]
        struct Flag(u8);

        let env = Environment::new();
        assert!(env.get::<Flag>().is_none());
        env.insert(Flag(1));
        env.insert(Flag(2));
        assert_eq!(*env.get::<Flag>().unwrap(), Flag(2));
    }

    #[test]
    fn clones_share_services() {
        let env = Environment::new();
        let clone = env.clone();
        let id = env.registry().next_id("probe");
        assert_eq!(id, "probe-1");
        assert_eq!(clone.registry().next_id("probe"), "probe-2");
    }

    #[test]
    fn page_defaults_to_root() {
        let env = Environment::new();
        assert_eq!(env.page(), Page::new("/"));
        env.insert(Page::new("/gauges"));
        assert_eq!(env.page().path, "/gauges");
    }
}
