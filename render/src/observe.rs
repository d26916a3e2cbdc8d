//! Explicit change observation over shared input data.
//!
//! [`Observable`] wraps a value behind named `get`/`set`/`remove` methods
//! — mutations are explicit commands, not intercepted property writes, so
//! the "mutate triggers re-render" contract stays easy to reason about.
//!
//! Semantics:
//!
//! - the change callback runs **synchronously inside** the mutating call,
//!   strictly after the mutation has committed (mutate-then-notify; a
//!   panicking callback leaves the mutation in place);
//! - `get` of a nested collection hands back a lazily created child
//!   scope, but only one level below the outermost wrap — deeper
//!   collections come back as raw cloned values with a logged warning,
//!   matching the renderer's refusal to deal with data beyond two
//!   dimensions;
//! - out-of-range or missing targets are warnings and no-ops, never
//!   panics.

use std::fmt;
use std::rc::Rc;
use std::cell::RefCell;

use serde_json::Value;
use tracing::{debug, warn};

use crate::address::PathSegment;

/// What kind of mutation a change notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A key or element that did not exist before.
    Added,
    /// An existing entry's value changed.
    Modified,
    /// An entry was removed.
    Deleted,
}

/// The change callback: full path from the outermost wrap, the new value
/// (`None` for deletions), and the mutation kind.
pub type ChangeCallback = dyn Fn(&[PathSegment], Option<&Value>, ChangeKind);

/// What [`Observable::get`] hands back.
#[derive(Clone)]
pub enum Fetched {
    /// A scalar, or a collection too deep to scope — a raw clone.
    Value(Value),
    /// A nested collection wrapped as a child scope.
    Scope(Observable),
}

impl fmt::Debug for Fetched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Scope(_) => f.write_str("Scope(..)"),
        }
    }
}

impl Fetched {
    /// The raw value, when this is not a scope.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Scope(_) => None,
        }
    }

    /// The child scope, when there is one.
    #[must_use]
    pub fn into_scope(self) -> Option<Observable> {
        match self {
            Self::Scope(scope) => Some(scope),
            Self::Value(_) => None,
        }
    }
}

/// An observable wrapper around a shared value.
#[derive(Clone)]
pub struct Observable {
    root: Rc<RefCell<Value>>,
    on_change: Rc<ChangeCallback>,
    prefix: Vec<PathSegment>,
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl Observable {
    /// Wraps `value`, invoking `on_change` after every committed mutation.
    pub fn new(
        value: Value,
        on_change: impl Fn(&[PathSegment], Option<&Value>, ChangeKind) + 'static,
    ) -> Self {
        Self::from_shared(Rc::new(RefCell::new(value)), on_change)
    }

    /// Wraps an already-shared value; host widgets use this so the
    /// observable and the widget see the same data.
    pub fn from_shared(
        root: Rc<RefCell<Value>>,
        on_change: impl Fn(&[PathSegment], Option<&Value>, ChangeKind) + 'static,
    ) -> Self {
        Self {
            root,
            on_change: Rc::new(on_change),
            prefix: Vec::new(),
        }
    }

    /// A clone of the value as it currently stands.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.root.borrow().clone()
    }

    /// Reads one entry.
    ///
    /// A nested collection becomes a child scope when this observable is
    /// the outermost wrap; one level down, deeper collections are handed
    /// back raw with a warning instead.
    #[must_use]
    pub fn get(&self, key: impl Into<PathSegment>) -> Option<Fetched> {
        let segment = key.into();
        let root = self.root.borrow();
        let target = resolve(&root, &self.prefix)?;
        let value = fetch(target, &segment)?;
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            if self.prefix.is_empty() {
                let mut prefix = self.prefix.clone();
                prefix.push(segment);
                return Some(Fetched::Scope(Self {
                    root: self.root.clone(),
                    on_change: self.on_change.clone(),
                    prefix,
                }));
            }
            warn!(
                "collection nested more than one level below the wrap; returning the raw value"
            );
        }
        Some(Fetched::Value(value.clone()))
    }

    /// Writes one entry, then notifies.
    ///
    /// Map keys are inserted or overwritten; sequence indices may update
    /// an existing slot or append at `len`. Anything else is a warning
    /// and a no-op.
    pub fn set(&self, key: impl Into<PathSegment>, value: Value) {
        let segment = key.into();
        let kind = {
            let mut root = self.root.borrow_mut();
            let Some(target) = resolve_mut(&mut root, &self.prefix) else {
                warn!("observed path no longer resolves; ignoring set");
                return;
            };
            match (&mut *target, &segment) {
                (Value::Object(map), PathSegment::Key(key)) => {
                    let kind = if map.contains_key(key) {
                        ChangeKind::Modified
                    } else {
                        ChangeKind::Added
                    };
                    map.insert(key.clone(), value.clone());
                    kind
                }
                (Value::Array(items), PathSegment::Index(index)) => {
                    if *index < items.len() {
                        items[*index] = value.clone();
                        ChangeKind::Modified
                    } else if *index == items.len() {
                        items.push(value.clone());
                        ChangeKind::Added
                    } else {
                        warn!(index, len = items.len(), "index beyond append point; ignoring set");
                        return;
                    }
                }
                _ => {
                    warn!("set target is not a collection; ignoring");
                    return;
                }
            }
        };
        // The borrow is released before notifying, so the callback may
        // read the data it is being told about.
        let path = self.full_path(segment);
        debug!(?kind, "committed mutation");
        (self.on_change)(&path, Some(&value), kind);
    }

    /// Removes one entry, then notifies. Removing something absent is a
    /// no-op with no notification.
    pub fn remove(&self, key: impl Into<PathSegment>) {
        let segment = key.into();
        let removed = {
            let mut root = self.root.borrow_mut();
            let Some(target) = resolve_mut(&mut root, &self.prefix) else {
                warn!("observed path no longer resolves; ignoring remove");
                return;
            };
            match (&mut *target, &segment) {
                (Value::Object(map), PathSegment::Key(key)) => map.shift_remove(key).is_some(),
                (Value::Array(items), PathSegment::Index(index)) => {
                    if *index < items.len() {
                        items.remove(*index);
                        true
                    } else {
                        false
                    }
                }
                _ => false,
            }
        };
        if removed {
            let path = self.full_path(segment);
            (self.on_change)(&path, None, ChangeKind::Deleted);
        }
    }

    fn full_path(&self, segment: PathSegment) -> Vec<PathSegment> {
        let mut path = self.prefix.clone();
        path.push(segment);
        path
    }
}

fn resolve<'v>(root: &'v Value, prefix: &[PathSegment]) -> Option<&'v Value> {
    let mut current = root;
    for segment in prefix {
        current = fetch(current, segment)?;
    }
    Some(current)
}

fn resolve_mut<'v>(root: &'v mut Value, prefix: &[PathSegment]) -> Option<&'v mut Value> {
    let mut current = root;
    for segment in prefix {
        current = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key)?,
            (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

fn fetch<'v>(value: &'v Value, segment: &PathSegment) -> Option<&'v Value> {
    match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}
