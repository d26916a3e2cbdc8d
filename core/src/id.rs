//! Stable widget identity.
//!
//! Identifiers come from one of two places: a slugified `name` attribute,
//! or a per-tag monotonic counter held by the [`Registry`]. The registry is
//! an injected service carried by the environment rather than an ambient
//! global, so a test gets a fresh, resettable numbering by constructing a
//! fresh environment.
//!
//! Counters never decrement and never reset within a registry's lifetime:
//! detaching a widget does not free its number, which rules out identifier
//! reuse for the life of the page session.

use std::cell::RefCell;
use std::collections::HashMap;

/// Per-tag-name monotonic instance numbering.
#[derive(Debug, Default)]
pub struct Registry {
    counters: RefCell<HashMap<String, u64>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next identifier for `tag`, shaped `{tag}-{n}` with `n`
    /// starting at 1.
    pub fn next_id(&self, tag: &str) -> String {
        let mut counters = self.counters.borrow_mut();
        let counter = counters.entry(tag.to_owned()).or_insert(0);
        *counter += 1;
        format!("{tag}-{counter}")
    }

    /// How many identifiers have been issued for `tag` so far.
    #[must_use]
    pub fn issued(&self, tag: &str) -> u64 {
        self.counters.borrow().get(tag).copied().unwrap_or(0)
    }
}

/// Reduces a display name to identifier characters: lowercased ASCII
/// alphanumerics with single dashes, no leading or trailing dash.
///
/// Returns an empty string when nothing survives; callers fall back to the
/// registry counter in that case.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
