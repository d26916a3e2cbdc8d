//! Error types shared across the toolkit.
//!
//! The policy is split by where a failure faces:
//!
//! - attribute-level problems degrade — the widget logs a warning and keeps
//!   its default, rendering never halts ([`ValidationError`]);
//! - boundary problems (schema derivation, fetching) propagate to the
//!   caller as explicit `Result`s, defined next to the code that raises
//!   them;
//! - a missing optional collaborator is not an error at all — capability
//!   lookups return `Option` and absence is a silent no-op.

use thiserror::Error;

/// A malformed attribute value.
///
/// Raised by setter-table entries when a string value does not parse or is
/// out of range. The host logs it and keeps the previous/default value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value {value:?} for attribute `{attribute}`: {reason}")]
pub struct ValidationError {
    /// The attribute that rejected the value.
    pub attribute: &'static str,
    /// The offending string value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for `attribute`.
    pub fn new(
        attribute: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            attribute,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Failure reading or writing the persisted settings blob.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The underlying store could not be read or written.
    #[error("settings store unavailable: {0}")]
    Io(#[from] std::io::Error),
    /// The stored document is not valid JSON of the expected shape.
    #[error("malformed settings document: {0}")]
    Malformed(#[from] serde_json::Error),
}
