//! Remote content inclusion.
//!
//! [`ContentInclude`] loads the resource named by its `src` attribute and
//! renders it according to the sniffed content type. Fetching goes through
//! the [`Fetch`] abstraction so embedders (and tests) control transport;
//! [`HttpFetcher`] is the bundled HTTP implementation.

pub mod fetch;
pub mod include;

pub use fetch::{Fetch, FetchError, FetcherHandle, HttpFetcher, Resource};
pub use include::{ContentInclude, LoadOutcome, LoadTicket, RenderModeKind, content_include};
