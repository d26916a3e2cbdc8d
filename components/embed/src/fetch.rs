//! The fetch abstraction and its HTTP implementation.

use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use thiserror::Error;

/// A fetched resource: its declared content type and textual body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The `Content-Type` header value, possibly with parameters.
    pub content_type: String,
    /// The resource body.
    pub body: String,
}

impl Resource {
    /// Creates a resource.
    pub fn new(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

/// Failure to retrieve a resource. These always propagate to the caller —
/// an inclusion widget must never swallow a fetch failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be performed at all.
    #[error("request to `{url}` failed: {message}")]
    Request {
        /// The requested URL.
        url: String,
        /// Transport-level detail.
        message: String,
    },
    /// The server answered with a non-success status.
    #[error("resource `{url}` returned status {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// No fetcher was installed in the environment.
    #[error("no fetcher is installed; cannot load `{url}`")]
    NoFetcher {
        /// The requested URL.
        url: String,
    },
}

/// Transport used by inclusion widgets. Futures are local: the toolkit is
/// single-threaded and fetches only suspend the including widget's own
/// continuation.
pub trait Fetch {
    /// Retrieves the resource at `url`.
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Resource, FetchError>>;
}

/// Environment handle carrying the installed fetcher.
#[derive(Clone)]
pub struct FetcherHandle(pub Rc<dyn Fetch>);

impl fmt::Debug for FetcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FetcherHandle")
    }
}

/// The bundled HTTP fetcher.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Resource, FetchError>> {
        let client = self.client.clone();
        let url = url.to_owned();
        Box::pin(async move {
            let response = client.get(&url).send().await.map_err(|err| {
                FetchError::Request {
                    url: url.clone(),
                    message: err.to_string(),
                }
            })?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("text/plain")
                .to_owned();
            let body = response.text().await.map_err(|err| FetchError::Request {
                url: url.clone(),
                message: err.to_string(),
            })?;
            Ok(Resource { content_type, body })
        })
    }
}
