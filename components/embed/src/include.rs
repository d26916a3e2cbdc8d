//! The content inclusion widget.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;
use tracing::warn;

use trellis_core::dom::Element;
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::event;
use trellis_core::widget::{AttributeSetter, Emitter, Widget, WidgetContext};
use trellis_render::tree::{ListStyle, TreeRenderer};

use crate::fetch::{Fetch, FetchError, FetcherHandle, Resource};

/// How a fetched body is rendered, selected by content-type sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderModeKind {
    /// Raw markup, carried verbatim.
    Html,
    /// JSON, rendered through the list renderer.
    Json,
    /// Form-encoded pairs, rendered as a definition list.
    FormData,
    /// Anything else, shown as preformatted text.
    Text,
}

impl RenderModeKind {
    fn sniff(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        if essence.ends_with("html") {
            Self::Html
        } else if essence.ends_with("json") {
            Self::Json
        } else if essence == "application/x-www-form-urlencoded" || essence == "multipart/form-data"
        {
            Self::FormData
        } else {
            Self::Text
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
            Self::FormData => "form-data",
            Self::Text => "text",
        }
    }
}

/// What applying a fetch result did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The body was rendered in the given mode.
    Rendered(RenderModeKind),
    /// The response belonged to a superseded request (or there was
    /// nothing to load) and was discarded.
    Skipped,
}

/// A ticket for one in-flight load.
///
/// Every call to [`ContentInclude::begin_load`] supersedes all earlier
/// tickets: applying a result against a stale ticket discards it, so the
/// final content always corresponds to the latest-set `src` no matter
/// which response arrives last.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    /// The URL this load is for.
    pub url: String,
    generation: u64,
}

/// Includes remote content selected by the `src` attribute.
pub struct ContentInclude {
    src: String,
    generation: Cell<u64>,
    body: Rc<RefCell<Element>>,
    emitter: Option<Emitter>,
    fetcher: Option<Rc<dyn Fetch>>,
}

impl std::fmt::Debug for ContentInclude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentInclude")
            .field("src", &self.src)
            .finish()
    }
}

impl Default for ContentInclude {
    fn default() -> Self {
        Self {
            src: String::new(),
            generation: Cell::new(0),
            body: Rc::new(RefCell::new(Element::new("div"))),
            emitter: None,
            fetcher: None,
        }
    }
}

impl ContentInclude {
    /// Creates an include with no source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set_src(&mut self, value: &str) -> Result<(), ValidationError> {
        self.src = value.to_owned();
        Ok(())
    }

    /// The current source URL.
    #[must_use]
    pub fn src(&self) -> &str {
        &self.src
    }

    /// The live content container.
    #[must_use]
    pub fn body(&self) -> Element {
        self.body.borrow().clone()
    }

    /// Starts a load of the current `src`, superseding any load still in
    /// flight. Returns `None` when there is nothing to load.
    #[must_use]
    pub fn begin_load(&self) -> Option<LoadTicket> {
        if self.src.is_empty() {
            return None;
        }
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        Some(LoadTicket {
            url: self.src.clone(),
            generation,
        })
    }

    /// Applies a fetch result obtained for `ticket`.
    ///
    /// Stale tickets — superseded by a later [`ContentInclude::begin_load`]
    /// — are discarded with a warning, success or failure alike. A fetch
    /// failure on the current ticket renders a visible error element
    /// *and* propagates, so callers cannot lose it silently.
    pub fn apply(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Resource, FetchError>,
    ) -> Result<LoadOutcome, FetchError> {
        if ticket.generation != self.generation.get() {
            warn!(url = %ticket.url, "discarding response for a superseded load");
            return Ok(LoadOutcome::Skipped);
        }
        let resource = match result {
            Ok(resource) => resource,
            Err(err) => {
                self.body.borrow_mut().replace_children(vec![
                    Element::new("p")
                        .with_attr("data-error", "fetch")
                        .with_text(err.to_string())
                        .into(),
                ]);
                return Err(err);
            }
        };

        let mode = RenderModeKind::sniff(&resource.content_type);
        let rendered = render_body(mode, &resource.body);
        self.body
            .borrow_mut()
            .replace_children(vec![rendered.into()]);
        if let Some(emitter) = &self.emitter {
            emitter.emit(
                event::CONTENT_LOADED,
                Some(json!({"url": ticket.url, "mode": mode.as_str()})),
            );
        }
        Ok(LoadOutcome::Rendered(mode))
    }

    /// Fetches and applies the current `src` in one step.
    pub async fn load(&mut self) -> Result<LoadOutcome, FetchError> {
        let Some(ticket) = self.begin_load() else {
            return Ok(LoadOutcome::Skipped);
        };
        let Some(fetcher) = self.fetcher.clone() else {
            return Err(FetchError::NoFetcher { url: ticket.url });
        };
        let result = fetcher.fetch(&ticket.url).await;
        self.apply(&ticket, result)
    }
}

fn render_body(mode: RenderModeKind, body: &str) -> Element {
    match mode {
        RenderModeKind::Html => Element::new("section")
            .with_attr("data-mode", "html")
            .with_text(body),
        RenderModeKind::Json => match serde_json::from_str(body) {
            Ok(value) => {
                let mut section = Element::new("section").with_attr("data-mode", "json");
                let renderer = TreeRenderer::list(ListStyle::Unordered);
                if let Ok(tree) = renderer.build(&value) {
                    TreeRenderer::render(&tree, &mut section);
                }
                section
            }
            Err(err) => {
                // A body that lied about being JSON still renders, as text.
                warn!(%err, "declared JSON did not parse, falling back to text");
                render_body(RenderModeKind::Text, body)
            }
        },
        RenderModeKind::FormData => {
            let mut list = Element::new("dl");
            // Pairs are split syntactically; percent-decoding is left to
            // the embedder.
            for pair in body.split('&').filter(|pair| !pair.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                list.append(Element::new("dt").with_text(key));
                list.append(Element::new("dd").with_text(value));
            }
            Element::new("section")
                .with_attr("data-mode", "form-data")
                .with_child(list)
        }
        RenderModeKind::Text => Element::new("pre")
            .with_attr("data-mode", "text")
            .with_text(body),
    }
}

impl Widget for ContentInclude {
    const TAG: &'static str = "content-include";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[AttributeSetter {
        name: "src",
        apply: ContentInclude::set_src,
    }];

    fn connected(&mut self, ctx: &mut WidgetContext<'_>) {
        self.emitter = Some(ctx.emitter());
        self.fetcher = ctx
            .env()
            .get::<FetcherHandle>()
            .map(|handle| handle.0.clone());
    }

    fn disconnected(&mut self, _ctx: &mut WidgetContext<'_>) {
        self.emitter = None;
        self.fetcher = None;
    }

    fn render(&self, _env: &Environment) -> Element {
        Element::new(Self::TAG).with_child(self.body.borrow().clone())
    }
}

/// Convenience constructor.
#[must_use]
pub fn content_include() -> ContentInclude {
    ContentInclude::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::future::{LocalBoxFuture, ready};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use trellis_core::lifecycle::Host;

    struct StubFetcher {
        responses: RefCell<HashMap<String, Result<Resource, FetchError>>>,
    }

    impl StubFetcher {
        fn new() -> Self {
            Self {
                responses: RefCell::new(HashMap::new()),
            }
        }

        fn insert(&self, url: &str, result: Result<Resource, FetchError>) {
            self.responses.borrow_mut().insert(url.to_owned(), result);
        }
    }

    impl Fetch for StubFetcher {
        fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Resource, FetchError>> {
            let result = self.responses.borrow().get(url).cloned().unwrap_or_else(|| {
                Err(FetchError::Status {
                    url: url.to_owned(),
                    status: 404,
                })
            });
            Box::pin(ready(result))
        }
    }

    fn attach_with_fetcher(env: &Environment, fetcher: Rc<StubFetcher>) -> Host<ContentInclude> {
        env.insert(FetcherHandle(fetcher));
        let mut host = Host::new(ContentInclude::new(), env);
        host.attach(&[]);
        host
    }

    #[test]
    fn json_bodies_render_through_the_list_renderer() {
        let env = Environment::new();
        let fetcher = Rc::new(StubFetcher::new());
        fetcher.insert(
            "/data",
            Ok(Resource::new("application/json", r#"{"k": 1}"#)),
        );
        let mut host = attach_with_fetcher(&env, fetcher.clone());
        host.set_attribute("src", "/data");

        let outcome = block_on(host.widget_mut().load()).unwrap();
        assert_eq!(outcome, LoadOutcome::Rendered(RenderModeKind::Json));
        let body = host.widget().body();
        assert_eq!(
            body.find_by_attr("data-address", "k").unwrap().text_content(),
            "k: 1"
        );
    }

    #[test]
    fn content_types_sniff_into_the_four_modes() {
        for (content_type, expected) in [
            ("text/html; charset=utf-8", RenderModeKind::Html),
            ("application/json", RenderModeKind::Json),
            ("application/x-www-form-urlencoded", RenderModeKind::FormData),
            ("text/csv", RenderModeKind::Text),
        ] {
            assert_eq!(RenderModeKind::sniff(content_type), expected, "{content_type}");
        }
    }

    #[test]
    fn form_bodies_render_as_definition_pairs() {
        let env = Environment::new();
        let fetcher = Rc::new(StubFetcher::new());
        fetcher.insert(
            "/form",
            Ok(Resource::new(
                "application/x-www-form-urlencoded",
                "a=1&b=two",
            )),
        );
        let mut host = attach_with_fetcher(&env, fetcher);
        host.set_attribute("src", "/form");
        block_on(host.widget_mut().load()).unwrap();

        let body = host.widget().body();
        let dl = body.find(&|e| e.tag() == "dl").unwrap();
        assert_eq!(dl.children().len(), 4);
        assert_eq!(dl.text_content(), "a1btwo");
    }

    #[test]
    fn fetch_failures_propagate_and_render_an_error() {
        let env = Environment::new();
        let fetcher = Rc::new(StubFetcher::new());
        fetcher.insert(
            "/missing",
            Err(FetchError::Status {
                url: "/missing".into(),
                status: 404,
            }),
        );
        let mut host = attach_with_fetcher(&env, fetcher);
        host.set_attribute("src", "/missing");

        let result = block_on(host.widget_mut().load());
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert!(host.widget().body().find_by_attr("data-error", "fetch").is_some());
    }

    #[test]
    fn latest_set_src_wins_when_responses_arrive_out_of_order() {
        let env = Environment::new();
        let fetcher = Rc::new(StubFetcher::new());
        let mut host = attach_with_fetcher(&env, fetcher);

        host.set_attribute("src", "/first");
        let first = host.widget().begin_load().unwrap();
        host.set_attribute("src", "/second");
        let second = host.widget().begin_load().unwrap();

        // The second request resolves before the first.
        let applied = host
            .widget_mut()
            .apply(&second, Ok(Resource::new("text/plain", "SECOND")))
            .unwrap();
        assert_eq!(applied, LoadOutcome::Rendered(RenderModeKind::Text));

        let stale = host
            .widget_mut()
            .apply(&first, Ok(Resource::new("text/plain", "FIRST")))
            .unwrap();
        assert_eq!(stale, LoadOutcome::Skipped);

        assert_eq!(host.widget().body().text_content(), "SECOND");
    }

    #[test]
    fn loading_emits_content_loaded() {
        let env = Environment::new();
        let loads = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let loads = loads.clone();
            env.events()
                .subscribe("content-include:content-loaded", move |event| {
                    loads.borrow_mut().push(event.payload.clone());
                })
        };
        let fetcher = Rc::new(StubFetcher::new());
        fetcher.insert("/page", Ok(Resource::new("text/html", "<h1>hi</h1>")));
        let mut host = attach_with_fetcher(&env, fetcher);
        host.set_attribute("src", "/page");
        block_on(host.widget_mut().load()).unwrap();

        let loads = loads.borrow();
        assert_eq!(loads.len(), 1);
        let data = loads[0].data.as_ref().unwrap();
        assert_eq!(data["mode"], "html");
        assert_eq!(data["url"], "/page");
    }

    #[test]
    fn loading_without_a_fetcher_is_an_explicit_error() {
        let env = Environment::new();
        let mut host = Host::new(ContentInclude::new(), &env);
        host.attach(&[("src", "/x")]);
        let result = block_on(host.widget_mut().load());
        assert!(matches!(result, Err(FetchError::NoFetcher { .. })));
    }
}
