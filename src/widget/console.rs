//! A widget mirroring `tracing` output.
//!
//! [`ConsoleLayer`] captures events into a bounded in-memory ring buffer,
//! keeping diagnostics out of whatever surface the embedder draws on;
//! [`ConsoleView`] renders that buffer as a log list with level badges.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use trellis_core::dom::Element;
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::widget::{AttributeSetter, Widget, WidgetContext};

const DEFAULT_CAPACITY: usize = 100;

/// Severity of one captured entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLevel {
    /// `ERROR` events.
    Error,
    /// `WARN` events.
    Warn,
    /// `INFO` events.
    Info,
    /// `DEBUG` events.
    Debug,
    /// `TRACE` events.
    Trace,
}

impl EntryLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl From<&Level> for EntryLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            Level::DEBUG => Self::Debug,
            Level::TRACE => Self::Trace,
        }
    }
}

/// One captured log event.
#[derive(Debug, Clone)]
pub struct ConsoleEntry {
    /// The event's severity.
    pub level: EntryLevel,
    /// The emitting module path.
    pub target: String,
    /// The formatted message.
    pub message: String,
}

/// Bounded, shared ring buffer of captured entries. Oldest entries are
/// evicted once the capacity is reached.
#[derive(Debug, Clone)]
pub struct ConsoleBuffer {
    entries: Arc<Mutex<VecDeque<ConsoleEntry>>>,
    capacity: usize,
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ConsoleBuffer {
    /// Creates a buffer holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn push(&self, entry: ConsoleEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }

    /// The captured entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<ConsoleEntry> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Empties the buffer.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

/// A `tracing` layer feeding a [`ConsoleBuffer`].
#[derive(Debug)]
pub struct ConsoleLayer {
    buffer: ConsoleBuffer,
}

impl ConsoleLayer {
    /// Creates a layer writing into `buffer`.
    #[must_use]
    pub const fn new(buffer: ConsoleBuffer) -> Self {
        Self { buffer }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        self.buffer.push(ConsoleEntry {
            level: EntryLevel::from(metadata.level()),
            target: metadata.target().to_owned(),
            message,
        });
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
            // Debug formatting quotes plain strings.
            if self.0.starts_with('"') && self.0.ends_with('"') && self.0.len() >= 2 {
                *self.0 = self.0[1..self.0.len() - 1].to_owned();
            }
        }
    }
}

/// Renders the captured log as a list with level badges.
pub struct ConsoleView {
    buffer: ConsoleBuffer,
    limit: usize,
}

impl std::fmt::Debug for ConsoleView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleView")
            .field("limit", &self.limit)
            .finish()
    }
}

impl ConsoleView {
    /// Creates a view over `buffer`.
    #[must_use]
    pub fn new(buffer: ConsoleBuffer) -> Self {
        Self {
            buffer,
            limit: DEFAULT_CAPACITY,
        }
    }

    fn set_limit(&mut self, value: &str) -> Result<(), ValidationError> {
        let limit: usize = value
            .trim()
            .parse()
            .map_err(|_| ValidationError::new("limit", value, "expected a row count"))?;
        if limit == 0 {
            return Err(ValidationError::new("limit", value, "expected at least one row"));
        }
        self.limit = limit;
        Ok(())
    }

    /// The shared buffer this view renders.
    #[must_use]
    pub const fn buffer(&self) -> &ConsoleBuffer {
        &self.buffer
    }

    /// Clears the mirrored log.
    pub fn clear(&self) {
        self.buffer.clear();
    }
}

impl Widget for ConsoleView {
    const TAG: &'static str = "console-view";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[AttributeSetter {
        name: "limit",
        apply: ConsoleView::set_limit,
    }];

    fn connected(&mut self, _ctx: &mut WidgetContext<'_>) {}

    fn render(&self, _env: &Environment) -> Element {
        let entries = self.buffer.entries();
        let skip = entries.len().saturating_sub(self.limit);
        let mut list = Element::new("ol").with_attr("data-role", "log");
        for entry in entries.iter().skip(skip) {
            list.append(
                Element::new("li")
                    .with_attr("data-level", entry.level.as_str())
                    .with_child(
                        Element::new("span")
                            .with_attr("data-slot", "badge")
                            .with_text(entry.level.as_str()),
                    )
                    .with_text(entry.message.clone()),
            );
        }
        Element::new(Self::TAG).with_child(list)
    }
}

/// Convenience constructor.
#[must_use]
pub fn console_view(buffer: ConsoleBuffer) -> ConsoleView {
    ConsoleView::new(buffer)
}
