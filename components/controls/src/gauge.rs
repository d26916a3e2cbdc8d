//! A segmented LED gauge.

use serde_json::{Value, json};
use tracing::warn;

use trellis_core::dom::Element;
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::event;
use trellis_core::widget::{AttributeSetter, Emitter, Widget, WidgetContext};

use crate::parse_number;

const BASE_HUE: f64 = 120.0;
const DEFAULT_SEGMENTS: usize = 10;

/// A bar of LED-style segments lighting up toward the current value.
///
/// `colors` holds hue overrides keyed by threshold: the greatest threshold
/// at or below the current value is active, and every segment whose range
/// starts at or above it takes that hue. Segments below the active
/// threshold keep the base hue.
#[derive(Debug)]
pub struct LedGauge {
    min: f64,
    max: f64,
    value: f64,
    segments: usize,
    unit: String,
    /// `(threshold, hue)` overrides, kept sorted by threshold.
    colors: Vec<(f64, f64)>,
    emitter: Option<Emitter>,
}

impl Default for LedGauge {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            value: 0.0,
            segments: DEFAULT_SEGMENTS,
            unit: String::new(),
            colors: Vec::new(),
            emitter: None,
        }
    }
}

impl LedGauge {
    /// Creates a gauge with the default 0–100 range.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set_min(&mut self, value: &str) -> Result<(), ValidationError> {
        self.min = parse_number("min", value)?;
        Ok(())
    }

    fn set_max(&mut self, value: &str) -> Result<(), ValidationError> {
        self.max = parse_number("max", value)?;
        Ok(())
    }

    fn set_value(&mut self, value: &str) -> Result<(), ValidationError> {
        self.value = parse_number("value", value)?;
        Ok(())
    }

    fn set_segments(&mut self, value: &str) -> Result<(), ValidationError> {
        let count: usize = value
            .trim()
            .parse()
            .map_err(|_| ValidationError::new("segments", value, "expected a count"))?;
        if (1..=100).contains(&count) {
            self.segments = count;
            Ok(())
        } else {
            Err(ValidationError::new(
                "segments",
                value,
                "expected between 1 and 100 segments",
            ))
        }
    }

    fn set_unit(&mut self, value: &str) -> Result<(), ValidationError> {
        self.unit = value.to_owned();
        Ok(())
    }

    fn set_colors(&mut self, value: &str) -> Result<(), ValidationError> {
        let parsed: Value = serde_json::from_str(value)
            .map_err(|err| ValidationError::new("colors", value, err.to_string()))?;
        let Some(map) = parsed.as_object() else {
            return Err(ValidationError::new(
                "colors",
                value,
                "expected an object of threshold: hue pairs",
            ));
        };
        let mut colors = Vec::with_capacity(map.len());
        for (key, hue) in map {
            let threshold: f64 = key.trim().parse().map_err(|_| {
                ValidationError::new("colors", value, format!("threshold {key:?} is not numeric"))
            })?;
            let hue = hue.as_f64().ok_or_else(|| {
                ValidationError::new("colors", value, format!("hue for {key:?} is not numeric"))
            })?;
            colors.push((threshold, hue));
        }
        colors.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.colors = colors;
        Ok(())
    }

    /// Sets the displayed value directly.
    pub fn set_level(&mut self, value: f64) {
        self.value = value;
    }

    /// The current value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    fn bounds(&self) -> (f64, f64) {
        if self.min < self.max {
            (self.min, self.max)
        } else {
            // Degenerate bounds render the default range instead of
            // halting.
            warn!(min = self.min, max = self.max, "gauge bounds are not ascending, using defaults");
            (0.0, 100.0)
        }
    }

    fn segment_start(&self, index: usize) -> f64 {
        let (min, max) = self.bounds();
        let span = (max - min) / self.segments as f64;
        min + span * index as f64
    }

    fn hue_for(&self, start: f64) -> f64 {
        let active = self
            .colors
            .iter()
            .filter(|(threshold, _)| self.value >= *threshold)
            .next_back();
        match active {
            Some((threshold, hue)) if start >= *threshold => *hue,
            _ => BASE_HUE,
        }
    }

    /// Reports a click on one segment, emitting `segment-click` with the
    /// segment's index and value bounds.
    pub fn click_segment(&self, index: usize) {
        if index >= self.segments {
            warn!(index, segments = self.segments, "ignoring click outside the gauge");
            return;
        }
        if let Some(emitter) = &self.emitter {
            let (min, max) = self.bounds();
            let span = (max - min) / self.segments as f64;
            let start = self.segment_start(index);
            emitter.emit(
                event::SEGMENT_CLICK,
                Some(json!({
                    "index": index,
                    "start": start,
                    "end": start + span,
                })),
            );
        }
    }
}

impl Widget for LedGauge {
    const TAG: &'static str = "led-gauge";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[
        AttributeSetter {
            name: "min",
            apply: LedGauge::set_min,
        },
        AttributeSetter {
            name: "max",
            apply: LedGauge::set_max,
        },
        AttributeSetter {
            name: "value",
            apply: LedGauge::set_value,
        },
        AttributeSetter {
            name: "segments",
            apply: LedGauge::set_segments,
        },
        AttributeSetter {
            name: "unit",
            apply: LedGauge::set_unit,
        },
        AttributeSetter {
            name: "colors",
            apply: LedGauge::set_colors,
        },
    ];

    fn connected(&mut self, ctx: &mut WidgetContext<'_>) {
        self.emitter = Some(ctx.emitter());
    }

    fn disconnected(&mut self, _ctx: &mut WidgetContext<'_>) {
        self.emitter = None;
    }

    fn render(&self, _env: &Environment) -> Element {
        let mut bar = Element::new("ul").with_attr("role", "meter");
        for index in 0..self.segments {
            let start = self.segment_start(index);
            bar.append(
                Element::new("li")
                    .with_attr("data-index", index.to_string())
                    .with_attr("data-on", (start < self.value).to_string())
                    .with_attr("hue", self.hue_for(start).to_string()),
            );
        }
        let mut label = format!("{}", self.value);
        if !self.unit.is_empty() {
            label.push(' ');
            label.push_str(&self.unit);
        }
        Element::new(Self::TAG)
            .with_child(bar)
            .with_child(Element::new("output").with_text(label))
    }
}

/// Convenience constructor.
#[must_use]
pub fn led_gauge() -> LedGauge {
    LedGauge::new()
}
