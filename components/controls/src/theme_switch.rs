//! A theme and contrast switcher with persisted preferences.

use std::rc::Rc;

use serde_json::json;
use tracing::warn;

use trellis_core::dom::Element;
use trellis_core::env::Environment;
use trellis_core::error::ValidationError;
use trellis_core::event;
use trellis_core::settings::{Settings, SettingsStore};
use trellis_core::widget::{AttributeSetter, Emitter, Widget, WidgetContext};

/// The color scheme choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    /// Force the light palette.
    Light,
    /// Force the dark palette.
    Dark,
    /// Follow the platform preference.
    #[default]
    Auto,
}

impl ColorScheme {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// The contrast preference choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContrastPref {
    /// Platform-standard contrast.
    #[default]
    Standard,
    /// Higher contrast.
    More,
    /// Lower contrast.
    Less,
}

impl ContrastPref {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::More => "more",
            Self::Less => "less",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(Self::Standard),
            "more" => Some(Self::More),
            "less" => Some(Self::Less),
            _ => None,
        }
    }
}

/// Switches the page theme and persists the choice per page path.
///
/// At connect the widget restores the stored `{theme, contrast}` blob for
/// the current page, overriding markup; every user toggle writes the blob
/// back (last write wins). Without a settings store the widget still
/// works, it just forgets.
pub struct ThemeSwitch {
    scheme: ColorScheme,
    contrast: ContrastPref,
    store: Option<Rc<dyn SettingsStore>>,
    page: String,
    emitter: Option<Emitter>,
}

impl std::fmt::Debug for ThemeSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeSwitch")
            .field("scheme", &self.scheme)
            .field("contrast", &self.contrast)
            .finish()
    }
}

impl Default for ThemeSwitch {
    fn default() -> Self {
        Self {
            scheme: ColorScheme::Auto,
            contrast: ContrastPref::Standard,
            store: None,
            page: "/".into(),
            emitter: None,
        }
    }
}

impl ThemeSwitch {
    /// Creates a switch in the `auto`/`standard` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set_theme(&mut self, value: &str) -> Result<(), ValidationError> {
        self.scheme = ColorScheme::parse(value).ok_or_else(|| {
            ValidationError::new("theme", value, "expected light, dark, or auto")
        })?;
        Ok(())
    }

    fn set_contrast(&mut self, value: &str) -> Result<(), ValidationError> {
        self.contrast = ContrastPref::parse(value).ok_or_else(|| {
            ValidationError::new("contrast", value, "expected standard, more, or less")
        })?;
        Ok(())
    }

    /// The active color scheme.
    #[must_use]
    pub const fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    /// The active contrast preference.
    #[must_use]
    pub const fn contrast(&self) -> ContrastPref {
        self.contrast
    }

    /// Flips between light and dark (auto resolves to light first),
    /// persists, and announces the change.
    pub fn toggle_theme(&mut self) {
        self.scheme = match self.scheme {
            ColorScheme::Light => ColorScheme::Dark,
            ColorScheme::Dark | ColorScheme::Auto => ColorScheme::Light,
        };
        self.persist();
        self.announce();
    }

    /// Cycles contrast standard → more → less, persists, and announces.
    pub fn cycle_contrast(&mut self) {
        self.contrast = match self.contrast {
            ContrastPref::Standard => ContrastPref::More,
            ContrastPref::More => ContrastPref::Less,
            ContrastPref::Less => ContrastPref::Standard,
        };
        self.persist();
        self.announce();
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let blob = Settings {
            theme: self.scheme.as_str().into(),
            contrast: self.contrast.as_str().into(),
        };
        if let Err(err) = store.save(&self.page, &blob) {
            warn!(%err, page = %self.page, "failed to persist theme settings");
        }
    }

    fn restore(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.load(&self.page) {
            Ok(Some(blob)) => {
                if let Some(scheme) = ColorScheme::parse(&blob.theme) {
                    self.scheme = scheme;
                } else {
                    warn!(theme = %blob.theme, "stored theme is unknown, keeping current");
                }
                if let Some(contrast) = ContrastPref::parse(&blob.contrast) {
                    self.contrast = contrast;
                } else {
                    warn!(contrast = %blob.contrast, "stored contrast is unknown, keeping current");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, page = %self.page, "failed to read theme settings"),
        }
    }

    fn announce(&self) {
        if let Some(emitter) = &self.emitter {
            emitter.emit(
                event::VALUE_CHANGE,
                Some(json!({
                    "theme": self.scheme.as_str(),
                    "contrast": self.contrast.as_str(),
                })),
            );
        }
    }
}

impl Widget for ThemeSwitch {
    const TAG: &'static str = "theme-switch";

    const ATTRIBUTES: &'static [AttributeSetter<Self>] = &[
        AttributeSetter {
            name: "theme",
            apply: ThemeSwitch::set_theme,
        },
        AttributeSetter {
            name: "contrast",
            apply: ThemeSwitch::set_contrast,
        },
    ];

    fn connected(&mut self, ctx: &mut WidgetContext<'_>) {
        self.emitter = Some(ctx.emitter());
        self.store = ctx.env().settings();
        self.page = ctx.env().page().path;
        // The stored blob wins over markup.
        self.restore();
    }

    fn disconnected(&mut self, _ctx: &mut WidgetContext<'_>) {
        self.emitter = None;
        self.store = None;
    }

    fn render(&self, _env: &Environment) -> Element {
        Element::new(Self::TAG)
            .with_attr("data-theme", self.scheme.as_str())
            .with_attr("data-contrast", self.contrast.as_str())
            .with_child(
                Element::new("button")
                    .with_attr("type", "button")
                    .with_text(format!("Theme: {}", self.scheme.as_str())),
            )
    }
}

/// Convenience constructor.
#[must_use]
pub fn theme_switch() -> ThemeSwitch {
    ThemeSwitch::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::env::Page;
    use trellis_core::lifecycle::Host;
    use trellis_core::settings::MemoryStore;

    #[test]
    fn toggling_persists_the_blob_for_the_page() {
        let env = Environment::new();
        let store = Rc::new(MemoryStore::new());
        env.install_settings(store.clone());
        env.insert(Page::new("/dash"));

        let mut host = Host::new(ThemeSwitch::new(), &env);
        host.attach(&[]);
        host.widget_mut().toggle_theme();

        let stored = store.load("/dash").unwrap().unwrap();
        assert_eq!(stored.theme, "light");
        assert_eq!(stored.contrast, "standard");
    }

    #[test]
    fn stored_settings_win_over_markup_at_connect() {
        let env = Environment::new();
        let store = Rc::new(MemoryStore::new());
        store
            .save(
                "/",
                &Settings {
                    theme: "dark".into(),
                    contrast: "more".into(),
                },
            )
            .unwrap();
        env.install_settings(store);

        let mut host = Host::new(ThemeSwitch::new(), &env);
        host.attach(&[("theme", "light")]);

        assert_eq!(host.widget().scheme(), ColorScheme::Dark);
        assert_eq!(host.widget().contrast(), ContrastPref::More);
        assert_eq!(host.root().attribute("data-theme"), Some("dark"));
    }

    #[test]
    fn last_write_wins_across_instances() {
        let env = Environment::new();
        let store = Rc::new(MemoryStore::new());
        env.install_settings(store.clone());

        let mut first = Host::new(ThemeSwitch::new(), &env);
        first.attach(&[]);
        first.widget_mut().toggle_theme(); // -> light

        let mut second = Host::new(ThemeSwitch::new(), &env);
        second.attach(&[]);
        second.widget_mut().toggle_theme(); // restored light -> dark

        assert_eq!(store.load("/").unwrap().unwrap().theme, "dark");
    }

    #[test]
    fn invalid_enums_degrade_to_defaults() {
        let env = Environment::new();
        let mut host = Host::new(ThemeSwitch::new(), &env);
        host.attach(&[("theme", "sepia"), ("contrast", "extreme")]);
        assert_eq!(host.widget().scheme(), ColorScheme::Auto);
        assert_eq!(host.widget().contrast(), ContrastPref::Standard);
    }

    #[test]
    fn works_without_a_store() {
        let env = Environment::new();
        let mut host = Host::new(ThemeSwitch::new(), &env);
        host.attach(&[("theme", "dark")]);
        host.widget_mut().toggle_theme();
        assert_eq!(host.widget().scheme(), ColorScheme::Light);
    }
}
