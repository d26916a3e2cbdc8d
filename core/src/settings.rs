//! The persisted page settings blob.
//!
//! One JSON document, keyed by page path, holding `{theme, contrast}` per
//! page. Read at connect, written on user interaction, last write wins —
//! there is no schema versioning and no merging.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// The per-page settings blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Color scheme: `light`, `dark`, or `auto`.
    pub theme: String,
    /// Contrast preference: `standard`, `more`, or `less`.
    pub contrast: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "auto".into(),
            contrast: "standard".into(),
        }
    }
}

/// Storage for the settings blob, keyed by page path.
pub trait SettingsStore {
    /// Reads the blob for `page`, `None` when nothing was stored yet.
    fn load(&self, page: &str) -> Result<Option<Settings>, SettingsError>;
    /// Writes the blob for `page`, replacing any previous value.
    fn save(&self, page: &str, settings: &Settings) -> Result<(), SettingsError>;
}

pub(crate) struct SettingsHandle(pub(crate) Rc<dyn SettingsStore>);

impl fmt::Debug for SettingsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SettingsHandle")
    }
}

/// In-memory store, for tests and ephemeral embedders.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, Settings>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, page: &str) -> Result<Option<Settings>, SettingsError> {
        Ok(self.entries.borrow().get(page).cloned())
    }

    fn save(&self, page: &str, settings: &Settings) -> Result<(), SettingsError> {
        self.entries
            .borrow_mut()
            .insert(page.to_owned(), settings.clone());
        Ok(())
    }
}

impl SettingsStore for Rc<MemoryStore> {
    fn load(&self, page: &str) -> Result<Option<Settings>, SettingsError> {
        self.as_ref().load(page)
    }

    fn save(&self, page: &str, settings: &Settings) -> Result<(), SettingsError> {
        self.as_ref().save(page, settings)
    }
}

/// One JSON file holding every page's blob — the single-key store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by the file at `path`. The file is created
    /// on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_document(&self) -> Result<HashMap<String, Settings>, SettingsError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl SettingsStore for FileStore {
    fn load(&self, page: &str) -> Result<Option<Settings>, SettingsError> {
        Ok(self.read_document()?.remove(page))
    }

    fn save(&self, page: &str, settings: &Settings) -> Result<(), SettingsError> {
        // Read-modify-write of the whole document; last write wins.
        let mut document = self.read_document()?;
        document.insert(page.to_owned(), settings.clone());
        fs::write(&self.path, serde_json::to_string_pretty(&document)?)?;
        Ok(())
    }
}
