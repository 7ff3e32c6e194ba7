//! Durable key/value storage for UI state, the equivalent of `localStorage`.
//!
//! Values are plain strings; callers serialize structured values themselves
//! so a corrupt entry only affects its own key.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

pub const THEME_KEY: &str = "theme";
pub const DRAFT_KEY: &str = "appState";

pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Prompt drafts, saved together on every keystroke.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftState {
    #[serde(rename = "imgPrompt", default)]
    pub image_prompt: String,
    #[serde(rename = "textPrompt", default)]
    pub text_prompt: String,
}

impl DraftState {
    pub fn load(storage: &impl Storage) -> Option<Self> {
        let raw = storage.get_item(DRAFT_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(draft) => Some(draft),
            Err(e) => {
                tracing::error!("Failed to load state: {}", e);
                None
            }
        }
    }

    pub fn save(&self, storage: &mut impl Storage) -> Result<()> {
        let raw = serde_json::to_string(self)?;
        storage.set_item(DRAFT_KEY, &raw)
    }
}

/// Session-only storage, used by tests and when no state file is wanted.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the store at `path`. A missing file starts empty; an unreadable
    /// one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable storage file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Could not read storage file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self { path, items }
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                ClientError::Storage(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }
        let content = serde_json::to_string_pretty(&self.items)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        self.flush()
    }
}
