//! Single-slot storage for the id of the call in flight

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::Settings;

/// Holds at most one call id, surviving process restarts where the
/// implementation is durable.
pub trait ActiveCallStore: Send + Sync {
    fn get(&self) -> Result<Option<String>>;
    fn set(&self, call_id: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Stores the active call id in a small file under the data directory
pub struct FileCallIdStore {
    path: PathBuf,
}

impl FileCallIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.active_call_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActiveCallStore for FileCallIdStore {
    fn get(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read active call: {}", self.path.display())),
        }
    }

    fn set(&self, call_id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write then rename so a reader never sees a half-written id.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, call_id)
            .with_context(|| format!("Failed to write active call: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to write active call: {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to clear active call: {}", self.path.display())),
        }
    }
}

/// In-memory slot; clones share the same slot
#[derive(Debug, Clone, Default)]
pub struct MemoryCallIdStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCallIdStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ActiveCallStore for MemoryCallIdStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.lock().clone())
    }

    fn set(&self, call_id: &str) -> Result<()> {
        *self.lock() = Some(call_id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}
